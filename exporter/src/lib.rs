pub mod csv_table;
pub mod xlsx_table;

use std::path::Path;
use topposts_core::{CoreError, ExportError, Row};
use tracing::{debug, info};

pub use topposts_core::ExportFormat;

/// Writes `rows` to `path` in the format its extension names.
///
/// Any existing file is replaced and missing parent directories are created.
/// An empty `rows` still produces a file with the header.
pub fn export(rows: &[Row], path: &Path) -> Result<(), CoreError> {
    let format = ExportFormat::from_path(path)?;
    ensure_parent_dir(path)?;

    debug!("Writing {} rows to {} as {:?}", rows.len(), path.display(), format);
    match format {
        ExportFormat::Csv => csv_table::write_csv(rows, path)?,
        ExportFormat::Xlsx => xlsx_table::write_xlsx(rows, path)?,
    }

    info!("Data saved to {}", path.display());
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<(), ExportError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
            std::fs::create_dir_all(dir).map_err(|source| ExportError::WriteFailed {
                path: dir.display().to_string(),
                source,
            })
        }
        _ => Ok(()),
    }
}
