use std::path::Path;
use topposts_core::{ExportError, Row, COLUMNS};

/// Writes a UTF-8 CSV file: one header line, then one line per row.
pub fn write_csv(rows: &[Row], path: &Path) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record(COLUMNS)?;
    for row in rows {
        writer.write_record(row.cells().iter().map(|cell| cell.to_string()))?;
    }

    writer.flush().map_err(|source| ExportError::WriteFailed {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_rows, temp_path};

    fn read_back(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
        let mut reader = csv::Reader::from_path(path).unwrap();
        let headers = reader
            .headers()
            .unwrap()
            .iter()
            .map(str::to_string)
            .collect();
        let records = reader
            .records()
            .map(|record| record.unwrap().iter().map(str::to_string).collect())
            .collect();
        (headers, records)
    }

    #[test]
    fn test_csv_round_trip() {
        let rows = sample_rows();
        let path = temp_path("csv");

        write_csv(&rows, &path).unwrap();
        let (headers, records) = read_back(&path);

        assert_eq!(headers, COLUMNS);
        assert_eq!(records.len(), rows.len());
        for (row, record) in rows.iter().zip(records.iter()) {
            let expected: Vec<String> = row.cells().iter().map(|cell| cell.to_string()).collect();
            assert_eq!(record, &expected);
        }

        // Quoting survives commas, quotes and newlines
        assert_eq!(records[0][0], "First, with a comma");
        assert_eq!(records[1][0], "Second \"quoted\"");
        assert_eq!(records[1][8], "line one\nline two");
        assert_eq!(records[1][3], "[deleted]");
        assert_eq!(records[0][5], "2023-11-14 22:13:20");
        assert_eq!(records[1][10], "true");

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_header_only_when_empty() {
        let path = temp_path("csv");

        write_csv(&[], &path).unwrap();
        let (headers, records) = read_back(&path);

        assert_eq!(headers, COLUMNS);
        assert!(records.is_empty());

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_unwritable_path() {
        let path = temp_path("missing-dir").join("posts.csv");
        assert!(matches!(
            write_csv(&sample_rows(), &path),
            Err(ExportError::Csv(_))
        ));
    }
}
