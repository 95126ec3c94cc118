pub mod config;
pub mod error;
pub mod error_recovery;
pub mod error_utils;
pub mod extract;
pub mod types;

pub use config::*;
pub use error::*;
pub use error_recovery::*;
pub use error_utils::*;
pub use extract::*;
pub use types::*;
