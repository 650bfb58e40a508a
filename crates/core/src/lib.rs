pub mod canon;
pub mod config;
pub mod error;
pub mod types;

pub use canon::canonicalize_url;
pub use config::*;
pub use error::CoreError;
pub use types::*;
