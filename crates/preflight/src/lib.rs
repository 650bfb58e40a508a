pub mod checker;
pub mod domain_validator;
pub mod error;

pub use checker::{run_preflight, CheckerConfig, PreflightResult};
pub use domain_validator::{validate, RejectReason, ValidatorConfig};
pub use error::PreflightError;
