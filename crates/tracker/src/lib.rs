pub mod error;
pub mod import;
pub mod store;
pub mod types;

pub use error::TrackerError;
pub use import::import_existing_results;
pub use store::Tracker;
pub use types::{Outcome, RangeAnalysis, RangeSuggestion, VerifyResult};
