use thiserror::Error;

#[derive(Error, Debug)]
pub enum PreflightError {
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}
