use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("batch progress file error: {0}")]
    Progress(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}
