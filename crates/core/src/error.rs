use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}
