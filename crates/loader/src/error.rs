use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("URL source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}
