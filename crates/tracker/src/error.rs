use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("tracker store unopenable: {0}")]
    Unopenable(String),

    #[error("tracker query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}
