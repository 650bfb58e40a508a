use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}
