use thiserror::Error;

use crate::usecase::ports::store::StoreError;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("row store failed: {0}")]
    Store(#[from] StoreError),

    #[error("failed to serialize table state: {0}")]
    State(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(Box<figment::Error>),

    #[error("unable to resolve {0} directory")]
    Directory(&'static str),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Figment(Box::new(err))
    }
}
