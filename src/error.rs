use thiserror::Error;

use crate::naming::OracleError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Environment error: {0}")]
    Environment(String),

    #[error("Naming oracle error: {0}")]
    Oracle(#[from] OracleError),
}
