use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum LivenessError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("No frames to analyze")]
    EmptyInput,
}
