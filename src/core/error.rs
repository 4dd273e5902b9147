use thiserror::Error;

use crate::core::types::{NationId, TownId, TravelerId};

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Traveler not found: {0}")]
    TravelerNotFound(TravelerId),

    #[error("Town not found: {0}")]
    TownNotFound(TownId),

    #[error("Nation not found: {0}")]
    NationNotFound(NationId),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
