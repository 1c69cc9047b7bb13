use std::time::Duration;
use thiserror::Error;

pub mod app_config;
pub mod configuration;
pub mod cosmetics;
pub mod distribute;
pub mod engine;
pub mod flags;
pub mod mystery;
pub mod options;
pub mod pipeline;
pub mod seed;
pub mod spoiler;
pub mod store;
pub mod translate;
pub mod verification;

pub use app_config::AppConfig;
pub use configuration::Configuration;
pub use cosmetics::CosmeticOptions;
pub use distribute::{ArtifactDistributor, BaseArtifactSpec};
pub use engine::{ArtifactMetadata, Engine, ProcessEngine};
pub use options::OptionMap;
pub use pipeline::{Pipeline, SpoilerFormat, SpoilerView};
pub use seed::{Secrecy, SeedWords};
pub use store::{FileStore, MemoryStore, RecordStore, ShareRecord, ShareStore};
pub use translate::Translator;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("malformed options: {0}")]
    MalformedOptions(String),
    #[error("invalid range: {0}")]
    InvalidRange(String),
    #[error("{0}")]
    InvalidSettings(String),
    #[error("invalid base artifact: {0}")]
    InvalidArtifact(String),
    #[error("no seed with id {0}")]
    NotFound(String),
    #[error("generation did not finish within {0:?}")]
    GenerationTimeout(Duration),
    #[error("engine error: {0}")]
    Engine(String),
    #[error("word list error: {0}")]
    Wordlist(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("image error: {0}")]
    Image(#[from] ::image::ImageError),
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

/// How a caller should answer a failed request.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// The user's options are at fault; show the message.
    Validation,
    /// The uploaded base artifact is at fault.
    Artifact,
    NotFound,
    /// Nothing was persisted; the request may be retried.
    Transient,
    Internal,
}

impl GeneratorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedOptions(_) | Self::InvalidRange(_) | Self::InvalidSettings(_) => {
                ErrorKind::Validation
            }
            Self::InvalidArtifact(_) => ErrorKind::Artifact,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::GenerationTimeout(_) => ErrorKind::Transient,
            Self::Engine(_)
            | Self::Wordlist(_)
            | Self::Io(_)
            | Self::Serialization(_)
            | Self::Image(_)
            | Self::Config(_) => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, GeneratorError>;
