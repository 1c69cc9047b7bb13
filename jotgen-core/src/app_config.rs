use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::distribute::BaseArtifactSpec;
use crate::engine::ProcessEngine;
use crate::{GeneratorError, Result};

pub const ENV_PREFIX: &str = "JOTGEN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store_dir: PathBuf,
    pub wordlist_path: PathBuf,
    /// Server-side copy of the base artifact, used for generation and for
    /// verification images.
    pub base_artifact_path: PathBuf,
    /// Engine program followed by its arguments.
    pub engine_command: Vec<String>,
    pub generation_timeout_secs: u64,
    pub identifier_length: usize,
    pub log_level: String,
    pub base_artifact: BaseArtifactSpec,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from("seeds"),
            wordlist_path: PathBuf::from("names.txt"),
            base_artifact_path: PathBuf::from("ct.sfc"),
            engine_command: vec!["jot-engine".to_string()],
            generation_timeout_secs: 60,
            identifier_length: 15,
            log_level: "info".to_string(),
            base_artifact: BaseArtifactSpec::default(),
        }
    }
}

impl AppConfig {
    /// Defaults, then the TOML file if given, then `JOTGEN__*` variables
    /// (e.g. `JOTGEN__STORE_DIR`, `JOTGEN__ENGINE_COMMAND="jot-engine --fast"`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&AppConfig::default())?);

        if let Some(path) = path {
            info!("Loading config from {}", path.display());
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(" ")
                    .with_list_parse_key("engine_command"),
            )
            .build()?
            .try_deserialize::<Self>()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.engine_command.is_empty() {
            return Err(GeneratorError::InvalidSettings(
                "engine_command must name a program".to_string(),
            ));
        }
        if self.base_artifact.header_len > self.base_artifact.headered_size {
            return Err(GeneratorError::InvalidSettings(
                "base_artifact.header_len must not exceed base_artifact.headered_size".to_string(),
            ));
        }
        if self.identifier_length == 0 {
            return Err(GeneratorError::InvalidSettings(
                "identifier_length must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    pub fn engine(&self) -> Result<ProcessEngine> {
        let (program, args) = self.engine_command.split_first().ok_or_else(|| {
            GeneratorError::InvalidSettings("engine_command must name a program".to_string())
        })?;
        Ok(ProcessEngine::new(program, args.to_vec()))
    }
}
