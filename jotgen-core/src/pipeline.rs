use std::fs;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

use crate::app_config::AppConfig;
use crate::configuration::Configuration;
use crate::cosmetics::CosmeticOptions;
use crate::distribute::{ArtifactDistributor, BaseArtifactSpec};
use crate::engine::{Engine, Generated};
use crate::options::OptionMap;
use crate::seed::{self, ObfuscatedSeed, Secrecy, SeedWords};
use crate::spoiler::{self, WebSpoiler};
use crate::store::{FileStore, RecordStore, ShareRecord, ShareStore};
use crate::translate::Translator;
use crate::verification;
use crate::{GeneratorError, Result};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SpoilerFormat {
    Text,
    Json,
    Web,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SpoilerView {
    /// Race record; nothing may be revealed.
    Withheld,
    Text(String),
    Json(String),
    Web(WebSpoiler),
}

impl SpoilerView {
    /// Body served in place of a JSON spoiler for race records.
    pub const WITHHELD_JSON: &'static str = r#"{"cheating": "not_allowed"}"#;
}

/// Privileged view of a record, including race records.
#[derive(Clone, Debug)]
pub struct Dump {
    pub id: String,
    pub effective_seed: String,
    pub spoiler: String,
}

/// The request-level operations: each call either stores a complete record
/// or stores nothing.
pub struct Pipeline<S> {
    store: ShareStore<S>,
    words: SeedWords,
    engine: Arc<dyn Engine>,
    base_artifact: Arc<Vec<u8>>,
    artifact_spec: BaseArtifactSpec,
    timeout: Duration,
}

impl Pipeline<FileStore> {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let store = ShareStore::with_id_len(FileStore::open(&config.store_dir)?, config.identifier_length);
        let words = SeedWords::load(&config.wordlist_path)?;
        let base = fs::read(&config.base_artifact_path)?;
        Self::new(
            store,
            words,
            Arc::new(config.engine()?),
            &base,
            config.base_artifact.clone(),
            config.generation_timeout(),
        )
    }
}

impl<S: RecordStore> Pipeline<S> {
    /// `base_artifact` is the server's own copy; it must pass the same
    /// check as user uploads.
    pub fn new(
        store: ShareStore<S>,
        words: SeedWords,
        engine: Arc<dyn Engine>,
        base_artifact: &[u8],
        artifact_spec: BaseArtifactSpec,
        timeout: Duration,
    ) -> Result<Self> {
        let base = ArtifactDistributor::new(&artifact_spec)
            .validate_base_artifact(base_artifact)?
            .to_vec();
        Ok(Self {
            store,
            words,
            engine,
            base_artifact: Arc::new(base),
            artifact_spec,
            timeout,
        })
    }

    pub fn store(&self) -> &ShareStore<S> {
        &self.store
    }

    /// Runs the engine on its own thread and gives up after the timeout.
    ///
    /// The engine call itself cannot be cancelled; a late result is
    /// discarded.
    fn run_engine(&self, cfg: &Configuration, seed: &ObfuscatedSeed) -> Result<Generated> {
        let mut settings = cfg.clone();
        settings.seed = seed.effective.clone();

        let engine = Arc::clone(&self.engine);
        let base = Arc::clone(&self.base_artifact);
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(engine.generate(&base, &settings));
        });

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                warn!(timeout = ?self.timeout, "generation timed out");
                Err(GeneratorError::GenerationTimeout(self.timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(GeneratorError::Engine(
                "engine thread ended without a result".to_string(),
            )),
        }
    }

    /// Options to stored record. Nothing is stored if any step fails; a
    /// failed mystery generation is not retried since a retry would draw
    /// different settings.
    pub fn generate(&self, options: &OptionMap, secrecy: Secrecy) -> Result<ShareRecord> {
        let mut rng = rand::thread_rng();
        let cfg = Translator::new(&self.words).translate(options, &mut rng)?;
        let seed = seed::obfuscate(&cfg.seed, secrecy);
        let generated = self.run_engine(&cfg, &seed)?;
        let record = self.store.put(cfg, generated.metadata, secrecy.is_race(), &seed.nonce)?;
        info!(id = %record.id, race = secrecy.is_race(), "generated seed");
        Ok(record)
    }

    /// New public record with the settings of `id` and a fresh seed.
    pub fn practice(&self, id: &str) -> Result<ShareRecord> {
        let mut rng = rand::thread_rng();
        self.store.clone_record(id, &self.words, &mut rng, |cfg, seed| {
            Ok(self.run_engine(cfg, seed)?.metadata)
        })
    }

    /// Applies a record to the user's base artifact. Returns the download
    /// file name and bytes.
    pub fn download(
        &self,
        id: &str,
        user_artifact: &[u8],
        cosmetics: &CosmeticOptions,
    ) -> Result<(String, Vec<u8>)> {
        let record = self.store.get(id)?;
        let mut settings = record.configuration.clone();
        settings.seed = record.effective_seed();

        let (name, patched) = ArtifactDistributor::new(&self.artifact_spec).materialize(
            self.engine.as_ref(),
            user_artifact,
            &settings,
            &record.metadata,
            cosmetics,
            id,
        )?;

        if record.verification_hash.is_none() {
            self.store.set_verification_hash(id, &patched.verification_token)?;
        }
        Ok((name, patched.artifact))
    }

    pub fn spoiler(&self, id: &str, format: SpoilerFormat) -> Result<SpoilerView> {
        let record = self.store.get(id)?;
        if record.race {
            return Ok(SpoilerView::Withheld);
        }

        let hash = record.verification_hash.as_deref();
        Ok(match format {
            SpoilerFormat::Text => {
                SpoilerView::Text(spoiler::project_text(&record.configuration, &record.metadata, hash))
            }
            SpoilerFormat::Json => SpoilerView::Json(spoiler::project_json(
                &record.configuration,
                &record.metadata,
                hash,
            )?),
            SpoilerFormat::Web => {
                SpoilerView::Web(spoiler::project_web(&record.configuration, &record.metadata))
            }
        })
    }

    pub fn share_details(&self, id: &str) -> Result<String> {
        Ok(spoiler::share_details(&self.store.get(id)?.configuration))
    }

    /// The record's verification hash, patching the server's base artifact
    /// to derive it if no download has happened yet.
    fn verification_hash(&self, record: &ShareRecord) -> Result<Vec<u8>> {
        if let Some(hash) = &record.verification_hash {
            return Ok(hash.clone());
        }

        let mut settings = record.configuration.clone();
        settings.seed = record.effective_seed();
        let patched = self.engine.patch(
            &self.base_artifact,
            &settings,
            &record.metadata,
            &CosmeticOptions::default(),
        )?;
        let stored = self
            .store
            .set_verification_hash(&record.id, &patched.verification_token)?;
        Ok(stored.verification_hash.unwrap_or(patched.verification_token))
    }

    /// PNG bytes of the record's verification image.
    pub fn verification_image(&self, id: &str) -> Result<Vec<u8>> {
        let record = self.store.get(id)?;
        let hash = self.verification_hash(&record)?;
        verification::render_png(id, &hash)
    }

    /// Full spoiler and effective seed, including for race records.
    pub fn dump(&self, id: &str) -> Result<Dump> {
        let record = self.store.get(id)?;
        let effective_seed = record.effective_seed();
        let spoiler = spoiler::project_text(
            &record.configuration,
            &record.metadata,
            record.verification_hash.as_deref(),
        );
        Ok(Dump {
            id: record.id,
            effective_seed,
            spoiler,
        })
    }

    pub fn recent(&self, count: usize) -> Result<Vec<ShareRecord>> {
        self.store.recent(count)
    }
}
