use chrono::{DateTime, Utc};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use parking_lot::RwLock;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::configuration::Configuration;
use crate::engine::ArtifactMetadata;
use crate::seed::{self, ObfuscatedSeed, SeedWords, TOKEN_ALPHABET};
use crate::{GeneratorError, Result};

pub const DEFAULT_ID_LEN: usize = 15;

/// A persisted generation: settings, placements and share metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct ShareRecord {
    pub id: String,
    pub configuration: Configuration,
    pub metadata: ArtifactMetadata,
    pub race: bool,
    /// Filled in the first time an artifact is materialised.
    pub verification_hash: Option<Vec<u8>>,
    pub created_at: DateTime<Utc>,
    /// Race nonce; empty for public records.
    pub nonce: String,
}

#[derive(Serialize, Deserialize)]
struct RecordV1 {
    id: String,
    configuration: Configuration,
    metadata: ArtifactMetadata,
    race: bool,
    #[serde(default)]
    verification_hash: Option<String>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    nonce: String,
}

/// On-disk schema. New fields go into the current version with
/// `#[serde(default)]`; incompatible changes add a variant.
#[derive(Serialize, Deserialize)]
#[serde(tag = "schema")]
enum StoredRecord {
    #[serde(rename = "v1")]
    V1(RecordV1),
}

impl ShareRecord {
    pub fn to_blob(&self) -> Result<Vec<u8>> {
        let stored = StoredRecord::V1(RecordV1 {
            id: self.id.clone(),
            configuration: self.configuration.clone(),
            metadata: self.metadata.clone(),
            race: self.race,
            verification_hash: self.verification_hash.as_ref().map(hex::encode),
            created_at: self.created_at,
            nonce: self.nonce.clone(),
        });
        Ok(serde_json::to_vec(&stored)?)
    }

    pub fn from_blob(blob: &[u8]) -> Result<Self> {
        let StoredRecord::V1(r) = serde_json::from_slice(blob)?;
        let verification_hash = r
            .verification_hash
            .map(|h| {
                hex::decode(&h).map_err(|e| {
                    GeneratorError::Serialization(serde::de::Error::custom(format!(
                        "bad verification hash for {}: {e}",
                        r.id
                    )))
                })
            })
            .transpose()?;
        Ok(Self {
            id: r.id,
            configuration: r.configuration,
            metadata: r.metadata,
            race: r.race,
            verification_hash,
            created_at: r.created_at,
            nonce: r.nonce,
        })
    }

    /// The seed the engine actually generated with.
    pub fn effective_seed(&self) -> String {
        seed::rederive(&self.configuration.seed, &self.nonce)
    }
}

/// Key to blob storage with an atomic insert-if-absent.
pub trait RecordStore: Send + Sync {
    /// Returns `false` without writing when `id` is already taken.
    fn insert_new(&self, id: &str, blob: &[u8]) -> Result<bool>;

    fn load(&self, id: &str) -> Result<Option<Vec<u8>>>;

    /// Overwrites an existing entry.
    fn replace(&self, id: &str, blob: &[u8]) -> Result<()>;

    fn ids(&self) -> Result<Vec<String>>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn insert_new(&self, id: &str, blob: &[u8]) -> Result<bool> {
        let mut entries = self.entries.write();
        if entries.contains_key(id) {
            return Ok(false);
        }
        entries.insert(id.to_string(), blob.to_vec());
        Ok(true)
    }

    fn load(&self, id: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().get(id).cloned())
    }

    fn replace(&self, id: &str, blob: &[u8]) -> Result<()> {
        match self.entries.write().get_mut(id) {
            Some(entry) => {
                *entry = blob.to_vec();
                Ok(())
            }
            None => Err(GeneratorError::NotFound(id.to_string())),
        }
    }

    fn ids(&self) -> Result<Vec<String>> {
        Ok(self.entries.read().keys().cloned().collect())
    }
}

const RECORD_SUFFIX: &str = ".json.gz";

/// One gzip-compressed file per record under a directory.
///
/// New records are written to a temporary file and hard-linked into place,
/// so a record is either absent or complete and two writers can never both
/// claim the same identifier.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, id: &str) -> Result<PathBuf> {
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(GeneratorError::NotFound(id.to_string()));
        }
        Ok(self.root.join(format!("{id}{RECORD_SUFFIX}")))
    }

    fn write_temp(&self, id: &str, blob: &[u8]) -> Result<PathBuf> {
        let tmp = self
            .root
            .join(format!(".{id}.{}.tmp", nanoid::nanoid!(8, &TOKEN_ALPHABET)));
        let file = OpenOptions::new().write(true).create_new(true).open(&tmp)?;
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(blob)?;
        encoder.finish()?.sync_all()?;
        Ok(tmp)
    }
}

/// Once the link exists the record is committed, so a leftover temp file
/// only costs disk space.
fn discard_temp(tmp: &Path) {
    if let Err(e) = fs::remove_file(tmp) {
        warn!(path = %tmp.display(), error = %e, "could not remove temp file");
    }
}

impl RecordStore for FileStore {
    fn insert_new(&self, id: &str, blob: &[u8]) -> Result<bool> {
        let path = self.record_path(id)?;
        let tmp = self.write_temp(id, blob)?;
        let linked = fs::hard_link(&tmp, &path);
        discard_temp(&tmp);
        match linked {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn load(&self, id: &str) -> Result<Option<Vec<u8>>> {
        let path = match self.record_path(id) {
            Ok(path) => path,
            Err(_) => return Ok(None),
        };
        let file = match fs::File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut blob = Vec::new();
        GzDecoder::new(file).read_to_end(&mut blob)?;
        Ok(Some(blob))
    }

    fn replace(&self, id: &str, blob: &[u8]) -> Result<()> {
        let path = self.record_path(id)?;
        if !path.exists() {
            return Err(GeneratorError::NotFound(id.to_string()));
        }
        let tmp = self.write_temp(id, blob)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn ids(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(id) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.strip_suffix(RECORD_SUFFIX))
                .filter(|id| !id.starts_with('.'))
            {
                ids.push(id.to_string());
            }
        }
        Ok(ids)
    }
}

/// Share records keyed by public identifier.
pub struct ShareStore<S> {
    backend: S,
    id_len: usize,
}

impl<S: RecordStore> ShareStore<S> {
    pub fn new(backend: S) -> Self {
        Self::with_id_len(backend, DEFAULT_ID_LEN)
    }

    pub fn with_id_len(backend: S, id_len: usize) -> Self {
        Self { backend, id_len }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// An identifier not used by any stored record at the time of the call.
    ///
    /// `put` still relies on the backend's insert-if-absent, since another
    /// writer may claim the identifier before it is stored.
    pub fn new_identifier(&self) -> Result<String> {
        loop {
            let len = self.id_len;
            let id = nanoid::nanoid!(len, &TOKEN_ALPHABET);
            if self.backend.load(&id)?.is_none() {
                return Ok(id);
            }
            debug!(%id, "share identifier already taken, drawing another");
        }
    }

    pub fn put(
        &self,
        configuration: Configuration,
        metadata: ArtifactMetadata,
        race: bool,
        nonce: &str,
    ) -> Result<ShareRecord> {
        let mut record = ShareRecord {
            id: String::new(),
            configuration,
            metadata,
            race,
            verification_hash: None,
            created_at: Utc::now(),
            nonce: nonce.to_string(),
        };

        loop {
            record.id = self.new_identifier()?;
            if self.backend.insert_new(&record.id, &record.to_blob()?)? {
                break;
            }
            debug!(id = %record.id, "lost identifier race, retrying");
        }

        info!(id = %record.id, race, mystery = record.configuration.is_mystery(), "stored share record");
        Ok(record)
    }

    pub fn get(&self, id: &str) -> Result<ShareRecord> {
        let blob = self
            .backend
            .load(id)?
            .ok_or_else(|| GeneratorError::NotFound(id.to_string()))?;
        ShareRecord::from_blob(&blob)
    }

    /// Stores the verification hash unless one is already present; returns
    /// the record as stored afterwards.
    pub fn set_verification_hash(&self, id: &str, hash: &[u8]) -> Result<ShareRecord> {
        let mut record = self.get(id)?;
        if record.verification_hash.is_some() {
            return Ok(record);
        }
        record.verification_hash = Some(hash.to_vec());
        self.backend.replace(id, &record.to_blob()?)?;
        info!(%id, "cached verification hash");
        Ok(record)
    }

    /// Newest first.
    pub fn recent(&self, count: usize) -> Result<Vec<ShareRecord>> {
        let mut records = self
            .backend
            .ids()?
            .iter()
            .map(|id| self.get(id))
            .collect::<Result<Vec<_>>>()?;
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records.truncate(count);
        Ok(records)
    }

    /// Creates a practice record from `id`: same settings, a fresh seed,
    /// never a race.
    ///
    /// `generate` runs the engine for the copied configuration (seed already
    /// replaced). Nothing is stored if it fails.
    pub fn clone_record<R, F>(
        &self,
        id: &str,
        words: &SeedWords,
        rng: &mut R,
        generate: F,
    ) -> Result<ShareRecord>
    where
        R: Rng + ?Sized,
        F: FnOnce(&Configuration, &ObfuscatedSeed) -> Result<ArtifactMetadata>,
    {
        let source = self.get(id)?;
        let (configuration, seed) = seed::practice_copy(&source.configuration, words, rng)?;
        let metadata = generate(&configuration, &seed)?;
        let record = self.put(configuration, metadata, false, &seed.nonce)?;
        info!(source = %id, id = %record.id, "created practice record");
        Ok(record)
    }
}
