use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use tracing::debug;

use crate::configuration::Configuration;
use crate::cosmetics::CosmeticOptions;
use crate::{GeneratorError, Result};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterPlacement {
    pub location: String,
    pub character: String,
    pub reassign: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyItemPlacement {
    pub location: String,
    pub key: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossPlacement {
    pub location: String,
    pub boss: String,
}

/// Placement result of one generation. Opaque to this crate apart from the
/// spoiler projections.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    #[serde(default)]
    pub characters: Vec<CharacterPlacement>,
    #[serde(default)]
    pub key_items: Vec<KeyItemPlacement>,
    #[serde(default)]
    pub bosses: Vec<BossPlacement>,
    #[serde(default)]
    pub objectives: Vec<String>,
    /// Progression proof, one line per step, e.g. `1: Crono finds the Pendant`.
    #[serde(default)]
    pub spheres: Vec<String>,
    /// Engine specific data carried through untouched.
    #[serde(default)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Clone, Debug)]
pub struct Generated {
    pub patched: Vec<u8>,
    pub metadata: ArtifactMetadata,
    pub verification_token: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct Patched {
    pub artifact: Vec<u8>,
    pub verification_token: Vec<u8>,
}

/// The external randomizer.
///
/// `generate` places everything from scratch using `settings.seed`;
/// `patch` re-applies stored placements to a caller's base artifact.
/// Both are synchronous and not cancellable.
pub trait Engine: Send + Sync {
    fn generate(&self, base: &[u8], settings: &Configuration) -> Result<Generated>;

    fn patch(
        &self,
        base: &[u8],
        settings: &Configuration,
        metadata: &ArtifactMetadata,
        cosmetics: &CosmeticOptions,
    ) -> Result<Patched>;
}

#[derive(Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Request<'a> {
    Generate {
        settings: &'a Configuration,
        base_artifact: String,
    },
    Patch {
        settings: &'a Configuration,
        metadata: &'a ArtifactMetadata,
        cosmetics: &'a CosmeticOptions,
        base_artifact: String,
    },
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    metadata: Option<ArtifactMetadata>,
    patched_artifact: String,
    verification_token: String,
}

/// Runs the randomizer as a child process, one request per invocation.
///
/// The request is a JSON object on stdin (`op` is `generate` or `patch`,
/// artifacts base64 encoded); the reply is a JSON object on stdout with
/// `patched_artifact` (base64), `verification_token` (hex) and, for
/// `generate`, `metadata`.
#[derive(Debug, Clone)]
pub struct ProcessEngine {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessEngine {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn call(&self, request: &Request<'_>) -> Result<Response> {
        let payload = serde_json::to_vec(request)?;
        debug!(program = %self.program.display(), bytes = payload.len(), "invoking engine");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                GeneratorError::Engine(format!("cannot start {}: {e}", self.program.display()))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| GeneratorError::Engine("engine stdin unavailable".to_string()))?;
        // Fed from a separate thread so a chatty engine cannot block on a
        // full stdout pipe while we are still writing.
        let writer = thread::spawn(move || stdin.write_all(&payload));

        let output = child.wait_with_output()?;
        writer
            .join()
            .map_err(|_| GeneratorError::Engine("engine stdin writer panicked".to_string()))??;

        if !output.status.success() {
            return Err(GeneratorError::Engine(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

fn decode_artifacts(response: &Response) -> Result<(Vec<u8>, Vec<u8>)> {
    let artifact = BASE64
        .decode(&response.patched_artifact)
        .map_err(|e| GeneratorError::Engine(format!("bad artifact encoding: {e}")))?;
    let token = hex::decode(&response.verification_token)
        .map_err(|e| GeneratorError::Engine(format!("bad verification token: {e}")))?;
    Ok((artifact, token))
}

impl Engine for ProcessEngine {
    fn generate(&self, base: &[u8], settings: &Configuration) -> Result<Generated> {
        let response = self.call(&Request::Generate {
            settings,
            base_artifact: BASE64.encode(base),
        })?;
        let (patched, verification_token) = decode_artifacts(&response)?;
        let metadata = response
            .metadata
            .ok_or_else(|| GeneratorError::Engine("engine returned no metadata".to_string()))?;
        Ok(Generated {
            patched,
            metadata,
            verification_token,
        })
    }

    fn patch(
        &self,
        base: &[u8],
        settings: &Configuration,
        metadata: &ArtifactMetadata,
        cosmetics: &CosmeticOptions,
    ) -> Result<Patched> {
        let response = self.call(&Request::Patch {
            settings,
            metadata,
            cosmetics,
            base_artifact: BASE64.encode(base),
        })?;
        let (artifact, verification_token) = decode_artifacts(&response)?;
        Ok(Patched {
            artifact,
            verification_token,
        })
    }
}
