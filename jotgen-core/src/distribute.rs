use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::configuration::Configuration;
use crate::cosmetics::CosmeticOptions;
use crate::engine::{ArtifactMetadata, Engine, Patched};
use crate::{GeneratorError, Result};

/// The one upstream binary the engine is known to work against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseArtifactSpec {
    /// Size of a copy carrying a copier header.
    pub headered_size: usize,
    pub header_len: usize,
    /// Lower-case hex MD5 of the unheadered artifact.
    pub md5: String,
}

impl Default for BaseArtifactSpec {
    fn default() -> Self {
        Self {
            headered_size: 4_194_816,
            header_len: 0x200,
            md5: "a2bc447961e52fd2227baed164f729dc".to_string(),
        }
    }
}

pub struct ArtifactDistributor<'a> {
    spec: &'a BaseArtifactSpec,
}

impl<'a> ArtifactDistributor<'a> {
    pub fn new(spec: &'a BaseArtifactSpec) -> Self {
        Self { spec }
    }

    /// Strips the copier header if present and checks the content hash.
    ///
    /// Anything larger than the headered size is rejected before hashing.
    pub fn validate_base_artifact<'b>(&self, bytes: &'b [u8]) -> Result<&'b [u8]> {
        if bytes.len() > self.spec.headered_size {
            warn!(size = bytes.len(), "rejected oversized base artifact");
            return Err(GeneratorError::InvalidArtifact(format!(
                "{} bytes is larger than any supported base artifact",
                bytes.len()
            )));
        }

        let body = if bytes.len() == self.spec.headered_size {
            bytes.get(self.spec.header_len..).ok_or_else(|| {
                GeneratorError::InvalidArtifact(format!(
                    "header length {} exceeds the artifact size",
                    self.spec.header_len
                ))
            })?
        } else {
            bytes
        };

        let digest = hex::encode(Md5::digest(body));
        if !digest.eq_ignore_ascii_case(&self.spec.md5) {
            warn!(size = bytes.len(), %digest, "rejected base artifact with unexpected hash");
            return Err(GeneratorError::InvalidArtifact(
                "the file does not match the supported base artifact".to_string(),
            ));
        }

        Ok(body)
    }

    pub fn name_output(&self, cfg: &Configuration, id: &str) -> String {
        name_output(cfg, id)
    }

    /// Validates `user_artifact` and re-applies the record's placements.
    ///
    /// Returns the download file name and the patch result.
    pub fn materialize(
        &self,
        engine: &dyn Engine,
        user_artifact: &[u8],
        cfg: &Configuration,
        metadata: &ArtifactMetadata,
        cosmetics: &CosmeticOptions,
        id: &str,
    ) -> Result<(String, Patched)> {
        let base = self.validate_base_artifact(user_artifact)?;
        let patched = engine.patch(base, cfg, metadata, cosmetics)?;
        let name = name_output(cfg, id);
        info!(%id, file = %name, bytes = patched.artifact.len(), "materialised artifact");
        Ok((name, patched))
    }
}

/// Mystery seeds hide their flags in the name; everything else embeds the
/// flag summary so different settings never share a file name.
pub fn name_output(cfg: &Configuration, id: &str) -> String {
    if cfg.is_mystery() {
        format!("ctjot_mystery_{id}.sfc")
    } else {
        format!("ctjot_{}_{id}.sfc", cfg.flag_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::GameFlags;

    fn spec_for(body: &[u8]) -> BaseArtifactSpec {
        BaseArtifactSpec {
            headered_size: body.len() + 4,
            header_len: 4,
            md5: hex::encode(Md5::digest(body)),
        }
    }

    #[test]
    fn accepts_unheadered_match() {
        let body = b"vanilla".to_vec();
        let spec = spec_for(&body);
        let distributor = ArtifactDistributor::new(&spec);
        assert_eq!(distributor.validate_base_artifact(&body).unwrap(), body.as_slice());
    }

    #[test]
    fn strips_header_at_headered_size() {
        let body = b"vanilla".to_vec();
        let spec = spec_for(&body);
        let mut headered = vec![0xFF; 4];
        headered.extend_from_slice(&body);
        let distributor = ArtifactDistributor::new(&spec);
        assert_eq!(distributor.validate_base_artifact(&headered).unwrap(), body.as_slice());
    }

    #[test]
    fn rejects_wrong_hash_and_oversize() {
        let spec = spec_for(b"vanilla");
        let distributor = ArtifactDistributor::new(&spec);
        assert!(matches!(
            distributor.validate_base_artifact(b"hacked!"),
            Err(GeneratorError::InvalidArtifact(_))
        ));
        assert!(matches!(
            distributor.validate_base_artifact(&[0u8; 12]),
            Err(GeneratorError::InvalidArtifact(_))
        ));
    }

    #[test]
    fn oversized_header_is_rejected_not_sliced() {
        let spec = BaseArtifactSpec {
            headered_size: 4,
            header_len: 8,
            md5: hex::encode(Md5::digest(b"")),
        };
        let distributor = ArtifactDistributor::new(&spec);
        assert!(matches!(
            distributor.validate_base_artifact(b"abcd"),
            Err(GeneratorError::InvalidArtifact(_))
        ));
    }

    #[test]
    fn names_hide_mystery_flags() {
        let mut cfg = Configuration::defaults();
        assert_eq!(name_output(&cfg, "abc"), "ctjot_st.nn.g-ft.rn_abc.sfc");
        cfg.game_flags |= GameFlags::MYSTERY;
        assert_eq!(name_output(&cfg, "abc"), "ctjot_mystery_abc.sfc");
    }
}
