#![allow(dead_code)]

use jotgen_core::configuration::Configuration;
use jotgen_core::cosmetics::CosmeticOptions;
use jotgen_core::engine::{ArtifactMetadata, Engine, Generated, KeyItemPlacement, Patched};
use jotgen_core::{BaseArtifactSpec, MemoryStore, OptionMap, Pipeline, SeedWords, ShareStore};
use md5::{Digest, Md5};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub const BASE: &[u8] = b"vanilla base artifact";
pub const HEADER_LEN: usize = 8;

/// Deterministic stand-in for the randomizer. Placements and the
/// verification token depend only on the seed it is handed.
#[derive(Default)]
pub struct FixtureEngine {
    pub delay: Option<Duration>,
    pub generate_calls: AtomicUsize,
    pub patch_calls: AtomicUsize,
}

impl FixtureEngine {
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn token(seed: &str) -> Vec<u8> {
        seed.bytes().take(8).map(|b| 0x20 + b % 12).collect()
    }
}

impl Engine for FixtureEngine {
    fn generate(&self, base: &[u8], settings: &Configuration) -> jotgen_core::Result<Generated> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        let metadata = ArtifactMetadata {
            key_items: vec![KeyItemPlacement {
                location: "Zenan Bridge".to_string(),
                key: settings.seed.clone(),
            }],
            spheres: vec!["GO: Start".to_string()],
            ..ArtifactMetadata::default()
        };
        let mut patched = base.to_vec();
        patched.extend_from_slice(settings.seed.as_bytes());
        Ok(Generated {
            patched,
            metadata,
            verification_token: Self::token(&settings.seed),
        })
    }

    fn patch(
        &self,
        base: &[u8],
        settings: &Configuration,
        metadata: &ArtifactMetadata,
        cosmetics: &CosmeticOptions,
    ) -> jotgen_core::Result<Patched> {
        self.patch_calls.fetch_add(1, Ordering::SeqCst);
        let mut artifact = base.to_vec();
        for item in &metadata.key_items {
            artifact.extend_from_slice(item.key.as_bytes());
        }
        artifact.extend_from_slice(cosmetics.names[0].as_bytes());
        Ok(Patched {
            artifact,
            verification_token: Self::token(&settings.seed),
        })
    }
}

pub fn artifact_spec() -> BaseArtifactSpec {
    BaseArtifactSpec {
        headered_size: BASE.len() + HEADER_LEN,
        header_len: HEADER_LEN,
        md5: hex::encode(Md5::digest(BASE)),
    }
}

pub fn words() -> SeedWords {
    SeedWords::parse("Crono,Marle,Lucca,Robo,Frog,Ayla,Magus").unwrap()
}

pub fn pipeline(engine: Arc<FixtureEngine>, timeout: Duration) -> Pipeline<MemoryStore> {
    Pipeline::new(
        ShareStore::new(MemoryStore::new()),
        words(),
        engine,
        BASE,
        artifact_spec(),
        timeout,
    )
    .unwrap()
}

pub fn options() -> OptionMap {
    OptionMap::new()
        .with("game_mode", "standard")
        .with("item_difficulty", "normal")
        .with("enemy_difficulty", "hard")
        .with("shop_prices", "normal")
        .with("tech_rando", "fully_random")
        .with("disable_glitches", "on")
        .with("power_tab_min", 2)
        .with("power_tab_max", 4)
        .with("magic_tab_min", 1)
        .with("magic_tab_max", 3)
        .with("speed_tab_min", 1)
        .with("speed_tab_max", 1)
}
