use rand::seq::SliceRandom;
use rand::Rng;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::configuration::Configuration;
use crate::{GeneratorError, Result};

/// Digits, lower case, then upper case letters.
pub const TOKEN_ALPHABET: [char; 62] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i',
    'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'A', 'B',
    'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U',
    'V', 'W', 'X', 'Y', 'Z',
];

/// 62^12 possible nonces, well beyond the collision range of concurrent
/// race requests.
pub const NONCE_LEN: usize = 12;

/// Word list used to build random two-word seed strings.
#[derive(Debug, Clone)]
pub struct SeedWords {
    words: Vec<String>,
}

impl SeedWords {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            GeneratorError::Wordlist(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::parse(&text)
    }

    /// Accepts comma and/or newline separated words.
    pub fn parse(text: &str) -> Result<Self> {
        let mut words: Vec<String> = text
            .split([',', '\n', '\r'])
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();
        words.sort();
        words.dedup();

        // A single distinct word could never produce a seed different from
        // a previous one, which practice seeds depend on.
        if words.len() < 2 {
            return Err(GeneratorError::Wordlist(format!(
                "word list needs at least two distinct words, found {}",
                words.len()
            )));
        }

        Ok(Self { words })
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Two words drawn uniformly with replacement, concatenated.
    pub fn random_seed<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let mut seed = String::new();
        for _ in 0..2 {
            if let Some(word) = self.words.choose(rng) {
                seed.push_str(word);
            }
        }
        seed
    }

    /// Draws until the result differs from `previous`.
    pub fn fresh_seed<R: Rng + ?Sized>(&self, previous: &str, rng: &mut R) -> String {
        loop {
            let seed = self.random_seed(rng);
            if seed != previous {
                return seed;
            }
            debug!("redrawing seed that matched its source");
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Secrecy {
    /// Spoilers may be shown; generation uses the literal seed.
    Public,
    /// Spoilers withheld; generation uses the seed plus a nonce.
    Race,
}

impl Secrecy {
    pub fn from_race_flag(race: bool) -> Self {
        if race {
            Self::Race
        } else {
            Self::Public
        }
    }

    pub fn is_race(self) -> bool {
        self == Self::Race
    }
}

/// Result of obfuscating a seed for one generation request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ObfuscatedSeed {
    /// Seed the engine generates with.
    pub effective: String,
    /// Seed that is persisted and displayed.
    pub base: String,
    /// Empty for public seeds.
    pub nonce: String,
}

pub fn obfuscate(base_seed: &str, secrecy: Secrecy) -> ObfuscatedSeed {
    match secrecy {
        Secrecy::Public => ObfuscatedSeed {
            effective: base_seed.to_string(),
            base: base_seed.to_string(),
            nonce: String::new(),
        },
        Secrecy::Race => {
            let nonce = nanoid::nanoid!(NONCE_LEN, &TOKEN_ALPHABET);
            ObfuscatedSeed {
                effective: rederive(base_seed, &nonce),
                base: base_seed.to_string(),
                nonce,
            }
        }
    }
}

/// Reconstructs the seed a record was generated with.
pub fn rederive(base_seed: &str, nonce: &str) -> String {
    format!("{base_seed}{nonce}")
}

/// Prepares a copy of `source` for a practice generation: a fresh seed and
/// public secrecy.
///
/// Returns the configuration to persist and the obfuscated seed to generate
/// with.
pub fn practice_copy<R: Rng + ?Sized>(
    source: &Configuration,
    words: &SeedWords,
    rng: &mut R,
) -> Result<(Configuration, ObfuscatedSeed)> {
    if source.is_mystery() {
        return Err(GeneratorError::InvalidSettings(
            "Mystery seeds cannot be cloned.".to_string(),
        ));
    }

    let mut copy = source.clone();
    copy.seed = words.fresh_seed(&source.seed, rng);
    let seed = obfuscate(&copy.seed, Secrecy::Public);
    Ok((copy, seed))
}
