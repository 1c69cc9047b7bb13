use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::flags::{
    Difficulty, GameFlags, GameMode, RoFlags, ShopPrices, TechOrder, DEFAULT_ENEMY_DIFFICULTY_WEIGHTS,
    DEFAULT_FLAG_PROBABILITIES, DEFAULT_GAME_MODE_WEIGHTS, DEFAULT_ITEM_DIFFICULTY_WEIGHTS,
    DEFAULT_SHOP_PRICE_WEIGHTS, DEFAULT_TECH_ORDER_WEIGHTS,
};
use crate::{GeneratorError, Result};

pub const CHARACTER_SLOTS: usize = 7;

pub const CHARACTER_NAMES: [&str; CHARACTER_SLOTS] =
    ["Crono", "Marle", "Lucca", "Robo", "Frog", "Ayla", "Magus"];

/// Set of roles (character indices) a recruit slot may be assigned.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct RoleMask(u8);

impl RoleMask {
    pub const ALL: RoleMask = RoleMask(0x7F);

    /// Bit 7 carries no role and is discarded.
    pub fn from_bits(bits: u8) -> Self {
        Self(bits & 0x7F)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn permits(self, role: usize) -> bool {
        role < CHARACTER_SLOTS && self.0 & (1 << role) != 0
    }

    pub fn roles(self) -> Vec<usize> {
        (0..CHARACTER_SLOTS).filter(|&r| self.permits(r)).collect()
    }
}

/// Per-slot role permissions for character randomisation.
///
/// The canonical text form is 14 hex digits, two per slot, slot 0 first.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CharChoices([RoleMask; CHARACTER_SLOTS]);

impl CharChoices {
    pub fn decode(hex: &str) -> Result<Self> {
        if hex.len() != CHARACTER_SLOTS * 2 {
            return Err(GeneratorError::MalformedOptions(format!(
                "character assignment '{hex}' must be {} hex digits, got {}",
                CHARACTER_SLOTS * 2,
                hex.len()
            )));
        }

        // Checked on bytes first so slicing below stays on char boundaries.
        if let Some(pos) = hex.bytes().position(|b| !b.is_ascii_hexdigit()) {
            return Err(GeneratorError::MalformedOptions(format!(
                "character assignment for slot {} is not hex: '{hex}'",
                pos / 2
            )));
        }

        let mut masks = [RoleMask(0); CHARACTER_SLOTS];
        for (slot, mask) in masks.iter_mut().enumerate() {
            let pair = &hex[slot * 2..slot * 2 + 2];
            let bits = u8::from_str_radix(pair, 16).map_err(|e| {
                GeneratorError::MalformedOptions(format!(
                    "character assignment for slot {slot} is not hex: '{pair}' ({e})"
                ))
            })?;
            *mask = RoleMask::from_bits(bits);
        }

        Ok(Self(masks))
    }

    pub fn encode(&self) -> String {
        self.0.iter().map(|m| format!("{:02X}", m.bits())).collect()
    }

    pub fn slot(&self, slot: usize) -> Option<RoleMask> {
        self.0.get(slot).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = RoleMask> + '_ {
        self.0.iter().copied()
    }
}

impl Default for CharChoices {
    fn default() -> Self {
        Self([RoleMask::ALL; CHARACTER_SLOTS])
    }
}

impl TryFrom<String> for CharChoices {
    type Error = GeneratorError;

    fn try_from(value: String) -> Result<Self> {
        Self::decode(&value)
    }
}

impl From<CharChoices> for String {
    fn from(value: CharChoices) -> Self {
        value.encode()
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TabScheme {
    #[default]
    Uniform,
    Binomial,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TabSettings {
    #[serde(default)]
    pub scheme: TabScheme,
    #[serde(default = "default_binom_success")]
    pub binom_success: f64,
    pub power_min: u8,
    pub power_max: u8,
    pub magic_min: u8,
    pub magic_max: u8,
    pub speed_min: u8,
    pub speed_max: u8,
}

fn default_binom_success() -> f64 {
    0.5
}

impl TabSettings {
    pub fn ranges(&self) -> [(&'static str, u8, u8); 3] {
        [
            ("power", self.power_min, self.power_max),
            ("magic", self.magic_min, self.magic_max),
            ("speed", self.speed_min, self.speed_max),
        ]
    }

    pub fn validate(&self) -> Result<()> {
        for (name, min, max) in self.ranges() {
            if min > max {
                return Err(GeneratorError::InvalidRange(format!(
                    "{name} tab minimum {min} exceeds maximum {max}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for TabSettings {
    fn default() -> Self {
        Self {
            scheme: TabScheme::Uniform,
            binom_success: default_binom_success(),
            power_min: 2,
            power_max: 4,
            magic_min: 1,
            magic_max: 3,
            speed_min: 1,
            speed_max: 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketSettings {
    pub disable_other_go_modes: bool,
    pub objectives_win: bool,
    pub num_objectives: u8,
    pub num_objectives_needed: u8,
    /// Exactly `num_objectives` entries when the bucket list is enabled,
    /// empty otherwise.
    pub hints: Vec<String>,
}

impl Default for BucketSettings {
    fn default() -> Self {
        Self {
            disable_other_go_modes: false,
            objectives_win: false,
            num_objectives: 5,
            num_objectives_needed: 4,
            hints: Vec::new(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlagProbability {
    pub flag: GameFlags,
    /// Fraction in `0.0..=1.0`.
    pub probability: f64,
}

/// Relative weights for mystery draws. Weights need not sum to 100.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MysterySettings {
    pub game_mode_freqs: BTreeMap<GameMode, u32>,
    pub item_difficulty_freqs: BTreeMap<Difficulty, u32>,
    pub enemy_difficulty_freqs: BTreeMap<Difficulty, u32>,
    pub tech_order_freqs: BTreeMap<TechOrder, u32>,
    pub shop_price_freqs: BTreeMap<ShopPrices, u32>,
    pub flag_probs: Vec<FlagProbability>,
}

impl Default for MysterySettings {
    fn default() -> Self {
        Self {
            game_mode_freqs: DEFAULT_GAME_MODE_WEIGHTS.iter().copied().collect(),
            item_difficulty_freqs: DEFAULT_ITEM_DIFFICULTY_WEIGHTS.iter().copied().collect(),
            enemy_difficulty_freqs: DEFAULT_ENEMY_DIFFICULTY_WEIGHTS.iter().copied().collect(),
            tech_order_freqs: DEFAULT_TECH_ORDER_WEIGHTS.iter().copied().collect(),
            shop_price_freqs: DEFAULT_SHOP_PRICE_WEIGHTS.iter().copied().collect(),
            flag_probs: DEFAULT_FLAG_PROBABILITIES
                .iter()
                .map(|&(flag, probability)| FlagProbability { flag, probability })
                .collect(),
        }
    }
}

/// Canonical, fully-resolved generation settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub seed: String,
    pub game_mode: GameMode,
    pub item_difficulty: Difficulty,
    pub enemy_difficulty: Difficulty,
    pub shop_prices: ShopPrices,
    pub tech_order: TechOrder,
    /// Active flags after any mystery resolution.
    pub game_flags: GameFlags,
    /// Flags as the user chose them, with the mystery bit cleared.
    pub initial_flags: GameFlags,
    pub char_choices: CharChoices,
    pub ro_flags: RoFlags,
    pub tab_settings: TabSettings,
    pub bucket_settings: BucketSettings,
    pub mystery_settings: MysterySettings,
}

impl Configuration {
    /// Settings an option front-end should start from.
    ///
    /// Glitch fixes and fast tabs are on even though the engine treats them
    /// as opt-in.
    pub fn defaults() -> Self {
        let flags = GameFlags::FIX_GLITCH | GameFlags::FAST_TABS;
        Self {
            seed: String::new(),
            game_mode: GameMode::Standard,
            item_difficulty: Difficulty::Normal,
            enemy_difficulty: Difficulty::Normal,
            shop_prices: ShopPrices::Normal,
            tech_order: TechOrder::FullRandom,
            game_flags: flags,
            initial_flags: flags,
            char_choices: CharChoices::default(),
            ro_flags: RoFlags::empty(),
            tab_settings: TabSettings::default(),
            bucket_settings: BucketSettings::default(),
            mystery_settings: MysterySettings::default(),
        }
    }

    pub fn defaults_json() -> Result<String> {
        Ok(serde_json::to_string(&Self::defaults())?)
    }

    pub fn is_mystery(&self) -> bool {
        self.game_flags.contains(GameFlags::MYSTERY)
    }

    /// Compact summary of the settings, e.g. `st.nn.g-ft.rn`.
    ///
    /// Layout: game mode, item and enemy difficulty, flag codes in catalog
    /// order, tech order and shop prices.
    pub fn flag_string(&self) -> String {
        let codes: Vec<&str> = crate::flags::GAME_FLAG_OPTIONS
            .iter()
            .filter(|o| o.flag != GameFlags::MYSTERY && self.game_flags.contains(o.flag))
            .map(|o| o.code)
            .collect();
        let flags = if codes.is_empty() {
            "none".to_string()
        } else {
            codes.join("-")
        };

        format!(
            "{}.{}{}.{}.{}{}",
            self.game_mode.code(),
            self.item_difficulty.code(),
            self.enemy_difficulty.code(),
            flags,
            self.tech_order.code(),
            self.shop_prices.code(),
        )
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.seed, self.flag_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn decodes_role_masks_per_slot() {
        let choices = CharChoices::decode("097F0000000000").unwrap();
        assert_eq!(choices.slot(0).unwrap().roles(), vec![0, 3]);
        assert_eq!(choices.slot(1).unwrap().roles(), vec![0, 1, 2, 3, 4, 5, 6]);
        assert!(choices.slot(2).unwrap().roles().is_empty());
        assert!(choices.slot(7).is_none());
    }

    #[test]
    fn high_bit_is_ignored() {
        let choices = CharChoices::decode("FF000000000000").unwrap();
        assert_eq!(choices.slot(0).unwrap(), RoleMask::ALL);
    }

    #[test]
    fn rejects_wrong_length_and_non_hex() {
        assert!(matches!(
            CharChoices::decode("097F"),
            Err(GeneratorError::MalformedOptions(_))
        ));
        assert!(matches!(
            CharChoices::decode("0G7F0000000000"),
            Err(GeneratorError::MalformedOptions(_))
        ));
        assert!(matches!(
            CharChoices::decode("+17F0000000000"),
            Err(GeneratorError::MalformedOptions(_))
        ));
        assert!(matches!(
            CharChoices::decode("é7F00000000000"),
            Err(GeneratorError::MalformedOptions(_))
        ));
    }

    #[test]
    fn char_choices_serialize_as_hex() {
        let choices = CharChoices::decode("097f0000000000").unwrap();
        let json = serde_json::to_string(&choices).unwrap();
        assert_eq!(json, "\"097F0000000000\"");
        let back: CharChoices = serde_json::from_str(&json).unwrap();
        assert_eq!(back, choices);
    }

    #[test]
    fn tab_ranges_validate() {
        let mut tabs = TabSettings::default();
        assert!(tabs.validate().is_ok());
        tabs.magic_min = 5;
        assert!(matches!(tabs.validate(), Err(GeneratorError::InvalidRange(_))));
    }

    #[test]
    fn flag_string_skips_mystery() {
        let mut cfg = Configuration::defaults();
        assert_eq!(cfg.flag_string(), "st.nn.g-ft.rn");
        cfg.game_flags |= GameFlags::MYSTERY;
        assert_eq!(cfg.flag_string(), "st.nn.g-ft.rn");
        cfg.game_flags = GameFlags::empty();
        assert_eq!(cfg.flag_string(), "st.nn.none.rn");
    }

    #[test]
    fn defaults_serialize_compactly() {
        let json = Configuration::defaults_json().unwrap();
        assert!(!json.contains('\n'));
        let back: Configuration = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Configuration::defaults());
    }

    proptest! {
        #[test]
        fn every_hex_pair_decodes_to_its_low_seven_bits(hex in "[0-9a-fA-F]{14}") {
            let choices = CharChoices::decode(&hex).unwrap();
            for (slot, mask) in choices.iter().enumerate() {
                let byte = u8::from_str_radix(&hex[slot * 2..slot * 2 + 2], 16).unwrap();
                prop_assert_eq!(mask.bits(), byte & 0x7F);
            }
        }

        #[test]
        fn wrong_length_never_decodes(hex in "[0-9a-f]{0,13}|[0-9a-f]{15,20}") {
            prop_assert!(CharChoices::decode(&hex).is_err());
        }
    }
}
