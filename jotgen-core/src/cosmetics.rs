use serde::{Deserialize, Serialize};

use crate::flags::{CosmeticFlags, COSMETIC_FLAG_OPTIONS};
use crate::options::OptionMap;
use crate::Result;

/// Rename slots: the seven characters followed by the Epoch.
pub const DEFAULT_NAMES: [&str; 8] = ["Crono", "Marle", "Lucca", "Robo", "Frog", "Ayla", "Magus", "Epoch"];

const NAME_KEYS: [&str; 8] = [
    "crono_name",
    "marle_name",
    "lucca_name",
    "robo_name",
    "frog_name",
    "ayla_name",
    "magus_name",
    "epoch_name",
];

const MAX_NAME_LEN: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InGameOptions {
    pub stereo_audio: bool,
    pub save_menu_cursor: bool,
    pub save_battle_cursor: bool,
    pub skill_item_info: bool,
    pub consistent_paging: bool,
    pub battle_speed: u8,
    pub menu_background: u8,
    pub battle_msg_speed: u8,
    pub battle_gauge_style: u8,
}

impl Default for InGameOptions {
    fn default() -> Self {
        Self {
            stereo_audio: true,
            save_menu_cursor: false,
            save_battle_cursor: false,
            skill_item_info: true,
            consistent_paging: false,
            battle_speed: 4,
            menu_background: 0,
            battle_msg_speed: 4,
            battle_gauge_style: 1,
        }
    }
}

/// Per-download presentation settings. Never persisted and never affect
/// placements.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CosmeticOptions {
    pub flags: CosmeticFlags,
    pub names: [String; 8],
    pub ctoptions: InGameOptions,
}

impl Default for CosmeticOptions {
    fn default() -> Self {
        Self {
            flags: CosmeticFlags::empty(),
            names: DEFAULT_NAMES.map(str::to_string),
            ctoptions: InGameOptions::default(),
        }
    }
}

/// A rename is kept only if it is 1-5 ASCII letters or digits.
pub fn character_name(name: Option<&str>, default: &str) -> String {
    match name {
        Some(n)
            if !n.is_empty()
                && n.chars().count() <= MAX_NAME_LEN
                && n.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            n.to_string()
        }
        _ => default.to_string(),
    }
}

fn slider(options: &OptionMap, key: &str, max: i64) -> Result<Option<u8>> {
    // Sliders are 1-based; zero means unset.
    Ok(options
        .integer(key)?
        .filter(|&v| v != 0)
        .map(|v| (v - 1).clamp(0, max) as u8))
}

impl CosmeticOptions {
    pub fn from_options(options: &OptionMap) -> Result<Self> {
        let flags = COSMETIC_FLAG_OPTIONS
            .iter()
            .filter(|(key, _)| options.flag(key))
            .fold(CosmeticFlags::empty(), |acc, (_, flag)| acc | *flag);

        let mut names = DEFAULT_NAMES.map(str::to_string);
        for (slot, key) in NAME_KEYS.iter().enumerate() {
            let raw = options.text(key)?;
            names[slot] = character_name(raw.as_deref(), DEFAULT_NAMES[slot]);
        }

        let mut ct = InGameOptions::default();
        for (key, field) in [
            ("stereo_audio", &mut ct.stereo_audio),
            ("save_menu_cursor", &mut ct.save_menu_cursor),
            ("save_battle_cursor", &mut ct.save_battle_cursor),
            ("skill_item_info", &mut ct.skill_item_info),
            ("consistent_paging", &mut ct.consistent_paging),
        ] {
            if options.contains(key) {
                *field = options.flag(key);
            }
        }
        if let Some(v) = slider(options, "battle_speed", 7)? {
            ct.battle_speed = v;
        }
        if let Some(v) = slider(options, "background_selection", 7)? {
            ct.menu_background = v;
        }
        if let Some(v) = slider(options, "battle_message_speed", 7)? {
            ct.battle_msg_speed = v;
        }
        if let Some(v) = options.integer("battle_gauge_style")? {
            ct.battle_gauge_style = v.clamp(0, 2) as u8;
        }

        Ok(Self {
            flags,
            names,
            ctoptions: ct,
        })
    }
}
