use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

bitflags! {
    /// Gameplay flags understood by the randomizer engine.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct GameFlags: u64 {
        const FIX_GLITCH = 1 << 0;
        const BOSS_RANDO = 1 << 1;
        const BOSS_SCALE = 1 << 2;
        const ZEAL_END = 1 << 3;
        const FAST_PENDANT = 1 << 4;
        const LOCKED_CHARS = 1 << 5;
        const UNLOCKED_MAGIC = 1 << 6;
        const TAB_TREASURES = 1 << 7;
        const CHRONOSANITY = 1 << 8;
        const CHAR_RANDO = 1 << 9;
        const HEALING_ITEM_RANDO = 1 << 10;
        const GEAR_RANDO = 1 << 11;
        const MYSTERY = 1 << 12;
        const EPOCH_FAIL = 1 << 13;
        const DUPLICATE_CHARS = 1 << 14;
        const DUPLICATE_TECHS = 1 << 15;
        const BOSS_SPOT_HP = 1 << 16;
        const UNLOCKED_SKYGATES = 1 << 17;
        const ADD_SUNKEEP_SPOT = 1 << 18;
        const ADD_BEKKLER_SPOT = 1 << 19;
        const ADD_CYRUS_SPOT = 1 << 20;
        const RESTORE_TOOLS = 1 << 21;
        const ADD_OZZIE_SPOT = 1 << 22;
        const RESTORE_JOHNNY_RACE = 1 << 23;
        const ADD_RACELOG_SPOT = 1 << 24;
        const REMOVE_BLACK_OMEN_SPOT = 1 << 25;
        const SPLIT_ARRIS_DOME = 1 << 26;
        const VANILLA_ROBO_RIBBON = 1 << 27;
        const VANILLA_DESERT = 1 << 28;
        const USE_ANTILIFE = 1 << 29;
        const TACKLE_EFFECTS_ON = 1 << 30;
        const STARTERS_SUFFICIENT = 1 << 31;
        const BUCKET_LIST = 1 << 32;
        const ROCKSANITY = 1 << 33;
        const TECH_DAMAGE_RANDO = 1 << 34;
        const VISIBLE_HEALTH = 1 << 35;
        const BOSS_SIGHTSCOPE = 1 << 36;
        const FAST_TABS = 1 << 37;
        const FREE_MENU_GLITCH = 1 << 38;
    }
}

bitflags! {
    /// Boss randomisation sub-flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct RoFlags: u8 {
        const PRESERVE_PARTS = 1 << 0;
        const BOSS_SPOT_HP = 1 << 1;
    }
}

bitflags! {
    /// Presentation-only flags applied when a patched artifact is built.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct CosmeticFlags: u8 {
        const REDUCE_FLASH = 1 << 0;
        const ZENAN_ALT_MUSIC = 1 << 1;
        const DEATH_PEAK_ALT_MUSIC = 1 << 2;
        const QUIET_MODE = 1 << 3;
        const AUTORUN = 1 << 4;
    }
}

// Flag sets are stored as their raw bits so records written by a build that
// knows more flags still load (unknown bits are retained, not dropped).
macro_rules! serde_as_bits {
    ($ty:ty, $bits:ty) => {
        impl Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                self.bits().serialize(serializer)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let bits = <$bits>::deserialize(deserializer)?;
                Ok(Self::from_bits_retain(bits))
            }
        }
    };
}

serde_as_bits!(GameFlags, u64);
serde_as_bits!(RoFlags, u8);
serde_as_bits!(CosmeticFlags, u8);

/// One named boolean option that toggles a gameplay flag.
#[derive(Copy, Clone, Debug)]
pub struct FlagOption {
    pub key: &'static str,
    pub flag: GameFlags,
    /// Short code used in output file names.
    pub code: &'static str,
    pub name: &'static str,
}

pub const GAME_FLAG_OPTIONS: &[FlagOption] = &[
    // Main
    FlagOption { key: "disable_glitches", flag: GameFlags::FIX_GLITCH, code: "g", name: "FIX_GLITCH" },
    FlagOption { key: "boss_rando", flag: GameFlags::BOSS_RANDO, code: "ro", name: "BOSS_RANDO" },
    FlagOption { key: "boss_scaling", flag: GameFlags::BOSS_SCALE, code: "b", name: "BOSS_SCALE" },
    FlagOption { key: "zeal", flag: GameFlags::ZEAL_END, code: "z", name: "ZEAL_END" },
    FlagOption { key: "early_pendant", flag: GameFlags::FAST_PENDANT, code: "p", name: "FAST_PENDANT" },
    FlagOption { key: "locked_chars", flag: GameFlags::LOCKED_CHARS, code: "c", name: "LOCKED_CHARS" },
    FlagOption { key: "unlocked_magic", flag: GameFlags::UNLOCKED_MAGIC, code: "m", name: "UNLOCKED_MAGIC" },
    FlagOption { key: "tab_treasures", flag: GameFlags::TAB_TREASURES, code: "tb", name: "TAB_TREASURES" },
    FlagOption { key: "chronosanity", flag: GameFlags::CHRONOSANITY, code: "cr", name: "CHRONOSANITY" },
    FlagOption { key: "char_rando", flag: GameFlags::CHAR_RANDO, code: "rc", name: "CHAR_RANDO" },
    FlagOption { key: "healing_item_rando", flag: GameFlags::HEALING_ITEM_RANDO, code: "h", name: "HEALING_ITEM_RANDO" },
    FlagOption { key: "gear_rando", flag: GameFlags::GEAR_RANDO, code: "q", name: "GEAR_RANDO" },
    FlagOption { key: "mystery_seed", flag: GameFlags::MYSTERY, code: "mys", name: "MYSTERY" },
    FlagOption { key: "epoch_fail", flag: GameFlags::EPOCH_FAIL, code: "ef", name: "EPOCH_FAIL" },
    FlagOption { key: "duplicate_characters", flag: GameFlags::DUPLICATE_CHARS, code: "dc", name: "DUPLICATE_CHARS" },
    FlagOption { key: "duplicate_duals", flag: GameFlags::DUPLICATE_TECHS, code: "dd", name: "DUPLICATE_TECHS" },
    FlagOption { key: "boss_spot_hp", flag: GameFlags::BOSS_SPOT_HP, code: "bh", name: "BOSS_SPOT_HP" },
    // Extra
    FlagOption { key: "unlocked_skyways", flag: GameFlags::UNLOCKED_SKYGATES, code: "us", name: "UNLOCKED_SKYGATES" },
    FlagOption { key: "add_sunkeep_spot", flag: GameFlags::ADD_SUNKEEP_SPOT, code: "as", name: "ADD_SUNKEEP_SPOT" },
    FlagOption { key: "add_bekkler_spot", flag: GameFlags::ADD_BEKKLER_SPOT, code: "ab", name: "ADD_BEKKLER_SPOT" },
    FlagOption { key: "add_cyrus_spot", flag: GameFlags::ADD_CYRUS_SPOT, code: "ac", name: "ADD_CYRUS_SPOT" },
    FlagOption { key: "restore_tools", flag: GameFlags::RESTORE_TOOLS, code: "rt", name: "RESTORE_TOOLS" },
    FlagOption { key: "add_ozzie_spot", flag: GameFlags::ADD_OZZIE_SPOT, code: "ao", name: "ADD_OZZIE_SPOT" },
    FlagOption { key: "restore_johnny_race", flag: GameFlags::RESTORE_JOHNNY_RACE, code: "rj", name: "RESTORE_JOHNNY_RACE" },
    FlagOption { key: "add_racelog_spot", flag: GameFlags::ADD_RACELOG_SPOT, code: "ar", name: "ADD_RACELOG_SPOT" },
    FlagOption { key: "remove_black_omen_spot", flag: GameFlags::REMOVE_BLACK_OMEN_SPOT, code: "rb", name: "REMOVE_BLACK_OMEN_SPOT" },
    FlagOption { key: "split_arris_dome", flag: GameFlags::SPLIT_ARRIS_DOME, code: "sa", name: "SPLIT_ARRIS_DOME" },
    FlagOption { key: "vanilla_robo_ribbon", flag: GameFlags::VANILLA_ROBO_RIBBON, code: "vr", name: "VANILLA_ROBO_RIBBON" },
    FlagOption { key: "vanilla_desert", flag: GameFlags::VANILLA_DESERT, code: "vd", name: "VANILLA_DESERT" },
    FlagOption { key: "use_antilife", flag: GameFlags::USE_ANTILIFE, code: "al", name: "USE_ANTILIFE" },
    FlagOption { key: "tackle_effects", flag: GameFlags::TACKLE_EFFECTS_ON, code: "te", name: "TACKLE_EFFECTS_ON" },
    FlagOption { key: "starters_sufficient", flag: GameFlags::STARTERS_SUFFICIENT, code: "ss", name: "STARTERS_SUFFICIENT" },
    FlagOption { key: "bucket_list", flag: GameFlags::BUCKET_LIST, code: "bl", name: "BUCKET_LIST" },
    FlagOption { key: "rocksanity", flag: GameFlags::ROCKSANITY, code: "rs", name: "ROCKSANITY" },
    FlagOption { key: "tech_damage_rando", flag: GameFlags::TECH_DAMAGE_RANDO, code: "td", name: "TECH_DAMAGE_RANDO" },
    // QoL
    FlagOption { key: "sightscope_always_on", flag: GameFlags::VISIBLE_HEALTH, code: "vh", name: "VISIBLE_HEALTH" },
    FlagOption { key: "boss_sightscope", flag: GameFlags::BOSS_SIGHTSCOPE, code: "bs", name: "BOSS_SIGHTSCOPE" },
    FlagOption { key: "fast_tabs", flag: GameFlags::FAST_TABS, code: "ft", name: "FAST_TABS" },
    FlagOption { key: "free_menu_glitch", flag: GameFlags::FREE_MENU_GLITCH, code: "fm", name: "FREE_MENU_GLITCH" },
];

pub const RO_FLAG_OPTIONS: &[(&str, RoFlags)] = &[
    ("legacy_boss_placement", RoFlags::PRESERVE_PARTS),
    ("boss_spot_hp", RoFlags::BOSS_SPOT_HP),
];

pub const COSMETIC_FLAG_OPTIONS: &[(&str, CosmeticFlags)] = &[
    ("reduce_flashes", CosmeticFlags::REDUCE_FLASH),
    ("zenan_alt_battle_music", CosmeticFlags::ZENAN_ALT_MUSIC),
    ("death_peak_alt_music", CosmeticFlags::DEATH_PEAK_ALT_MUSIC),
    ("quiet_mode", CosmeticFlags::QUIET_MODE),
    ("auto_run", CosmeticFlags::AUTORUN),
];

/// Option keys without which an option map cannot be translated.
pub const REQUIRED_OPTION_KEYS: &[&str] = &[
    "game_mode",
    "item_difficulty",
    "enemy_difficulty",
    "shop_prices",
    "tech_rando",
    "power_tab_min",
    "power_tab_max",
    "magic_tab_min",
    "magic_tab_max",
    "speed_tab_min",
    "speed_tab_max",
];

impl GameFlags {
    pub fn option(self) -> Option<&'static FlagOption> {
        GAME_FLAG_OPTIONS.iter().find(|o| o.flag == self)
    }

    /// Names of the set flags in catalog order.
    pub fn names(self) -> Vec<&'static str> {
        GAME_FLAG_OPTIONS
            .iter()
            .filter(|o| self.contains(o.flag))
            .map(|o| o.name)
            .collect()
    }
}

/// Closed set of string-keyed choices accepted by an option map.
pub trait OptionChoice: Copy + Sized + 'static {
    const ALL: &'static [Self];
    const OPTION_KEY: &'static str;

    fn key(self) -> &'static str;

    fn parse_choice(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.key() == value)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    Standard,
    LostWorlds,
    IceAge,
    LegacyOfCyrus,
    VanillaRando,
}

impl OptionChoice for GameMode {
    const ALL: &'static [Self] = &[
        Self::Standard,
        Self::LostWorlds,
        Self::IceAge,
        Self::LegacyOfCyrus,
        Self::VanillaRando,
    ];
    const OPTION_KEY: &'static str = "game_mode";

    fn key(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::LostWorlds => "lost_worlds",
            Self::IceAge => "ice_age",
            Self::LegacyOfCyrus => "legacy_of_cyrus",
            Self::VanillaRando => "vanilla_rando",
        }
    }
}

impl GameMode {
    pub fn code(self) -> &'static str {
        match self {
            Self::Standard => "st",
            Self::LostWorlds => "lw",
            Self::IceAge => "ia",
            Self::LegacyOfCyrus => "loc",
            Self::VanillaRando => "vr",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::LostWorlds => "Lost Worlds",
            Self::IceAge => "Ice Age",
            Self::LegacyOfCyrus => "Legacy of Cyrus",
            Self::VanillaRando => "Vanilla Rando",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
}

impl OptionChoice for Difficulty {
    const ALL: &'static [Self] = &[Self::Easy, Self::Normal, Self::Hard];
    const OPTION_KEY: &'static str = "difficulty";

    fn key(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Normal => "normal",
            Self::Hard => "hard",
        }
    }
}

impl Difficulty {
    pub fn code(self) -> &'static str {
        match self {
            Self::Easy => "e",
            Self::Normal => "n",
            Self::Hard => "h",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Normal => "Normal",
            Self::Hard => "Hard",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShopPrices {
    Normal,
    Free,
    MostlyRandom,
    FullyRandom,
}

impl OptionChoice for ShopPrices {
    const ALL: &'static [Self] = &[
        Self::Normal,
        Self::Free,
        Self::MostlyRandom,
        Self::FullyRandom,
    ];
    const OPTION_KEY: &'static str = "shop_prices";

    fn key(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Free => "free",
            Self::MostlyRandom => "mostly_random",
            Self::FullyRandom => "fully_random",
        }
    }
}

impl ShopPrices {
    pub fn code(self) -> &'static str {
        match self {
            Self::Normal => "n",
            Self::Free => "f",
            Self::MostlyRandom => "m",
            Self::FullyRandom => "r",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Free => "Free",
            Self::MostlyRandom => "Mostly Random",
            Self::FullyRandom => "Fully Random",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechOrder {
    Normal,
    FullRandom,
    BalancedRandom,
}

impl OptionChoice for TechOrder {
    const ALL: &'static [Self] = &[Self::Normal, Self::FullRandom, Self::BalancedRandom];
    const OPTION_KEY: &'static str = "tech_rando";

    fn key(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::FullRandom => "fully_random",
            Self::BalancedRandom => "balanced_random",
        }
    }
}

impl TechOrder {
    pub fn code(self) -> &'static str {
        match self {
            Self::Normal => "n",
            Self::FullRandom => "r",
            Self::BalancedRandom => "b",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::FullRandom => "Full Random",
            Self::BalancedRandom => "Balanced Random",
        }
    }
}

/// Mystery weight option keys, one table per top-level choice.
pub const MYSTERY_GAME_MODE_KEYS: &[(&str, GameMode)] = &[
    ("mystery_game_mode_standard", GameMode::Standard),
    ("mystery_game_mode_lw", GameMode::LostWorlds),
    ("mystery_game_mode_loc", GameMode::LegacyOfCyrus),
    ("mystery_game_mode_ia", GameMode::IceAge),
    ("mystery_game_mode_vr", GameMode::VanillaRando),
];

pub const MYSTERY_ITEM_DIFFICULTY_KEYS: &[(&str, Difficulty)] = &[
    ("mystery_item_difficulty_easy", Difficulty::Easy),
    ("mystery_item_difficulty_normal", Difficulty::Normal),
    ("mystery_item_difficulty_hard", Difficulty::Hard),
];

pub const MYSTERY_ENEMY_DIFFICULTY_KEYS: &[(&str, Difficulty)] = &[
    ("mystery_enemy_difficulty_normal", Difficulty::Normal),
    ("mystery_enemy_difficulty_hard", Difficulty::Hard),
];

pub const MYSTERY_TECH_ORDER_KEYS: &[(&str, TechOrder)] = &[
    ("mystery_tech_order_normal", TechOrder::Normal),
    ("mystery_tech_order_full_random", TechOrder::FullRandom),
    ("mystery_tech_order_balanced_random", TechOrder::BalancedRandom),
];

pub const MYSTERY_SHOP_PRICE_KEYS: &[(&str, ShopPrices)] = &[
    ("mystery_shop_prices_normal", ShopPrices::Normal),
    ("mystery_shop_prices_random", ShopPrices::FullyRandom),
    ("mystery_shop_prices_mostly_random", ShopPrices::MostlyRandom),
    ("mystery_shop_prices_free", ShopPrices::Free),
];

/// Mystery flag probabilities, given as 0-100 percentages in option maps.
pub const MYSTERY_FLAG_KEYS: &[(&str, GameFlags)] = &[
    ("mystery_tab_treasures", GameFlags::TAB_TREASURES),
    ("mystery_unlock_magic", GameFlags::UNLOCKED_MAGIC),
    ("mystery_bucket_list", GameFlags::BUCKET_LIST),
    ("mystery_chronosanity", GameFlags::CHRONOSANITY),
    ("mystery_boss_rando", GameFlags::BOSS_RANDO),
    ("mystery_boss_scale", GameFlags::BOSS_SCALE),
    ("mystery_locked_characters", GameFlags::LOCKED_CHARS),
    ("mystery_char_rando", GameFlags::CHAR_RANDO),
    ("mystery_duplicate_characters", GameFlags::DUPLICATE_CHARS),
    ("mystery_epoch_fail", GameFlags::EPOCH_FAIL),
    ("mystery_gear_rando", GameFlags::GEAR_RANDO),
    ("mystery_heal_rando", GameFlags::HEALING_ITEM_RANDO),
];

pub const DEFAULT_GAME_MODE_WEIGHTS: &[(GameMode, u32)] = &[
    (GameMode::Standard, 75),
    (GameMode::LostWorlds, 25),
    (GameMode::LegacyOfCyrus, 0),
    (GameMode::IceAge, 0),
    (GameMode::VanillaRando, 0),
];

pub const DEFAULT_ITEM_DIFFICULTY_WEIGHTS: &[(Difficulty, u32)] = &[
    (Difficulty::Easy, 15),
    (Difficulty::Normal, 70),
    (Difficulty::Hard, 15),
];

pub const DEFAULT_ENEMY_DIFFICULTY_WEIGHTS: &[(Difficulty, u32)] =
    &[(Difficulty::Normal, 75), (Difficulty::Hard, 25)];

pub const DEFAULT_TECH_ORDER_WEIGHTS: &[(TechOrder, u32)] = &[
    (TechOrder::Normal, 10),
    (TechOrder::BalancedRandom, 10),
    (TechOrder::FullRandom, 80),
];

pub const DEFAULT_SHOP_PRICE_WEIGHTS: &[(ShopPrices, u32)] = &[
    (ShopPrices::Normal, 70),
    (ShopPrices::MostlyRandom, 10),
    (ShopPrices::FullyRandom, 10),
    (ShopPrices::Free, 10),
];

pub const DEFAULT_FLAG_PROBABILITIES: &[(GameFlags, f64)] = &[
    (GameFlags::TAB_TREASURES, 0.1),
    (GameFlags::UNLOCKED_MAGIC, 0.5),
    (GameFlags::BUCKET_LIST, 0.15),
    (GameFlags::CHRONOSANITY, 0.5),
    (GameFlags::BOSS_RANDO, 0.5),
    (GameFlags::BOSS_SCALE, 0.1),
    (GameFlags::LOCKED_CHARS, 0.25),
    (GameFlags::CHAR_RANDO, 0.5),
    (GameFlags::DUPLICATE_CHARS, 0.25),
    (GameFlags::EPOCH_FAIL, 0.5),
    (GameFlags::GEAR_RANDO, 0.25),
    (GameFlags::HEALING_ITEM_RANDO, 0.25),
];

/// Objective hint aliases, most common random categories first.
pub const OBJECTIVE_HINT_ALIASES: &[(&str, &str)] = &[
    ("Random", "65:quest_gated, 30:boss_nogo, 15:recruit_gated"),
    ("Random Gated Quest", "quest_gated"),
    ("Random Hard Quest", "quest_late"),
    ("Random Go Mode Quest", "quest_go"),
    ("Random Gated Character Recruit", "recruit_gated"),
    ("Random Boss (Includes Go Mode Dungeons)", "boss_any"),
    ("Random Boss from Go Mode Dungeon", "boss_go"),
    ("Random Boss (No Go Mode Dungeons)", "boss_nogo"),
    ("Recruit 3 Characters (Total 5)", "recruit_3"),
    ("Recruit 4 Characters (Total 6)", "recruit_4"),
    ("Recruit 5 Characters (Total 7)", "recruit_5"),
    ("Collect 10 of 20 Fragments", "collect_10_fragments_20"),
    ("Collect 10 of 30 Fragments", "collect_10_fragments_30"),
    ("Collect 3 Rocks", "collect_3_rocks"),
    ("Collect 4 Rocks", "collect_4_rocks"),
    ("Collect 5 Rocks", "collect_5_rocks"),
    ("Forge the Masamune", "quest_forge"),
    ("Charge the Moonstone", "quest_moonstone"),
    ("Trade the Jerky Away", "quest_jerky"),
    ("Defeat the Arris Dome Boss", "quest_arris"),
    ("Visit Cyrus's Grave with Frog", "quest_cyrus"),
    ("Defeat the Boss of Death's Peak", "quest_deathpeak"),
    ("Defeat the Boss of Denadoro Mountains", "quest_denadoro"),
    ("Gain Epoch Flight", "quest_epoch"),
    ("Defeat the Boss of the Factory Ruins", "quest_factory"),
    ("Defeat the Boss of the Geno Dome", "quest_geno"),
    ("Defeat the Boss of the Giant's Claw", "quest_claw"),
    ("Defeat the Boss of Heckran's Cave", "quest_heckran"),
    ("Defeat the Boss of the King's Trial", "quest_shard"),
    ("Defeat the Boss of Manoria Cathedral", "quest_cathedral"),
    ("Defeat the Boss of Mount Woe", "quest_woe"),
    ("Defeat the Boss of the Pendant Trial", "quest_pendant"),
    ("Defeat the Boss of the Reptite Lair", "quest_reptite"),
    ("Defeat the Boss of the Sun Palace", "quest_sunpalace"),
    ("Defeat the Boss of the Sunken Desert", "quest_desert"),
    ("Defeat the Boss in the Zeal Throneroom", "quest_zealthrone"),
    ("Defeat the Boss of Zenan Bridge", "quest_zenan"),
    ("Defeat the Black Tyrano", "quest_blacktyrano"),
    ("Defeat the Tyrano Lair Midboss", "quest_tyranomid"),
    ("Defeat the Boss in Flea's Spot", "quest_flea"),
    ("Defeat the Boss in Slash's Spot", "quest_slash"),
    ("Defeat Magus in Magus's Castle", "quest_magus"),
    ("Defeat the Boss in the GigaMutant Spot", "quest_omengiga"),
    ("Defeat the Boss in the TerraMutant Spot", "quest_omenterra"),
    ("Defeat the Boss in the ElderSpawn Spot", "quest_omenelder"),
    ("Defeat the Boss in the Twin Golem Spot", "quest_twinboss"),
    ("Beat Johnny in a Race", "quest_johnny"),
    ("Bet on a Fair Race and Win", "quest_fairrace"),
    ("Play the Fair Drinking Game", "quest_soda"),
    ("Defeat AtroposXR", "boss_atropos"),
    ("Defeat DaltonPlus", "boss_dalton"),
    ("Defeat DragonTank", "boss_dragontank"),
    ("Defeat ElderSpawn", "boss_elderspawn"),
    ("Defeat Flea", "boss_flea"),
    ("Defeat Flea Plus", "boss_fleaplus"),
    ("Defeat Giga Gaia", "boss_gigagaia"),
    ("Defeat GigaMutant", "boss_gigamutant"),
    ("Defeat Golem", "boss_golem"),
    ("Defeat Golem Boss", "boss_golemboss"),
    ("Defeat Guardian", "boss_guardian"),
    ("Defeat Heckran", "boss_heckran"),
    ("Defeat LavosSpawn", "boss_lavosspawn"),
    ("Defeat Magus (North Cape)", "boss_magusnc"),
    ("Defeat Masamune", "boss_masamune"),
    ("Defeat Mother Brain", "boss_motherbrain"),
    ("Defeat Mud Imp", "boss_mudimp"),
    ("Defeat Nizbel", "boss_nizbel"),
    ("Defeat Nizbel II", "boss_nizbel2"),
    ("Defeat R-Series", "boss_rseries"),
    ("Defeat Retinite", "boss_retinite"),
    ("Defeat RustTyrano", "boss_rusttyrano"),
    ("Defeat Slash", "boss_slash"),
    ("Defeat Son of Sun", "boss_sonofsun"),
    ("Defeat Super Slash", "boss_superslash"),
    ("Defeat TerraMutant", "boss_terramutant"),
    // Twin boss lives in the quest list.
    ("Defeat Yakra", "boss_yakra"),
    ("Defeat Yakra XIII", "boss_yakraxiii"),
    ("Defeat Zombor", "boss_zombor"),
];

/// Resolves a hint alias to its hint string; freeform text passes through.
pub fn resolve_hint(hint: &str) -> &str {
    OBJECTIVE_HINT_ALIASES
        .iter()
        .find(|(alias, _)| *alias == hint)
        .map(|(_, value)| *value)
        .unwrap_or(hint)
}

/// Option key to flag name, for option front-ends.
pub fn gameflags_map() -> Vec<(&'static str, &'static str)> {
    GAME_FLAG_OPTIONS.iter().map(|o| (o.key, o.name)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_game_flag_has_exactly_one_option() {
        let mut seen = GameFlags::empty();
        for option in GAME_FLAG_OPTIONS {
            assert_eq!(option.flag.bits().count_ones(), 1, "{}", option.key);
            assert!(!seen.intersects(option.flag), "duplicate flag for {}", option.key);
            seen |= option.flag;
        }
        assert_eq!(seen, GameFlags::all());
    }

    #[test]
    fn option_keys_and_codes_are_unique() {
        let keys: HashSet<_> = GAME_FLAG_OPTIONS.iter().map(|o| o.key).collect();
        let codes: HashSet<_> = GAME_FLAG_OPTIONS.iter().map(|o| o.code).collect();
        assert_eq!(keys.len(), GAME_FLAG_OPTIONS.len());
        assert_eq!(codes.len(), GAME_FLAG_OPTIONS.len());
    }

    #[test]
    fn choices_round_trip_through_their_keys() {
        for mode in GameMode::ALL {
            assert_eq!(GameMode::parse_choice(mode.key()), Some(*mode));
        }
        for order in TechOrder::ALL {
            assert_eq!(TechOrder::parse_choice(order.key()), Some(*order));
        }
        assert_eq!(ShopPrices::parse_choice("mostly_random"), Some(ShopPrices::MostlyRandom));
        assert_eq!(Difficulty::parse_choice("brutal"), None);
    }

    #[test]
    fn unknown_bits_survive_serialization() {
        let flags = GameFlags::from_bits_retain(GameFlags::FAST_TABS.bits() | (1 << 60));
        let json = serde_json::to_string(&flags).unwrap();
        let back: GameFlags = serde_json::from_str(&json).unwrap();
        assert_eq!(back, flags);
    }

    #[test]
    fn hint_aliases_resolve() {
        assert_eq!(resolve_hint("Collect 3 Rocks"), "collect_3_rocks");
        assert_eq!(resolve_hint("boss_any"), "boss_any");
        assert_eq!(resolve_hint("my own words"), "my own words");
    }

    #[test]
    fn names_follow_catalog_order() {
        let flags = GameFlags::FAST_TABS | GameFlags::FIX_GLITCH;
        assert_eq!(flags.names(), vec!["FIX_GLITCH", "FAST_TABS"]);
    }
}
