use rand::Rng;
use std::collections::BTreeMap;

use crate::configuration::{
    BucketSettings, CharChoices, Configuration, FlagProbability, MysterySettings, TabScheme,
    TabSettings,
};
use crate::flags::{
    resolve_hint, Difficulty, GameFlags, GameMode, RoFlags, ShopPrices, TechOrder,
    DEFAULT_ENEMY_DIFFICULTY_WEIGHTS, DEFAULT_FLAG_PROBABILITIES, DEFAULT_GAME_MODE_WEIGHTS,
    DEFAULT_ITEM_DIFFICULTY_WEIGHTS, DEFAULT_SHOP_PRICE_WEIGHTS, DEFAULT_TECH_ORDER_WEIGHTS,
    GAME_FLAG_OPTIONS, MYSTERY_ENEMY_DIFFICULTY_KEYS, MYSTERY_FLAG_KEYS, MYSTERY_GAME_MODE_KEYS,
    MYSTERY_ITEM_DIFFICULTY_KEYS, MYSTERY_SHOP_PRICE_KEYS, MYSTERY_TECH_ORDER_KEYS,
    REQUIRED_OPTION_KEYS, RO_FLAG_OPTIONS,
};
use crate::options::OptionMap;
use crate::seed::SeedWords;
use crate::{mystery, GeneratorError, Result};

pub const MAX_OBJECTIVES: u8 = 8;

/// Turns raw option maps into canonical configurations.
#[derive(Debug, Clone, Copy)]
pub struct Translator<'a> {
    words: &'a SeedWords,
}

impl<'a> Translator<'a> {
    pub fn new(words: &'a SeedWords) -> Self {
        Self { words }
    }

    /// Validates `options` and builds a configuration.
    ///
    /// `rng` is only consumed to draw a seed when none was given and to
    /// resolve mystery settings.
    pub fn translate<R: Rng + ?Sized>(&self, options: &OptionMap, rng: &mut R) -> Result<Configuration> {
        if let Some(key) = REQUIRED_OPTION_KEYS.iter().find(|k| !options.contains(k)) {
            return Err(GeneratorError::MalformedOptions(format!(
                "required option '{key}' is missing"
            )));
        }

        let game_mode: GameMode = options.require_choice("game_mode")?;
        let item_difficulty: Difficulty = options.require_choice("item_difficulty")?;
        let enemy_difficulty: Difficulty = options.require_choice("enemy_difficulty")?;
        let shop_prices: ShopPrices = options.require_choice("shop_prices")?;
        let tech_order: TechOrder = options.require_choice("tech_rando")?;

        let game_flags = GAME_FLAG_OPTIONS
            .iter()
            .filter(|o| options.flag(o.key))
            .fold(GameFlags::empty(), |acc, o| acc | o.flag);

        let ro_flags = RO_FLAG_OPTIONS
            .iter()
            .filter(|(key, _)| options.flag(key))
            .fold(RoFlags::empty(), |acc, (_, flag)| acc | *flag);

        let char_choices = match options.text("char_rando_assignments")? {
            Some(hex) if !hex.is_empty() => CharChoices::decode(&hex)?,
            _ => CharChoices::default(),
        };

        let tab_settings = read_tabs(options)?;
        let bucket_settings = read_bucket(options)?;
        let mystery_settings = read_mystery(options)?;
        mystery::validate(&mystery_settings)?;

        let seed = match options.text("seed")? {
            Some(seed) if !seed.is_empty() => seed,
            _ => self.words.random_seed(rng),
        };

        let cfg = Configuration {
            seed,
            game_mode,
            item_difficulty,
            enemy_difficulty,
            shop_prices,
            tech_order,
            game_flags,
            initial_flags: game_flags - GameFlags::MYSTERY,
            char_choices,
            ro_flags,
            tab_settings,
            bucket_settings,
            mystery_settings,
        };

        let mut cfg = if cfg.is_mystery() {
            mystery::resolve(cfg, rng)?
        } else {
            cfg
        };

        // Mystery resolution may toggle the bucket list.
        let enabled = cfg.game_flags.contains(GameFlags::BUCKET_LIST);
        cfg.bucket_settings.hints =
            bucket_hints(options, cfg.bucket_settings.num_objectives, enabled)?;
        Ok(cfg)
    }
}

fn tab_value(options: &OptionMap, key: &str) -> Result<u8> {
    let value = options.require_integer(key)?;
    u8::try_from(value)
        .map_err(|_| GeneratorError::InvalidRange(format!("{key} must be between 0 and 255, got {value}")))
}

fn read_tabs(options: &OptionMap) -> Result<TabSettings> {
    let tabs = TabSettings {
        scheme: TabScheme::Uniform,
        binom_success: 0.5,
        power_min: tab_value(options, "power_tab_min")?,
        power_max: tab_value(options, "power_tab_max")?,
        magic_min: tab_value(options, "magic_tab_min")?,
        magic_max: tab_value(options, "magic_tab_max")?,
        speed_min: tab_value(options, "speed_tab_min")?,
        speed_max: tab_value(options, "speed_tab_max")?,
    };
    tabs.validate()?;
    Ok(tabs)
}

fn objective_count(options: &OptionMap, key: &str, default: u8) -> Result<u8> {
    match options.integer(key)? {
        None => Ok(default),
        Some(n) if (0..=i64::from(MAX_OBJECTIVES)).contains(&n) => Ok(n as u8),
        Some(n) => Err(GeneratorError::InvalidRange(format!(
            "{key} must be between 0 and {MAX_OBJECTIVES}, got {n}"
        ))),
    }
}

fn read_bucket(options: &OptionMap) -> Result<BucketSettings> {
    let defaults = BucketSettings::default();
    let num_objectives = objective_count(options, "bucket_num_objs", defaults.num_objectives)?;
    let num_objectives_needed =
        objective_count(options, "bucket_num_objs_req", defaults.num_objectives_needed)?;

    if num_objectives_needed > num_objectives {
        return Err(GeneratorError::InvalidRange(format!(
            "{num_objectives_needed} objectives required but only {num_objectives} set"
        )));
    }

    Ok(BucketSettings {
        disable_other_go_modes: options.flag("bucket_disable_go_modes"),
        objectives_win: options.flag("bucket_obj_win_game"),
        num_objectives,
        num_objectives_needed,
        hints: Vec::new(),
    })
}

/// One hint per objective when the bucket list is on, none otherwise.
/// Absent hints become empty strings.
fn bucket_hints(options: &OptionMap, num_objectives: u8, enabled: bool) -> Result<Vec<String>> {
    if !enabled {
        return Ok(Vec::new());
    }
    if num_objectives == 0 {
        return Err(GeneratorError::InvalidRange(
            "bucket list needs at least one objective".to_string(),
        ));
    }
    (1..=num_objectives)
        .map(|i| {
            let hint = options.text(&format!("bucket_objective{i}"))?.unwrap_or_default();
            Ok(resolve_hint(hint.trim()).to_string())
        })
        .collect()
}

fn weight(options: &OptionMap, key: &str, default: u32) -> Result<u32> {
    match options.integer(key)? {
        None => Ok(default),
        Some(n) if n < 0 => Err(GeneratorError::InvalidRange(format!(
            "{key} must not be negative, got {n}"
        ))),
        Some(n) => u32::try_from(n)
            .map_err(|_| GeneratorError::InvalidRange(format!("{key} is too large: {n}"))),
    }
}

fn weight_table<K: Copy + Ord>(
    options: &OptionMap,
    keys: &[(&str, K)],
    defaults: &[(K, u32)],
) -> Result<BTreeMap<K, u32>> {
    keys.iter()
        .map(|&(key, choice)| {
            let default = defaults
                .iter()
                .find(|(k, _)| *k == choice)
                .map_or(0, |(_, w)| *w);
            Ok((choice, weight(options, key, default)?))
        })
        .collect()
}

fn read_mystery(options: &OptionMap) -> Result<MysterySettings> {
    let flag_probs = MYSTERY_FLAG_KEYS
        .iter()
        .map(|&(key, flag)| {
            let default = DEFAULT_FLAG_PROBABILITIES
                .iter()
                .find(|(f, _)| *f == flag)
                .map_or(0.0, |(_, p)| *p);
            let probability = match options.integer(key)? {
                None => default,
                Some(n) if (0..=100).contains(&n) => n as f64 / 100.0,
                Some(n) => {
                    return Err(GeneratorError::InvalidRange(format!(
                        "{key} must be a percentage between 0 and 100, got {n}"
                    )))
                }
            };
            Ok(FlagProbability { flag, probability })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(MysterySettings {
        game_mode_freqs: weight_table(options, MYSTERY_GAME_MODE_KEYS, DEFAULT_GAME_MODE_WEIGHTS)?,
        item_difficulty_freqs: weight_table(
            options,
            MYSTERY_ITEM_DIFFICULTY_KEYS,
            DEFAULT_ITEM_DIFFICULTY_WEIGHTS,
        )?,
        enemy_difficulty_freqs: weight_table(
            options,
            MYSTERY_ENEMY_DIFFICULTY_KEYS,
            DEFAULT_ENEMY_DIFFICULTY_WEIGHTS,
        )?,
        tech_order_freqs: weight_table(options, MYSTERY_TECH_ORDER_KEYS, DEFAULT_TECH_ORDER_WEIGHTS)?,
        shop_price_freqs: weight_table(options, MYSTERY_SHOP_PRICE_KEYS, DEFAULT_SHOP_PRICE_WEIGHTS)?,
        flag_probs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn words() -> SeedWords {
        SeedWords::parse("Crono,Marle,Lucca,Robo,Frog,Ayla,Magus").unwrap()
    }

    fn base_options() -> OptionMap {
        OptionMap::new()
            .with("game_mode", "standard")
            .with("item_difficulty", "normal")
            .with("enemy_difficulty", "hard")
            .with("shop_prices", "normal")
            .with("tech_rando", "fully_random")
            .with("power_tab_min", 2)
            .with("power_tab_max", 4)
            .with("magic_tab_min", 1)
            .with("magic_tab_max", 3)
            .with("speed_tab_min", 1)
            .with("speed_tab_max", 1)
    }

    #[test]
    fn standard_options_with_blank_seed() {
        let options = base_options().with("disable_glitches", true).with("seed", "");
        let mut rng = StdRng::seed_from_u64(5);
        let cfg = Translator::new(&words()).translate(&options, &mut rng).unwrap();

        assert_eq!(cfg.game_mode, GameMode::Standard);
        assert_eq!(cfg.item_difficulty, Difficulty::Normal);
        assert_eq!(cfg.enemy_difficulty, Difficulty::Hard);
        assert!(!cfg.seed.is_empty());
        assert!(cfg.game_flags.contains(GameFlags::FIX_GLITCH));
        assert!(!cfg.game_flags.contains(GameFlags::BUCKET_LIST));
        assert!(cfg.bucket_settings.hints.is_empty());
    }

    #[test]
    fn explicit_seed_is_kept_and_rng_untouched() {
        let options = base_options().with("seed", "MySeed");
        let mut a = StdRng::seed_from_u64(5);
        let mut b = StdRng::seed_from_u64(5);
        let first = Translator::new(&words()).translate(&options, &mut a).unwrap();
        let second = Translator::new(&words()).translate(&options, &mut b).unwrap();
        assert_eq!(first.seed, "MySeed");
        assert_eq!(first, second);
        assert_eq!(a.gen::<u64>(), StdRng::seed_from_u64(5).gen::<u64>());
    }

    #[test]
    fn unknown_keys_are_ignored_and_missing_required_fail() {
        let options = base_options().with("seed", "x").with("some_future_flag", true);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(Translator::new(&words()).translate(&options, &mut rng).is_ok());

        let mut options = base_options();
        options.insert("tech_rando", serde_json::Value::Null);
        assert!(matches!(
            Translator::new(&words()).translate(&options, &mut rng),
            Err(GeneratorError::MalformedOptions(_))
        ));
    }

    #[test]
    fn decodes_character_assignments() {
        let options = base_options().with("seed", "x").with("char_rando_assignments", "097F0000000000");
        let mut rng = StdRng::seed_from_u64(0);
        let cfg = Translator::new(&words()).translate(&options, &mut rng).unwrap();
        assert_eq!(cfg.char_choices.slot(0).unwrap().roles(), vec![0, 3]);
        assert_eq!(cfg.char_choices.slot(1).unwrap().roles().len(), 7);

        let bad = base_options().with("seed", "x").with("char_rando_assignments", "zz7F0000000000");
        assert!(matches!(
            Translator::new(&words()).translate(&bad, &mut rng),
            Err(GeneratorError::MalformedOptions(_))
        ));
    }

    #[test]
    fn bucket_hints_follow_objective_count() {
        let options = base_options()
            .with("seed", "x")
            .with("bucket_list", "on")
            .with("bucket_num_objs", 3)
            .with("bucket_num_objs_req", 2)
            .with("bucket_objective1", "Collect 3 Rocks")
            .with("bucket_objective2", serde_json::Value::Null)
            .with("bucket_objective3", "boss_any")
            .with("bucket_objective4", "ignored");
        let mut rng = StdRng::seed_from_u64(0);
        let cfg = Translator::new(&words()).translate(&options, &mut rng).unwrap();
        assert_eq!(cfg.bucket_settings.hints, vec!["collect_3_rocks", "", "boss_any"]);
        assert_eq!(cfg.bucket_settings.num_objectives_needed, 2);
    }

    #[test]
    fn required_objectives_cannot_exceed_total() {
        let options = base_options()
            .with("seed", "x")
            .with("bucket_num_objs", 2)
            .with("bucket_num_objs_req", 3);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            Translator::new(&words()).translate(&options, &mut rng),
            Err(GeneratorError::InvalidRange(_))
        ));
    }

    #[test]
    fn mystery_weights_are_copied_and_probabilities_scaled() {
        let options = base_options()
            .with("seed", "x")
            .with("mystery_game_mode_lw", 40)
            .with("mystery_tech_order_balanced_random", 7)
            .with("mystery_chronosanity", 35);
        let mut rng = StdRng::seed_from_u64(0);
        let cfg = Translator::new(&words()).translate(&options, &mut rng).unwrap();
        let m = &cfg.mystery_settings;
        assert_eq!(m.game_mode_freqs[&GameMode::LostWorlds], 40);
        assert_eq!(m.game_mode_freqs[&GameMode::Standard], 75);
        assert_eq!(m.tech_order_freqs[&TechOrder::BalancedRandom], 7);
        let chrono = m
            .flag_probs
            .iter()
            .find(|p| p.flag == GameFlags::CHRONOSANITY)
            .unwrap();
        assert!((chrono.probability - 0.35).abs() < f64::EPSILON);
    }

    #[test]
    fn negative_mystery_weight_fails() {
        let options = base_options().with("seed", "x").with("mystery_shop_prices_free", -1);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            Translator::new(&words()).translate(&options, &mut rng),
            Err(GeneratorError::InvalidRange(_))
        ));
    }

    #[test]
    fn mystery_seed_is_resolved_and_snapshot_cleared() {
        let options = base_options()
            .with("seed", "x")
            .with("mystery_seed", true)
            .with("fast_tabs", true)
            .with("mystery_game_mode_standard", 0)
            .with("mystery_game_mode_lw", 0)
            .with("mystery_game_mode_ia", 5);
        let mut rng = StdRng::seed_from_u64(21);
        let cfg = Translator::new(&words()).translate(&options, &mut rng).unwrap();
        assert_eq!(cfg.game_mode, GameMode::IceAge);
        assert!(cfg.is_mystery());
        assert!(!cfg.initial_flags.contains(GameFlags::MYSTERY));
        assert!(cfg.initial_flags.contains(GameFlags::FAST_TABS));
    }

    fn mystery_bucket_options(percent: i64) -> OptionMap {
        base_options()
            .with("seed", "x")
            .with("mystery_seed", true)
            .with("mystery_bucket_list", percent)
            .with("bucket_num_objs", 5)
            .with("bucket_num_objs_req", 3)
            .with("bucket_objective2", "boss_any")
    }

    #[test]
    fn mystery_bucket_list_on_fills_every_hint() {
        let mut rng = StdRng::seed_from_u64(4);
        let cfg = Translator::new(&words())
            .translate(&mystery_bucket_options(100), &mut rng)
            .unwrap();
        assert!(cfg.game_flags.contains(GameFlags::BUCKET_LIST));
        assert_eq!(cfg.bucket_settings.hints.len(), 5);
        assert_eq!(cfg.bucket_settings.hints, vec!["", "boss_any", "", "", ""]);
    }

    #[test]
    fn mystery_bucket_list_off_drops_hints() {
        let options = mystery_bucket_options(0).with("bucket_list", true);
        let mut rng = StdRng::seed_from_u64(4);
        let cfg = Translator::new(&words()).translate(&options, &mut rng).unwrap();
        assert!(!cfg.game_flags.contains(GameFlags::BUCKET_LIST));
        assert!(cfg.bucket_settings.hints.is_empty());
    }

    #[test]
    fn mystery_bucket_list_needs_objectives() {
        let options = mystery_bucket_options(100)
            .with("bucket_num_objs", 0)
            .with("bucket_num_objs_req", 0);
        let mut rng = StdRng::seed_from_u64(4);
        assert!(matches!(
            Translator::new(&words()).translate(&options, &mut rng),
            Err(GeneratorError::InvalidRange(_))
        ));
    }

    #[test]
    fn whitespace_seed_is_kept_verbatim() {
        let options = base_options().with("seed", "  ");
        let mut rng = StdRng::seed_from_u64(0);
        let cfg = Translator::new(&words()).translate(&options, &mut rng).unwrap();
        assert_eq!(cfg.seed, "  ");
    }

    proptest! {
        #[test]
        fn tab_ranges_accept_ordered_and_reject_inverted(
            power in (0u8..10, 0u8..10),
            magic in (0u8..10, 0u8..10),
            speed in (0u8..10, 0u8..10),
        ) {
            let options = base_options()
                .with("seed", "x")
                .with("power_tab_min", power.0)
                .with("power_tab_max", power.1)
                .with("magic_tab_min", magic.0)
                .with("magic_tab_max", magic.1)
                .with("speed_tab_min", speed.0)
                .with("speed_tab_max", speed.1);
            let ordered = power.0 <= power.1 && magic.0 <= magic.1 && speed.0 <= speed.1;
            let mut rng = StdRng::seed_from_u64(0);
            let result = Translator::new(&words()).translate(&options, &mut rng);
            if ordered {
                prop_assert!(result.is_ok());
            } else {
                prop_assert!(matches!(result, Err(GeneratorError::InvalidRange(_))));
            }
        }
    }
}
