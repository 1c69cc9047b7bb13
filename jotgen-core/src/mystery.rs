use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use std::collections::BTreeMap;
use tracing::debug;

use crate::configuration::{Configuration, MysterySettings};
use crate::{GeneratorError, Result};

fn draw<K: Copy + Ord, R: Rng + ?Sized>(
    table: &'static str,
    weights: &BTreeMap<K, u32>,
    rng: &mut R,
) -> Result<K> {
    let keys: Vec<K> = weights.keys().copied().collect();
    let dist = WeightedIndex::new(weights.values().copied()).map_err(|e| {
        GeneratorError::InvalidRange(format!("mystery {table} weights cannot be drawn from: {e}"))
    })?;
    Ok(keys[dist.sample(rng)])
}

/// Checks that every flag probability is a usable fraction.
pub fn validate(settings: &MysterySettings) -> Result<()> {
    for entry in &settings.flag_probs {
        if !(0.0..=1.0).contains(&entry.probability) {
            return Err(GeneratorError::InvalidRange(format!(
                "mystery probability {} for {:?} is outside 0-100%",
                entry.probability, entry.flag
            )));
        }
    }
    Ok(())
}

/// Replaces the user's top-level choices with weighted draws from the
/// mystery tables and rolls each listed flag independently.
///
/// The mystery bit stays in the active flags so the record is still known
/// to be a mystery seed. Every table is drawn before anything is assigned.
pub fn resolve<R: Rng + ?Sized>(mut cfg: Configuration, rng: &mut R) -> Result<Configuration> {
    let settings = &cfg.mystery_settings;
    validate(settings)?;

    let game_mode = draw("game mode", &settings.game_mode_freqs, rng)?;
    let item_difficulty = draw("item difficulty", &settings.item_difficulty_freqs, rng)?;
    let enemy_difficulty = draw("enemy difficulty", &settings.enemy_difficulty_freqs, rng)?;
    let tech_order = draw("tech order", &settings.tech_order_freqs, rng)?;
    let shop_prices = draw("shop prices", &settings.shop_price_freqs, rng)?;

    let mut flags = cfg.game_flags;
    for entry in &settings.flag_probs {
        flags.set(entry.flag, rng.gen_bool(entry.probability));
    }

    debug!(
        ?game_mode,
        ?item_difficulty,
        ?enemy_difficulty,
        ?tech_order,
        ?shop_prices,
        "resolved mystery settings"
    );

    cfg.game_mode = game_mode;
    cfg.item_difficulty = item_difficulty;
    cfg.enemy_difficulty = enemy_difficulty;
    cfg.tech_order = tech_order;
    cfg.shop_prices = shop_prices;
    cfg.game_flags = flags;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::FlagProbability;
    use crate::flags::{Difficulty, GameFlags, GameMode, ShopPrices, TechOrder};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn mystery_config() -> Configuration {
        let mut cfg = Configuration::defaults();
        cfg.game_flags |= GameFlags::MYSTERY;
        cfg
    }

    #[test]
    fn single_weighted_entries_always_win() {
        let mut cfg = mystery_config();
        let m = &mut cfg.mystery_settings;
        m.game_mode_freqs = [(GameMode::Standard, 0), (GameMode::IceAge, 3)].into();
        m.item_difficulty_freqs = [(Difficulty::Hard, 1)].into();
        m.enemy_difficulty_freqs = [(Difficulty::Normal, 0), (Difficulty::Hard, 9)].into();
        m.tech_order_freqs = [(TechOrder::BalancedRandom, 50)].into();
        m.shop_price_freqs = [(ShopPrices::Free, 1), (ShopPrices::Normal, 0)].into();
        m.flag_probs = vec![
            FlagProbability { flag: GameFlags::CHRONOSANITY, probability: 1.0 },
            FlagProbability { flag: GameFlags::FAST_TABS, probability: 0.0 },
        ];

        let mut rng = StdRng::seed_from_u64(11);
        let resolved = resolve(cfg, &mut rng).unwrap();
        assert_eq!(resolved.game_mode, GameMode::IceAge);
        assert_eq!(resolved.item_difficulty, Difficulty::Hard);
        assert_eq!(resolved.enemy_difficulty, Difficulty::Hard);
        assert_eq!(resolved.tech_order, TechOrder::BalancedRandom);
        assert_eq!(resolved.shop_prices, ShopPrices::Free);
        assert!(resolved.game_flags.contains(GameFlags::CHRONOSANITY));
        assert!(!resolved.game_flags.contains(GameFlags::FAST_TABS));
        assert!(resolved.game_flags.contains(GameFlags::MYSTERY));
    }

    #[test]
    fn all_zero_table_is_rejected() {
        let mut cfg = mystery_config();
        cfg.mystery_settings.tech_order_freqs = [(TechOrder::Normal, 0)].into();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(resolve(cfg, &mut rng), Err(GeneratorError::InvalidRange(_))));
    }

    #[test]
    fn same_rng_state_same_resolution() {
        let a = resolve(mystery_config(), &mut StdRng::seed_from_u64(99)).unwrap();
        let b = resolve(mystery_config(), &mut StdRng::seed_from_u64(99)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn probability_over_one_is_rejected() {
        let mut cfg = mystery_config();
        cfg.mystery_settings.flag_probs[0].probability = 1.5;
        assert!(matches!(validate(&cfg.mystery_settings), Err(GeneratorError::InvalidRange(_))));
    }
}
