//! Read-only views of a stored generation.
//!
//! Nothing here checks race secrecy; callers must withhold spoilers for
//! race records before projecting.

use serde::Serialize;
use std::fmt::Write as _;

use crate::configuration::{Configuration, TabScheme, CHARACTER_NAMES};
use crate::engine::{ArtifactMetadata, BossPlacement, CharacterPlacement, KeyItemPlacement};
use crate::flags::GameFlags;
use crate::Result;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Objective {
    pub name: String,
    pub desc: String,
}

/// One line of the progression proof. `sphere` is `GO`, a single digit,
/// empty, or absent when the line carries no prefix.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Sphere {
    pub sphere: Option<String>,
    pub desc: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WebSpoiler {
    pub characters: Vec<CharacterPlacement>,
    pub key_items: Vec<KeyItemPlacement>,
    pub bosses: Vec<BossPlacement>,
    pub objectives: Vec<Objective>,
    pub spheres: Vec<Sphere>,
}

pub fn parse_sphere(line: &str) -> Sphere {
    if let Some((prefix, rest)) = line.split_once(':') {
        let is_sphere = prefix == "GO"
            || prefix.is_empty()
            || (prefix.len() == 1 && prefix.chars().all(|c| c.is_ascii_digit()));
        let desc = rest.trim_start();
        if is_sphere && !desc.is_empty() {
            return Sphere {
                sphere: Some(prefix.to_string()),
                desc: desc.to_string(),
            };
        }
    }
    Sphere {
        sphere: None,
        desc: line.to_string(),
    }
}

fn objectives(cfg: &Configuration, metadata: &ArtifactMetadata) -> Vec<Objective> {
    if !cfg.game_flags.contains(GameFlags::BUCKET_LIST) {
        return Vec::new();
    }
    metadata
        .objectives
        .iter()
        .take(usize::from(cfg.bucket_settings.num_objectives))
        .enumerate()
        .map(|(i, desc)| Objective {
            name: format!("Objective {}", i + 1),
            desc: desc.clone(),
        })
        .collect()
}

/// Structured spoiler for the seed page.
pub fn project_web(cfg: &Configuration, metadata: &ArtifactMetadata) -> WebSpoiler {
    WebSpoiler {
        characters: metadata.characters.clone(),
        key_items: metadata.key_items.clone(),
        bosses: metadata.bosses.clone(),
        objectives: objectives(cfg, metadata),
        spheres: metadata
            .spheres
            .iter()
            .filter(|line| !line.trim().is_empty())
            .map(|line| parse_sphere(line))
            .collect(),
    }
}

/// Human-readable settings block shared by the text spoiler and the share
/// page.
pub fn settings_summary(cfg: &Configuration) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Game Mode: {}", cfg.game_mode.label());
    let _ = writeln!(out, "Item Difficulty: {}", cfg.item_difficulty.label());
    let _ = writeln!(out, "Enemy Difficulty: {}", cfg.enemy_difficulty.label());
    let _ = writeln!(out, "Tech Order: {}", cfg.tech_order.label());
    let _ = writeln!(out, "Shop Prices: {}", cfg.shop_prices.label());

    let names = cfg.game_flags.difference(GameFlags::MYSTERY).names();
    let flags = if names.is_empty() {
        "None".to_string()
    } else {
        names.join(", ")
    };
    let _ = writeln!(out, "Flags: {flags}");

    let tabs = &cfg.tab_settings;
    let scheme = match tabs.scheme {
        TabScheme::Uniform => "Uniform".to_string(),
        TabScheme::Binomial => format!("Binomial (p = {})", tabs.binom_success),
    };
    let _ = writeln!(
        out,
        "Tabs: Power {}-{}, Magic {}-{}, Speed {}-{} ({scheme})",
        tabs.power_min, tabs.power_max, tabs.magic_min, tabs.magic_max, tabs.speed_min, tabs.speed_max
    );

    if cfg.game_flags.contains(GameFlags::CHAR_RANDO) {
        let _ = writeln!(out, "Character Choices:");
        for (slot, mask) in cfg.char_choices.iter().enumerate() {
            let allowed: Vec<&str> = mask.roles().into_iter().map(|r| CHARACTER_NAMES[r]).collect();
            let _ = writeln!(out, "    {}: {}", CHARACTER_NAMES[slot], allowed.join(", "));
        }
    }

    if cfg.game_flags.contains(GameFlags::BUCKET_LIST) {
        let bucket = &cfg.bucket_settings;
        let _ = writeln!(
            out,
            "Bucket List: {} of {} objectives",
            bucket.num_objectives_needed, bucket.num_objectives
        );
    }
    out
}

/// Plain text spoiler log.
pub fn project_text(
    cfg: &Configuration,
    metadata: &ArtifactMetadata,
    verification_hash: Option<&[u8]>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Seed: {}", cfg.seed);
    let _ = writeln!(out, "Flags: {}", cfg.flag_string());
    if let Some(hash) = verification_hash {
        let _ = writeln!(out, "Verification: {}", hex::encode(hash));
    }
    out.push('\n');
    out.push_str(&settings_summary(cfg));

    let web = project_web(cfg, metadata);

    if !web.objectives.is_empty() {
        out.push_str("\nObjectives\n");
        for o in &web.objectives {
            let _ = writeln!(out, "    {}: {}", o.name, o.desc);
        }
    }

    out.push_str("\nCharacters\n");
    for c in &web.characters {
        let _ = writeln!(out, "    {:<24}{} (as {})", c.location, c.character, c.reassign);
    }

    out.push_str("\nKey Items\n");
    for k in &web.key_items {
        let _ = writeln!(out, "    {:<24}{}", k.location, k.key);
    }

    out.push_str("\nBosses\n");
    for b in &web.bosses {
        let _ = writeln!(out, "    {:<24}{}", b.location, b.boss);
    }

    if !web.spheres.is_empty() {
        out.push_str("\nSpheres\n");
        for line in &metadata.spheres {
            let _ = writeln!(out, "    {line}");
        }
    }
    out
}

#[derive(Serialize)]
struct JsonSpoiler<'a> {
    seed: &'a str,
    flag_string: String,
    verification_hash: Option<String>,
    settings: &'a Configuration,
    #[serde(flatten)]
    placements: WebSpoiler,
}

/// Machine-readable spoiler log.
pub fn project_json(
    cfg: &Configuration,
    metadata: &ArtifactMetadata,
    verification_hash: Option<&[u8]>,
) -> Result<String> {
    let spoiler = JsonSpoiler {
        seed: &cfg.seed,
        flag_string: cfg.flag_string(),
        verification_hash: verification_hash.map(hex::encode),
        settings: cfg,
        placements: project_web(cfg, metadata),
    };
    Ok(serde_json::to_string_pretty(&spoiler)?)
}

/// Text for the share page. Mystery records reveal nothing about their
/// resolved settings.
pub fn share_details(cfg: &Configuration) -> String {
    if cfg.is_mystery() {
        "Mystery seed!\n".to_string()
    } else {
        format!("Seed: {}\n{}", cfg.seed, settings_summary(cfg))
    }
}
