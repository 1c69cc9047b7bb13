use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::flags::OptionChoice;
use crate::{GeneratorError, Result};

/// Raw option map as submitted by a front-end.
///
/// Values are loosely typed: form posts deliver `"on"` for checkboxes and
/// strings for numbers, JSON clients deliver booleans and integers. The
/// accessors below accept both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionMap(BTreeMap<String, Value>);

impl OptionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Present and non-null.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// Checkbox semantics: absent, null, false, zero, "", "off" and "false"
    /// are all unset.
    pub fn flag(&self, key: &str) -> bool {
        match self.get(key) {
            None => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().map_or(false, |f| f != 0.0),
            Some(Value::String(s)) => {
                let s = s.trim();
                !(s.is_empty()
                    || s == "0"
                    || s.eq_ignore_ascii_case("off")
                    || s.eq_ignore_ascii_case("false"))
            }
            Some(_) => true,
        }
    }

    pub fn text(&self, key: &str) -> Result<Option<String>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(other) => Err(GeneratorError::MalformedOptions(format!(
                "option '{key}' must be text, got {other}"
            ))),
        }
    }

    pub fn integer(&self, key: &str) -> Result<Option<i64>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Number(n)) => n.as_i64().map(Some).ok_or_else(|| {
                GeneratorError::MalformedOptions(format!("option '{key}' is not an integer: {n}"))
            }),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => s.trim().parse::<i64>().map(Some).map_err(|_| {
                GeneratorError::MalformedOptions(format!("option '{key}' is not an integer: '{s}'"))
            }),
            Some(other) => Err(GeneratorError::MalformedOptions(format!(
                "option '{key}' must be an integer, got {other}"
            ))),
        }
    }

    pub fn require_integer(&self, key: &str) -> Result<i64> {
        self.integer(key)?.ok_or_else(|| missing(key))
    }

    pub fn require_choice<T: OptionChoice>(&self, key: &str) -> Result<T> {
        let raw = self.text(key)?.ok_or_else(|| missing(key))?;
        T::parse_choice(raw.trim()).ok_or_else(|| {
            GeneratorError::MalformedOptions(format!("unknown value '{raw}' for option '{key}'"))
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl FromIterator<(String, Value)> for OptionMap {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn missing(key: &str) -> GeneratorError {
    GeneratorError::MalformedOptions(format!("required option '{key}' is missing"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::GameMode;
    use serde_json::json;

    #[test]
    fn checkbox_values() {
        let map = OptionMap::new()
            .with("a", "on")
            .with("b", true)
            .with("c", "off")
            .with("d", 0)
            .with("e", Value::Null)
            .with("f", "");
        assert!(map.flag("a"));
        assert!(map.flag("b"));
        assert!(!map.flag("c"));
        assert!(!map.flag("d"));
        assert!(!map.flag("e"));
        assert!(!map.flag("f"));
        assert!(!map.flag("absent"));
    }

    #[test]
    fn integers_accept_numbers_and_numeric_text() {
        let map = OptionMap::new().with("n", 4).with("s", " 7 ").with("bad", "seven");
        assert_eq!(map.integer("n").unwrap(), Some(4));
        assert_eq!(map.integer("s").unwrap(), Some(7));
        assert!(matches!(map.integer("bad"), Err(GeneratorError::MalformedOptions(_))));
        assert!(matches!(
            map.require_integer("absent"),
            Err(GeneratorError::MalformedOptions(_))
        ));
    }

    #[test]
    fn choices_parse_by_key() {
        let map = OptionMap::new().with("game_mode", "lost_worlds").with("other", "nope");
        assert_eq!(map.require_choice::<GameMode>("game_mode").unwrap(), GameMode::LostWorlds);
        assert!(map.require_choice::<GameMode>("other").is_err());
    }

    #[test]
    fn deserializes_from_a_json_object() {
        let map: OptionMap =
            serde_json::from_value(json!({"seed": "", "fast_tabs": "on", "power_tab_min": 2}))
                .unwrap();
        assert!(map.flag("fast_tabs"));
        assert_eq!(map.text("seed").unwrap(), Some(String::new()));
        assert_eq!(map.require_integer("power_tab_min").unwrap(), 2);
    }
}
