//! Typed access to free-form slot and layout options.
//!
//! Options arrive as arbitrary JSON from the configuration layer. They are
//! stored in a `BTreeMap` so iteration order (and therefore anything derived
//! from it) is stable between render passes.

use crate::color::Color;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options(BTreeMap<String, Value>);

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for tests and defaults
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Numeric option. Numeric strings ("42.5") are accepted as well.
    pub fn f64(&self, key: &str) -> Option<f64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn f64_or(&self, key: &str, default: f64) -> f64 {
        self.f64(key).filter(|v| v.is_finite()).unwrap_or(default)
    }

    pub fn u32_or(&self, key: &str, default: u32) -> u32 {
        self.f64(key)
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v.round().min(u32::MAX as f64) as u32)
            .unwrap_or(default)
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        match self.0.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => match s.to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => true,
                "false" | "no" | "off" | "0" => false,
                _ => default,
            },
            Some(Value::Number(n)) => n.as_f64().map(|v| v != 0.0).unwrap_or(default),
            _ => default,
        }
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.str(key).unwrap_or(default)
    }

    pub fn color(&self, key: &str) -> Option<Color> {
        self.0.get(key).and_then(Color::from_value)
    }

    pub fn array(&self, key: &str) -> Option<&Vec<Value>> {
        self.0.get(key).and_then(Value::as_array)
    }
}

impl From<BTreeMap<String, Value>> for Options {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_typed_getters() {
        let opts = Options::new()
            .with("max", 250)
            .with("min", "-5.5")
            .with("show_date", "no")
            .with("style", "ring")
            .with("color", "#00ff00");

        assert_eq!(opts.f64_or("max", 100.0), 250.0);
        assert_eq!(opts.f64_or("min", 0.0), -5.5);
        assert_eq!(opts.f64_or("missing", 7.0), 7.0);
        assert!(!opts.bool_or("show_date", true));
        assert!(opts.bool_or("missing", true));
        assert_eq!(opts.str_or("style", "bar"), "ring");
        assert_eq!(opts.color("color"), Some(Color::from_rgb8(0, 255, 0)));
    }

    #[test]
    fn test_deserializes_transparently() {
        let opts: Options = serde_json::from_value(json!({"hours": 12, "fill": false})).unwrap();
        assert_eq!(opts.u32_or("hours", 24), 12);
        assert!(!opts.bool_or("fill", true));
        assert_eq!(opts.keys().collect::<Vec<_>>(), vec!["fill", "hours"]);
    }
}
