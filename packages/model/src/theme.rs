//! Theme seam
//!
//! Themes are opaque to the document model. The only place that looks inside
//! one is the theme-recompute migration, through a [`ThemeComputer`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

/// Document-wide theme configuration (persisted as `customTheme`)
pub type Theme = Value;

/// Named reference to a theme mode, used by boards and node overrides
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThemeRef(String);

impl ThemeRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ThemeRef {
    fn default() -> Self {
        Self("default".to_string())
    }
}

impl From<&str> for ThemeRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for ThemeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Theme every new document starts with
pub fn system_default_theme() -> Theme {
    json!({
        "name": "system",
        "colors": {
            "primary": "#3366ff",
            "secondary": "#8f9bb3",
            "background": "#ffffff",
            "text": "#222b45"
        },
        "typography": {
            "fontFamily": "Inter, sans-serif",
            "baseSize": 16,
            "scaleRatio": 1.25
        },
        "spacing": {
            "unit": 4
        },
        "radius": 4
    })
}

/// Computes derived theme values
pub trait ThemeComputer {
    fn compute(&self, theme: &Theme) -> Theme;
}

/// Fills every key missing from a theme with the system default value.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemThemeComputer;

impl ThemeComputer for SystemThemeComputer {
    fn compute(&self, theme: &Theme) -> Theme {
        match theme {
            Value::Object(map) => {
                let mut merged = map.clone();
                if let Value::Object(defaults) = system_default_theme() {
                    fill_missing(&mut merged, &defaults);
                }
                Value::Object(merged)
            }
            _ => system_default_theme(),
        }
    }
}

fn fill_missing(target: &mut Map<String, Value>, defaults: &Map<String, Value>) {
    for (key, default) in defaults {
        match target.get_mut(key) {
            None | Some(Value::Null) => {
                target.insert(key.clone(), default.clone());
            }
            Some(Value::Object(nested)) => {
                if let Value::Object(nested_defaults) = default {
                    fill_missing(nested, nested_defaults);
                }
            }
            Some(_) => {}
        }
    }
}
