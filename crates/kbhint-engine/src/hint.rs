//! Hint descriptors
//!
//! Declared by a site module, immutable afterwards. Enabled state lives in
//! the settings store; a missing or non-boolean stored value falls back to
//! `default_enabled`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where an overlay sits relative to its anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HintPosition {
    #[default]
    BelowCenter,
    BelowLeft,
    BelowRight,
    /// Rendered by the site module through a CSS pseudo-element
    PseudoElement,
}

impl HintPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            HintPosition::BelowCenter => "below-center",
            HintPosition::BelowLeft => "below-left",
            HintPosition::BelowRight => "below-right",
            HintPosition::PseudoElement => "pseudo-element",
        }
    }
}

impl fmt::Display for HintPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HintPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "below-center" => Ok(HintPosition::BelowCenter),
            "below-left" => Ok(HintPosition::BelowLeft),
            "below-right" => Ok(HintPosition::BelowRight),
            "pseudo-element" => Ok(HintPosition::PseudoElement),
            other => Err(format!("unknown hint position {:?}", other)),
        }
    }
}

/// A hint a site module can show
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintDescriptor {
    /// Unique within its site
    pub id: String,
    pub label: String,
    /// Display text, e.g. `Ctrl + Shift + F`
    pub shortcut: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(default)]
    pub position: HintPosition,
    #[serde(default = "default_true")]
    pub default_enabled: bool,
}

fn default_true() -> bool {
    true
}

impl HintDescriptor {
    pub fn new(id: impl Into<String>, label: impl Into<String>, shortcut: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            shortcut: shortcut.into(),
            selector: None,
            position: HintPosition::default(),
            default_enabled: true,
        }
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn with_position(mut self, position: HintPosition) -> Self {
        self.position = position;
        self
    }

    pub fn enabled_by_default(mut self, enabled: bool) -> Self {
        self.default_enabled = enabled;
        self
    }

    /// Stored state if it is a boolean, else the default
    pub fn resolve_enabled(&self, stored: Option<&Value>) -> bool {
        stored.and_then(Value::as_bool).unwrap_or(self.default_enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_enabled() {
        let hint = HintDescriptor::new("x", "X", "/").enabled_by_default(true);
        assert!(hint.resolve_enabled(None));
        assert!(!hint.resolve_enabled(Some(&json!(false))));
        assert!(hint.resolve_enabled(Some(&json!("false"))));
        assert!(hint.resolve_enabled(Some(&json!(0))));
    }

    #[test]
    fn test_serde_shape() {
        let hint: HintDescriptor = serde_json::from_value(json!({
            "id": "search-input",
            "label": "Focus search",
            "shortcut": "/",
            "selector": "input#search",
            "position": "pseudo-element",
            "defaultEnabled": true
        }))
        .unwrap();
        assert_eq!(hint.position, HintPosition::PseudoElement);
        assert!(hint.default_enabled);

        let value = serde_json::to_value(HintDescriptor::new("a", "A", "K")).unwrap();
        assert_eq!(value["position"], "below-center");
        assert_eq!(value["defaultEnabled"], true);
        assert!(value.get("selector").is_none());
    }

    #[test]
    fn test_missing_default_enabled_matches_constructor() {
        let hint: HintDescriptor = serde_json::from_value(json!({
            "id": "a",
            "label": "A",
            "shortcut": "K"
        }))
        .unwrap();
        assert_eq!(hint, HintDescriptor::new("a", "A", "K"));
    }

    #[test]
    fn test_position_from_str() {
        assert_eq!("below-right".parse::<HintPosition>(), Ok(HintPosition::BelowRight));
        assert!("above".parse::<HintPosition>().is_err());
    }
}
