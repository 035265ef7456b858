//! Spy configuration
//!
//! Options mirror the classic scrollspy option object:
//! `{ element: 'body', offset: 10, method: 'auto', throttle: 75 }`.
//! Mismatched option types are reported as warnings and never abort
//! construction.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::ConfigError;

/// Name used as the prefix of configuration warnings
pub const NAME: &str = "scrollspy";

/// Default scroll container selector
pub const DEFAULT_ELEMENT: &str = "body";

/// Default activation offset in pixels
pub const DEFAULT_OFFSET: f64 = 10.0;

/// Default throttle window for layout events
pub const DEFAULT_THROTTLE: Duration = Duration::from_millis(75);

/// Option names and the value types they accept
const OPTION_TYPES: [(&str, &str); 4] = [
    ("element", "(string|element|component)"),
    ("offset", "number"),
    ("method", "string"),
    ("throttle", "number"),
];

/// How target offsets are measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OffsetMethod {
    /// `Position` for element containers, `Offset` for the window
    #[default]
    Auto,
    /// Relative to the container's scrolled content origin
    Position,
    /// Relative to the document
    Offset,
}

impl FromStr for OffsetMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "auto" => Ok(OffsetMethod::Auto),
            "position" => Ok(OffsetMethod::Position),
            "offset" => Ok(OffsetMethod::Offset),
            other => Err(ConfigError::InvalidMethod(other.to_string())),
        }
    }
}

impl fmt::Display for OffsetMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OffsetMethod::Auto => "auto",
            OffsetMethod::Position => "position",
            OffsetMethod::Offset => "offset",
        };
        write!(f, "{}", name)
    }
}

/// Reference to the scroll container
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementRef<N> {
    /// CSS selector resolved against the document (`body` means the window)
    Selector(String),
    /// A specific element
    Node(N),
    /// A component; its root element is used
    Component(N),
    /// No container: the spy stays idle
    None,
}

/// Scrollspy configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SpyConfig<N> {
    /// Scroll container
    pub element: ElementRef<N>,
    /// Pixels added to the scroll position before comparing against offsets
    pub offset: f64,
    /// Offset measurement strategy
    pub method: OffsetMethod,
    /// Coalescing window for resize, orientation, transition and mutation events
    pub throttle: Duration,
}

impl<N> Default for SpyConfig<N> {
    fn default() -> Self {
        Self {
            element: ElementRef::Selector(DEFAULT_ELEMENT.to_string()),
            offset: DEFAULT_OFFSET,
            method: OffsetMethod::Auto,
            throttle: DEFAULT_THROTTLE,
        }
    }
}

impl<N> SpyConfig<N> {
    /// Use a selector for the scroll container
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.element = ElementRef::Selector(selector.into());
        self
    }

    /// Use a specific element as the scroll container
    pub fn with_element(mut self, element: ElementRef<N>) -> Self {
        self.element = element;
        self
    }

    /// Set the activation offset
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    /// Set the offset method
    pub fn with_method(mut self, method: OffsetMethod) -> Self {
        self.method = method;
        self
    }

    /// Set the throttle window
    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    /// Build a configuration from an options object
    ///
    /// Missing options keep their defaults. Values of the wrong type are
    /// reported with a warning; numeric strings are still accepted for
    /// numeric options and unknown method names fall back to document
    /// offsets.
    pub fn from_options(options: &Value) -> Self {
        let mut config = Self::default();
        let Some(map) = options.as_object() else {
            if !options.is_null() {
                tracing::warn!(
                    "{}: Options provided type \"{}\" but expected type \"object\"",
                    NAME,
                    value_type(options)
                );
            }
            return config;
        };
        check_option_types(map);

        if let Some(element) = map.get("element") {
            match element {
                Value::String(selector) if !selector.is_empty() => {
                    config.element = ElementRef::Selector(selector.clone());
                }
                Value::Null | Value::Bool(false) | Value::String(_) => {
                    config.element = ElementRef::None;
                }
                _ => {}
            }
        }
        if let Some(offset) = map.get("offset").and_then(coerce_number) {
            config.offset = offset;
        }
        if let Some(method) = map.get("method") {
            config.method = match method.as_str().map(OffsetMethod::from_str) {
                Some(Ok(method)) => method,
                Some(Err(err)) => {
                    tracing::warn!("{}: {}, measuring from the document", NAME, err);
                    OffsetMethod::Offset
                }
                None => config.method,
            };
        }
        if let Some(throttle) = map.get("throttle").and_then(coerce_number) {
            config.throttle = Duration::from_millis(throttle.max(0.0).round() as u64);
        }
        config
    }

    /// Build a configuration from a directive-style binding
    ///
    /// `arg` names the container element id (`#` is prepended). Numeric
    /// modifiers set the offset and `auto`, `position` or `offset` modifiers
    /// set the method. A string value names the container, a numeric value
    /// sets the offset and an object value supplies any known options.
    pub fn from_binding(arg: Option<&str>, modifiers: &[&str], value: Option<&Value>) -> Self {
        let mut options = Map::new();
        if let Some(arg) = arg.filter(|a| !a.is_empty()) {
            options.insert("element".to_string(), Value::String(format!("#{}", arg)));
        }
        for modifier in modifiers {
            if !modifier.is_empty() && modifier.chars().all(|c| c.is_ascii_digit()) {
                let offset = modifier.parse::<u64>().unwrap_or(0);
                options.insert("offset".to_string(), Value::from(offset));
            } else if OffsetMethod::from_str(modifier).is_ok() {
                options.insert("method".to_string(), Value::String((*modifier).to_string()));
            }
        }
        match value {
            Some(Value::String(element)) => {
                options.insert("element".to_string(), Value::String(element.clone()));
            }
            Some(Value::Number(number)) => {
                let offset = number.as_f64().unwrap_or(0.0).round();
                options.insert("offset".to_string(), Value::from(offset));
            }
            Some(Value::Object(object)) => {
                for (key, value) in object {
                    if OPTION_TYPES.iter().any(|(name, _)| *name == key.as_str()) {
                        options.insert(key.clone(), value.clone());
                    }
                }
            }
            _ => {}
        }
        Self::from_options(&Value::Object(options))
    }
}

fn value_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Warn about options whose value type does not match
fn check_option_types(options: &Map<String, Value>) {
    for (property, expected) in OPTION_TYPES {
        let Some(value) = options.get(property) else {
            continue;
        };
        let actual = value_type(value);
        if !expected.contains(actual) {
            tracing::warn!(
                "{}: Option \"{}\" provided type \"{}\" but expected type \"{}\"",
                NAME,
                property,
                actual,
                expected
            );
        }
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}
