//! Configuration values and their normalization before they are written.

use crate::scalar::ScalarValue;
use std::fmt;

/// A configuration value as supplied by the caller: raw text plus a flag
/// marking it as a secret.
///
/// Secret values are written inside the reserved `{secure: ...}` wrapper;
/// the raw text of a secret is expected to be ciphertext already.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigValue {
    raw: String,
    secure: bool,
}

impl ConfigValue {
    /// A plain value.
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            secure: false,
        }
    }

    /// A secret value.
    pub fn secure(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            secure: true,
        }
    }

    /// The raw text.
    pub fn raw_value(&self) -> &str {
        &self.raw
    }

    /// Whether the value is a secret.
    pub fn is_secure(&self) -> bool {
        self.secure
    }
}

impl From<&str> for ConfigValue {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for ConfigValue {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

/// A value after [`adjust_value`] decided how it should be typed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AdjustedValue {
    /// Written as a YAML boolean.
    Bool(bool),
    /// Written as a YAML integer.
    Int(i64),
    /// Written as a YAML string.
    Str(String),
}

impl fmt::Display for AdjustedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdjustedValue::Bool(value) => write!(f, "{}", value),
            AdjustedValue::Int(value) => write!(f, "{}", value),
            AdjustedValue::Str(value) => write!(f, "{}", value),
        }
    }
}

impl From<AdjustedValue> for ScalarValue {
    fn from(value: AdjustedValue) -> Self {
        match value {
            AdjustedValue::Bool(value) => ScalarValue::from(value),
            AdjustedValue::Int(value) => ScalarValue::from(value),
            AdjustedValue::Str(value) => ScalarValue::new(value),
        }
    }
}

/// Decide how a value is typed when written.
///
/// Only path-mode writes of non-secret values are typed: `true`/`false`
/// become booleans and decimal integers become integers, except that a
/// value of more than one character starting with `0` stays a string.
pub fn adjust_value(value: &ConfigValue, path: bool) -> AdjustedValue {
    let raw = value.raw_value();
    if value.is_secure() || !path {
        return AdjustedValue::Str(raw.to_string());
    }
    if raw.len() > 1 && raw.starts_with('0') {
        return AdjustedValue::Str(raw.to_string());
    }
    match raw {
        "true" => return AdjustedValue::Bool(true),
        "false" => return AdjustedValue::Bool(false),
        _ => {}
    }
    match raw.parse::<i64>() {
        Ok(int) => AdjustedValue::Int(int),
        Err(_) => AdjustedValue::Str(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_mode_typing() {
        let adjust = |raw: &str| adjust_value(&ConfigValue::new(raw), true);
        assert_eq!(adjust("true"), AdjustedValue::Bool(true));
        assert_eq!(adjust("false"), AdjustedValue::Bool(false));
        assert_eq!(adjust("42"), AdjustedValue::Int(42));
        assert_eq!(adjust("-7"), AdjustedValue::Int(-7));
        assert_eq!(adjust("0"), AdjustedValue::Int(0));
        assert_eq!(adjust("007"), AdjustedValue::Str("007".to_string()));
        assert_eq!(adjust("3.5"), AdjustedValue::Str("3.5".to_string()));
        assert_eq!(adjust("True"), AdjustedValue::Str("True".to_string()));
    }

    #[test]
    fn test_literal_and_secure_values_stay_strings() {
        assert_eq!(
            adjust_value(&ConfigValue::new("42"), false),
            AdjustedValue::Str("42".to_string())
        );
        assert_eq!(
            adjust_value(&ConfigValue::secure("true"), true),
            AdjustedValue::Str("true".to_string())
        );
    }

    #[test]
    fn test_rendering() {
        assert_eq!(ScalarValue::from(AdjustedValue::Int(1)).to_yaml_string(), "1");
        assert_eq!(ScalarValue::from(AdjustedValue::Bool(true)).to_yaml_string(), "true");
        assert_eq!(
            ScalarValue::from(AdjustedValue::Str("1".to_string())).to_yaml_string(),
            "\"1\""
        );
    }
}
