//! Request-time overrides of display settings.
//!
//! Overrides never touch the stored snapshot: they produce a fresh `Config`
//! for the one request that asked for them.

use serde_json::{Map, Number, Value};

use crate::config::loader::ConfigError;
use crate::config::schema::Config;
use crate::config::validation::{lowercase_fields, lowercase_hide_countries};

/// Fields that cannot be overridden from a request.
const PROTECTED_FIELDS: &[&str] = &["immich_api_key", "immich_url", "weather", "kiosk"];

impl Config {
    /// Return a copy of this configuration with `overrides` applied.
    ///
    /// Repeated keys append to list fields; the first occurrence of a list
    /// field clears the configured list. Unknown and protected keys are
    /// ignored.
    pub fn with_overrides<K, V>(&self, overrides: &[(K, V)]) -> Result<Config, ConfigError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        if overrides.is_empty() {
            return Ok(self.clone());
        }

        let mut fields = match serde_json::to_value(self) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => return Err(internal_error("configuration is not an object")),
            Err(e) => return Err(internal_error(e)),
        };

        let mut cleared: Vec<&str> = Vec::new();

        for (key, raw) in overrides {
            let (key, raw) = (key.as_ref(), raw.as_ref());
            if PROTECTED_FIELDS.contains(&key) {
                tracing::debug!(key, "Ignoring override of protected field");
                continue;
            }

            let Some(current) = fields.get_mut(key) else {
                tracing::debug!(key, "Ignoring unknown override");
                continue;
            };

            if let Value::Array(items) = current {
                if !cleared.contains(&key) {
                    items.clear();
                    cleared.push(key);
                }
                items.push(Value::String(raw.trim().to_string()));
                continue;
            }

            *current = parse_like(current, raw).ok_or_else(|| ConfigError::Override {
                key: key.to_string(),
                value: raw.to_string(),
            })?;
        }

        let mut config = from_fields(fields)?;
        lowercase_fields(&mut config);
        lowercase_hide_countries(&mut config);
        Ok(config)
    }
}

fn from_fields(fields: Map<String, Value>) -> Result<Config, ConfigError> {
    serde_json::from_value(Value::Object(fields)).map_err(internal_error)
}

fn internal_error(reason: impl std::fmt::Display) -> ConfigError {
    tracing::error!(error = %reason, "Failed to apply overrides");
    ConfigError::Override {
        key: String::new(),
        value: reason.to_string(),
    }
}

/// Parse `raw` into a value of the same JSON type as `current`.
fn parse_like(current: &Value, raw: &str) -> Option<Value> {
    let raw = raw.trim();
    match current {
        Value::Bool(_) => parse_bool(raw).map(Value::Bool),
        Value::Number(n) if n.is_u64() => raw.parse::<u64>().ok().map(Value::from),
        Value::Number(_) => raw
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        Value::String(_) => Some(Value::String(raw.to_string())),
        _ => None,
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Some(true),
        "false" | "0" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Config {
        Config {
            immich_url: "http://photos.local".into(),
            immich_api_key: "key".into(),
            album: vec!["a1".into(), "a2".into()],
            ..Config::default()
        }
    }

    #[test]
    fn test_scalar_overrides() {
        let config = base()
            .with_overrides(&[
                ("refresh", "15"),
                ("show_time", "true"),
                ("theme", "Bubble"),
                ("fade_transition_duration", "2.5"),
            ])
            .unwrap();

        assert_eq!(config.refresh, 15);
        assert!(config.show_time);
        assert_eq!(config.theme, "bubble");
        assert_eq!(config.fade_transition_duration, 2.5);
    }

    #[test]
    fn test_list_override_replaces_then_appends() {
        let config = base()
            .with_overrides(&[("album", "b1"), ("album", "b2")])
            .unwrap();
        assert_eq!(config.album, vec!["b1".to_string(), "b2".to_string()]);
    }

    #[test]
    fn test_hide_countries_override_lowercased() {
        let config = base()
            .with_overrides(&[
                ("hide_countries", "United Kingdom"),
                ("hide_countries", "FRANCE"),
            ])
            .unwrap();
        assert_eq!(
            config.hide_countries,
            vec!["united kingdom".to_string(), "france".to_string()]
        );
    }

    #[test]
    fn test_protected_and_unknown_ignored() {
        let original = base();
        let config = original
            .with_overrides(&[
                ("immich_api_key", "stolen"),
                ("kiosk", "x"),
                ("no_such_field", "1"),
            ])
            .unwrap();
        assert_eq!(config, original);
    }

    #[test]
    fn test_invalid_value_rejected() {
        let err = base().with_overrides(&[("refresh", "soon")]).unwrap_err();
        assert!(matches!(err, ConfigError::Override { ref key, .. } if key == "refresh"));
    }

    #[test]
    fn test_source_untouched() {
        let original = base();
        let _ = original.with_overrides(&[("refresh", "5")]).unwrap();
        assert_eq!(original.refresh, 60);
    }
}
