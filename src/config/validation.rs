//! Configuration normalization and validation.
//!
//! # Responsibilities
//! - Normalize free-form strings (lowercase names, URL scheme, list cleanup)
//! - Drop incomplete optional entries (weather locations)
//! - Validate required fields and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: &Config → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::Config;

const DEFAULT_SCHEME: &str = "http://";

/// Smallest and largest accepted `kiosk.fetched_assets_size`.
const FETCHED_ASSETS_RANGE: (u32, u32) = (1, 1000);

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is missing")]
    MissingField(&'static str),

    #[error("{field} is not a valid URL ({url}): {reason}")]
    InvalidUrl {
        field: &'static str,
        url: String,
        reason: String,
    },

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },
}

/// Apply every normalization step in order.
pub fn normalize(config: &mut Config) {
    lowercase_fields(config);
    clean_album_and_person(config);
    ensure_url_scheme(config);
    lowercase_hide_countries(config);
    drop_incomplete_weather(config);

    if config.kiosk.debug_verbose {
        config.kiosk.debug = true;
    }
}

/// Lowercase the fields whose values are matched case-insensitively.
pub(crate) fn lowercase_fields(config: &mut Config) {
    for field in [
        &mut config.theme,
        &mut config.layout,
        &mut config.image_fit,
        &mut config.image_effect,
        &mut config.transition,
    ] {
        *field = field.to_lowercase();
    }
}

fn clean_ids(ids: &[String], placeholder: &str) -> Vec<String> {
    ids.iter()
        .filter(|id| !id.is_empty() && id.as_str() != placeholder)
        .map(|id| id.trim().to_string())
        .collect()
}

fn clean_album_and_person(config: &mut Config) {
    config.album = clean_ids(&config.album, "ALBUM_ID");
    config.person = clean_ids(&config.person, "PERSON_ID");
}

fn ensure_url_scheme(config: &mut Config) {
    if config.immich_url.is_empty() {
        return;
    }

    let lower = config.immich_url.to_lowercase();
    if !lower.starts_with("http://") && !lower.starts_with("https://") {
        config.immich_url = format!("{}{}", DEFAULT_SCHEME, config.immich_url);
    }
}

pub(crate) fn lowercase_hide_countries(config: &mut Config) {
    for country in &mut config.hide_countries {
        *country = country.to_lowercase();
    }
}

fn drop_incomplete_weather(config: &mut Config) {
    config.weather_locations.retain(|w| {
        let missing: Vec<&str> = [
            (w.name.is_empty(), "name"),
            (w.lat.is_empty(), "latitude"),
            (w.lon.is_empty(), "longitude"),
            (w.api.is_empty(), "API key"),
        ]
        .into_iter()
        .filter_map(|(is_missing, field)| is_missing.then_some(field))
        .collect();

        if missing.is_empty() {
            return true;
        }

        tracing::warn!(
            missing_fields = %missing.join(", "),
            name = %w.name,
            "Weather location is missing required fields, ignoring it"
        );
        false
    });
}

/// Validate a normalized configuration.
pub fn validate_config(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.immich_url.is_empty() {
        errors.push(ValidationError::MissingField("immich_url"));
    } else if let Err(e) = Url::parse(&config.immich_url) {
        errors.push(ValidationError::InvalidUrl {
            field: "immich_url",
            url: config.immich_url.clone(),
            reason: e.to_string(),
        });
    }

    if config.immich_api_key.is_empty() {
        errors.push(ValidationError::MissingField("immich_api_key"));
    }

    let (min, max) = FETCHED_ASSETS_RANGE;
    let size = config.kiosk.fetched_assets_size;
    if !(min..=max).contains(&size) {
        errors.push(ValidationError::OutOfRange {
            field: "kiosk.fetched_assets_size",
            value: u64::from(size),
            min: u64::from(min),
            max: u64::from(max),
        });
    }

    if config.refresh == 0 {
        errors.push(ValidationError::OutOfRange {
            field: "refresh",
            value: 0,
            min: 1,
            max: u64::from(u32::MAX),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
