//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the kiosk.
//! All types derive Serde traits for deserialization from config files.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Root configuration for the kiosk.
///
/// Produced only by the loader. A reload always builds a brand-new value;
/// nothing mutates a `Config` once it has been handed to the store.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Immich API key used to access assets.
    pub immich_api_key: String,

    /// Immich base URL.
    pub immich_url: String,

    /// Shortcut that hides the clock, date, image time and image date.
    pub disable_ui: bool,

    /// Display the clock.
    pub show_time: bool,

    /// 12 or 24 hour clock format.
    pub time_format: String,

    /// Display the date.
    pub show_date: bool,

    /// Date format.
    pub date_format: String,

    /// Seconds between fetching new images.
    pub refresh: u32,

    /// Ask the browser to disable the screensaver.
    pub disable_screensaver: bool,

    /// Hide the cursor via CSS.
    pub hide_cursor: bool,

    /// Base font size as a percentage.
    pub font_size: u32,

    /// Theme name.
    pub theme: String,

    /// Layout name.
    pub layout: String,

    /// When to start sleep mode.
    pub sleep_start: String,

    /// When to exit sleep mode.
    pub sleep_end: String,

    /// Allow archived images to be displayed.
    pub show_archived: bool,

    /// Person IDs to display.
    pub person: Vec<String>,

    /// Album IDs to display.
    pub album: Vec<String>,

    /// Fit style for the main image.
    pub image_fit: String,

    /// Effect applied to the image, if any.
    pub image_effect: String,

    /// Amount of effect to apply.
    pub image_effect_amount: u32,

    /// Use the original image rather than a preview.
    pub use_original_image: bool,

    /// Display a blurred copy of the image as background.
    pub background_blur: bool,

    /// Transition between images (none, fade, cross-fade).
    pub transition: String,

    /// Length of the fade transition in seconds.
    pub fade_transition_duration: f32,

    /// Length of the cross-fade transition in seconds.
    pub cross_fade_transition_duration: f32,

    /// Display a progress bar.
    pub show_progress: bool,

    /// Use the custom CSS file.
    pub custom_css: bool,

    pub show_image_time: bool,
    pub image_time_format: String,
    pub show_image_date: bool,
    pub image_date_format: String,
    pub show_image_description: bool,

    /// Display EXIF data (f-number, ISO, shutter speed, focal length).
    pub show_image_exif: bool,

    pub show_image_location: bool,

    /// Country names hidden from location information.
    pub hide_countries: Vec<String>,

    pub show_image_id: bool,

    /// Weather locations.
    #[serde(rename = "weather")]
    pub weather_locations: Vec<WeatherLocation>,

    /// Kiosk settings that cannot be changed through request overrides.
    pub kiosk: KioskSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            immich_api_key: String::new(),
            immich_url: String::new(),
            disable_ui: false,
            show_time: false,
            time_format: String::new(),
            show_date: false,
            date_format: String::new(),
            refresh: 60,
            disable_screensaver: false,
            hide_cursor: false,
            font_size: 100,
            theme: "fade".to_string(),
            layout: "single".to_string(),
            sleep_start: String::new(),
            sleep_end: String::new(),
            show_archived: false,
            person: Vec::new(),
            album: Vec::new(),
            image_fit: "contain".to_string(),
            image_effect: String::new(),
            image_effect_amount: 120,
            use_original_image: false,
            background_blur: true,
            transition: String::new(),
            fade_transition_duration: 1.0,
            cross_fade_transition_duration: 1.0,
            show_progress: false,
            custom_css: true,
            show_image_time: false,
            image_time_format: String::new(),
            show_image_date: false,
            image_date_format: String::new(),
            show_image_description: false,
            show_image_exif: false,
            show_image_location: false,
            hide_countries: Vec::new(),
            show_image_id: false,
            weather_locations: Vec::new(),
            kiosk: KioskSettings::default(),
        }
    }
}

impl Config {
    /// Copy of this configuration with credentials blanked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.immich_api_key = mask(&copy.immich_api_key);
        copy.kiosk.password = mask(&copy.kiosk.password);
        copy
    }
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else {
        "********".to_string()
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.kiosk.debug_verbose {
            return write!(f, "use debug_verbose for more info");
        }

        match serde_json::to_string_pretty(&self.redacted()) {
            Ok(json) => write!(f, "{}", json),
            Err(e) => {
                tracing::error!(error = %e, "Failed to render configuration");
                Err(fmt::Error)
            }
        }
    }
}

/// Settings specific to the kiosk process.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct KioskSettings {
    /// Port the kiosk listens on.
    pub port: u16,

    /// Watch the config file for changes.
    pub watch_config: bool,

    /// Size of asset requests to Immich (1..=1000).
    pub fetched_assets_size: u32,

    /// Enable API call and image caching.
    pub cache: bool,

    /// Fetch and cache an image in the background.
    pub prefetch: bool,

    /// Password protecting the frontend.
    pub password: String,

    /// Use weighting when picking assets.
    pub asset_weighting: bool,

    pub debug: bool,
    pub debug_verbose: bool,
}

impl Default for KioskSettings {
    fn default() -> Self {
        Self {
            port: 3000,
            watch_config: false,
            fetched_assets_size: 1000,
            cache: true,
            prefetch: true,
            password: String::new(),
            asset_weighting: true,
            debug: false,
            debug_verbose: false,
        }
    }
}

/// A weather location shown on the kiosk.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct WeatherLocation {
    pub name: String,
    pub lat: String,
    pub lon: String,
    pub api: String,
    pub unit: String,
    pub lang: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.refresh, 60);
        assert_eq!(config.theme, "fade");
        assert_eq!(config.image_fit, "contain");
        assert_eq!(config.kiosk.port, 3000);
        assert!(config.kiosk.cache);
        assert!(!config.kiosk.watch_config);
    }

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            immich_url = "http://photos.local"
            refresh = 30

            [kiosk]
            debug = true
            "#,
        )
        .unwrap();

        assert_eq!(config.refresh, 30);
        assert_eq!(config.layout, "single");
        assert!(config.kiosk.debug);
        assert_eq!(config.kiosk.fetched_assets_size, 1000);
    }

    #[test]
    fn test_weather_table_array() {
        let config: Config = toml::from_str(
            r#"
            [[weather]]
            name = "home"
            lat = "51.5"
            lon = "-0.1"
            api = "key"
            "#,
        )
        .unwrap();

        assert_eq!(config.weather_locations.len(), 1);
        assert_eq!(config.weather_locations[0].name, "home");
    }

    #[test]
    fn test_redacted_hides_credentials() {
        let mut config = Config::default();
        config.immich_api_key = "secret".into();
        config.kiosk.password = "hunter2".into();

        let redacted = config.redacted();
        assert_eq!(redacted.immich_api_key, "********");
        assert_eq!(redacted.kiosk.password, "********");
        assert_eq!(config.immich_api_key, "secret");
    }

    #[test]
    fn test_display_requires_debug_verbose() {
        let mut config = Config::default();
        assert_eq!(config.to_string(), "use debug_verbose for more info");

        config.kiosk.debug_verbose = true;
        assert!(config.to_string().contains("\"refresh\": 60"));
    }
}
