//! Configuration loading from disk and environment.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml::{Table, Value};

use crate::config::schema::Config;
use crate::config::validation::{normalize, validate_config, ValidationError};
use crate::reload::Loader;

/// File name probed in every search directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Directories probed for the config file, in order.
pub const SEARCH_DIRS: [&str; 3] = [".", "./config/", "../"];

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config file is a directory: {0}")]
    IsDirectory(PathBuf),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment variable {var} has invalid value {value:?}")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("Invalid override for {key}: {value:?}")]
    Override { key: String, value: String },
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Copy)]
enum EnvKind {
    Str,
    Bool,
    Int,
}

/// Config keys bound to environment variables. Environment wins over the file.
const ENV_BINDINGS: &[(&str, &str, EnvKind)] = &[
    ("immich_url", "KIOSK_IMMICH_URL", EnvKind::Str),
    ("immich_api_key", "KIOSK_IMMICH_API_KEY", EnvKind::Str),
    ("kiosk.port", "KIOSK_PORT", EnvKind::Int),
    ("kiosk.watch_config", "KIOSK_WATCH_CONFIG", EnvKind::Bool),
    ("kiosk.fetched_assets_size", "KIOSK_FETCHED_ASSETS_SIZE", EnvKind::Int),
    ("kiosk.password", "KIOSK_PASSWORD", EnvKind::Str),
    ("kiosk.cache", "KIOSK_CACHE", EnvKind::Bool),
    ("kiosk.prefetch", "KIOSK_PREFETCH", EnvKind::Bool),
    ("kiosk.asset_weighting", "KIOSK_ASSET_WEIGHTING", EnvKind::Bool),
    ("kiosk.debug", "KIOSK_DEBUG", EnvKind::Bool),
    ("kiosk.debug_verbose", "KIOSK_DEBUG_VERBOSE", EnvKind::Bool),
];

/// Where environment variables are read from.
#[derive(Debug, Clone, Default)]
pub enum EnvSource {
    /// The process environment, read fresh on every load.
    #[default]
    Process,
    /// A fixed set of variables.
    Fixed(HashMap<String, String>),
}

impl EnvSource {
    fn var(&self, name: &str) -> Option<String> {
        match self {
            EnvSource::Process => std::env::var(name).ok(),
            EnvSource::Fixed(vars) => vars.get(name).cloned(),
        }
    }
}

/// Find the config file in `dirs`, returning its absolute path.
///
/// A missing file is not an error; a candidate that is a directory is.
pub fn resolve_config_path<P: AsRef<Path>>(dirs: &[P]) -> Result<Option<PathBuf>, ConfigError> {
    for dir in dirs {
        let candidate = dir.as_ref().join(CONFIG_FILE_NAME);
        let metadata = match fs::metadata(&candidate) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => {
                return Err(ConfigError::Io {
                    path: candidate,
                    source: e,
                })
            }
        };

        if metadata.is_dir() {
            return Err(ConfigError::IsDirectory(candidate));
        }

        let absolute = candidate.canonicalize().map_err(|e| ConfigError::Io {
            path: candidate.clone(),
            source: e,
        })?;
        return Ok(Some(absolute));
    }

    Ok(None)
}

/// Loads the kiosk configuration from a TOML file plus environment overrides.
#[derive(Debug, Clone, Default)]
pub struct FileLoader {
    path: Option<PathBuf>,
    env: EnvSource,
}

impl FileLoader {
    /// Create a loader for an already-resolved path (or none).
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            env: EnvSource::Process,
        }
    }

    /// Resolve the config file through the standard search directories.
    pub fn discover() -> Result<Self, ConfigError> {
        let path = resolve_config_path(&SEARCH_DIRS)?;
        match &path {
            Some(p) => tracing::info!(path = %p.display(), "Using config file"),
            None => tracing::info!("Not using {}", CONFIG_FILE_NAME),
        }
        Ok(Self::new(path))
    }

    /// Replace the environment source.
    pub fn with_env(mut self, env: EnvSource) -> Self {
        self.env = env;
        self
    }

    /// The watched config file, if one was found.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn read_table(&self) -> Result<Table, ConfigError> {
        let Some(path) = &self.path else {
            return Ok(Table::new());
        };

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;
        Ok(toml::from_str::<Table>(&content)?)
    }

    fn apply_env(&self, table: &mut Table) -> Result<(), ConfigError> {
        for &(key, var, kind) in ENV_BINDINGS {
            let Some(raw) = self.env.var(var) else {
                continue;
            };

            let parsed = match kind {
                EnvKind::Str => Some(Value::String(raw.clone())),
                EnvKind::Bool => raw.trim().to_lowercase().parse::<bool>().ok().map(Value::Boolean),
                EnvKind::Int => raw.trim().parse::<i64>().ok().map(Value::Integer),
            };
            let value = parsed.ok_or(ConfigError::Env { var, value: raw })?;

            set_dotted(table, key, value);
        }
        Ok(())
    }
}

fn set_dotted(table: &mut Table, key: &str, value: Value) {
    match key.split_once('.') {
        Some((section, rest)) => {
            let entry = table
                .entry(section.to_string())
                .or_insert_with(|| Value::Table(Table::new()));
            if !entry.is_table() {
                *entry = Value::Table(Table::new());
            }
            if let Value::Table(inner) = entry {
                set_dotted(inner, rest, value);
            }
        }
        None => {
            table.insert(key.to_string(), value);
        }
    }
}

impl Loader for FileLoader {
    type Config = Config;

    fn load(&self) -> Result<Config, ConfigError> {
        let mut table = self.read_table()?;
        self.apply_env(&mut table)?;

        let mut config: Config = Value::Table(table).try_into()?;
        normalize(&mut config);
        validate_config(&config).map_err(ConfigError::Validation)?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn env(pairs: &[(&str, &str)]) -> EnvSource {
        EnvSource::Fixed(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_from_file() {
        let file = write_config(
            r#"
            immich_url = "photos.local"
            immich_api_key = "key"
            refresh = 30
            theme = "BUBBLE"
            "#,
        );

        let loader = FileLoader::new(Some(file.path().to_path_buf())).with_env(env(&[]));
        let config = loader.load().unwrap();

        assert_eq!(config.refresh, 30);
        assert_eq!(config.theme, "bubble");
        assert_eq!(config.immich_url, "http://photos.local");
    }

    #[test]
    fn test_env_overrides_file() {
        let file = write_config(
            r#"
            immich_url = "http://photos.local"
            immich_api_key = "file-key"

            [kiosk]
            port = 4000
            "#,
        );

        let loader = FileLoader::new(Some(file.path().to_path_buf())).with_env(env(&[
            ("KIOSK_IMMICH_API_KEY", "env-key"),
            ("KIOSK_PORT", "5000"),
            ("KIOSK_DEBUG", "TRUE"),
        ]));
        let config = loader.load().unwrap();

        assert_eq!(config.immich_api_key, "env-key");
        assert_eq!(config.kiosk.port, 5000);
        assert!(config.kiosk.debug);
    }

    #[test]
    fn test_env_only_without_file() {
        let loader = FileLoader::new(None).with_env(env(&[
            ("KIOSK_IMMICH_URL", "https://photos.local"),
            ("KIOSK_IMMICH_API_KEY", "12345"),
        ]));
        let config = loader.load().unwrap();

        assert_eq!(config.immich_api_key, "12345");
        assert_eq!(config.refresh, 60);
    }

    #[test]
    fn test_invalid_env_value() {
        let loader = FileLoader::new(None).with_env(env(&[("KIOSK_CACHE", "maybe")]));
        let err = loader.load().unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "KIOSK_CACHE", .. }));
    }

    #[test]
    fn test_missing_required_fields() {
        let loader = FileLoader::new(None).with_env(env(&[]));
        let err = loader.load().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("immich_url is missing"));
    }

    #[test]
    fn test_malformed_toml() {
        let file = write_config("refresh = = 30");
        let loader = FileLoader::new(Some(file.path().to_path_buf())).with_env(env(&[]));
        assert!(matches!(loader.load(), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_wrong_type_is_parse_error() {
        let file = write_config(
            r#"
            immich_url = "http://photos.local"
            immich_api_key = "key"
            refresh = "soon"
            "#,
        );
        let loader = FileLoader::new(Some(file.path().to_path_buf())).with_env(env(&[]));
        assert!(matches!(loader.load(), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let loader = FileLoader::new(Some(dir.path().join("gone.toml"))).with_env(env(&[]));
        assert!(matches!(loader.load(), Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_resolve_search_order() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        fs::write(second.path().join(CONFIG_FILE_NAME), "refresh = 1").unwrap();

        let resolved = resolve_config_path(&[first.path(), second.path()])
            .unwrap()
            .unwrap();
        assert!(resolved.is_absolute());
        assert_eq!(
            resolved,
            second.path().join(CONFIG_FILE_NAME).canonicalize().unwrap()
        );

        fs::write(first.path().join(CONFIG_FILE_NAME), "refresh = 2").unwrap();
        let resolved = resolve_config_path(&[first.path(), second.path()])
            .unwrap()
            .unwrap();
        assert_eq!(
            resolved,
            first.path().join(CONFIG_FILE_NAME).canonicalize().unwrap()
        );
    }

    #[test]
    fn test_resolve_none_and_directory() {
        let dir = TempDir::new().unwrap();
        assert!(resolve_config_path(&[dir.path()]).unwrap().is_none());

        fs::create_dir(dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert!(matches!(
            resolve_config_path(&[dir.path()]),
            Err(ConfigError::IsDirectory(_))
        ));
    }
}
