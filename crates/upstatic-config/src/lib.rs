use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

mod logging;
mod schema;
mod validation;

pub use logging::init_tracing;
pub use schema::json_schema;
pub use validation::ConfigWarning;

/// Environment variable that points at an explicit config file.
pub const UPSTATIC_CONFIG_ENV_VAR: &str = "UPSTATIC_CONFIG_PATH";

/// File names probed (in order) by [`discover_config_path`].
pub const CONFIG_FILE_NAMES: [&str; 2] = ["upstatic.toml", ".upstatic.toml"];

/// Top-level configuration, usually loaded from `upstatic.toml`.
///
/// ```toml
/// [suggest]
/// cadence_ms = 200
///
/// [logging]
/// level = "info"
/// json = false
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct UpstaticConfig {
    /// Suggestion session behaviour.
    #[serde(default)]
    pub suggest: SuggestConfig,

    /// Global logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct SuggestConfig {
    /// Interval (in milliseconds) at which a dirty query is re-ranked.
    ///
    /// Keystrokes arriving faster than this are coalesced into one pass over
    /// the latest input.
    #[serde(default = "SuggestConfig::default_cadence_ms")]
    #[schemars(range(min = 1))]
    pub cadence_ms: u64,

    /// Capacity of the per-session event channel handed to renderers.
    #[serde(default = "SuggestConfig::default_event_capacity")]
    #[schemars(range(min = 1))]
    pub event_capacity: usize,
}

impl SuggestConfig {
    fn default_cadence_ms() -> u64 {
        200
    }

    fn default_event_capacity() -> usize {
        256
    }

    pub fn cadence(&self) -> Duration {
        Duration::from_millis(self.cadence_ms.max(1))
    }
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            cadence_ms: Self::default_cadence_ms(),
            event_capacity: Self::default_event_capacity(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level, or a full `EnvFilter` directive string.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs in JSON format.
    #[serde(default)]
    pub json: bool,

    /// Mirror logs to stderr.
    #[serde(default = "LoggingConfig::default_stderr")]
    pub stderr: bool,

    /// Append logs to the given file path.
    ///
    /// If the file cannot be opened, file logging is disabled while other sinks
    /// remain active.
    #[serde(default)]
    #[schemars(with = "Option<String>")]
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    fn default_stderr() -> bool {
        true
    }

    pub(crate) fn normalize_level_directives(input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::default_level();
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "trace" => "trace".to_owned(),
            "debug" => "debug".to_owned(),
            "info" => "info".to_owned(),
            "warn" | "warning" => "warn".to_owned(),
            "error" => "error".to_owned(),
            _ => trimmed.to_owned(),
        }
    }

    fn config_env_filter(&self) -> tracing_subscriber::EnvFilter {
        let directives = Self::normalize_level_directives(&self.level);
        tracing_subscriber::EnvFilter::try_new(directives).unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::default()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        })
    }

    /// Create the effective `EnvFilter`.
    ///
    /// If `RUST_LOG` is set, it is merged into the configured directives.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        let env_directives = std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        let config_directives = Self::normalize_level_directives(&self.level);

        match env_directives {
            Some(env_directives) => {
                let combined = format!("{config_directives},{env_directives}");
                tracing_subscriber::EnvFilter::try_new(combined)
                    .or_else(|_| tracing_subscriber::EnvFilter::try_new(env_directives))
                    .unwrap_or_else(|_| self.config_env_filter())
            }
            None => self.config_env_filter(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
            stderr: Self::default_stderr(),
            file: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
    #[error("invalid value for `{toml_path}`: {message}")]
    InvalidValue { toml_path: String, message: String },
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // The default `Display` includes a snippet of the input; keep only the message.
        ConfigError::Toml(err.message().to_owned())
    }
}

impl UpstaticConfig {
    /// Load a config file from TOML.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::load_from_str(&text)
    }

    /// Parse and validate a TOML document. Fatal validation problems are
    /// returned as [`ConfigError::InvalidValue`].
    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        let config: UpstaticConfig = toml::from_str(text)?;
        config.check()?;
        Ok(config)
    }
}

/// Locate a config file for `root`.
///
/// `UPSTATIC_CONFIG_PATH` wins when set (relative paths are resolved against
/// `root`); otherwise the names in [`CONFIG_FILE_NAMES`] are probed.
pub fn discover_config_path(root: &Path) -> Option<PathBuf> {
    if let Some(value) = std::env::var_os(UPSTATIC_CONFIG_ENV_VAR) {
        if !value.is_empty() {
            let path = PathBuf::from(value);
            return Some(if path.is_absolute() {
                path
            } else {
                root.join(path)
            });
        }
    }

    CONFIG_FILE_NAMES
        .iter()
        .map(|name| root.join(name))
        .find(|candidate| candidate.is_file())
}

/// Load the config for `root`, falling back to defaults when no file exists.
pub fn load_for_root(root: &Path) -> Result<UpstaticConfig, ConfigError> {
    match discover_config_path(root) {
        Some(path) => UpstaticConfig::load_from_path(path),
        None => Ok(UpstaticConfig::default()),
    }
}
