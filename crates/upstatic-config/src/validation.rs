use std::path::PathBuf;

use crate::{ConfigError, LoggingConfig, UpstaticConfig};

/// Non-fatal configuration issues.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// `logging.level` is neither a level name nor a parseable directive string.
    LoggingLevelInvalid { value: String, normalized: String },
    /// `logging.file` points into a directory that does not exist.
    LoggingFileDirectoryMissing { resolved: PathBuf },
}

impl UpstaticConfig {
    /// Report recoverable problems; the config stays usable.
    #[must_use]
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut out = Vec::new();
        validate_logging(&self.logging, &mut out);
        out
    }

    /// Fatal checks run on every load.
    pub(crate) fn check(&self) -> Result<(), ConfigError> {
        if self.suggest.cadence_ms == 0 {
            return Err(ConfigError::InvalidValue {
                toml_path: "suggest.cadence_ms".to_owned(),
                message: "must be >= 1".to_owned(),
            });
        }
        if self.suggest.event_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                toml_path: "suggest.event_capacity".to_owned(),
                message: "must be >= 1".to_owned(),
            });
        }
        Ok(())
    }
}

fn validate_logging(logging: &LoggingConfig, out: &mut Vec<ConfigWarning>) {
    let normalized = LoggingConfig::normalize_level_directives(&logging.level);
    if !logging.level.trim().is_empty()
        && tracing_subscriber::EnvFilter::try_new(normalized.clone()).is_err()
    {
        out.push(ConfigWarning::LoggingLevelInvalid {
            value: logging.level.clone(),
            normalized,
        });
    }

    if let Some(parent) = logging.file.as_deref().and_then(|file| file.parent()) {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            out.push(ConfigWarning::LoggingFileDirectoryMissing {
                resolved: parent.to_path_buf(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_config_has_no_warnings() {
        assert!(UpstaticConfig::default().validate().is_empty());
    }

    #[test]
    fn bad_level_is_reported() {
        let mut config = UpstaticConfig::default();
        config.logging.level = "upstatic=verbose".to_owned();
        assert!(matches!(
            config.validate().as_slice(),
            [ConfigWarning::LoggingLevelInvalid { .. }]
        ));
    }

    #[test]
    fn missing_log_directory_is_reported() {
        let mut config = UpstaticConfig::default();
        config.logging.file = Some(PathBuf::from("/definitely/not/here/upstatic.log"));
        assert_eq!(
            config.validate(),
            vec![ConfigWarning::LoggingFileDirectoryMissing {
                resolved: PathBuf::from("/definitely/not/here"),
            }]
        );
    }
}
