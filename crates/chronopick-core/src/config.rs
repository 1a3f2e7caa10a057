//! Loading and validating picker configuration from TOML.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::{info, warn};
use masterror::AppError;
use thiserror::Error;

pub use chronopick_proto::config::*;

/// Errors raised while loading a [`PickerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The file content is not valid TOML for a picker configuration.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    /// The configuration decoded but is internally inconsistent.
    #[error("invalid picker configuration: {0}")]
    Validation(#[from] ConfigValidationError),
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::internal(err.to_string())
    }
}

/// Decodes and validates a configuration from TOML text.
///
/// # Errors
///
/// Returns [`ConfigError`] when decoding or validation fails.
pub fn from_toml_str(content: &str) -> Result<PickerConfig, ConfigError> {
    let config: PickerConfig = toml::from_str(content)?;
    config.validate()?;

    Ok(config)
}

/// Reads, decodes and validates a configuration file.
///
/// # Errors
///
/// Returns [`ConfigError`] when the file cannot be read, decoded or
/// validated.
pub fn load_config(path: &Path) -> Result<PickerConfig, ConfigError> {
    let mut content = String::new();
    File::open(path).and_then(|mut file| file.read_to_string(&mut content))?;

    info!("decoding picker config file {path:?}");

    match from_toml_str(&content) {
        Ok(config) => {
            info!("picker config file loaded successfully");
            Ok(config)
        }
        Err(err) => {
            warn!("failed to load picker config file: {err}");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn loads_a_valid_config_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            r#"
            mode = "Range"
            min_date = "2024-01-01"
            max_date = "2024-12-31"
            "#
        )
        .expect("write config");

        let config = load_config(file.path()).expect("load");

        assert_eq!(config.mode, SelectionMode::Range);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_config(Path::new("/nonexistent/picker.toml"))
            .expect_err("missing file");

        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = from_toml_str("mode = [not toml").expect_err("malformed");

        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn inconsistent_config_is_a_validation_error() {
        let err = from_toml_str(
            r#"
            min_date = "2024-12-31"
            max_date = "2024-01-01"
            "#,
        )
        .expect_err("inverted bounds");

        assert!(matches!(
            err,
            ConfigError::Validation(ConfigValidationError::InvertedDateBounds { .. })
        ));
    }
}
