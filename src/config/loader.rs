//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::ConfigSnapshot;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate a configuration snapshot from a TOML file.
///
/// The returned snapshot is complete: a decode or validation failure never
/// yields a partially-applied tree.
pub fn load_config(path: &Path) -> Result<ConfigSnapshot, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: ConfigSnapshot = toml::from_str(&content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_valid_file() {
        let file = write_config(
            r#"
            [server]
            bind_address = ":8443"

            [routes.api]
            paths = ["/v1/*"]
            upstream = "http://backend:80"
            "#,
        );

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.server.bind_address, ":8443");
        assert!(config.routes.contains_key("api"));
    }

    #[test]
    fn rejects_malformed_toml() {
        let file = write_config("server = [not toml");
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn rejects_semantically_invalid_config() {
        let file = write_config(
            r#"
            [routes.api]
            paths = []
            upstream = "http://backend:80"
            "#,
        );
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            load_config(Path::new("/nonexistent/postern.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
