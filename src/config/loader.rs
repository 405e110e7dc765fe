//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::ManagedConfig;
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

/// Load and validate the startup configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ManagedConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<ManagedConfig, ConfigError> {
    let config: ManagedConfig = toml::from_str(content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            r#"
            version_file_path = "/srv/VERSION"

            [dirs]
            enrichments = "/srv/enrichments"
            config = "/srv/configs"

            [psql]
            user = "iglu"
            password = "secret"
            database = "iglu"
            addr = "db:5432"
            "#
        )
        .unwrap();

        let config = load_config(f.path()).unwrap();
        assert_eq!(config.psql.addr, "db:5432");
        assert_eq!(config.version_file_path, Path::new("/srv/VERSION"));
    }

    #[test]
    fn test_restart_settings_use_snake_case_keys() {
        let config = parse_config(
            "[services]\nrestart_attempts = 3\nrestart_all = [\"reverse-proxy\"]\n",
        )
        .unwrap();

        assert_eq!(config.services.restart_attempts, 3);
        assert_eq!(
            config.services.restart_all,
            vec![crate::services::ServiceName::ReverseProxy]
        );
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/control-plane.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("[dirs\nconfig = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_semantic_error() {
        let err = parse_config("[timeouts]\nrequest_secs = 0\n").unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "timeouts.request_secs");
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
