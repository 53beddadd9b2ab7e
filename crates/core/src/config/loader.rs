//! Configuration loading.
//!
//! A TOML file is the base layer; `CLIPFORGE_*` environment variables are
//! merged on top, split on underscores, so `CLIPFORGE_SERVER_PORT=9000`
//! overrides `[server] port`. Only `[auth]` is mandatory in the file, every
//! other section falls back to its defaults.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("CLIPFORGE_").split("_"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Parses a bare TOML document with no environment layer. Test fixtures
/// build their configs through this.
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_minimal_config_gets_section_defaults() {
        let config = load_config_from_str("[auth]\nmethod = \"none\"").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.synthesis.target_tempo, 1.35);
        assert!(config.embedding.is_none());
    }

    #[test]
    fn test_explicit_values_override_defaults() {
        let toml = r#"
[auth]
method = "none"

[server]
host = "127.0.0.1"
port = 3000

[synthesis]
target_tempo = 1.1

[scheduler]
daily_cap = 2
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(config.synthesis.target_tempo, 1.1);
        assert_eq!(config.scheduler.daily_cap, 2);
    }

    #[test]
    fn test_auth_section_is_mandatory() {
        let result = load_config_from_str("[server]\nport = 8080");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[auth]\nmethod = \"none\"\n\n[server]\nport = 3000").unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.server.port, 3000);
    }
}
