use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Base address of the Todoc backend
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Overrides the default `<data dir>/todoc/storage.json`
    #[serde(default)]
    pub storage_path: Option<PathBuf>,

    /// Try the stored refresh token once on 401 before logging out
    #[serde(default)]
    pub silent_refresh: bool,

    /// Requests wait indefinitely unless set
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            storage_path: None,
            silent_refresh: false,
            timeout_secs: None,
        }
    }
}

impl Settings {
    /// Load `todoc.toml` (or `$TODOC_CONFIG`), then `VITE_*` and `TODOC_*`
    /// environment overrides
    pub fn new() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("TODOC_CONFIG").unwrap_or_else(|_| "todoc.toml".to_string());

        Self::load(&config_path, true)
    }

    /// Load an explicit config file, still honoring environment overrides
    pub fn with_config_file(path: &str) -> Result<Self, ConfigError> {
        Self::load(path, true)
    }

    /// Load from a config file only, ignoring the environment
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::load(path, false)
    }

    fn load(config_path: &str, with_env: bool) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(File::with_name(config_path).required(false));

        if with_env {
            builder = builder
                .add_source(Environment::with_prefix("VITE"))
                .add_source(Environment::with_prefix("TODOC").try_parsing(true));
        }

        builder.build()?.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.api_url.is_empty() {
            return Err("api_url is required".to_string());
        }
        if !self.api_url.starts_with("http") {
            return Err("api_url must be a valid HTTP(S) URL".to_string());
        }
        if self.timeout_secs == Some(0) {
            return Err("timeout_secs must be greater than zero".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let settings = Settings::from_file(path.to_str().unwrap()).unwrap();

        assert_eq!(settings.api_url, "http://localhost:8000");
        assert!(!settings.silent_refresh);
        assert_eq!(settings.timeout_secs, None);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_reads_values_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "api_url = \"https://api.todoc.example\"").unwrap();
        writeln!(file, "silent_refresh = true").unwrap();
        writeln!(file, "timeout_secs = 30").unwrap();

        let settings = Settings::from_file(file.path().to_str().unwrap()).unwrap();

        assert_eq!(settings.api_url, "https://api.todoc.example");
        assert!(settings.silent_refresh);
        assert_eq!(settings.timeout_secs, Some(30));
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        let mut settings = Settings::default();

        settings.api_url = String::new();
        assert!(settings.validate().is_err());

        settings.api_url = "localhost:8000".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let settings = Settings {
            timeout_secs: Some(0),
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }
}
