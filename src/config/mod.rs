//! Configuration management for ga4cache

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::TtlPolicy;
use crate::error::{ConfigError, Result};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// OAuth bearer token for the Data API
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Override the Data API base URL (development and tests)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_host: Option<String>,

    /// Property used when neither the spec nor `--property` names one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_property: Option<String>,

    /// User preferences
    #[serde(default)]
    pub preferences: Preferences,
}

/// User preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    /// Default output format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Lifetime of cached report results
    #[serde(default = "default_query_ttl_hours")]
    pub query_ttl_hours: u64,

    /// Lifetime of cached property metadata
    #[serde(default = "default_metadata_ttl_hours")]
    pub metadata_ttl_hours: u64,

    /// Check field names against property metadata on every query
    #[serde(default)]
    pub strict: bool,
}

fn default_query_ttl_hours() -> u64 {
    4
}

fn default_metadata_ttl_hours() -> u64 {
    24
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            format: None,
            query_ttl_hours: default_query_ttl_hours(),
            metadata_ttl_hours: default_metadata_ttl_hours(),
            strict: false,
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(".ga4cache").join("config.yaml"))
    }

    /// Resolve an optional `--config` override
    pub fn resolve_path(path: Option<&str>) -> Result<PathBuf> {
        match path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Self::default_path(),
        }
    }

    /// Load configuration from an optional path override
    pub fn load_at(path: Option<&str>) -> Result<Self> {
        Self::load_from(Self::resolve_path(path)?)
    }

    /// Load configuration, falling back to defaults when the file is absent
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        let path = Self::resolve_path(path)?;
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()).into());
        }

        let contents = std::fs::read_to_string(&path)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to an optional path override
    pub fn save_at(&self, path: Option<&str>) -> Result<()> {
        self.save_to(Self::resolve_path(path)?)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents =
            serde_yaml::to_string(self).map_err(|e| ConfigError::SaveError(e.to_string()))?;
        std::fs::write(&path, contents)?;

        // The file holds a bearer token
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(&path, perms)?;
        }

        Ok(())
    }

    /// Reject values that would make the cache unusable
    pub fn validate(&self) -> Result<()> {
        if self.preferences.metadata_ttl_hours == 0 {
            return Err(
                ConfigError::Invalid("metadata_ttl_hours must be at least 1".to_string()).into(),
            );
        }
        Ok(())
    }

    /// Validate that required configuration is present
    pub fn validate_auth(&self) -> Result<()> {
        match self.access_token.as_deref() {
            Some(token) if !token.trim().is_empty() => Ok(()),
            _ => Err(ConfigError::MissingAccessToken.into()),
        }
    }

    /// Pick the property: explicit value first, then the configured default
    pub fn resolve_property(&self, explicit: Option<&str>) -> Result<String> {
        explicit
            .filter(|p| !p.trim().is_empty())
            .or(self.default_property.as_deref())
            .map(str::to_string)
            .ok_or_else(|| ConfigError::MissingProperty.into())
    }

    /// Cache lifetimes from preferences
    pub fn ttl_policy(&self) -> TtlPolicy {
        TtlPolicy {
            metadata: hours(self.preferences.metadata_ttl_hours),
            query: hours(self.preferences.query_ttl_hours),
        }
    }
}

fn hours(h: u64) -> Duration {
    Duration::from_secs(h.saturating_mul(60 * 60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.access_token.is_none());
        assert!(config.default_property.is_none());
        assert_eq!(config.preferences.query_ttl_hours, 4);
        assert_eq!(config.preferences.metadata_ttl_hours, 24);
        assert!(!config.preferences.strict);
    }

    #[test]
    fn test_ttl_policy_defaults_match_cache() {
        assert_eq!(Config::default().ttl_policy(), TtlPolicy::default());
    }

    #[test]
    fn test_load_partial_preferences() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "access_token: ya29.token\ndefault_property: \"123\"\npreferences:\n  query_ttl_hours: 1\n",
        )
        .unwrap();

        let config = Config::load_from(path).unwrap();
        assert_eq!(config.access_token.as_deref(), Some("ya29.token"));
        assert_eq!(config.preferences.query_ttl_hours, 1);
        assert_eq!(config.preferences.metadata_ttl_hours, 24);
        assert_eq!(config.ttl_policy().query, Duration::from_secs(3600));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = Config::default();
        config.access_token = Some("ya29.secret".to_string());
        config.default_property = Some("123".to_string());
        config.preferences.strict = true;
        config.save_to(path.clone()).unwrap();

        let loaded = Config::load_from(path.clone()).unwrap();
        assert_eq!(loaded.access_token.as_deref(), Some("ya29.secret"));
        assert_eq!(loaded.default_property.as_deref(), Some("123"));
        assert!(loaded.preferences.strict);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.yaml");
        assert!(Config::load_from(path.clone()).is_err());

        let fallback = Config::load_or_default(path.to_str()).unwrap();
        assert!(fallback.access_token.is_none());
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            format!("preferences:\n  query_ttl_hours: {}\n", u64::MAX),
        )
        .unwrap();

        let config = Config::load_from(path).unwrap();
        assert_eq!(config.ttl_policy().query, Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_zero_metadata_ttl_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "preferences:\n  metadata_ttl_hours: 0\n").unwrap();
        assert!(Config::load_from(path).is_err());
    }

    #[test]
    fn test_validate_auth() {
        let mut config = Config::default();
        assert!(config.validate_auth().is_err());

        config.access_token = Some("  ".to_string());
        assert!(config.validate_auth().is_err());

        config.access_token = Some("token".to_string());
        assert!(config.validate_auth().is_ok());
    }

    #[test]
    fn test_resolve_property() {
        let mut config = Config::default();
        assert!(config.resolve_property(None).is_err());

        config.default_property = Some("123".to_string());
        assert_eq!(config.resolve_property(None).unwrap(), "123");
        assert_eq!(config.resolve_property(Some("456")).unwrap(), "456");
        assert_eq!(config.resolve_property(Some("")).unwrap(), "123");
    }
}
