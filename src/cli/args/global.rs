//! Global CLI options shared across all commands

use std::path::PathBuf;

use crate::cache::{CacheContext, CacheStorage};
use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::error::Result;

/// Global CLI options passed to all command handlers.
///
/// Precedence is CLI flag > environment variable > config file > default.
/// This struct captures the CLI/env layer; config defaults are applied by
/// [`GlobalOptions::resolve_format`] and `CommandContext`.
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    /// Output format, if given on the command line
    pub format: Option<OutputFormat>,

    /// Custom config file path (defaults to ~/.ga4cache/config.yaml)
    pub config: Option<String>,

    /// Cache context name
    pub context: String,

    /// Custom cache root (defaults to the platform cache dir)
    pub cache_dir: Option<String>,

    /// Bypass the cache entirely
    pub no_cache: bool,

    /// Custom API host for development/testing
    pub api_host: Option<String>,
}

impl GlobalOptions {
    /// Create GlobalOptions from a parsed CLI struct.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            format: cli.format,
            config: cli.config.clone(),
            context: cli.context.clone(),
            cache_dir: cli.cache_dir.clone(),
            no_cache: cli.no_cache,
            api_host: cli.api_host.clone(),
        }
    }

    /// Get config path as `Option<&str>`.
    pub fn config_ref(&self) -> Option<&str> {
        self.config.as_deref()
    }

    /// Effective output format given the loaded config
    pub fn resolve_format(&self, config: &Config) -> OutputFormat {
        self.format
            .or_else(|| OutputFormat::from_config(config.preferences.format.as_deref()))
            .unwrap_or_default()
    }

    /// Validated cache context
    pub fn cache_context(&self) -> Result<CacheContext> {
        Ok(CacheContext::new(self.context.as_str())?)
    }

    /// Directory holding this context's store
    pub fn cache_path(&self) -> Result<PathBuf> {
        let context = self.cache_context()?;
        match self.cache_dir {
            Some(ref root) => Ok(PathBuf::from(root).join(context.as_str())),
            None => Ok(CacheStorage::context_dir(&context)?),
        }
    }

    /// Open the store for this context
    pub fn open_cache(&self) -> Result<CacheStorage> {
        let context = self.cache_context()?;
        match self.cache_dir {
            Some(ref root) => Ok(CacheStorage::open_at(
                &PathBuf::from(root).join(context.as_str()),
                &context,
            )?),
            None => Ok(CacheStorage::open(&context)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn options() -> GlobalOptions {
        GlobalOptions {
            format: None,
            config: None,
            context: "default".to_string(),
            cache_dir: None,
            no_cache: false,
            api_host: None,
        }
    }

    #[test]
    fn test_format_precedence() {
        let mut config = Config::default();
        let mut opts = options();
        assert_eq!(opts.resolve_format(&config), OutputFormat::Table);

        config.preferences.format = Some("json".to_string());
        assert_eq!(opts.resolve_format(&config), OutputFormat::Json);

        opts.format = Some(OutputFormat::Pretty);
        assert_eq!(opts.resolve_format(&config), OutputFormat::Pretty);
    }

    #[test]
    fn test_cache_path_per_context() {
        let dir = TempDir::new().unwrap();
        let mut opts = options();
        opts.cache_dir = Some(dir.path().display().to_string());
        opts.context = "client-a".to_string();

        assert_eq!(opts.cache_path().unwrap(), dir.path().join("client-a"));

        let store = opts.open_cache().unwrap();
        assert_eq!(store.context().as_str(), "client-a");
    }

    #[test]
    fn test_invalid_context_rejected() {
        let mut opts = options();
        opts.context = "../escape".to_string();
        assert!(opts.cache_context().is_err());
        assert!(opts.cache_path().is_err());
    }
}
