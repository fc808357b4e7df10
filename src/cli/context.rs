//! Command execution context
//!
//! Loads config, validates authentication, and wires the executor to the
//! cache store for the selected context.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};

use crate::cache::{CacheStorage, NoopCache, ReportCache};
use crate::cli::{ExecArgs, GlobalOptions, OutputFormat};
use crate::client::DataApiClient;
use crate::client::data_api::API_BASE_URL;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::query::{ExecuteOptions, Executor};

/// Context for command execution containing config, executor, and runtime options.
pub struct CommandContext {
    /// Loaded and validated configuration
    pub config: Config,
    /// Executor bound to this context's cache
    pub executor: Executor<DataApiClient>,
    /// Direct store handle; `None` with `--no-cache` or when the store failed to open
    pub storage: Option<Arc<CacheStorage>>,
    /// Output format preference
    pub format: OutputFormat,
}

impl CommandContext {
    /// Create a new command context.
    ///
    /// A cache store that cannot be opened degrades to no caching rather
    /// than failing the command.
    ///
    /// # Errors
    /// Returns error if config cannot be loaded or no access token is set.
    pub fn new(opts: &GlobalOptions) -> Result<Self> {
        let config = Config::load_at(opts.config_ref())?;
        config.validate_auth()?;
        let format = opts.resolve_format(&config);

        let token = config.access_token.clone().unwrap_or_default();
        let base_url = opts
            .api_host
            .as_deref()
            .or(config.api_host.as_deref())
            .unwrap_or(API_BASE_URL);
        let gateway = Arc::new(DataApiClient::with_base_url(token, base_url)?);

        let storage = if opts.no_cache {
            debug!("Cache disabled by --no-cache");
            None
        } else {
            match opts.open_cache() {
                Ok(store) => Some(Arc::new(store)),
                Err(e) => {
                    warn!("Cache unavailable, continuing without it: {}", e);
                    None
                }
            }
        };

        let cache: Arc<dyn ReportCache> = match storage {
            Some(ref store) => Arc::clone(store) as Arc<dyn ReportCache>,
            None => Arc::new(NoopCache),
        };
        let executor = Executor::new(gateway, cache).with_ttl(config.ttl_policy());

        Ok(Self {
            config,
            executor,
            storage,
            format,
        })
    }

    /// Store handle for commands that need one
    pub fn require_storage(&self) -> Result<&CacheStorage> {
        self.storage
            .as_deref()
            .ok_or_else(|| Error::Other("This command needs the cache; drop --no-cache".to_string()))
    }

    /// Execution options from command flags and config preferences
    pub fn execute_options(&self, exec: &ExecArgs) -> ExecuteOptions {
        ExecuteOptions {
            persist: exec.persist,
            strict: exec.strict || self.config.preferences.strict,
            timeout: exec.timeout.map(Duration::from_secs),
        }
    }
}
