//! CLI command definitions and handlers

use clap::{Args, Parser, Subcommand};

pub mod args;
pub mod cache;
pub mod context;
pub mod init;
pub mod metadata;
pub mod query;
pub mod template;

pub use args::{GlobalOptions, OutputFormat};
pub use context::CommandContext;

/// ga4cache - cached, validated GA4 Data API reports from the command line
#[derive(Parser, Debug)]
#[command(name = "ga4cache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (pretty, table, json)
    #[arg(
        long,
        global = true,
        env = "GA4CACHE_FORMAT",
        hide_env = true,
        hide_possible_values = true
    )]
    pub format: Option<OutputFormat>,

    /// Override config file location
    #[arg(long, global = true, env = "GA4CACHE_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Cache context; each context has its own isolated store
    #[arg(
        long,
        global = true,
        env = "GA4CACHE_CONTEXT",
        default_value = "default",
        hide_env = true
    )]
    pub context: String,

    /// Override the cache root directory
    #[arg(long, global = true, env = "GA4CACHE_CACHE_DIR", hide = true)]
    pub cache_dir: Option<String>,

    /// Override the Data API base URL
    #[arg(long, global = true, env = "GA4CACHE_API_HOST", hide = true)]
    pub api_host: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true, env = "GA4CACHE_DEBUG", hide_env = true)]
    pub debug: bool,

    /// Bypass the cache, always fetch fresh data from the API
    #[arg(long, global = true, env = "GA4CACHE_NO_CACHE", hide_env = true)]
    pub no_cache: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create or update the configuration file
    Init {
        /// Access token (prompted for when omitted)
        #[arg(long)]
        access_token: Option<String>,

        /// Default property ID (prompted for when omitted)
        #[arg(long)]
        property: Option<String>,
    },

    /// Run report queries
    #[command(subcommand)]
    Query(QueryCommands),

    /// Run saved query templates
    #[command(subcommand)]
    Template(TemplateCommands),

    /// List the dimensions and metrics available on a property
    Metadata {
        /// Property ID (defaults to `default_property` from config)
        #[arg(long)]
        property: Option<String>,

        /// Ignore cached metadata and fetch it again
        #[arg(long)]
        refresh: bool,
    },

    /// Manage local cache
    #[command(subcommand)]
    Cache(CacheCommands),

    /// Display version information
    Version,
}

/// Execution switches shared by `query run` and `template run`
#[derive(Debug, Clone, Args, Default)]
pub struct ExecArgs {
    /// Keep the result until explicitly cleared instead of expiring it
    #[arg(long)]
    pub persist: bool,

    /// Check field names against property metadata before running
    #[arg(long)]
    pub strict: bool,

    /// Give up on the API call after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Query subcommands
#[derive(Subcommand, Debug)]
pub enum QueryCommands {
    /// Run a query spec file (YAML or JSON)
    Run {
        /// Path to the query spec
        #[arg(long, short = 'f')]
        file: String,

        /// Override the property ID named in the spec
        #[arg(long)]
        property: Option<String>,

        /// Name the cached result so it can be shown later
        #[arg(long, value_name = "NAME")]
        save_as: Option<String>,

        #[command(flatten)]
        exec: ExecArgs,
    },
}

/// Template subcommands
#[derive(Subcommand, Debug)]
pub enum TemplateCommands {
    /// Run a template file, recording the use in the file
    Run {
        /// Path to the template
        #[arg(long, short = 'f')]
        file: String,

        /// Override the start date
        #[arg(long)]
        start_date: Option<String>,

        /// Override the end date
        #[arg(long)]
        end_date: Option<String>,

        /// Override the row limit
        #[arg(long)]
        limit: Option<i64>,

        /// Override the row offset
        #[arg(long)]
        offset: Option<i64>,

        #[command(flatten)]
        exec: ExecArgs,
    },
}

/// Cache management subcommands
#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Show cache statistics
    Status,
    /// Remove expired entries
    Sweep,
    /// Clear all cached data
    Clear,
    /// Print cache directory path
    Path,
    /// Give a cached report a durable name
    Name {
        /// Name to assign
        name: String,

        /// Digest of the cached report (`query_hash` in JSON output)
        #[arg(long)]
        hash: String,

        /// Free-text description
        #[arg(long)]
        description: Option<String>,
    },
    /// List named results
    Tables {
        /// Only results for this property
        #[arg(long)]
        property: Option<String>,
    },
    /// Show a named result
    Show {
        /// Name given with `query run --save-as`
        name: String,
    },
}
