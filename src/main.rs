//! ga4cache - cached, validated GA4 Data API reports from the command line

use clap::Parser;

mod cache;
mod cli;
mod client;
mod config;
mod error;
mod output;
mod query;

use cli::{CacheCommands, Cli, Commands, GlobalOptions, QueryCommands, TemplateCommands};
use error::Result;
use query::TemplateOverrides;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

/// `--debug` raises the default level; RUST_LOG still takes precedence
fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let opts = GlobalOptions::from_cli(&cli);

    match cli.command {
        Commands::Init {
            access_token,
            property,
        } => cli::init::run(&opts, access_token, property),
        Commands::Version => {
            println!("ga4cache version {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Query(QueryCommands::Run {
            file,
            property,
            save_as,
            exec,
        }) => cli::query::run(&opts, &file, property.as_deref(), save_as.as_deref(), &exec).await,
        Commands::Template(TemplateCommands::Run {
            file,
            start_date,
            end_date,
            limit,
            offset,
            exec,
        }) => {
            let overrides = TemplateOverrides {
                start_date,
                end_date,
                limit,
                offset,
            };
            cli::template::run(&opts, &file, overrides, &exec).await
        }
        Commands::Metadata { property, refresh } => {
            cli::metadata::run(&opts, property.as_deref(), refresh).await
        }
        Commands::Cache(cache_cmd) => match cache_cmd {
            CacheCommands::Status => cli::cache::status(&opts),
            CacheCommands::Sweep => cli::cache::sweep(&opts),
            CacheCommands::Clear => cli::cache::clear(&opts),
            CacheCommands::Path => cli::cache::path(&opts),
            CacheCommands::Name {
                name,
                hash,
                description,
            } => cli::cache::name(&opts, &name, &hash, description.as_deref()),
            CacheCommands::Tables { property } => cli::cache::tables(&opts, property.as_deref()),
            CacheCommands::Show { name } => cli::cache::show(&opts, &name),
        },
    }
}
