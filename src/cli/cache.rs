//! Cache management commands

use colored::Colorize;
use tabled::Tabled;

use crate::cache::CacheStorage;
use crate::cli::{GlobalOptions, OutputFormat};
use crate::client::RunReportResponse;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::output::formatters::{format_expiry, format_size, format_unix_local};
use crate::output::json::format_json;
use crate::output::table::{format_report, format_table};

fn open(opts: &GlobalOptions) -> Result<(CacheStorage, OutputFormat)> {
    let config = Config::load_or_default(opts.config_ref())?;
    Ok((opts.open_cache()?, opts.resolve_format(&config)))
}

/// Show cache status/statistics
pub fn status(opts: &GlobalOptions) -> Result<()> {
    let (cache, format) = open(opts)?;
    let stats = cache.stats()?;
    let path = opts.cache_path()?.display().to_string();

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "context": stats.context,
                "hits": stats.hits,
                "misses": stats.misses,
                "hit_rate": stats.hit_rate(),
                "metadata_entries": stats.metadata_entries,
                "query_entries": stats.query_entries,
                "named_results": stats.named_results,
                "expired_entries": stats.expired_entries,
                "total_size_bytes": stats.total_size_bytes,
                "total_size_human": format_size(stats.total_size_bytes),
                "oldest_entry_timestamp": stats.oldest_entry,
                "newest_entry_timestamp": stats.newest_entry,
                "last_sweep_timestamp": stats.last_sweep,
                "path": path,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        _ => {
            println!("{}", "Cache Status".bold());
            println!("────────────────────────────────────────");
            println!("Context:        {}", stats.context);
            println!("Location:       {}", path);
            println!("Metadata:       {}", stats.metadata_entries);
            println!("Reports:        {}", stats.query_entries);
            println!("Named results:  {}", stats.named_results);
            println!("Expired:        {}", stats.expired_entries);
            println!("Total size:     {}", format_size(stats.total_size_bytes));
            println!(
                "Hit rate:       {:.1}% ({} hits, {} misses)",
                stats.hit_rate() * 100.0,
                stats.hits,
                stats.misses
            );

            if let Some(oldest) = stats.oldest_entry {
                println!("Oldest entry:   {}", format_unix_local(oldest));
            }
            if let Some(newest) = stats.newest_entry {
                println!("Newest entry:   {}", format_unix_local(newest));
            }
            if let Some(swept) = stats.last_sweep {
                println!("Last sweep:     {}", format_unix_local(swept));
            }
        }
    }

    Ok(())
}

/// Remove expired entries
pub fn sweep(opts: &GlobalOptions) -> Result<()> {
    let (cache, format) = open(opts)?;
    let stats = cache.sweep_expired()?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "metadata_removed": stats.metadata_removed,
                "queries_removed": stats.queries_removed,
                "entries_removed": stats.total(),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        _ => {
            if stats.total() > 0 {
                println!(
                    "{} Removed {} expired entries ({} metadata, {} reports)",
                    "✓".green(),
                    stats.total(),
                    stats.metadata_removed,
                    stats.queries_removed
                );
            } else {
                println!("No expired entries");
            }
        }
    }

    Ok(())
}

/// Clear all cache entries
pub fn clear(opts: &GlobalOptions) -> Result<()> {
    let (cache, format) = open(opts)?;
    let stats = cache.clear_all()?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "entries_removed": stats.entries_removed,
                "success": true,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        _ => {
            if stats.entries_removed > 0 {
                println!("Cleared {} cache entries", stats.entries_removed);
            } else {
                println!("Cache was already empty");
            }
        }
    }

    Ok(())
}

/// Show cache path for the current context
pub fn path(opts: &GlobalOptions) -> Result<()> {
    println!("{}", opts.cache_path()?.display());
    Ok(())
}

/// Name a cached report
pub fn name(opts: &GlobalOptions, name: &str, hash: &str, description: Option<&str>) -> Result<()> {
    let (cache, format) = open(opts)?;
    cache.name_result(name, hash, description)?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "name": name,
                "query_hash": hash,
                "success": true,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        _ => {
            let short: String = hash.chars().take(12).collect();
            println!("{} Named {} as '{}'", "✓".green(), short, name);
        }
    }

    Ok(())
}

/// One named result in table output
#[derive(Debug, Tabled)]
struct NamedRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "PROPERTY")]
    property_id: String,
    #[tabled(rename = "ROWS")]
    row_count: i64,
    #[tabled(rename = "CREATED")]
    created: String,
    #[tabled(rename = "EXPIRES")]
    expires: String,
    #[tabled(rename = "DESCRIPTION")]
    description: String,
}

/// List named results
pub fn tables(opts: &GlobalOptions, property: Option<&str>) -> Result<()> {
    let (cache, format) = open(opts)?;
    let property = property.map(|p| p.strip_prefix("properties/").unwrap_or(p));
    let named = cache.list_named(property)?;

    match format {
        OutputFormat::Json => println!("{}", format_json(&named)?),
        _ => {
            let rows: Vec<NamedRow> = named
                .into_iter()
                .map(|n| NamedRow {
                    name: n.name,
                    property_id: n.property_id,
                    row_count: n.row_count,
                    created: format_unix_local(n.created_at),
                    expires: format_expiry(n.expires_at),
                    description: n.description.unwrap_or_default(),
                })
                .collect();
            println!("{}", format_table(&rows));
        }
    }

    Ok(())
}

/// Show a named result's report
pub fn show(opts: &GlobalOptions, name: &str) -> Result<()> {
    let (cache, format) = open(opts)?;
    let (named, payload) = cache
        .get_named(name)?
        .ok_or_else(|| CacheError::NotFound(name.to_string()))?;
    let report: RunReportResponse = serde_json::from_slice(&payload).map_err(CacheError::from)?;

    let columns: Vec<String> = report
        .dimension_headers
        .iter()
        .map(|h| h.name.clone())
        .chain(report.metric_headers.iter().map(|h| h.name.clone()))
        .collect();

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "named": named,
                "report": report,
            });
            println!("{}", format_json(&json)?);
        }
        OutputFormat::Table => println!("{}", format_report(&columns, &report.rows)),
        OutputFormat::Pretty => {
            println!(
                "{} {} · property {} · {} rows · expires {}\n",
                "Result".bold(),
                named.name,
                named.property_id,
                named.row_count,
                format_expiry(named.expires_at)
            );
            println!("{}", format_report(&columns, &report.rows));
        }
    }

    Ok(())
}
