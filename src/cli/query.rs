//! Query command implementations

use std::path::Path;

use colored::Colorize;
use log::debug;

use crate::cli::{CommandContext, ExecArgs, GlobalOptions, OutputFormat};
use crate::error::{Error, Result};
use crate::output;
use crate::query::QuerySpec;

/// Read a query spec from a YAML or JSON file
pub fn load_spec(path: &Path) -> Result<QuerySpec> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::Other(format!("Cannot read {}: {}", path.display(), e)))?;
    Ok(serde_yaml::from_str(&contents)?)
}

/// Run a query spec file
pub async fn run(
    opts: &GlobalOptions,
    file: &str,
    property: Option<&str>,
    save_as: Option<&str>,
    exec: &ExecArgs,
) -> Result<()> {
    let mut spec = load_spec(Path::new(file))?;
    let ctx = CommandContext::new(opts)?;

    if let Some(property) = property {
        spec.property_id = property.to_string();
    } else if spec.property_id.trim().is_empty() {
        spec.property_id = ctx.config.resolve_property(None)?;
    }

    // Fail before spending quota if the name cannot be stored
    if save_as.is_some() {
        ctx.require_storage()?;
    }

    let options = ctx.execute_options(exec);
    let result = match ctx.executor.execute(&spec, &options).await {
        Ok(result) => result,
        Err(err) => {
            // Scripts get the failed attempt envelope alongside the exit code
            if ctx.format == OutputFormat::Json
                && let Some(attempt) = err.failed_attempt()
            {
                output::print(attempt, ctx.format)?;
            }
            return Err(err);
        }
    };
    debug!(
        "Query {} returned {} rows (cached: {})",
        result.query_id,
        result.rows.len(),
        result.from_cache
    );

    output::print(&result, ctx.format)?;

    if let Some(name) = save_as {
        ctx.require_storage()?
            .name_result(name, &result.query_hash, spec.description.as_deref())?;
        if ctx.format != OutputFormat::Json {
            eprintln!("{} Saved as '{}'", "✓".green(), name);
        }
    }

    Ok(())
}
