//! Template command implementations

use std::path::Path;

use log::{debug, warn};

use crate::cli::{CommandContext, ExecArgs, GlobalOptions};
use crate::error::{Error, Result};
use crate::output;
use crate::query::{QueryTemplate, TemplateOverrides};

/// Read a template from a YAML or JSON file
pub fn load_template(path: &Path) -> Result<QueryTemplate> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::Other(format!("Cannot read {}: {}", path.display(), e)))?;
    Ok(serde_yaml::from_str(&contents)?)
}

/// Write a template back as YAML
pub fn save_template(path: &Path, template: &QueryTemplate) -> Result<()> {
    let contents = serde_yaml::to_string(template)?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Run a template file and record the use in it
pub async fn run(
    opts: &GlobalOptions,
    file: &str,
    overrides: TemplateOverrides,
    exec: &ExecArgs,
) -> Result<()> {
    let path = Path::new(file);
    let mut template = load_template(path)?;
    let ctx = CommandContext::new(opts)?;

    if template.query.property_id.trim().is_empty() {
        template.query.property_id = ctx.config.resolve_property(None)?;
    }
    if !overrides.is_empty() {
        debug!("Template '{}' overrides: {:?}", template.name, overrides);
    }

    let options = ctx.execute_options(exec);
    let outcome = ctx
        .executor
        .execute_template(&mut template, &overrides, &options)
        .await;

    // The attempt counts as a use whether or not the report succeeded
    if let Err(e) = save_template(path, &template) {
        warn!("Failed to record template usage in {}: {}", file, e);
    }

    output::print(&outcome?, ctx.format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TEMPLATE: &str = r#"
name: weekly-traffic
description: Sessions by source
query:
  property_id: "123"
  start_date: 7daysAgo
  end_date: yesterday
  dimensions: [sessionSource]
  metrics: [sessions]
"#;

    #[test]
    fn test_template_roundtrip_keeps_usage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("weekly.yaml");
        std::fs::write(&path, TEMPLATE).unwrap();

        let mut template = load_template(&path).unwrap();
        assert_eq!(template.usage_count, 0);
        assert!(template.last_used.is_none());

        template.usage_count = 3;
        template.last_used = Some(chrono::Utc::now());
        save_template(&path, &template).unwrap();

        let reloaded = load_template(&path).unwrap();
        assert_eq!(reloaded.name, "weekly-traffic");
        assert_eq!(reloaded.usage_count, 3);
        assert!(reloaded.last_used.is_some());
        assert_eq!(reloaded.query, template.query);
    }
}
