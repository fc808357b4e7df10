//! Property metadata command

use colored::Colorize;
use log::warn;
use tabled::Tabled;

use crate::cache::METADATA_KIND;
use crate::cli::{CommandContext, GlobalOptions, OutputFormat};
use crate::client::MetadataResponse;
use crate::error::Result;
use crate::output::{json::format_json, table::format_table};

/// One dimension or metric in table output
#[derive(Debug, Tabled)]
struct FieldRow {
    #[tabled(rename = "KIND")]
    kind: &'static str,
    #[tabled(rename = "API NAME")]
    api_name: String,
    #[tabled(rename = "UI NAME")]
    ui_name: String,
    #[tabled(rename = "CATEGORY")]
    category: String,
    #[tabled(rename = "TYPE")]
    metric_type: String,
}

fn field_rows(metadata: &MetadataResponse) -> Vec<FieldRow> {
    let dimensions = metadata.dimensions.iter().map(|d| FieldRow {
        kind: "dimension",
        api_name: d.api_name.clone(),
        ui_name: d.ui_name.clone(),
        category: d.category.clone(),
        metric_type: String::new(),
    });
    let metrics = metadata.metrics.iter().map(|m| FieldRow {
        kind: "metric",
        api_name: m.api_name.clone(),
        ui_name: m.ui_name.clone(),
        category: m.category.clone(),
        metric_type: m.metric_type.clone(),
    });
    dimensions.chain(metrics).collect()
}

/// List a property's dimensions and metrics
pub async fn run(opts: &GlobalOptions, property: Option<&str>, refresh: bool) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let property_id = ctx.config.resolve_property(property)?;

    if refresh && let Some(ref store) = ctx.storage {
        let id = property_id
            .strip_prefix("properties/")
            .unwrap_or(&property_id);
        if let Err(e) = store.delete_metadata(id, METADATA_KIND) {
            warn!("Failed to drop cached metadata: {}", e);
        }
    }

    let metadata = ctx.executor.metadata(&property_id).await?;

    match ctx.format {
        OutputFormat::Json => println!("{}", format_json(&metadata)?),
        OutputFormat::Table => println!("{}", format_table(&field_rows(&metadata))),
        OutputFormat::Pretty => {
            println!(
                "{} {} · {} dimensions · {} metrics\n",
                "Property".bold(),
                property_id,
                metadata.dimensions.len(),
                metadata.metrics.len()
            );
            println!("{}", format_table(&field_rows(&metadata)));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::models::{DimensionMetadata, MetricMetadata};

    #[test]
    fn test_field_rows_dimensions_first() {
        let metadata = MetadataResponse {
            name: "properties/1/metadata".to_string(),
            dimensions: vec![DimensionMetadata {
                api_name: "country".to_string(),
                ui_name: "Country".to_string(),
                ..Default::default()
            }],
            metrics: vec![MetricMetadata {
                api_name: "sessions".to_string(),
                metric_type: "TYPE_INTEGER".to_string(),
                ..Default::default()
            }],
        };

        let rows = field_rows(&metadata);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].kind, "dimension");
        assert_eq!(rows[0].api_name, "country");
        assert_eq!(rows[1].kind, "metric");
        assert_eq!(rows[1].metric_type, "TYPE_INTEGER");
    }
}
