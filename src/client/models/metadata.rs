//! Property metadata models

use serde::{Deserialize, Serialize};

/// Dimensions and metrics available on a property
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataResponse {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub dimensions: Vec<DimensionMetadata>,

    #[serde(default)]
    pub metrics: Vec<MetricMetadata>,
}

impl MetadataResponse {
    /// Whether `name` is a dimension API name (or a deprecated alias of one)
    pub fn has_dimension(&self, name: &str) -> bool {
        self.dimensions
            .iter()
            .any(|d| d.api_name == name || d.deprecated_api_names.iter().any(|n| n == name))
    }

    /// Whether `name` is a metric API name (or a deprecated alias of one)
    pub fn has_metric(&self, name: &str) -> bool {
        self.metrics
            .iter()
            .any(|m| m.api_name == name || m.deprecated_api_names.iter().any(|n| n == name))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionMetadata {
    pub api_name: String,

    #[serde(default)]
    pub ui_name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deprecated_api_names: Vec<String>,

    #[serde(default)]
    pub custom_definition: bool,

    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricMetadata {
    pub api_name: String,

    #[serde(default)]
    pub ui_name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, rename = "type")]
    pub metric_type: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deprecated_api_names: Vec<String>,

    #[serde(default)]
    pub custom_definition: bool,

    #[serde(default)]
    pub category: String,
}
