//! Query specification, template, and result models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::client::models::{
    DimensionHeader, MetricHeader, PropertyQuota, ResponseMetadata, Row, RunReportResponse,
};

/// Rows returned when the spec leaves `limit` unset (or non-positive)
pub const DEFAULT_LIMIT: i64 = 10_000;

/// Largest page the Data API will return
pub const MAX_LIMIT: i64 = 250_000;

/// A user-authored report query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    /// GA4 property ID (`123` or `properties/123`)
    #[serde(default)]
    pub property_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Dimension API names; order determines result column order
    #[serde(default)]
    pub dimensions: Vec<String>,

    /// Metric API names; order determines result column order
    #[serde(default)]
    pub metrics: Vec<String>,

    /// `YYYY-MM-DD`, `today`, `yesterday` or `NdaysAgo`
    #[serde(default)]
    pub start_date: String,

    #[serde(default)]
    pub end_date: String,

    #[serde(default)]
    pub limit: i64,

    #[serde(default)]
    pub offset: i64,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub keep_empty_rows: bool,

    /// TOTAL, MAXIMUM, MINIMUM
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metric_aggregations: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub return_property_quota: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<FilterSpec>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderBySpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl QuerySpec {
    /// Start a spec for a property and date range
    pub fn new(
        property_id: impl Into<String>,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
    ) -> Self {
        Self {
            property_id: property_id.into(),
            start_date: start_date.into(),
            end_date: end_date.into(),
            ..Default::default()
        }
    }

    pub fn dimension(mut self, name: impl Into<String>) -> Self {
        self.dimensions.push(name.into());
        self
    }

    pub fn metric(mut self, name: impl Into<String>) -> Self {
        self.metrics.push(name.into());
        self
    }

    pub fn filter(mut self, filter: FilterSpec) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order(mut self, order: OrderBySpec) -> Self {
        self.order_by.push(order);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Filter kind tag; unknown tags are kept so translation can reject them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FilterKind {
    #[default]
    String,
    Numeric,
    Between,
    InList,
    Unsupported(String),
}

impl FilterKind {
    pub fn as_str(&self) -> &str {
        match self {
            FilterKind::String => "string",
            FilterKind::Numeric => "numeric",
            FilterKind::Between => "between",
            FilterKind::InList => "in_list",
            FilterKind::Unsupported(kind) => kind,
        }
    }
}

impl From<String> for FilterKind {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "" | "string" => FilterKind::String,
            "numeric" => FilterKind::Numeric,
            "between" => FilterKind::Between,
            "in_list" | "inlist" | "in-list" => FilterKind::InList,
            _ => FilterKind::Unsupported(s),
        }
    }
}

impl From<FilterKind> for String {
    fn from(kind: FilterKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One flat filter condition as authored by the user.
///
/// Exactly the payload matching `kind` should be populated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub field_name: String,

    #[serde(default, rename = "type")]
    pub kind: FilterKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string: Option<StringCondition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericCondition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub between: Option<BetweenCondition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_list: Option<InListCondition>,
}

impl FilterSpec {
    pub fn string(
        field_name: impl Into<String>,
        match_type: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            kind: FilterKind::String,
            string: Some(StringCondition {
                match_type: Some(match_type.into()),
                value: value.into(),
                case_sensitive: false,
            }),
            ..Default::default()
        }
    }

    pub fn numeric(field_name: impl Into<String>, operation: impl Into<String>, value: f64) -> Self {
        Self {
            field_name: field_name.into(),
            kind: FilterKind::Numeric,
            numeric: Some(NumericCondition {
                operation: operation.into(),
                value,
            }),
            ..Default::default()
        }
    }

    pub fn between(field_name: impl Into<String>, from: f64, to: f64) -> Self {
        Self {
            field_name: field_name.into(),
            kind: FilterKind::Between,
            between: Some(BetweenCondition { from, to }),
            ..Default::default()
        }
    }

    pub fn in_list<S: Into<String>>(
        field_name: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            kind: FilterKind::InList,
            in_list: Some(InListCondition {
                values: values.into_iter().map(Into::into).collect(),
                case_sensitive: false,
            }),
            ..Default::default()
        }
    }

    /// Number of kind payloads populated
    pub fn payload_count(&self) -> usize {
        [
            self.string.is_some(),
            self.numeric.is_some(),
            self.between.is_some(),
            self.in_list.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StringCondition {
    /// EXACT (default), CONTAINS, BEGINS_WITH / STARTS_WITH, ENDS_WITH, FULL_REGEXP / REGEX, PARTIAL_REGEXP
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_type: Option<String>,

    #[serde(default)]
    pub value: String,

    #[serde(default)]
    pub case_sensitive: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericCondition {
    /// EQUAL, LESS_THAN, LESS_THAN_OR_EQUAL, GREATER_THAN, GREATER_THAN_OR_EQUAL
    #[serde(default)]
    pub operation: String,

    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BetweenCondition {
    pub from: f64,
    pub to: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InListCondition {
    #[serde(default)]
    pub values: Vec<String>,

    #[serde(default)]
    pub case_sensitive: bool,
}

/// Whether an order-by field is a dimension or a metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Dimension,
    Metric,
}

/// One sort key as authored by the user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBySpec {
    pub field_name: String,

    /// Inferred from the spec's own dimension/metric lists when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,

    #[serde(default)]
    pub descending: bool,

    /// Dimensions only: ALPHANUMERIC, CASE_INSENSITIVE_ALPHANUMERIC, NUMERIC
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_type: Option<String>,
}

impl OrderBySpec {
    pub fn new(field_name: impl Into<String>, descending: bool) -> Self {
        Self {
            field_name: field_name.into(),
            descending,
            ..Default::default()
        }
    }
}

/// A saved query with usage bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryTemplate {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    pub query: QuerySpec,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub usage_count: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used: Option<DateTime<Utc>>,
}

/// The closed set of parameters a template run may override
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateOverrides {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl TemplateOverrides {
    /// Derive a spec from `base`; the base is left untouched
    pub fn apply(&self, base: &QuerySpec) -> QuerySpec {
        let mut spec = base.clone();
        if let Some(ref start) = self.start_date {
            spec.start_date = start.clone();
        }
        if let Some(ref end) = self.end_date {
            spec.end_date = end.clone();
        }
        if let Some(limit) = self.limit {
            spec.limit = limit;
        }
        if let Some(offset) = self.offset {
            spec.offset = offset;
        }
        spec
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Result envelope for one executed (or cache-served) query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub query_id: String,
    pub property_id: String,
    pub query_hash: String,

    /// The validated, defaulted spec that was run
    pub query: QuerySpec,

    pub executed_at: DateTime<Utc>,
    pub execution_time_ms: u64,
    pub row_count: i64,
    pub from_cache: bool,

    #[serde(default)]
    pub dimension_headers: Vec<DimensionHeader>,

    #[serde(default)]
    pub metric_headers: Vec<MetricHeader>,

    #[serde(default)]
    pub rows: Vec<Row>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub totals: Vec<Row>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub maximums: Vec<Row>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub minimums: Vec<Row>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_metadata: Option<ResponseMetadata>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_quota: Option<PropertyQuota>,

    /// Remote failure text for failed attempts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryResult {
    /// An envelope with no data yet
    pub fn empty(query_id: String, query_hash: String, query: QuerySpec) -> Self {
        Self {
            query_id,
            property_id: query.property_id.clone(),
            query_hash,
            query,
            executed_at: Utc::now(),
            execution_time_ms: 0,
            row_count: 0,
            from_cache: false,
            dimension_headers: Vec::new(),
            metric_headers: Vec::new(),
            rows: Vec::new(),
            totals: Vec::new(),
            maximums: Vec::new(),
            minimums: Vec::new(),
            response_metadata: None,
            property_quota: None,
            error: None,
        }
    }

    /// Move a report response into this envelope
    pub fn fill(&mut self, response: RunReportResponse) {
        self.row_count = response.row_count;
        self.dimension_headers = response.dimension_headers;
        self.metric_headers = response.metric_headers;
        self.rows = response.rows;
        self.totals = response.totals;
        self.maximums = response.maximums;
        self.minimums = response.minimums;
        self.response_metadata = response.metadata;
        self.property_quota = response.property_quota;
    }

    /// Column names: dimensions then metrics, in spec order
    pub fn column_names(&self) -> Vec<String> {
        self.dimension_headers
            .iter()
            .map(|h| h.name.clone())
            .chain(self.metric_headers.iter().map(|h| h.name.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_spec_yaml_defaults_to_string_kind() {
        let yaml = "field_name: deviceCategory\nstring:\n  value: mobile\n";
        let spec: FilterSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(spec.kind, FilterKind::String);
        assert_eq!(spec.string.unwrap().value, "mobile");
    }

    #[test]
    fn test_filter_kind_keeps_unknown_tags() {
        let yaml = "field_name: x\ntype: regex_list\n";
        let spec: FilterSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(spec.kind, FilterKind::Unsupported("regex_list".to_string()));
        assert_eq!(spec.payload_count(), 0);
    }

    #[test]
    fn test_query_spec_yaml() {
        let yaml = r#"
property_id: "123"
dimensions: [sessionSource, country]
metrics: [sessions]
start_date: 30daysAgo
end_date: yesterday
filters:
  - field_name: sessions
    type: numeric
    numeric: { operation: GREATER_THAN, value: 10 }
order_by:
  - field_name: sessions
    descending: true
"#;
        let spec: QuerySpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(spec.dimensions, vec!["sessionSource", "country"]);
        assert_eq!(spec.filters[0].kind, FilterKind::Numeric);
        assert_eq!(spec.limit, 0);
        assert!(spec.order_by[0].field_type.is_none());
    }

    #[test]
    fn test_overrides_apply_to_copy() {
        let base = QuerySpec::new("123", "7daysAgo", "yesterday")
            .metric("sessions")
            .limit(50);
        let overrides = TemplateOverrides {
            start_date: Some("2024-01-01".to_string()),
            limit: Some(500),
            ..Default::default()
        };

        let derived = overrides.apply(&base);
        assert_eq!(derived.start_date, "2024-01-01");
        assert_eq!(derived.end_date, "yesterday");
        assert_eq!(derived.limit, 500);
        assert_eq!(base.limit, 50);
        assert!(!overrides.is_empty());
        assert!(TemplateOverrides::default().is_empty());
    }
}
