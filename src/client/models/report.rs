//! runReport request and response models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::FilterExpression;

/// Fully assembled request body for `properties/{id}:runReport`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReportRequest {
    /// Property ID (part of the URL, not the body)
    #[serde(skip)]
    pub property: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dimensions: Vec<Dimension>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metrics: Vec<Metric>,

    pub date_ranges: Vec<DateRange>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension_filter: Option<FilterExpression>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_filter: Option<FilterExpression>,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub offset: i64,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub limit: i64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metric_aggregations: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_bys: Vec<OrderBy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub keep_empty_rows: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub return_property_quota: bool,
}

fn is_zero(v: &i64) -> bool {
    *v == 0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: String,
    pub end_date: String,
}

/// One sort key; `desc` plus either a dimension or a metric target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub desc: bool,

    #[serde(flatten)]
    pub target: OrderByTarget,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderByTarget {
    Dimension(DimensionOrderBy),
    Metric(MetricOrderBy),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionOrderBy {
    pub dimension_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_type: Option<DimensionOrderType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricOrderBy {
    pub metric_name: String,
}

/// Ordering modes for dimension sort keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DimensionOrderType {
    Alphanumeric,
    CaseInsensitiveAlphanumeric,
    Numeric,
}

impl FromStr for DimensionOrderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ALPHANUMERIC" => Ok(DimensionOrderType::Alphanumeric),
            "CASE_INSENSITIVE_ALPHANUMERIC" => Ok(DimensionOrderType::CaseInsensitiveAlphanumeric),
            "NUMERIC" => Ok(DimensionOrderType::Numeric),
            _ => Err(s.to_string()),
        }
    }
}

impl fmt::Display for DimensionOrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DimensionOrderType::Alphanumeric => "ALPHANUMERIC",
            DimensionOrderType::CaseInsensitiveAlphanumeric => "CASE_INSENSITIVE_ALPHANUMERIC",
            DimensionOrderType::Numeric => "NUMERIC",
        };
        f.write_str(s)
    }
}

/// Response body of `runReport`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReportResponse {
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

    /// Total rows matching the query, independent of limit/offset
    #[serde(default)]
    pub row_count: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_quota: Option<PropertyQuota>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionHeader {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricHeader {
    pub name: String,

    /// TYPE_INTEGER, TYPE_FLOAT, TYPE_SECONDS, TYPE_CURRENCY, ...
    #[serde(default, rename = "type")]
    pub metric_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    #[serde(default)]
    pub dimension_values: Vec<CellValue>,

    #[serde(default)]
    pub metric_values: Vec<CellValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellValue {
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    #[serde(default)]
    pub currency_code: String,

    #[serde(default)]
    pub time_zone: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_reason: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub data_loss_from_other_row: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyQuota {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_per_day: Option<QuotaStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_per_hour: Option<QuotaStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrent_requests: Option<QuotaStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuotaStatus {
    #[serde(default)]
    pub consumed: i64,

    #[serde(default)]
    pub remaining: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body_omits_defaults() {
        let request = RunReportRequest {
            property: "123".to_string(),
            dimensions: vec![Dimension {
                name: "country".to_string(),
            }],
            metrics: vec![],
            date_ranges: vec![DateRange {
                start_date: "7daysAgo".to_string(),
                end_date: "yesterday".to_string(),
            }],
            dimension_filter: None,
            metric_filter: None,
            offset: 0,
            limit: 100,
            metric_aggregations: vec![],
            order_bys: vec![OrderBy {
                desc: true,
                target: OrderByTarget::Metric(MetricOrderBy {
                    metric_name: "sessions".to_string(),
                }),
            }],
            currency_code: None,
            keep_empty_rows: false,
            return_property_quota: false,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "dimensions": [{"name": "country"}],
                "dateRanges": [{"startDate": "7daysAgo", "endDate": "yesterday"}],
                "limit": 100,
                "orderBys": [{"desc": true, "metric": {"metricName": "sessions"}}]
            })
        );
    }

    #[test]
    fn test_response_parses_sparse_body() {
        let body = r#"{
            "dimensionHeaders": [{"name": "country"}],
            "metricHeaders": [{"name": "sessions", "type": "TYPE_INTEGER"}],
            "rows": [{"dimensionValues": [{"value": "Japan"}], "metricValues": [{"value": "42"}]}],
            "rowCount": 1,
            "metadata": {"currencyCode": "USD", "timeZone": "Asia/Tokyo"},
            "kind": "analyticsData#runReport"
        }"#;

        let response: RunReportResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.row_count, 1);
        assert_eq!(response.metric_headers[0].metric_type, "TYPE_INTEGER");
        assert_eq!(response.rows[0].metric_values[0].value, "42");
        assert!(response.totals.is_empty());
    }

    #[test]
    fn test_order_type_parse() {
        assert_eq!(
            "numeric".parse::<DimensionOrderType>(),
            Ok(DimensionOrderType::Numeric)
        );
        assert!("DATE".parse::<DimensionOrderType>().is_err());
    }
}
