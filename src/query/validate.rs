//! Query specification validation
//!
//! Checks structure, ranges and (when metadata is available) field
//! existence, and returns a normalized copy of the spec with defaults
//! applied. Checks run in a fixed order and the first failure wins.

use std::str::FromStr;

use chrono::NaiveDate;

use crate::client::models::{DimensionOrderType, MetadataResponse, NumericOperation, StringMatchType};
use crate::error::ValidationError;

use super::models::{
    DEFAULT_LIMIT, FieldType, FilterKind, FilterSpec, MAX_LIMIT, OrderBySpec, QuerySpec,
};

/// Validator for [`QuerySpec`]s.
///
/// Without metadata, field existence is skipped unless `strict` is set, in
/// which case validation fails with [`ValidationError::MetadataUnavailable`].
#[derive(Debug, Default, Clone, Copy)]
pub struct QueryValidator<'a> {
    metadata: Option<&'a MetadataResponse>,
    strict: bool,
}

impl<'a> QueryValidator<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check dimension and metric names against property metadata
    pub fn with_metadata(mut self, metadata: &'a MetadataResponse) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Validate `spec` and return its normalized form.
    pub fn validate(&self, spec: &QuerySpec) -> Result<QuerySpec, ValidationError> {
        let mut spec = spec.clone();

        let property_id = spec.property_id.trim();
        spec.property_id = property_id
            .strip_prefix("properties/")
            .unwrap_or(property_id)
            .to_string();
        if spec.property_id.is_empty() {
            return Err(ValidationError::MissingSubject);
        }

        validate_date_range(&spec.start_date, &spec.end_date)?;

        if spec.dimensions.is_empty() && spec.metrics.is_empty() {
            return Err(ValidationError::EmptySelection);
        }

        if spec.limit <= 0 {
            spec.limit = DEFAULT_LIMIT;
        }
        if spec.limit > MAX_LIMIT {
            return Err(ValidationError::LimitTooLarge {
                limit: spec.limit,
                max: MAX_LIMIT,
            });
        }
        if spec.offset < 0 {
            return Err(ValidationError::NegativeOffset(spec.offset));
        }

        for (index, filter) in spec.filters.iter_mut().enumerate() {
            normalize_filter(filter)
                .map_err(|reason| ValidationError::Filter { index, reason })?;
        }

        let dimensions = spec.dimensions.clone();
        let metrics = spec.metrics.clone();
        for (index, order) in spec.order_by.iter_mut().enumerate() {
            normalize_order_by(order, &dimensions, &metrics)
                .map_err(|reason| ValidationError::OrderBy { index, reason })?;
        }

        match self.metadata {
            Some(metadata) => {
                if let Some(name) = spec.dimensions.iter().find(|d| !metadata.has_dimension(d)) {
                    return Err(ValidationError::UnknownDimension(name.clone()));
                }
                if let Some(name) = spec.metrics.iter().find(|m| !metadata.has_metric(m)) {
                    return Err(ValidationError::UnknownMetric(name.clone()));
                }
            }
            None if self.strict => {
                return Err(ValidationError::MetadataUnavailable(
                    "no metadata supplied".to_string(),
                ));
            }
            None => {}
        }

        Ok(spec)
    }
}

/// A date token accepted by the Data API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateToken {
    Absolute(NaiveDate),
    Relative,
}

fn parse_date(which: &'static str, value: &str) -> Result<DateToken, ValidationError> {
    let invalid = || ValidationError::InvalidDate {
        which,
        value: value.to_string(),
    };

    if value == "today" || value == "yesterday" {
        return Ok(DateToken::Relative);
    }
    if let Some(days) = value.strip_suffix("daysAgo") {
        if !days.is_empty() && days.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(DateToken::Relative);
        }
        return Err(invalid());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(DateToken::Absolute)
        .map_err(|_| invalid())
}

fn validate_date_range(start: &str, end: &str) -> Result<(), ValidationError> {
    if start.trim().is_empty() || end.trim().is_empty() {
        return Err(ValidationError::MissingDateRange);
    }

    let start_token = parse_date("start", start)?;
    let end_token = parse_date("end", end)?;

    if let (DateToken::Absolute(s), DateToken::Absolute(e)) = (start_token, end_token) {
        if s > e {
            return Err(ValidationError::InvertedDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
    }
    Ok(())
}

/// Check one filter and canonicalize its enum-like strings.
fn normalize_filter(filter: &mut FilterSpec) -> Result<(), String> {
    if filter.field_name.trim().is_empty() {
        return Err("field_name is required".to_string());
    }

    // Unknown kinds are left for the filter compiler to reject
    if let FilterKind::Unsupported(_) = filter.kind {
        return Ok(());
    }
    if filter.payload_count() > 1 {
        return Err(format!(
            "only the {} payload may be set for a {} filter",
            filter.kind, filter.kind
        ));
    }

    let missing = |kind: &FilterKind| format!("{} filter requires a {} payload", kind, kind);

    match filter.kind {
        FilterKind::String => {
            let payload = filter
                .string
                .as_mut()
                .ok_or_else(|| missing(&FilterKind::String))?;
            if payload.value.is_empty() {
                return Err("string filter value is required".to_string());
            }
            let match_type = match payload.match_type.as_deref() {
                None | Some("") => StringMatchType::Exact,
                Some(raw) => StringMatchType::from_str(raw)
                    .map_err(|raw| format!("unknown match type '{}'", raw))?,
            };
            payload.match_type = Some(match_type.as_str().to_string());
        }
        FilterKind::Numeric => {
            let payload = filter
                .numeric
                .as_mut()
                .ok_or_else(|| missing(&FilterKind::Numeric))?;
            if payload.operation.trim().is_empty() {
                return Err("numeric filter operation is required".to_string());
            }
            let operation = NumericOperation::from_str(&payload.operation)
                .map_err(|raw| format!("unknown numeric operation '{}'", raw))?;
            payload.operation = operation.as_str().to_string();
            if !payload.value.is_finite() {
                return Err("numeric filter value must be finite".to_string());
            }
        }
        FilterKind::Between => {
            let payload = filter
                .between
                .as_ref()
                .ok_or_else(|| missing(&FilterKind::Between))?;
            if !payload.from.is_finite() || !payload.to.is_finite() {
                return Err("between bounds must be finite".to_string());
            }
            if payload.from >= payload.to {
                return Err(format!(
                    "between lower bound {} must be less than upper bound {}",
                    payload.from, payload.to
                ));
            }
        }
        FilterKind::InList => {
            let payload = filter
                .in_list
                .as_ref()
                .ok_or_else(|| missing(&FilterKind::InList))?;
            if payload.values.is_empty() {
                return Err("in_list filter requires at least one value".to_string());
            }
        }
        FilterKind::Unsupported(_) => {}
    }
    Ok(())
}

/// Resolve an order-by against the spec's own selection.
fn normalize_order_by(
    order: &mut OrderBySpec,
    dimensions: &[String],
    metrics: &[String],
) -> Result<(), String> {
    if order.field_name.trim().is_empty() {
        return Err("field_name is required".to_string());
    }

    let is_dimension = dimensions.contains(&order.field_name);
    let is_metric = metrics.contains(&order.field_name);

    let field_type = match order.field_type {
        Some(FieldType::Dimension) if is_dimension => FieldType::Dimension,
        Some(FieldType::Metric) if is_metric => FieldType::Metric,
        Some(FieldType::Dimension) => {
            return Err(format!("'{}' is not a selected dimension", order.field_name));
        }
        Some(FieldType::Metric) => {
            return Err(format!("'{}' is not a selected metric", order.field_name));
        }
        None if is_dimension => FieldType::Dimension,
        None if is_metric => FieldType::Metric,
        None => {
            return Err(format!(
                "'{}' is neither a selected dimension nor metric",
                order.field_name
            ));
        }
    };
    order.field_type = Some(field_type);

    if let Some(raw) = order.order_type.as_deref() {
        if field_type == FieldType::Metric {
            return Err("order_type only applies to dimensions".to_string());
        }
        let order_type = DimensionOrderType::from_str(raw)
            .map_err(|raw| format!("unknown order type '{}'", raw))?;
        order.order_type = Some(order_type.to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::models::{DimensionMetadata, MetricMetadata};

    fn base() -> QuerySpec {
        QuerySpec::new("123456", "2024-01-01", "2024-01-31")
            .dimension("country")
            .metric("sessions")
    }

    fn metadata() -> MetadataResponse {
        MetadataResponse {
            name: "properties/123456/metadata".to_string(),
            dimensions: vec![DimensionMetadata {
                api_name: "country".to_string(),
                ..Default::default()
            }],
            metrics: vec![MetricMetadata {
                api_name: "sessions".to_string(),
                ..Default::default()
            }],
        }
    }

    #[test]
    fn test_zero_limit_defaults() {
        let spec = QuerySpec::new("123", "7daysAgo", "yesterday")
            .dimension("country")
            .limit(0);
        let normalized = QueryValidator::new().validate(&spec).unwrap();
        assert_eq!(normalized.limit, 10_000);
    }

    #[test]
    fn test_limit_boundaries() {
        let at_max = base().limit(250_000);
        assert!(QueryValidator::new().validate(&at_max).is_ok());

        let over = base().limit(250_001);
        assert_eq!(
            QueryValidator::new().validate(&over).unwrap_err(),
            ValidationError::LimitTooLarge {
                limit: 250_001,
                max: 250_000
            }
        );
    }

    #[test]
    fn test_negative_offset() {
        let spec = base().offset(-1);
        assert_eq!(
            QueryValidator::new().validate(&spec).unwrap_err(),
            ValidationError::NegativeOffset(-1)
        );
    }

    #[test]
    fn test_missing_subject() {
        let mut spec = base();
        spec.property_id = "  ".to_string();
        assert_eq!(
            QueryValidator::new().validate(&spec).unwrap_err(),
            ValidationError::MissingSubject
        );
    }

    #[test]
    fn test_missing_date_range() {
        let mut spec = base();
        spec.end_date.clear();
        assert_eq!(
            QueryValidator::new().validate(&spec).unwrap_err(),
            ValidationError::MissingDateRange
        );
    }

    #[test]
    fn test_date_formats() {
        for (start, end) in [
            ("today", "today"),
            ("30daysAgo", "yesterday"),
            ("2024-02-29", "today"),
        ] {
            let spec = QuerySpec::new("1", start, end).metric("sessions");
            assert!(QueryValidator::new().validate(&spec).is_ok(), "{} {}", start, end);
        }

        for bad in ["2024-13-01", "01/02/2024", "daysAgo", "xdaysAgo", "lastWeek"] {
            let spec = QuerySpec::new("1", bad, "today").metric("sessions");
            assert!(
                matches!(
                    QueryValidator::new().validate(&spec),
                    Err(ValidationError::InvalidDate { which: "start", .. })
                ),
                "{}",
                bad
            );
        }
    }

    #[test]
    fn test_inverted_absolute_dates() {
        let spec = QuerySpec::new("1", "2024-02-01", "2024-01-01").metric("sessions");
        assert!(matches!(
            QueryValidator::new().validate(&spec),
            Err(ValidationError::InvertedDateRange { .. })
        ));
    }

    #[test]
    fn test_empty_selection() {
        let spec = QuerySpec::new("1", "today", "today");
        assert_eq!(
            QueryValidator::new().validate(&spec).unwrap_err(),
            ValidationError::EmptySelection
        );
    }

    #[test]
    fn test_filter_normalization() {
        let spec = base()
            .filter(FilterSpec::string("country", "starts_with", "Ger"))
            .filter(FilterSpec::numeric("sessions", "greater_than", 3.0));
        let normalized = QueryValidator::new().validate(&spec).unwrap();

        let string = normalized.filters[0].string.as_ref().unwrap();
        assert_eq!(string.match_type.as_deref(), Some("BEGINS_WITH"));
        let numeric = normalized.filters[1].numeric.as_ref().unwrap();
        assert_eq!(numeric.operation, "GREATER_THAN");
    }

    #[test]
    fn test_filter_errors_carry_index() {
        let spec = base()
            .filter(FilterSpec::string("country", "EXACT", "US"))
            .filter(FilterSpec::between("sessions", 10.0, 1.0));
        assert!(matches!(
            QueryValidator::new().validate(&spec),
            Err(ValidationError::Filter { index: 1, .. })
        ));
    }

    #[test]
    fn test_filter_payload_mismatch() {
        let mut filter = FilterSpec::numeric("sessions", "EQUAL", 1.0);
        filter.kind = FilterKind::String;
        let spec = base().filter(filter);
        assert!(matches!(
            QueryValidator::new().validate(&spec),
            Err(ValidationError::Filter { index: 0, .. })
        ));
    }

    #[test]
    fn test_filter_rejects_non_finite_values() {
        let spec = base().filter(FilterSpec::numeric("sessions", "EQUAL", f64::NAN));
        assert!(matches!(
            QueryValidator::new().validate(&spec),
            Err(ValidationError::Filter { .. })
        ));
    }

    #[test]
    fn test_unsupported_filter_kind_passes_validation() {
        let filter = FilterSpec {
            field_name: "country".to_string(),
            kind: FilterKind::Unsupported("geo_radius".to_string()),
            ..Default::default()
        };
        assert!(QueryValidator::new().validate(&base().filter(filter)).is_ok());
    }

    #[test]
    fn test_order_by_inference() {
        let spec = base()
            .order(OrderBySpec::new("sessions", true))
            .order(OrderBySpec {
                field_name: "country".to_string(),
                order_type: Some("case_insensitive_alphanumeric".to_string()),
                ..Default::default()
            });
        let normalized = QueryValidator::new().validate(&spec).unwrap();

        assert_eq!(normalized.order_by[0].field_type, Some(FieldType::Metric));
        assert_eq!(normalized.order_by[1].field_type, Some(FieldType::Dimension));
        assert_eq!(
            normalized.order_by[1].order_type.as_deref(),
            Some("CASE_INSENSITIVE_ALPHANUMERIC")
        );
    }

    #[test]
    fn test_order_by_unknown_field() {
        let spec = base().order(OrderBySpec::new("bounceRate", false));
        assert!(matches!(
            QueryValidator::new().validate(&spec),
            Err(ValidationError::OrderBy { index: 0, .. })
        ));
    }

    #[test]
    fn test_order_type_rejected_for_metric() {
        let spec = base().order(OrderBySpec {
            field_name: "sessions".to_string(),
            order_type: Some("NUMERIC".to_string()),
            ..Default::default()
        });
        assert!(matches!(
            QueryValidator::new().validate(&spec),
            Err(ValidationError::OrderBy { .. })
        ));
    }

    #[test]
    fn test_metadata_existence_checks() {
        let md = metadata();
        let validator = QueryValidator::new().with_metadata(&md);
        assert!(validator.validate(&base()).is_ok());

        let spec = base().dimension("city");
        assert_eq!(
            validator.validate(&spec).unwrap_err(),
            ValidationError::UnknownDimension("city".to_string())
        );

        let spec = base().metric("conversions");
        assert_eq!(
            validator.validate(&spec).unwrap_err(),
            ValidationError::UnknownMetric("conversions".to_string())
        );
    }

    #[test]
    fn test_strict_without_metadata_fails() {
        let result = QueryValidator::new().strict(true).validate(&base());
        assert!(matches!(
            result,
            Err(ValidationError::MetadataUnavailable(_))
        ));

        // Lenient mode skips the existence check
        assert!(QueryValidator::new().validate(&base().dimension("anything")).is_ok());
    }
}
