//! Filter expression models for the runReport protocol

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Nested boolean filter expression sent as `dimensionFilter` / `metricFilter`.
///
/// Serializes externally tagged, e.g. `{"andGroup": {"expressions": [...]}}`
/// or `{"filter": {"fieldName": "country", "stringFilter": {...}}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterExpression {
    AndGroup(FilterExpressionList),
    OrGroup(FilterExpressionList),
    NotExpression(Box<FilterExpression>),
    Filter(Filter),
}

impl FilterExpression {
    /// Combine expressions with AND, preserving order
    pub fn and(expressions: Vec<FilterExpression>) -> Self {
        FilterExpression::AndGroup(FilterExpressionList { expressions })
    }

    /// Combine expressions with OR, preserving order
    #[allow(dead_code)]
    pub fn or(expressions: Vec<FilterExpression>) -> Self {
        FilterExpression::OrGroup(FilterExpressionList { expressions })
    }

    /// Negate an expression
    #[allow(dead_code)]
    pub fn not(expression: FilterExpression) -> Self {
        FilterExpression::NotExpression(Box::new(expression))
    }

    /// Number of leaf filters in this tree
    pub fn leaf_count(&self) -> usize {
        match self {
            FilterExpression::Filter(_) => 1,
            FilterExpression::NotExpression(inner) => inner.leaf_count(),
            FilterExpression::AndGroup(list) | FilterExpression::OrGroup(list) => {
                list.expressions.iter().map(Self::leaf_count).sum()
            }
        }
    }
}

/// Ordered children of an AND / OR group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterExpressionList {
    pub expressions: Vec<FilterExpression>,
}

/// A single leaf filter on one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub field_name: String,

    #[serde(flatten)]
    pub condition: FilterCondition,
}

/// Exactly one condition payload per leaf
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterCondition {
    StringFilter(StringFilter),
    NumericFilter(NumericFilter),
    BetweenFilter(BetweenFilter),
    InListFilter(InListFilter),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StringFilter {
    pub match_type: StringMatchType,
    pub value: String,
    pub case_sensitive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericFilter {
    pub operation: NumericOperation,
    pub value: NumericValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetweenFilter {
    pub from_value: NumericValue,
    pub to_value: NumericValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InListFilter {
    pub values: Vec<String>,
    pub case_sensitive: bool,
}

/// Numeric literal in wire form: an integer token or a decimal-string token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NumericValue {
    Int64Value(String),
    DoubleValue(String),
}

impl NumericValue {
    /// The token text regardless of representation
    pub fn token(&self) -> &str {
        match self {
            NumericValue::Int64Value(v) | NumericValue::DoubleValue(v) => v,
        }
    }
}

/// String match types understood by the Data API.
///
/// `STARTS_WITH` and `REGEX` are accepted as aliases for `BEGINS_WITH` and
/// `FULL_REGEXP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StringMatchType {
    Exact,
    BeginsWith,
    EndsWith,
    Contains,
    FullRegexp,
    PartialRegexp,
}

impl StringMatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StringMatchType::Exact => "EXACT",
            StringMatchType::BeginsWith => "BEGINS_WITH",
            StringMatchType::EndsWith => "ENDS_WITH",
            StringMatchType::Contains => "CONTAINS",
            StringMatchType::FullRegexp => "FULL_REGEXP",
            StringMatchType::PartialRegexp => "PARTIAL_REGEXP",
        }
    }
}

impl FromStr for StringMatchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "EXACT" => Ok(StringMatchType::Exact),
            "BEGINS_WITH" | "STARTS_WITH" => Ok(StringMatchType::BeginsWith),
            "ENDS_WITH" => Ok(StringMatchType::EndsWith),
            "CONTAINS" => Ok(StringMatchType::Contains),
            "FULL_REGEXP" | "REGEX" => Ok(StringMatchType::FullRegexp),
            "PARTIAL_REGEXP" => Ok(StringMatchType::PartialRegexp),
            _ => Err(s.to_string()),
        }
    }
}

impl fmt::Display for StringMatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NumericOperation {
    Equal,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl NumericOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            NumericOperation::Equal => "EQUAL",
            NumericOperation::LessThan => "LESS_THAN",
            NumericOperation::LessThanOrEqual => "LESS_THAN_OR_EQUAL",
            NumericOperation::GreaterThan => "GREATER_THAN",
            NumericOperation::GreaterThanOrEqual => "GREATER_THAN_OR_EQUAL",
        }
    }
}

impl FromStr for NumericOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "EQUAL" => Ok(NumericOperation::Equal),
            "LESS_THAN" => Ok(NumericOperation::LessThan),
            "LESS_THAN_OR_EQUAL" => Ok(NumericOperation::LessThanOrEqual),
            "GREATER_THAN" => Ok(NumericOperation::GreaterThan),
            "GREATER_THAN_OR_EQUAL" => Ok(NumericOperation::GreaterThanOrEqual),
            _ => Err(s.to_string()),
        }
    }
}

impl fmt::Display for NumericOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_leaf_serializes_with_payload_key() {
        let expr = FilterExpression::Filter(Filter {
            field_name: "country".to_string(),
            condition: FilterCondition::StringFilter(StringFilter {
                match_type: StringMatchType::Exact,
                value: "Japan".to_string(),
                case_sensitive: false,
            }),
        });

        let value = serde_json::to_value(&expr).unwrap();
        assert_eq!(
            value,
            json!({
                "filter": {
                    "fieldName": "country",
                    "stringFilter": {"matchType": "EXACT", "value": "Japan", "caseSensitive": false}
                }
            })
        );
    }

    #[test]
    fn test_numeric_value_wire_form() {
        let int = serde_json::to_value(NumericValue::Int64Value("5".into())).unwrap();
        let dbl = serde_json::to_value(NumericValue::DoubleValue("5.5".into())).unwrap();
        assert_eq!(int, json!({"int64Value": "5"}));
        assert_eq!(dbl, json!({"doubleValue": "5.5"}));
    }

    #[test]
    fn test_or_and_not_are_representable() {
        let leaf = || {
            FilterExpression::Filter(Filter {
                field_name: "sessions".to_string(),
                condition: FilterCondition::NumericFilter(NumericFilter {
                    operation: NumericOperation::GreaterThan,
                    value: NumericValue::Int64Value("10".into()),
                }),
            })
        };
        let tree = FilterExpression::or(vec![leaf(), FilterExpression::not(leaf())]);

        let value = serde_json::to_value(&tree).unwrap();
        assert!(value["orGroup"]["expressions"][1]["notExpression"]["filter"].is_object());
        assert_eq!(tree.leaf_count(), 2);

        let back: FilterExpression = serde_json::from_value(value).unwrap();
        assert_eq!(back, tree);
    }

    #[test]
    fn test_match_type_aliases() {
        assert_eq!(
            "starts_with".parse::<StringMatchType>(),
            Ok(StringMatchType::BeginsWith)
        );
        assert_eq!("REGEX".parse::<StringMatchType>(), Ok(StringMatchType::FullRegexp));
        assert!("LIKE".parse::<StringMatchType>().is_err());
    }

    #[test]
    fn test_numeric_operation_parse() {
        assert_eq!(
            "GREATER_THAN_OR_EQUAL".parse::<NumericOperation>(),
            Ok(NumericOperation::GreaterThanOrEqual)
        );
        assert!("BETWEEN".parse::<NumericOperation>().is_err());
    }
}
