//! Translation of flat filter specs into Data API filter expressions
//!
//! A list of conditions compiles to `None` (no filter), a bare leaf (one
//! condition) or an `andGroup` holding one leaf per condition in input
//! order. Nothing else is ever produced.

use std::str::FromStr;

use crate::client::models::{
    BetweenFilter, Filter, FilterCondition, FilterExpression, InListFilter, NumericFilter,
    NumericOperation, NumericValue, StringFilter, StringMatchType,
};
use crate::error::TranslationError;

use super::models::{FilterKind, FilterSpec};

/// 2^63, the first magnitude an i64 cannot hold
const INT64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

/// Compile a list of conditions into a single filter expression.
pub fn compile<'a, I>(filters: I) -> Result<Option<FilterExpression>, TranslationError>
where
    I: IntoIterator<Item = &'a FilterSpec>,
{
    let mut leaves = filters
        .into_iter()
        .map(compile_filter)
        .collect::<Result<Vec<_>, _>>()?;

    match leaves.len() {
        0 => Ok(None),
        1 => Ok(leaves.pop()),
        _ => Ok(Some(FilterExpression::and(leaves))),
    }
}

/// Compile one condition into a leaf expression.
pub fn compile_filter(spec: &FilterSpec) -> Result<FilterExpression, TranslationError> {
    let missing = || TranslationError::MissingPayload {
        field: spec.field_name.clone(),
        kind: spec.kind.to_string(),
    };

    let condition = match &spec.kind {
        FilterKind::String => {
            let payload = spec.string.as_ref().ok_or_else(missing)?;
            let match_type = match payload.match_type.as_deref() {
                None | Some("") => StringMatchType::Exact,
                Some(raw) => {
                    StringMatchType::from_str(raw).map_err(TranslationError::UnknownMatchType)?
                }
            };
            FilterCondition::StringFilter(StringFilter {
                match_type,
                value: payload.value.clone(),
                case_sensitive: payload.case_sensitive,
            })
        }
        FilterKind::Numeric => {
            let payload = spec.numeric.as_ref().ok_or_else(missing)?;
            let operation = NumericOperation::from_str(&payload.operation)
                .map_err(TranslationError::UnknownOperation)?;
            FilterCondition::NumericFilter(NumericFilter {
                operation,
                value: encode_numeric(payload.value),
            })
        }
        FilterKind::Between => {
            let payload = spec.between.as_ref().ok_or_else(missing)?;
            FilterCondition::BetweenFilter(BetweenFilter {
                from_value: encode_numeric(payload.from),
                to_value: encode_numeric(payload.to),
            })
        }
        FilterKind::InList => {
            let payload = spec.in_list.as_ref().ok_or_else(missing)?;
            FilterCondition::InListFilter(InListFilter {
                values: payload.values.clone(),
                case_sensitive: payload.case_sensitive,
            })
        }
        FilterKind::Unsupported(kind) => {
            return Err(TranslationError::UnsupportedKind(kind.clone()));
        }
    };

    Ok(FilterExpression::Filter(Filter {
        field_name: spec.field_name.clone(),
        condition,
    }))
}

/// Encode a numeric literal for the wire.
///
/// Whole numbers that fit in an i64 become integer tokens (`5.0` -> `"5"`);
/// everything else becomes the shortest decimal string that round-trips
/// (`5.5` -> `"5.5"`).
pub fn encode_numeric(value: f64) -> NumericValue {
    if value.is_finite() && value.fract() == 0.0 && (-INT64_LIMIT..INT64_LIMIT).contains(&value) {
        NumericValue::Int64Value((value as i64).to_string())
    } else {
        NumericValue::DoubleValue(value.to_string())
    }
}
