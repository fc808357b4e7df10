//! GA4 Data API data models
//!
//! Wire types for `runReport` and `metadata`, organized by resource.

// Not every wire type is constructed by the CLI; all are exported for completeness.
#![allow(unused_imports)]

mod filter;
mod metadata;
mod report;

pub use filter::{
    BetweenFilter, Filter, FilterCondition, FilterExpression, FilterExpressionList, InListFilter,
    NumericFilter, NumericOperation, NumericValue, StringFilter, StringMatchType,
};
pub use metadata::{DimensionMetadata, MetadataResponse, MetricMetadata};
pub use report::{
    CellValue, DateRange, Dimension, DimensionHeader, DimensionOrderBy, DimensionOrderType, Metric,
    MetricHeader, MetricOrderBy, OrderBy, OrderByTarget, PropertyQuota, QuotaStatus,
    ResponseMetadata, Row, RunReportRequest, RunReportResponse,
};
