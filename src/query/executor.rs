//! Query execution: validate, digest, check the cache, fetch, persist
//!
//! Cache failures never fail a query; they are logged and treated as a
//! miss. Nothing is written to the cache unless the gateway returned a
//! complete response.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use uuid::Uuid;

use crate::cache::{
    CachedQuery, METADATA_KIND, QueryRecord, ReportCache, TtlPolicy, query_digest,
};
use crate::client::models::{
    DateRange, Dimension, DimensionOrderBy, DimensionOrderType, Metric, MetricOrderBy, OrderBy,
    OrderByTarget,
};
use crate::client::{
    ApiResult, MetadataResponse, ReportingGateway, RunReportRequest, RunReportResponse,
};
use crate::error::{ApiError, Error, Result, TranslationError, ValidationError};

use super::filter::compile;
use super::models::{
    FieldType, FilterSpec, OrderBySpec, QueryResult, QuerySpec, QueryTemplate, TemplateOverrides,
};
use super::validate::QueryValidator;

/// Per-call execution switches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecuteOptions {
    /// Store the result without expiry
    pub persist: bool,
    /// Check field names against property metadata; fail if it cannot be loaded
    pub strict: bool,
    /// Upper bound on the gateway call
    pub timeout: Option<Duration>,
}

/// Runs query specs against a reporting gateway through a cache
pub struct Executor<G: ReportingGateway> {
    gateway: Arc<G>,
    cache: Arc<dyn ReportCache>,
    ttl: TtlPolicy,
}

impl<G: ReportingGateway> Executor<G> {
    /// `cache` is already bound to the caller's context
    pub fn new(gateway: Arc<G>, cache: Arc<dyn ReportCache>) -> Self {
        Self {
            gateway,
            cache,
            ttl: TtlPolicy::default(),
        }
    }

    pub fn with_ttl(mut self, ttl: TtlPolicy) -> Self {
        self.ttl = ttl;
        self
    }

    /// Execute a query spec.
    ///
    /// Remote failures return [`Error::Report`], which carries the
    /// error-annotated result alongside the remote error.
    pub async fn execute(&self, spec: &QuerySpec, options: &ExecuteOptions) -> Result<QueryResult> {
        let started = Instant::now();

        let mut validated = QueryValidator::new().validate(spec)?;
        if options.strict {
            let metadata = self
                .metadata(&validated.property_id)
                .await
                .map_err(|e| ValidationError::MetadataUnavailable(e.to_string()))?;
            validated = QueryValidator::new()
                .strict(true)
                .with_metadata(&metadata)
                .validate(&validated)?;
        }

        let query_hash = query_digest(&validated);

        if let Some((entry, response)) = self.cached_report(&query_hash) {
            debug!("Cache hit: query {}", short_hash(&query_hash));
            // A served result keeps the identity of the fetch that produced it
            let mut result = QueryResult::empty(entry.query_id, query_hash, validated);
            result.fill(response);
            result.from_cache = true;
            result.executed_at =
                DateTime::from_timestamp(entry.created_at, 0).unwrap_or_else(Utc::now);
            result.execution_time_ms = started.elapsed().as_millis() as u64;
            return Ok(result);
        }
        debug!("Cache miss: query {}", short_hash(&query_hash));

        let request = build_request(&validated)?;
        let mut result = QueryResult::empty(new_query_id(), query_hash, validated);

        match self.run_report(&request, options.timeout).await {
            Ok(response) => {
                let payload = serde_json::to_vec(&response);
                result.fill(response);
                result.executed_at = Utc::now();
                result.execution_time_ms = started.elapsed().as_millis() as u64;

                match payload {
                    Ok(payload) => self.store_report(&result, &request, &payload, options.persist),
                    Err(e) => warn!("Failed to serialize report for cache: {}", e),
                }
                Ok(result)
            }
            Err(err) => {
                debug!("Report failed for property {}: {}", result.property_id, err);
                result.error = Some(err.to_string());
                result.execution_time_ms = started.elapsed().as_millis() as u64;
                Err(Error::Report {
                    source: err,
                    attempt: Box::new(result),
                })
            }
        }
    }

    /// Execute a template with overrides, recording the use on the template.
    ///
    /// The template's own query is never modified.
    pub async fn execute_template(
        &self,
        template: &mut QueryTemplate,
        overrides: &TemplateOverrides,
        options: &ExecuteOptions,
    ) -> Result<QueryResult> {
        let spec = overrides.apply(&template.query);
        template.usage_count += 1;
        template.last_used = Some(Utc::now());
        self.execute(&spec, options).await
    }

    /// Field metadata for a property, served from cache when fresh
    pub async fn metadata(&self, property_id: &str) -> Result<MetadataResponse> {
        let property_id = property_id.trim();
        let property_id = property_id
            .strip_prefix("properties/")
            .unwrap_or(property_id);

        match self.cache.get_cached_metadata(property_id, METADATA_KIND) {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(metadata) => {
                    debug!("Cache hit: metadata for {}", property_id);
                    return Ok(metadata);
                }
                Err(e) => warn!("Discarding unreadable cached metadata: {}", e),
            },
            Ok(None) => debug!("Cache miss: metadata for {}", property_id),
            Err(e) => warn!("Metadata cache unavailable: {}", e),
        }

        let metadata = self.gateway.get_metadata(property_id).await?;

        match serde_json::to_vec(&metadata) {
            Ok(bytes) => {
                if let Err(e) =
                    self.cache
                        .cache_metadata(property_id, METADATA_KIND, &bytes, self.ttl.metadata)
                {
                    warn!("Failed to cache metadata: {}", e);
                }
            }
            Err(e) => warn!("Failed to serialize metadata for cache: {}", e),
        }
        Ok(metadata)
    }

    /// Remove expired cache entries
    pub fn sweep(&self) -> Result<usize> {
        Ok(self.cache.sweep()?)
    }

    fn cached_report(&self, query_hash: &str) -> Option<(CachedQuery, RunReportResponse)> {
        match self.cache.get_cached_query(query_hash) {
            Ok(Some(entry)) => match serde_json::from_slice(&entry.payload) {
                Ok(response) => Some((entry, response)),
                Err(e) => {
                    warn!("Discarding unreadable cached report: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Query cache unavailable: {}", e);
                None
            }
        }
    }

    async fn run_report(
        &self,
        request: &RunReportRequest,
        timeout: Option<Duration>,
    ) -> ApiResult<RunReportResponse> {
        let call = self.gateway.run_report(request);
        match timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or(Err(ApiError::Timeout(limit))),
            None => call.await,
        }
    }

    fn store_report(
        &self,
        result: &QueryResult,
        request: &RunReportRequest,
        payload: &[u8],
        persist: bool,
    ) {
        let request_json = match serde_json::to_vec(request) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize request for cache: {}", e);
                return;
            }
        };

        let record = QueryRecord {
            query_id: &result.query_id,
            property_id: &result.property_id,
            query_hash: &result.query_hash,
            request: &request_json,
            payload,
            row_count: result.row_count,
            ttl: if persist { None } else { Some(self.ttl.query) },
        };

        if let Err(e) = self.cache.cache_query(&record) {
            warn!("Failed to cache report: {}", e);
        }
    }
}

/// Assemble the wire request for a validated spec.
///
/// Filters on one of the spec's metrics go to `metricFilter`, the rest to
/// `dimensionFilter`.
pub fn build_request(spec: &QuerySpec) -> std::result::Result<RunReportRequest, TranslationError> {
    let (metric_filters, dimension_filters): (Vec<&FilterSpec>, Vec<&FilterSpec>) = spec
        .filters
        .iter()
        .partition(|f| spec.metrics.contains(&f.field_name));

    Ok(RunReportRequest {
        property: spec.property_id.clone(),
        dimensions: spec
            .dimensions
            .iter()
            .map(|name| Dimension { name: name.clone() })
            .collect(),
        metrics: spec
            .metrics
            .iter()
            .map(|name| Metric { name: name.clone() })
            .collect(),
        date_ranges: vec![DateRange {
            start_date: spec.start_date.clone(),
            end_date: spec.end_date.clone(),
        }],
        dimension_filter: compile(dimension_filters)?,
        metric_filter: compile(metric_filters)?,
        offset: spec.offset,
        limit: spec.limit,
        metric_aggregations: spec.metric_aggregations.clone(),
        order_bys: spec.order_by.iter().map(|o| build_order_by(o, spec)).collect(),
        currency_code: spec.currency_code.clone(),
        keep_empty_rows: spec.keep_empty_rows,
        return_property_quota: spec.return_property_quota,
    })
}

fn build_order_by(order: &OrderBySpec, spec: &QuerySpec) -> OrderBy {
    let field_type = order.field_type.unwrap_or(if spec.dimensions.contains(&order.field_name) {
        FieldType::Dimension
    } else {
        FieldType::Metric
    });

    let target = match field_type {
        FieldType::Dimension => OrderByTarget::Dimension(DimensionOrderBy {
            dimension_name: order.field_name.clone(),
            order_type: order
                .order_type
                .as_deref()
                .and_then(|t| t.parse::<DimensionOrderType>().ok()),
        }),
        FieldType::Metric => OrderByTarget::Metric(MetricOrderBy {
            metric_name: order.field_name.clone(),
        }),
    };

    OrderBy {
        desc: order.descending,
        target,
    }
}

fn new_query_id() -> String {
    Uuid::new_v4().to_string()
}

fn short_hash(hash: &str) -> &str {
    &hash[..12.min(hash.len())]
}
