//! GA4 Data API reporting gateway

use async_trait::async_trait;

use crate::error::ApiError;

pub mod data_api;
#[cfg(test)]
pub mod mock;
pub mod models;

pub use data_api::DataApiClient;
#[cfg(test)]
#[allow(unused_imports)]
pub use mock::MockGateway;
pub use models::{MetadataResponse, RunReportRequest, RunReportResponse};

/// Result type for gateway calls; failures are always remote errors
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Remote reporting service consumed by the executor.
///
/// Implementations own transport, authentication and rate limiting. A
/// `NOT_FOUND` status must surface as [`ApiError::NotFound`].
#[async_trait]
pub trait ReportingGateway: Send + Sync {
    /// Execute a fully assembled report request
    async fn run_report(&self, request: &RunReportRequest) -> ApiResult<RunReportResponse>;

    /// Fetch the dimensions and metrics available on a property
    async fn get_metadata(&self, property_id: &str) -> ApiResult<MetadataResponse>;
}
