//! Mock reporting gateway for testing
//!
//! Serves canned responses without making real API calls, and records
//! every request so tests can assert on call counts and request shape.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use super::models::{CellValue, DimensionHeader, MetricHeader, Row};
use super::{ApiResult, MetadataResponse, ReportingGateway, RunReportRequest, RunReportResponse};
use crate::error::ApiError;

/// Mock gateway for testing.
///
/// # Example
/// ```ignore
/// let mock = MockGateway::new().with_report(MockGateway::sample_report()).await;
/// let response = mock.run_report(&request).await?;
/// assert_eq!(mock.call_counts().await.run_report, 1);
/// ```
#[derive(Default)]
pub struct MockGateway {
    /// Response returned from run_report
    report: Arc<Mutex<RunReportResponse>>,
    /// Response returned from get_metadata
    metadata: Arc<Mutex<Option<MetadataResponse>>>,
    /// Error to return (if any) - consumed on first use
    error: Arc<Mutex<Option<ApiError>>>,
    /// Artificial latency for run_report
    delay: Arc<Mutex<Option<Duration>>>,
    /// Track number of calls for verification
    call_count: Arc<Mutex<CallCounts>>,
    /// Captured report requests for test assertions
    captured_requests: Arc<Mutex<Vec<RunReportRequest>>>,
}

/// Tracks gateway call counts for test verification
#[derive(Default, Debug, Clone)]
pub struct CallCounts {
    pub run_report: usize,
    pub get_metadata: usize,
}

impl MockGateway {
    /// Create a new mock gateway returning an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the report returned from run_report.
    pub async fn with_report(self, report: RunReportResponse) -> Self {
        *self.report.lock().await = report;
        self
    }

    /// Configure the metadata returned from get_metadata.
    pub async fn with_metadata(self, metadata: MetadataResponse) -> Self {
        *self.metadata.lock().await = Some(metadata);
        self
    }

    /// Configure an error for the next call.
    pub async fn with_error(self, error: ApiError) -> Self {
        *self.error.lock().await = Some(error);
        self
    }

    /// Delay every run_report call.
    pub async fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock().await = Some(delay);
        self
    }

    /// Get the current call counts.
    pub async fn call_counts(&self) -> CallCounts {
        self.call_count.lock().await.clone()
    }

    /// Get all captured report requests.
    pub async fn captured_requests(&self) -> Vec<RunReportRequest> {
        self.captured_requests.lock().await.clone()
    }

    /// A two-row sessions-by-source report.
    pub fn sample_report() -> RunReportResponse {
        let row = |source: &str, sessions: &str| Row {
            dimension_values: vec![CellValue {
                value: source.to_string(),
            }],
            metric_values: vec![CellValue {
                value: sessions.to_string(),
            }],
        };

        RunReportResponse {
            dimension_headers: vec![DimensionHeader {
                name: "sessionSource".to_string(),
            }],
            metric_headers: vec![MetricHeader {
                name: "sessions".to_string(),
                metric_type: "TYPE_INTEGER".to_string(),
            }],
            rows: vec![row("google", "120"), row("(direct)", "45")],
            row_count: 2,
            ..Default::default()
        }
    }

    async fn take_error(&self) -> Option<ApiError> {
        self.error.lock().await.take()
    }
}

#[async_trait]
impl ReportingGateway for MockGateway {
    async fn run_report(&self, request: &RunReportRequest) -> ApiResult<RunReportResponse> {
        self.call_count.lock().await.run_report += 1;
        self.captured_requests.lock().await.push(request.clone());

        let delay = *self.delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        Ok(self.report.lock().await.clone())
    }

    async fn get_metadata(&self, property_id: &str) -> ApiResult<MetadataResponse> {
        self.call_count.lock().await.get_metadata += 1;

        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        self.metadata
            .lock()
            .await
            .clone()
            .ok_or_else(|| ApiError::NotFound(format!("properties/{}/metadata", property_id)))
    }
}
