//! GA4 Data API client implementation
//!
//! Thin reqwest transport behind [`ReportingGateway`]. Token acquisition and
//! refresh happen elsewhere; this client only sends the bearer token it was
//! given.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use log::debug;
use reqwest::{Client as HttpClient, Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::{ApiResult, MetadataResponse, ReportingGateway, RunReportRequest, RunReportResponse};
use crate::error::ApiError;

/// GA4 Data API base URL
pub const API_BASE_URL: &str = "https://analyticsdata.googleapis.com/v1beta";

/// Client-side throttle, well below the per-property concurrent quota
const RATE_LIMIT_PER_SECOND: u32 = 10;

/// Per-request transport timeout
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// GA4 Data API client
pub struct DataApiClient {
    http: HttpClient,
    base_url: String,
    access_token: String,
    rate_limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

/// Google API error envelope: `{"error": {"code": 404, "message": "...", "status": "NOT_FOUND"}}`
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

impl DataApiClient {
    /// Create a new client against the public API
    pub fn new(access_token: impl Into<String>) -> ApiResult<Self> {
        Self::with_base_url(access_token, API_BASE_URL)
    }

    /// Create a client against a custom host (development and tests)
    pub fn with_base_url(
        access_token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> ApiResult<Self> {
        let http = HttpClient::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let quota = Quota::per_second(NonZeroU32::MIN.saturating_add(RATE_LIMIT_PER_SECOND - 1));
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            rate_limiter,
        })
    }

    /// Make an authenticated API request
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&RunReportRequest>,
    ) -> ApiResult<T> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);

        let mut builder = self
            .http
            .request(method, &url)
            .bearer_auth(&self.access_token);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(ApiError::from)?;

        let status = response.status();
        match status {
            StatusCode::OK => response.json::<T>().await.map_err(|e| {
                ApiError::InvalidResponse(format!("Failed to parse response: {}", e))
            }),
            StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
            StatusCode::FORBIDDEN => Err(ApiError::Forbidden),
            StatusCode::NOT_FOUND => {
                let text = response.text().await.unwrap_or_default();
                Err(ApiError::NotFound(error_message(&text, "Resource not found")))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                Err(ApiError::RateLimit(Duration::from_secs(retry_after)))
            }
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                let text = response.text().await.unwrap_or_default();
                Err(ApiError::BadRequest(error_message(&text, "Bad request")))
            }
            _ => {
                let text = response.text().await.unwrap_or_default();
                Err(ApiError::Status {
                    status: status.as_u16(),
                    message: error_message(&text, status.as_str()),
                })
            }
        }
    }
}

/// Pull the human-readable message out of a Google error body
fn error_message(body: &str, fallback: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
        _ if !body.trim().is_empty() => body.trim().to_string(),
        _ => fallback.to_string(),
    }
}

/// Accept both `123` and `properties/123`
fn property_path(property_id: &str) -> String {
    let id = property_id
        .strip_prefix("properties/")
        .unwrap_or(property_id);
    format!("/properties/{}", id)
}

#[async_trait]
impl ReportingGateway for DataApiClient {
    async fn run_report(&self, request: &RunReportRequest) -> ApiResult<RunReportResponse> {
        let path = format!("{}:runReport", property_path(&request.property));
        self.request(Method::POST, &path, Some(request)).await
    }

    async fn get_metadata(&self, property_id: &str) -> ApiResult<MetadataResponse> {
        let path = format!("{}/metadata", property_path(property_id));
        self.request(Method::GET, &path, None).await
    }
}
