//! HTTP report delivery.

use async_trait::async_trait;
use tracing::instrument;
use uuid::Uuid;

use readiness_core::traits::{ReportReceipt, ReportRequest, ReportService};

use crate::error::ServiceError;
use crate::http::{build_client, check_status, send_error};

/// Path of the report function under the configured base URL.
const REPORT_PATH: &str = "send-assessment-report";

/// Sends the assessment report as a JSON POST.
pub struct HttpReportService {
    api_key: Option<String>,
    endpoint: String,
    client: reqwest::Client,
}

impl HttpReportService {
    pub fn new(base_url: &str, api_key: Option<String>) -> anyhow::Result<Self> {
        Ok(Self {
            api_key,
            endpoint: format!("{}/{REPORT_PATH}", base_url.trim_end_matches('/')),
            client: build_client()?,
        })
    }
}

#[async_trait]
impl ReportService for HttpReportService {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    async fn send_report(&self, request: &ReportRequest) -> anyhow::Result<ReportReceipt> {
        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("idempotency-key", Uuid::new_v4().to_string())
            .json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(send_error)?;
        let response = check_status(response).await?;

        let body = response.text().await.map_err(send_error)?;
        if body.trim().is_empty() {
            return Ok(ReportReceipt::default());
        }
        let receipt: ReportReceipt =
            serde_json::from_str(&body).map_err(|e| ServiceError::ApiError {
                status: 0,
                message: format!("failed to parse response: {e}"),
            })?;
        tracing::info!(id = ?receipt.id, "report sent");
        Ok(receipt)
    }
}
