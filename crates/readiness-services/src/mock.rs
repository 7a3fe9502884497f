//! Mock services for testing and offline runs.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use readiness_core::traits::{
    ConsultationIntake, ConsultationRequest, ReportReceipt, ReportRequest, ReportService,
};

/// A report service that records requests instead of sending them.
#[derive(Default)]
pub struct MockReportService {
    /// Error message returned from every call when set.
    failure: Option<String>,
    call_count: AtomicU32,
    last_request: Mutex<Option<ReportRequest>>,
}

impl MockReportService {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock whose every call fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_request(&self) -> Option<ReportRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl ReportService for MockReportService {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send_report(&self, request: &ReportRequest) -> anyhow::Result<ReportReceipt> {
        let n = self.call_count.fetch_add(1, Ordering::Relaxed) + 1;
        *self.last_request.lock().unwrap_or_else(|e| e.into_inner()) = Some(request.clone());

        if let Some(message) = &self.failure {
            anyhow::bail!("{message}");
        }
        tracing::info!(email = %request.email, "mock report recorded");
        Ok(ReportReceipt {
            id: Some(format!("mock-{n}")),
        })
    }
}

/// A consultation intake that records requests instead of sending them.
#[derive(Default)]
pub struct MockConsultationIntake {
    failure: Option<String>,
    requests: Mutex<Vec<ConsultationRequest>>,
}

impl MockConsultationIntake {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<ConsultationRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl ConsultationIntake for MockConsultationIntake {
    fn name(&self) -> &str {
        "mock"
    }

    async fn submit(&self, request: &ConsultationRequest) -> anyhow::Result<()> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());
        match &self.failure {
            Some(message) => anyhow::bail!("{message}"),
            None => Ok(()),
        }
    }
}
