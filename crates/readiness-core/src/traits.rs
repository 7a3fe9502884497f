//! Ports to the collaborators the core depends on.
//!
//! Durable storage is implemented in this crate (`storage::MemoryStorage`) and
//! in `readiness-services`; the remote report and consultation services are
//! implemented in `readiness-services` only.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::model::{CompanyProfile, SectionId};

// ---------------------------------------------------------------------------
// Durable storage
// ---------------------------------------------------------------------------

/// Key-value storage for serialized assessment snapshots.
#[async_trait]
pub trait StateStorage: Send + Sync {
    /// Backend name for logs (e.g. "file").
    fn name(&self) -> &str;

    /// Read the blob stored under `key`; `Ok(None)` on first run.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the blob stored under `key`.
    ///
    /// A failed write must leave the previous value readable.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

// ---------------------------------------------------------------------------
// Report delivery
// ---------------------------------------------------------------------------

/// Remote service that emails the assessment report.
#[async_trait]
pub trait ReportService: Send + Sync {
    fn name(&self) -> &str;

    async fn send_report(&self, request: &ReportRequest) -> anyhow::Result<ReportReceipt>;
}

/// Payload accepted by the report service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    /// Where the report goes; may differ from the profile contact.
    pub email: String,
    pub company_profile: CompanyProfile,
    /// Total score across all sections.
    pub overall_score: u32,
    pub section_scores: BTreeMap<SectionId, u32>,
}

/// What the report service hands back on success.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportReceipt {
    /// Provider message id, when one is returned.
    #[serde(default)]
    pub id: Option<String>,
}

// ---------------------------------------------------------------------------
// Consultation intake
// ---------------------------------------------------------------------------

/// Remote service that records consultation requests. Fire-and-forget.
#[async_trait]
pub trait ConsultationIntake: Send + Sync {
    fn name(&self) -> &str;

    async fn submit(&self, request: &ConsultationRequest) -> anyhow::Result<()>;
}

/// Contact fields for a consultation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultationRequest {
    pub name: String,
    pub email: String,
    pub company: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub source: String,
}

/// Source tag attached to consultation requests from this engine.
pub const CONSULTATION_SOURCE: &str = "Readiness Assessment Tool";

impl ConsultationRequest {
    /// Build a request stamped with the current time.
    pub fn new(name: &str, email: &str, company: &str) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            company: company.to_string(),
            phone: String::new(),
            message: String::new(),
            timestamp: Utc::now(),
            source: CONSULTATION_SOURCE.to_string(),
        }
    }

    /// Prefill contact fields from the company profile.
    pub fn from_profile(name: &str, profile: &CompanyProfile) -> Self {
        let mut request = Self::new(name, &profile.email, &profile.company_name);
        request.phone = profile.phone.clone().unwrap_or_default();
        request
    }
}
