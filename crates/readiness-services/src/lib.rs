//! readiness-services — Storage backends, remote services and configuration.
//!
//! Implements the `StateStorage`, `ReportService` and `ConsultationIntake`
//! ports from `readiness-core` on top of the filesystem and HTTP.

pub mod config;
pub mod consultation;
pub mod error;
pub mod file_store;
mod http;
pub mod mock;
pub mod report;

pub use config::{
    create_consultation_intake, create_report_service, load_config, load_config_from,
    ReadinessConfig, ServiceConfig,
};
pub use error::ServiceError;
pub use file_store::JsonFileStorage;
