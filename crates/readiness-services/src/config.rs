//! Configuration and service factory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use readiness_core::persistence::DEFAULT_NAMESPACE;
use readiness_core::section::SectionTiming;
use readiness_core::traits::{ConsultationIntake, ReportService};

use crate::consultation::HttpConsultationIntake;
use crate::mock::{MockConsultationIntake, MockReportService};
use crate::report::HttpReportService;

/// Configuration for one remote service.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServiceConfig {
    Http {
        base_url: String,
        #[serde(default)]
        api_key: Option<String>,
    },
    /// Record requests locally instead of sending them.
    Mock,
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceConfig::Http { base_url, api_key } => f
                .debug_struct("Http")
                .field("base_url", base_url)
                .field("api_key", &api_key.as_ref().map(|_| "***"))
                .finish(),
            ServiceConfig::Mock => f.write_str("Mock"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServicesConfig {
    #[serde(default)]
    pub report: Option<ServiceConfig>,
    #[serde(default)]
    pub consultation: Option<ServiceConfig>,
}

/// Save feedback and pacing delays, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub saved_display_ms: u64,
    pub verify_delay_ms: u64,
    pub advance_delay_ms: u64,
    pub slow_threshold_ms: u64,
    pub commit_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            saved_display_ms: 2000,
            verify_delay_ms: 400,
            advance_delay_ms: 1500,
            slow_threshold_ms: 3000,
            commit_timeout_ms: 10_000,
        }
    }
}

impl TimingConfig {
    pub fn section_timing(&self) -> SectionTiming {
        SectionTiming {
            saved_display: Duration::from_millis(self.saved_display_ms),
            verify_delay: Duration::from_millis(self.verify_delay_ms),
            advance_delay: Duration::from_millis(self.advance_delay_ms),
            slow_threshold: Duration::from_millis(self.slow_threshold_ms),
        }
    }

    pub fn commit_timeout(&self) -> Duration {
        Duration::from_millis(self.commit_timeout_ms)
    }
}

/// Top-level readiness configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessConfig {
    /// Where assessment snapshots are stored.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Storage key of the assessment snapshot.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Question catalog file; the bundled catalog is used when unset.
    #[serde(default)]
    pub catalog: Option<PathBuf>,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub services: ServicesConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./.readiness")
}
fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            namespace: default_namespace(),
            catalog: None,
            timing: TimingConfig::default(),
            services: ServicesConfig::default(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_service_config(config: &ServiceConfig) -> ServiceConfig {
    match config {
        ServiceConfig::Http { base_url, api_key } => ServiceConfig::Http {
            base_url: resolve_env_vars(base_url),
            api_key: api_key
                .as_ref()
                .map(|k| resolve_env_vars(k))
                .filter(|k| !k.is_empty()),
        },
        ServiceConfig::Mock => ServiceConfig::Mock,
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `readiness.toml` in the current directory
/// 2. `~/.config/readiness/config.toml`
///
/// Environment variable overrides: `READINESS_DATA_DIR`, `READINESS_REPORT_KEY`.
pub fn load_config() -> Result<ReadinessConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ReadinessConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("readiness.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match &config_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<ReadinessConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ReadinessConfig::default(),
    };

    if let Some(path) = &config_path {
        tracing::debug!("loaded config from {}", path.display());
    }

    // Apply env var overrides
    if let Ok(dir) = std::env::var("READINESS_DATA_DIR") {
        config.data_dir = PathBuf::from(dir);
    }
    if let Ok(key) = std::env::var("READINESS_REPORT_KEY") {
        if let Some(ServiceConfig::Http { api_key, .. }) = &mut config.services.report {
            *api_key = Some(key);
        }
    }

    config.services.report = config.services.report.as_ref().map(resolve_service_config);
    config.services.consultation = config
        .services
        .consultation
        .as_ref()
        .map(resolve_service_config);

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("readiness"))
}

/// Create a report service from its configuration.
pub fn create_report_service(config: &ServiceConfig) -> Result<Box<dyn ReportService>> {
    match config {
        ServiceConfig::Http { base_url, api_key } => {
            Ok(Box::new(HttpReportService::new(base_url, api_key.clone())?))
        }
        ServiceConfig::Mock => Ok(Box::new(MockReportService::new())),
    }
}

/// Create a consultation intake from its configuration.
pub fn create_consultation_intake(config: &ServiceConfig) -> Result<Box<dyn ConsultationIntake>> {
    match config {
        ServiceConfig::Http { base_url, api_key } => Ok(Box::new(HttpConsultationIntake::new(
            base_url,
            api_key.clone(),
        )?)),
        ServiceConfig::Mock => Ok(Box::new(MockConsultationIntake::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_READINESS_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_READINESS_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_READINESS_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        std::env::remove_var("_READINESS_TEST_VAR");
    }

    #[test]
    fn unset_key_reference_becomes_none() {
        let resolved = resolve_service_config(&ServiceConfig::Http {
            base_url: "https://reports.example".into(),
            api_key: Some("${_READINESS_UNSET_VAR}".into()),
        });
        assert!(matches!(
            resolved,
            ServiceConfig::Http { api_key: None, .. }
        ));
    }

    #[test]
    fn default_config() {
        let config = ReadinessConfig::default();
        assert_eq!(config.namespace, "readinow-assessment");
        assert_eq!(config.timing.saved_display_ms, 2000);
        assert_eq!(config.timing.commit_timeout(), Duration::from_secs(10));
        assert!(config.services.report.is_none());
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
data_dir = "/var/lib/readiness"
catalog = "catalog/provision29.toml"

[timing]
verify_delay_ms = 0
advance_delay_ms = 0

[services.report]
type = "http"
base_url = "https://functions.example/v1"
api_key = "sk-test"

[services.consultation]
type = "mock"
"#;
        let config: ReadinessConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/readiness"));
        assert_eq!(config.namespace, "readinow-assessment");
        assert_eq!(config.timing.verify_delay_ms, 0);
        assert_eq!(config.timing.saved_display_ms, 2000);
        assert_eq!(config.timing.section_timing().advance_delay, Duration::ZERO);
        assert!(matches!(
            config.services.report,
            Some(ServiceConfig::Http { .. })
        ));
        assert!(matches!(config.services.consultation, Some(ServiceConfig::Mock)));
    }

    #[test]
    fn debug_masks_api_key() {
        let config = ServiceConfig::Http {
            base_url: "https://functions.example".into(),
            api_key: Some("sk-secret".into()),
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("readiness.toml");
        std::fs::write(&path, "namespace = \"pilot\"\n").unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.namespace, "pilot");

        let missing = load_config_from(Some(&dir.path().join("absent.toml")));
        assert!(missing.is_err());
    }

    #[test]
    fn factories_build_services() {
        let report = create_report_service(&ServiceConfig::Mock).unwrap();
        assert_eq!(report.name(), "mock");
        let intake = create_consultation_intake(&ServiceConfig::Http {
            base_url: "https://hooks.example/consult".into(),
            api_key: None,
        })
        .unwrap();
        assert_eq!(intake.name(), "webhook");
    }
}
