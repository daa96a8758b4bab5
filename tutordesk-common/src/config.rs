//! Configuration loading
//!
//! Engagement parameters are read from a TOML file resolved in priority
//! order: explicit path, `TUTORDESK_CONFIG` environment variable, the
//! user's config directory, compiled defaults. Every field has a default
//! so a partial file (or none at all) is valid.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "TUTORDESK_CONFIG";

/// Scan pipeline parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Seconds an identical raw text is suppressed after acceptance
    pub debounce_window_secs: u64,
    /// Seconds before scan feedback resets to Ready
    pub feedback_reset_secs: u64,
    /// Points awarded with a new attendance
    pub attendance_points: i64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            debounce_window_secs: 3,
            feedback_reset_secs: 3,
            attendance_points: 10,
        }
    }
}

/// Report workflow parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Days after which a periodic report recipient is due again
    pub periodic_due_days: i64,
    /// Issuer name substituted into report templates
    pub issuer_name: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            periodic_due_days: 14,
            issuer_name: "Tutordesk".to_string(),
        }
    }
}

/// Text-generation service parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Generation endpoint URL
    pub endpoint: String,
    /// Request timeout in seconds (the service is slow)
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8750/generate".to_string(),
            timeout_secs: 20,
        }
    }
}

/// Delivery gateway parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Message gateway endpoint URL
    pub endpoint: String,
    /// Sender identity forwarded to the gateway
    pub sender_id: String,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8751/send".to_string(),
            sender_id: "tutordesk".to_string(),
        }
    }
}

/// Engagement core configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngagementConfig {
    /// Scan pipeline parameters
    pub scan: ScanConfig,
    /// Report workflow parameters
    pub report: ReportConfig,
    /// Text-generation service parameters
    pub generator: GeneratorConfig,
    /// Delivery gateway parameters
    pub delivery: DeliveryConfig,
}

impl EngagementConfig {
    /// Load configuration following the priority order
    ///
    /// 1. Explicit path argument (must exist and parse)
    /// 2. `TUTORDESK_CONFIG` environment variable
    /// 3. `<config dir>/tutordesk/config.toml`
    /// 4. Compiled defaults
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::load_from_path(path);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Self::load_from_path(Path::new(&path));
        }

        if let Some(path) = default_config_path() {
            if path.exists() {
                return Self::load_from_path(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load and parse one TOML file
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))
    }
}

/// Platform config file location: `<config dir>/tutordesk/config.toml`
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tutordesk").join("config.toml"))
}
