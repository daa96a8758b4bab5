//! Text-generation service client
//!
//! HTTP client for the external report-text generator. The service is
//! treated as fallible and slow: every request carries a timeout and all
//! failures map to [`Error::Generation`] for the caller to degrade on.

use crate::error::{Error, Result};
use crate::report::ActivitySummary;
use crate::services::TextGenerator;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use tutordesk_common::config::GeneratorConfig;

/// Response body of the generation endpoint
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    /// Generated report text
    text: String,
}

/// HTTP client for the text-generation service
pub struct HttpTextGenerator {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTextGenerator {
    /// Build a client from the generator configuration
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Generation(format!("failed to build client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn generate(&self, summary: &ActivitySummary) -> Result<String> {
        debug!(
            student = %summary.student_name,
            period = %summary.period_label,
            "requesting report text"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(summary)
            .send()
            .await
            .map_err(|e| Error::Generation(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Generation(format!(
                "service returned {}",
                response.status()
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Generation(format!("malformed response: {}", e)))?;

        Ok(body.text)
    }
}
