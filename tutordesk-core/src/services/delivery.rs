//! Message delivery gateway client
//!
//! HTTP client for the external delivery channel. The report queue
//! invokes it fire-and-forget; errors returned here are logged by the
//! caller and never block the workflow.

use crate::error::{Error, Result};
use crate::services::DeliveryChannel;
use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;
use tutordesk_common::config::DeliveryConfig;

/// Request body of the gateway endpoint
#[derive(Debug, Serialize)]
struct OutboundMessage<'a> {
    /// Sender identity
    from: &'a str,
    /// Recipient phone number
    to: &'a str,
    /// Message text
    body: &'a str,
}

/// HTTP client for the message gateway
pub struct HttpDeliveryChannel {
    client: reqwest::Client,
    endpoint: String,
    sender_id: String,
}

impl HttpDeliveryChannel {
    /// Build a client from the delivery configuration
    pub fn new(config: &DeliveryConfig) -> Result<Self> {
        let client = reqwest::Client::new();
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            sender_id: config.sender_id.clone(),
        })
    }
}

#[async_trait]
impl DeliveryChannel for HttpDeliveryChannel {
    async fn send(&self, phone: &str, text: &str) -> Result<()> {
        debug!(to = phone, "dispatching message to gateway");

        let message = OutboundMessage {
            from: &self.sender_id,
            to: phone,
            body: text,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&message)
            .send()
            .await
            .map_err(|e| Error::Delivery(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Delivery(format!(
                "gateway returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}
