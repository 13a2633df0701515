// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP transport for the controller API

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{Method, Payload, Transport};
use crate::config::ControllerSettings;
use crate::error::{Result, ShiftError};

/// Sends payloads to the controller's `/v1/api` endpoint over HTTPS
///
/// Controllers commonly run with self-signed certificates, so certificate
/// validation is turned off for every request.
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    controller: String,
    user: String,
}

impl HttpTransport {
    /// Build a transport for the controller described by `settings`
    pub fn new(settings: &ControllerSettings) -> Result<Self> {
        Self::with_url(settings.api_url(), &settings.controller_ip, &settings.username)
    }

    /// Build a transport posting to an explicit endpoint
    pub fn with_url(url: impl Into<String>, controller: &str, user: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|source| ShiftError::Transport {
                action: "build-client".to_string(),
                source,
            })?;

        Ok(Self {
            client,
            url: url.into(),
            controller: controller.to_string(),
            user: user.to_string(),
        })
    }

    /// Endpoint every request goes to
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, method: Method, payload: &Payload) -> Result<Value> {
        let action = payload.action().to_string();

        debug!(
            controller = %self.controller,
            user = %self.user,
            action = %action,
            method = ?method,
            "Sending controller request"
        );

        let builder = match method {
            Method::Get => self.client.get(&self.url).query(payload.fields()),
            Method::Post => self.client.post(&self.url).form(payload.fields()),
        };

        let response = builder
            .send()
            .await
            .map_err(|source| ShiftError::Transport {
                action: action.clone(),
                source,
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| ShiftError::Transport {
                action: action.clone(),
                source,
            })?;

        debug!(
            controller = %self.controller,
            user = %self.user,
            action = %action,
            status = status.as_u16(),
            bytes = body.len(),
            "Received controller response"
        );

        decode_body(&action, &body)
    }
}

/// Parse a response body as JSON
pub(crate) fn decode_body(action: &str, body: &str) -> Result<Value> {
    serde_json::from_str(body).map_err(|e| ShiftError::MalformedResponse {
        action: action.to_string(),
        message: e.to_string(),
    })
}
