// SPDX-License-Identifier: AGPL-3.0-or-later
//! Scripted in-memory controller for unit tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{Method, Payload, Transport};
use crate::error::{Result, ShiftError};

type Responder = Box<dyn Fn(&Payload) -> Result<Value> + Send + Sync>;

/// Records every payload and answers through a responder function
pub(crate) struct FakeController {
    calls: Mutex<Vec<Payload>>,
    responder: Responder,
}

impl FakeController {
    pub const CID: &'static str = "cid-fake-0001";

    /// A controller that answers with `responder`
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&Payload) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            calls: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        }
    }

    /// A well-behaved controller knowing the domain of each listed spoke
    pub fn with_domains(domains: &[(&str, &str)]) -> Self {
        let domains: HashMap<String, String> = domains
            .iter()
            .map(|(gw, domain)| (gw.to_string(), domain.to_string()))
            .collect();

        Self::new(move |payload| Ok(healthy_reply(&domains, payload)))
    }

    /// Every payload received so far
    pub fn calls(&self) -> Vec<Payload> {
        self.calls.lock().unwrap().clone()
    }

    /// Action names received so far
    pub fn actions(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|payload| payload.action().to_string())
            .collect()
    }
}

/// Answer the way a healthy controller does
pub(crate) fn healthy_reply(domains: &HashMap<String, String>, payload: &Payload) -> Value {
    match payload.action() {
        "login" => json!({
            "return": true,
            "results": "User login:admin in account:admin has been authorized successfully",
            "CID": FakeController::CID,
        }),
        "get_multi_cloud_security_domain_attachment_details" => {
            let attachment = payload.get("attachment_name").unwrap_or_default();
            match domains.get(attachment) {
                Some(domain) => json!({
                    "return": true,
                    "results": {"name": attachment, "domain": domain},
                }),
                None => json!({
                    "return": false,
                    "reason": format!("Attachment {} does not exist", attachment),
                }),
            }
        }
        action => json!({"return": true, "results": format!("{} done", action)}),
    }
}

/// The error a transport returns for a body that is not JSON
pub(crate) fn malformed(payload: &Payload) -> ShiftError {
    ShiftError::MalformedResponse {
        action: payload.action().to_string(),
        message: "expected value at line 1 column 1".to_string(),
    }
}

#[async_trait]
impl Transport for FakeController {
    async fn request(&self, _method: Method, payload: &Payload) -> Result<Value> {
        self.calls.lock().unwrap().push(payload.clone());
        (self.responder)(payload)
    }
}
