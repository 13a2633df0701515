// SPDX-License-Identifier: AGPL-3.0-or-later
//! Controller API access
//!
//! Every controller action is a form-encoded request to a single endpoint.
//! The [`Transport`] trait is the request helper: it sends one payload and
//! hands back the parsed JSON body. [`ControllerClient`] builds the payloads
//! for each action on top of it.

mod client;
mod http;
#[cfg(test)]
pub(crate) mod testing;

pub use client::{extract_domain, reported_failure, ControllerClient};
pub use http::HttpTransport;

use std::fmt;

use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::Value;

use crate::error::{Result, ShiftError};

/// Actions sent in the `action` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Login,
    GetSecurityDomainDetails,
    DetachSpoke,
    AttachSpoke,
    AssociateSecurityDomain,
    AddSpokeToInspection,
}

impl Action {
    /// Wire name of the action
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Login => "login",
            Action::GetSecurityDomainDetails => {
                "get_multi_cloud_security_domain_attachment_details"
            }
            Action::DetachSpoke => "detach_spoke_from_transit_gw",
            Action::AttachSpoke => "attach_spoke_to_transit_gw",
            Action::AssociateSecurityDomain => {
                "associate_attachment_to_multi_cloud_security_domain"
            }
            Action::AddSpokeToInspection => "add_spoke_to_transit_firenet_inspection",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP verb for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Payload sent as the query string
    ///
    /// A GET never carries a form body here. Every controller action is a
    /// POST, so this only matters for ad hoc reads.
    Get,
    /// Payload sent as a form body
    Post,
}

/// Ordered key/value fields of one request
#[derive(Clone, PartialEq, Eq)]
pub struct Payload {
    fields: Vec<(String, String)>,
}

impl Payload {
    /// Start a payload for `action`
    pub fn new(action: Action) -> Self {
        Self {
            fields: vec![("action".to_string(), action.as_str().to_string())],
        }
    }

    /// Add the session token as `CID`
    pub fn with_session(self, session: &Session) -> Self {
        self.field("CID", session.cid())
    }

    /// Append a field
    pub fn field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields.push((key.to_string(), value.into()));
        self
    }

    /// Value of the `action` field
    pub fn action(&self) -> &str {
        self.get("action").unwrap_or_default()
    }

    /// Value of the first field named `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All fields in insertion order
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.fields {
            if key == "password" {
                map.entry(key, &"********");
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}

/// The request helper every controller call goes through
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `payload` and return the JSON body of the answer
    async fn request(&self, method: Method, payload: &Payload) -> Result<Value>;
}

/// Login credentials
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

/// Session token (CID) returned by login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    cid: String,
}

impl Session {
    pub fn new(cid: impl Into<String>) -> Self {
        Self { cid: cid.into() }
    }

    /// Pull the `CID` out of a login response
    pub fn from_login_response(response: &Value) -> Result<Self> {
        response
            .get("CID")
            .and_then(Value::as_str)
            .map(Session::new)
            .ok_or_else(|| ShiftError::MissingField {
                action: Action::Login.to_string(),
                field: "CID".to_string(),
            })
    }

    pub fn cid(&self) -> &str {
        &self.cid
    }
}
