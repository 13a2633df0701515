// SPDX-License-Identifier: AGPL-3.0-or-later
//! Typed wrappers around the controller actions

use secrecy::ExposeSecret;
use serde_json::Value;
use tracing::info;

use super::{Action, Credentials, Method, Payload, Session, Transport};
use crate::error::{Result, ShiftError};

/// Controller API client
///
/// Each method issues exactly one request and returns the raw JSON answer.
/// The controller's own `return` flag is left for the caller to judge.
pub struct ControllerClient<T> {
    transport: T,
}

impl<T: Transport> ControllerClient<T> {
    /// Create a client on top of a transport
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// The underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Issue the login action and return the full response
    pub async fn login(&self, credentials: &Credentials) -> Result<Value> {
        let payload = Payload::new(Action::Login)
            .field("username", credentials.username.as_str())
            .field("password", credentials.password.expose_secret().as_str());

        self.transport.request(Method::Post, &payload).await
    }

    /// Log in and keep only the session token
    pub async fn open_session(&self, credentials: &Credentials) -> Result<Session> {
        let response = self.login(credentials).await?;
        let session = Session::from_login_response(&response)?;
        info!(user = %credentials.username, "Controller session opened");
        Ok(session)
    }

    /// Security domain details of a spoke attachment
    pub async fn get_security_domain_details(
        &self,
        session: &Session,
        spoke_gateway: &str,
    ) -> Result<Value> {
        let payload = Payload::new(Action::GetSecurityDomainDetails)
            .with_session(session)
            .field("attachment_name", spoke_gateway);

        let response = self.transport.request(Method::Post, &payload).await?;
        info!(gateway = %spoke_gateway, response = %response, "Security domain details");
        Ok(response)
    }

    /// Detach a spoke from a transit gateway
    pub async fn detach_spoke_from_transit(
        &self,
        session: &Session,
        spoke_gateway: &str,
        transit_gateway: &str,
    ) -> Result<Value> {
        let payload = Payload::new(Action::DetachSpoke)
            .with_session(session)
            .field("spoke_gw", spoke_gateway)
            .field("transit_gw", transit_gateway);

        let response = self.transport.request(Method::Post, &payload).await?;
        info!(
            gateway = %spoke_gateway,
            transit = %transit_gateway,
            response = %response,
            "Detach response"
        );
        Ok(response)
    }

    /// Attach a spoke to a transit gateway
    ///
    /// `route_table_list` is always sent, even when empty.
    pub async fn attach_spoke_to_transit(
        &self,
        session: &Session,
        spoke_gateway: &str,
        transit_gateway: &str,
        route_table_list: &str,
    ) -> Result<Value> {
        let payload = Payload::new(Action::AttachSpoke)
            .with_session(session)
            .field("spoke_gw", spoke_gateway)
            .field("transit_gw", transit_gateway)
            .field("route_table_list", route_table_list);

        let response = self.transport.request(Method::Post, &payload).await?;
        info!(
            gateway = %spoke_gateway,
            transit = %transit_gateway,
            response = %response,
            "Attach response"
        );
        Ok(response)
    }

    /// Associate a spoke attachment with a security domain
    pub async fn associate_security_domain(
        &self,
        session: &Session,
        spoke_gateway: &str,
        domain_name: &str,
    ) -> Result<Value> {
        let payload = Payload::new(Action::AssociateSecurityDomain)
            .with_session(session)
            .field("attachment_name", spoke_gateway)
            .field("domain_name", domain_name);

        let response = self.transport.request(Method::Post, &payload).await?;
        info!(
            gateway = %spoke_gateway,
            domain = %domain_name,
            response = %response,
            "Associate response"
        );
        Ok(response)
    }

    /// Add a spoke to the FireNet inspection policy of a transit gateway
    pub async fn add_spoke_to_inspection(
        &self,
        session: &Session,
        spoke_gateway: &str,
        firenet_gateway: &str,
    ) -> Result<Value> {
        let payload = Payload::new(Action::AddSpokeToInspection)
            .with_session(session)
            .field("spoke_gateway_name", spoke_gateway)
            .field("firenet_gateway_name", firenet_gateway);

        let response = self.transport.request(Method::Post, &payload).await?;
        info!(
            gateway = %spoke_gateway,
            firenet = %firenet_gateway,
            response = %response,
            "Inspection response"
        );
        Ok(response)
    }
}

/// Read `results.domain` from a security domain details response
pub fn extract_domain(response: &Value) -> Result<String> {
    response
        .pointer("/results/domain")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ShiftError::MissingField {
            action: Action::GetSecurityDomainDetails.to_string(),
            field: "results.domain".to_string(),
        })
}

/// The controller's reason when a response carries `return: false`
pub fn reported_failure(response: &Value) -> Option<String> {
    match response.get("return").and_then(Value::as_bool) {
        Some(false) => Some(
            response
                .get("reason")
                .and_then(Value::as_str)
                .unwrap_or("no reason given")
                .to_string(),
        ),
        _ => None,
    }
}
