// SPDX-License-Identifier: AGPL-3.0-or-later
//! Mock controller shared by the integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Form, Json, Router,
};
use serde_json::json;

pub const CID: &str = "cid-mock-7f3a";

/// How the mock controller answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    /// Answers like a healthy controller
    Healthy,
    /// Answers every request with HTTP 200 and an HTML page
    NonJson,
    /// Healthy, except every attach is answered with `return: false`
    RejectAttach,
}

type Calls = Arc<Mutex<Vec<HashMap<String, String>>>>;

#[derive(Clone)]
struct MockState {
    behaviour: Behaviour,
    domains: Arc<HashMap<String, String>>,
    calls: Calls,
}

/// A controller API served on 127.0.0.1 over plain HTTP
pub struct MockController {
    pub url: String,
    calls: Calls,
}

impl MockController {
    pub async fn start(behaviour: Behaviour, domains: &[(&str, &str)]) -> Self {
        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            behaviour,
            domains: Arc::new(
                domains
                    .iter()
                    .map(|(gw, domain)| (gw.to_string(), domain.to_string()))
                    .collect(),
            ),
            calls: calls.clone(),
        };

        let app = Router::new()
            .route("/v1/api", post(handle_form).get(handle_query))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{}/v1/api", addr),
            calls,
        }
    }

    /// Every form received so far
    pub fn calls(&self) -> Vec<HashMap<String, String>> {
        self.calls.lock().unwrap().clone()
    }

    /// Action names received so far
    pub fn actions(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|form| form.get("action").cloned().unwrap_or_default())
            .collect()
    }

    /// `(attachment_name, domain_name)` of every associate call
    pub fn associations(&self) -> Vec<(String, String)> {
        self.calls()
            .iter()
            .filter(|form| {
                form.get("action").map(String::as_str)
                    == Some("associate_attachment_to_multi_cloud_security_domain")
            })
            .map(|form| (form["attachment_name"].clone(), form["domain_name"].clone()))
            .collect()
    }
}

async fn handle_form(
    State(state): State<MockState>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    answer(&state, form)
}

async fn handle_query(
    State(state): State<MockState>,
    Query(form): Query<HashMap<String, String>>,
) -> Response {
    answer(&state, form)
}

fn answer(state: &MockState, form: HashMap<String, String>) -> Response {
    state.calls.lock().unwrap().push(form.clone());

    if state.behaviour == Behaviour::NonJson {
        return (
            StatusCode::OK,
            "<html><body>Controller upgrade in progress</body></html>",
        )
            .into_response();
    }

    let action = form.get("action").map(String::as_str).unwrap_or_default();
    if action != "login" && form.get("CID").map(String::as_str) != Some(CID) {
        return Json(json!({"return": false, "reason": "CID is invalid or expired."}))
            .into_response();
    }

    let body = match action {
        "login" => json!({
            "return": true,
            "results": "User login:admin in account:admin has been authorized successfully",
            "CID": CID,
        }),
        "get_multi_cloud_security_domain_attachment_details" => {
            let attachment = form
                .get("attachment_name")
                .map(String::as_str)
                .unwrap_or_default();
            match state.domains.get(attachment) {
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
        "attach_spoke_to_transit_gw" if state.behaviour == Behaviour::RejectAttach => json!({
            "return": false,
            "reason": "Transit gateway is not ready for attachment",
        }),
        other => json!({"return": true, "results": format!("{} succeeded", other)}),
    };

    Json(body).into_response()
}

/// Write a configuration pointing at `api_url`
pub fn write_config(dir: &Path, api_url: &str, migration: &str) -> PathBuf {
    write_config_with_level(dir, api_url, "info", migration)
}

/// Write a configuration pointing at `api_url` with an explicit `loglevel`
pub fn write_config_with_level(
    dir: &Path,
    api_url: &str,
    loglevel: &str,
    migration: &str,
) -> PathBuf {
    let path = dir.join("spoke-shift.ini");
    let contents = format!(
        "[aviatrix]\nloglevel = {}\ncontroller_ip = 127.0.0.1\n\
         controller_username = admin\ncontroller_password = hunter2\napi_url = {}\n\n\
         [migration]\n{}\n",
        loglevel, api_url, migration
    );
    std::fs::write(&path, contents).unwrap();
    path
}
