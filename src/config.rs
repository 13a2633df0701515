// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration management for spoke-shift
//!
//! Settings come from an INI file with an `[aviatrix]` section holding the
//! controller endpoint and credentials, and an optional `[migration]`
//! section describing which spokes move between which transit gateways.

use std::fmt::Write as _;
use std::path::Path;

use config::{FileStoredFormat, Format, Map, Value, ValueKind};
use ini::{Ini, ParseOption};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::controller::Credentials;
use crate::error::{Result, ShiftError};
use crate::migration::{ControllerErrorPolicy, InspectionPhase, MigrationPlan};

/// Fully validated settings for one run
#[derive(Debug, Clone)]
pub struct Settings {
    /// Controller endpoint, credentials and log verbosity
    pub controller: ControllerSettings,

    /// What to migrate
    pub migration: MigrationPlan,
}

/// The `[aviatrix]` section
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// Requested log verbosity
    pub log_level: LogLevel,

    /// Controller host, optionally with `:port`
    pub controller_ip: String,

    /// Login user
    pub username: String,

    /// Login password
    pub password: SecretString,

    /// Explicit API endpoint, replacing `https://<controller_ip>/v1/api`
    pub api_url: Option<String>,
}

/// Log verbosity understood by the `loglevel` key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Standard progress logging
    Info,
    /// Per-request logging with controller and user fields
    Debug,
}

impl LogLevel {
    /// Only `debug` (any case) selects debug output; every other value means info.
    pub fn from_setting(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("debug") {
            LogLevel::Debug
        } else {
            LogLevel::Info
        }
    }

    /// Directive for `tracing_subscriber::EnvFilter`
    pub fn filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

impl ControllerSettings {
    /// Endpoint every action is posted to
    pub fn api_url(&self) -> String {
        match &self.api_url {
            Some(url) => url.clone(),
            None => format!("https://{}/v1/api", self.controller_ip),
        }
    }

    /// Credentials for the login action
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.username.clone(), self.password.clone())
    }
}

impl Settings {
    /// Load settings from an INI file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// The validated settings or an error
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ShiftError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let contents = std::fs::read_to_string(path)?;
        Self::from_ini_str(&contents)
    }

    /// Load settings from INI text
    pub fn from_ini_str(contents: &str) -> Result<Self> {
        let raw: RawSettings = config::Config::builder()
            .add_source(config::File::from_str(contents, LiteralIni))
            .build()?
            .try_deserialize()?;

        raw.into_settings()
    }

    /// Render the effective settings as INI, with the password masked
    pub fn render_redacted(&self) -> String {
        let controller = &self.controller;
        let plan = &self.migration;
        let mut out = String::new();

        let _ = writeln!(out, "[aviatrix]");
        let _ = writeln!(out, "loglevel = {}", controller.log_level.filter_directive());
        let _ = writeln!(out, "controller_ip = {}", controller.controller_ip);
        let _ = writeln!(out, "controller_username = {}", controller.username);
        let _ = writeln!(out, "controller_password = {}", redact(&controller.password));
        let _ = writeln!(out, "api_url = {}", controller.api_url());
        let _ = writeln!(out);
        let _ = writeln!(out, "[migration]");
        let _ = writeln!(out, "old_transit_gateway = {}", plan.old_transit_gateway);
        let _ = writeln!(out, "new_transit_gateway = {}", plan.new_transit_gateway);
        let _ = writeln!(out, "spoke_route_table = {}", plan.spoke_route_table);
        let _ = writeln!(out, "spoke_gateways = {}", plan.spoke_gateways.join(","));
        let _ = writeln!(out, "inspection = {}", plan.inspection);
        let _ = writeln!(out, "on_controller_error = {}", plan.on_controller_error);
        out
    }
}

/// INI format that keeps values exactly as written
///
/// Quotes and backslashes are ordinary characters, so a password such as
/// `ab\cd` or `"quoted"` reaches the login call unchanged. Keys are
/// lowercased.
#[derive(Debug, Clone, Copy)]
struct LiteralIni;

impl Format for LiteralIni {
    fn parse(
        &self,
        uri: Option<&String>,
        text: &str,
    ) -> std::result::Result<Map<String, Value>, Box<dyn std::error::Error + Send + Sync>> {
        let options = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
        };
        let ini = Ini::load_from_str_opt(text, options)?;

        let mut root = Map::new();
        for (section, properties) in ini.iter() {
            let values: Map<String, Value> = properties
                .iter()
                .map(|(key, value)| {
                    (
                        key.to_lowercase(),
                        Value::new(uri, ValueKind::String(value.to_string())),
                    )
                })
                .collect();

            match section {
                Some(name) => {
                    root.insert(name.to_string(), Value::new(uri, ValueKind::Table(values)));
                }
                None => root.extend(values),
            }
        }
        Ok(root)
    }
}

impl FileStoredFormat for LiteralIni {
    fn file_extensions(&self) -> &'static [&'static str] {
        &["ini"]
    }
}

fn redact(secret: &SecretString) -> &'static str {
    if secret.expose_secret().is_empty() {
        "(empty)"
    } else {
        "********"
    }
}

#[derive(Debug, Deserialize)]
struct RawSettings {
    aviatrix: RawControllerSection,

    #[serde(default)]
    migration: RawMigrationSection,
}

#[derive(Debug, Deserialize)]
struct RawControllerSection {
    #[serde(default = "default_log_level")]
    loglevel: String,
    controller_ip: String,
    controller_username: String,
    controller_password: String,
    #[serde(default)]
    api_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMigrationSection {
    #[serde(default = "default_old_transit")]
    old_transit_gateway: String,

    #[serde(default = "default_new_transit")]
    new_transit_gateway: String,

    #[serde(default)]
    spoke_route_table: String,

    #[serde(default = "default_spoke_gateways")]
    spoke_gateways: String,

    #[serde(default)]
    inspection: String,

    #[serde(default)]
    on_controller_error: String,
}

impl Default for RawMigrationSection {
    fn default() -> Self {
        Self {
            old_transit_gateway: default_old_transit(),
            new_transit_gateway: default_new_transit(),
            spoke_route_table: String::new(),
            spoke_gateways: default_spoke_gateways(),
            inspection: String::new(),
            on_controller_error: String::new(),
        }
    }
}

impl RawSettings {
    fn into_settings(self) -> Result<Settings> {
        let aviatrix = self.aviatrix;

        if aviatrix.controller_ip.trim().is_empty() && aviatrix.api_url.is_none() {
            return Err(ShiftError::InvalidConfig {
                message: "controller_ip cannot be empty".to_string(),
            });
        }

        let controller = ControllerSettings {
            log_level: LogLevel::from_setting(&aviatrix.loglevel),
            controller_ip: aviatrix.controller_ip.trim().to_string(),
            username: aviatrix.controller_username,
            password: SecretString::new(aviatrix.controller_password),
            api_url: aviatrix
                .api_url
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty()),
        };

        let migration = self.migration;
        let plan = MigrationPlan {
            spoke_gateways: parse_gateway_list(&migration.spoke_gateways),
            old_transit_gateway: migration.old_transit_gateway.trim().to_string(),
            new_transit_gateway: migration.new_transit_gateway.trim().to_string(),
            spoke_route_table: migration.spoke_route_table.trim().to_string(),
            inspection: migration.inspection.parse::<InspectionPhase>()?,
            on_controller_error: migration.on_controller_error.parse::<ControllerErrorPolicy>()?,
        };
        plan.validate()?;

        Ok(Settings {
            controller,
            migration: plan,
        })
    }
}

/// Split a comma separated gateway list, dropping blank entries
pub fn parse_gateway_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

// Default value functions

fn default_log_level() -> String {
    "info".to_string()
}

fn default_old_transit() -> String {
    "transit1".to_string()
}

fn default_new_transit() -> String {
    "transit2".to_string()
}

fn default_spoke_gateways() -> String {
    "spoke1,spoke2,spoke3,spoke4,spoke5".to_string()
}
