// SPDX-License-Identifier: AGPL-3.0-or-later
//! spoke-shift: moves spoke gateways from one transit gateway to another
//!
//! The tool logs into a network controller's management API once, records
//! the security domain of every listed spoke, detaches the spokes from the
//! old transit gateway, attaches them to the new one and re-associates each
//! spoke with the domain it had before.
//!
//! # Features
//!
//! * **Domain preservation:** domains are recorded by gateway name before anything moves
//! * **Dry run:** read-only runs print the calls that would change the controller
//! * **Inspection:** spokes can optionally be added to the new transit's FireNet policy

pub mod config;
pub mod controller;
pub mod error;
pub mod migration;

pub use crate::config::Settings;
pub use crate::error::{Result, ShiftError};
