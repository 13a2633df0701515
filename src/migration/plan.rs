// SPDX-License-Identifier: AGPL-3.0-or-later
//! Migration plan definition
//!
//! A plan names the spokes to move, the transit gateway they leave, the one
//! they join, and the optional behaviours of the run.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, ShiftError};

/// What to migrate and how to react to controller answers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPlan {
    /// Spoke gateways, in the order every phase visits them
    pub spoke_gateways: Vec<String>,

    /// Transit gateway the spokes are detached from
    pub old_transit_gateway: String,

    /// Transit gateway the spokes are attached to
    pub new_transit_gateway: String,

    /// Route table list sent with every attach (may be empty)
    pub spoke_route_table: String,

    /// Whether spokes are added to the new transit's inspection policy
    pub inspection: InspectionPhase,

    /// What to do when the controller answers `return: false`
    pub on_controller_error: ControllerErrorPolicy,
}

/// Optional final phase adding each spoke to the FireNet inspection policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InspectionPhase {
    #[default]
    Disabled,
    Enabled,
}

/// Reaction to an application-level failure inside a successful HTTP response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ControllerErrorPolicy {
    /// Log the raw response and keep going
    #[default]
    Ignore,
    /// Stop the run at the first rejected call
    Abort,
}

impl MigrationPlan {
    /// A plan with the given spokes and transits and default options
    pub fn new(
        spoke_gateways: Vec<String>,
        old_transit_gateway: impl Into<String>,
        new_transit_gateway: impl Into<String>,
    ) -> Self {
        Self {
            spoke_gateways,
            old_transit_gateway: old_transit_gateway.into(),
            new_transit_gateway: new_transit_gateway.into(),
            spoke_route_table: String::new(),
            inspection: InspectionPhase::default(),
            on_controller_error: ControllerErrorPolicy::default(),
        }
    }

    /// Validate the plan
    ///
    /// Gateway names are used as keys when domains are recorded, so each
    /// spoke may appear only once.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for name in &self.spoke_gateways {
            if !seen.insert(name.as_str()) {
                return Err(ShiftError::DuplicateGateway { name: name.clone() });
            }
        }

        if self.old_transit_gateway.is_empty() || self.new_transit_gateway.is_empty() {
            return Err(ShiftError::InvalidConfig {
                message: "transit gateway names cannot be empty".to_string(),
            });
        }

        Ok(())
    }
}

impl FromStr for InspectionPhase {
    type Err = ShiftError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "" | "disabled" | "false" | "no" | "off" => Ok(InspectionPhase::Disabled),
            "enabled" | "true" | "yes" | "on" => Ok(InspectionPhase::Enabled),
            other => Err(ShiftError::InvalidConfig {
                message: format!("inspection must be 'enabled' or 'disabled', got '{}'", other),
            }),
        }
    }
}

impl fmt::Display for InspectionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InspectionPhase::Disabled => write!(f, "disabled"),
            InspectionPhase::Enabled => write!(f, "enabled"),
        }
    }
}

impl FromStr for ControllerErrorPolicy {
    type Err = ShiftError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "" | "ignore" => Ok(ControllerErrorPolicy::Ignore),
            "abort" => Ok(ControllerErrorPolicy::Abort),
            other => Err(ShiftError::InvalidConfig {
                message: format!(
                    "on_controller_error must be 'ignore' or 'abort', got '{}'",
                    other
                ),
            }),
        }
    }
}

impl fmt::Display for ControllerErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerErrorPolicy::Ignore => write!(f, "ignore"),
            ControllerErrorPolicy::Abort => write!(f, "abort"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spokes(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_new_plan_defaults() {
        let plan = MigrationPlan::new(spokes(&["spoke1"]), "transit1", "transit2");
        assert_eq!(plan.inspection, InspectionPhase::Disabled);
        assert_eq!(plan.on_controller_error, ControllerErrorPolicy::Ignore);
        assert!(plan.spoke_route_table.is_empty());
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_empty_plan_is_valid() {
        let plan = MigrationPlan::new(Vec::new(), "transit1", "transit2");
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_duplicate_gateway() {
        let plan = MigrationPlan::new(spokes(&["a", "b", "b"]), "transit1", "transit2");
        match plan.validate() {
            Err(ShiftError::DuplicateGateway { name }) => assert_eq!(name, "b"),
            other => panic!("Expected DuplicateGateway, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_transit_name() {
        let plan = MigrationPlan::new(spokes(&["a"]), "", "transit2");
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_inspection_phase_parsing() {
        assert_eq!("".parse::<InspectionPhase>().unwrap(), InspectionPhase::Disabled);
        assert_eq!("Enabled".parse::<InspectionPhase>().unwrap(), InspectionPhase::Enabled);
        assert_eq!("on".parse::<InspectionPhase>().unwrap(), InspectionPhase::Enabled);
        assert!("sometimes".parse::<InspectionPhase>().is_err());
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!(
            "".parse::<ControllerErrorPolicy>().unwrap(),
            ControllerErrorPolicy::Ignore
        );
        assert_eq!(
            "ABORT".parse::<ControllerErrorPolicy>().unwrap(),
            ControllerErrorPolicy::Abort
        );
        assert!("rollback".parse::<ControllerErrorPolicy>().is_err());
    }
}
