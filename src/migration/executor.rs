// SPDX-License-Identifier: AGPL-3.0-or-later
//! Migration executor
//!
//! Runs the phases of a migration one after another against a single
//! controller session: record domains, detach, attach, re-associate and,
//! when enabled, add the spokes to the inspection policy. Every call is
//! awaited before the next is sent. A failed call stops the run and nothing
//! already done is rolled back.

use std::fmt;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::{ControllerErrorPolicy, DomainSnapshot, InspectionPhase, MigrationPlan};
use crate::controller::{
    extract_domain, reported_failure, Action, ControllerClient, Credentials, Session, Transport,
};
use crate::error::{Result, ShiftError};

/// Executor for migration plans
pub struct Migrator<T> {
    client: ControllerClient<T>,
    /// Whether to skip every call that changes controller state
    dry_run: bool,
}

/// Phases of a migration, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    QueryDomains,
    Detach,
    Attach,
    Associate,
    Inspect,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::QueryDomains => "query-domains",
            Phase::Detach => "detach",
            Phase::Attach => "attach",
            Phase::Associate => "associate",
            Phase::Inspect => "inspect",
        };
        f.write_str(name)
    }
}

/// Result of executing a complete migration
#[derive(Debug)]
pub struct MigrationReport {
    /// Domains recorded before any spoke was moved
    pub domains: DomainSnapshot,
    /// Spokes detached from the old transit
    pub detached: usize,
    /// Spokes attached to the new transit
    pub attached: usize,
    /// Spokes re-associated with their domain
    pub associated: usize,
    /// Spokes added to the inspection policy
    pub inspected: usize,
    /// Whether mutating calls were skipped
    pub dry_run: bool,
    /// Total duration
    pub total_duration_ms: u64,
}

impl<T: Transport> Migrator<T> {
    /// Create a new executor
    pub fn new(client: ControllerClient<T>, dry_run: bool) -> Self {
        Self { client, dry_run }
    }

    /// The controller client this executor drives
    pub fn client(&self) -> &ControllerClient<T> {
        &self.client
    }

    /// Log in once and run every phase of `plan`
    pub async fn execute(
        &self,
        credentials: &Credentials,
        plan: &MigrationPlan,
    ) -> Result<MigrationReport> {
        plan.validate()?;
        let start_time = Instant::now();

        info!(
            spokes = plan.spoke_gateways.len(),
            old_transit = %plan.old_transit_gateway,
            new_transit = %plan.new_transit_gateway,
            inspection = %plan.inspection,
            dry_run = self.dry_run,
            "Starting migration"
        );

        let session = self.client.open_session(credentials).await?;

        let domains = self.capture_domains(&session, plan).await?;
        println!("Recorded security domains: {}", domains);

        let detached = self.detach_all(&session, plan).await?;
        let attached = self.attach_all(&session, plan).await?;
        let associated = self.associate_all(&session, plan, &domains).await?;

        let inspected = match plan.inspection {
            InspectionPhase::Enabled => self.inspect_all(&session, plan).await?,
            InspectionPhase::Disabled => {
                debug!(phase = %Phase::Inspect, "Phase disabled");
                0
            }
        };

        let total_duration_ms = start_time.elapsed().as_millis() as u64;

        info!(
            detached = detached,
            attached = attached,
            associated = associated,
            inspected = inspected,
            duration_ms = total_duration_ms,
            "Migration completed"
        );

        Ok(MigrationReport {
            domains,
            detached,
            attached,
            associated,
            inspected,
            dry_run: self.dry_run,
            total_duration_ms,
        })
    }

    /// Log in once and only record the current domains
    pub async fn snapshot(
        &self,
        credentials: &Credentials,
        plan: &MigrationPlan,
    ) -> Result<DomainSnapshot> {
        plan.validate()?;
        let session = self.client.open_session(credentials).await?;
        self.capture_domains(&session, plan).await
    }

    async fn capture_domains(
        &self,
        session: &Session,
        plan: &MigrationPlan,
    ) -> Result<DomainSnapshot> {
        debug!(phase = %Phase::QueryDomains, "Starting phase");
        let mut snapshot = DomainSnapshot::new();

        for gateway in &plan.spoke_gateways {
            println!("Querying security domain for {}", gateway);
            let response = self
                .client
                .get_security_domain_details(session, gateway)
                .await?;
            let domain = extract_domain(&response)?;

            debug!(gateway = %gateway, domain = %domain, "Recorded security domain");
            snapshot.record(gateway.as_str(), domain)?;
        }

        Ok(snapshot)
    }

    async fn detach_all(&self, session: &Session, plan: &MigrationPlan) -> Result<usize> {
        debug!(phase = %Phase::Detach, "Starting phase");
        let transit = &plan.old_transit_gateway;
        let mut count = 0usize;

        for gateway in &plan.spoke_gateways {
            if self.dry_run {
                println!("[DRY RUN] Would detach {} from {}", gateway, transit);
            } else {
                println!("Detaching {} from {}", gateway, transit);
                let response = self
                    .client
                    .detach_spoke_from_transit(session, gateway, transit)
                    .await?;
                enforce_policy(plan.on_controller_error, Action::DetachSpoke, gateway, &response)?;
            }
            count += 1;
        }

        Ok(count)
    }

    async fn attach_all(&self, session: &Session, plan: &MigrationPlan) -> Result<usize> {
        debug!(phase = %Phase::Attach, "Starting phase");
        let transit = &plan.new_transit_gateway;
        let mut count = 0usize;

        for gateway in &plan.spoke_gateways {
            if self.dry_run {
                println!("[DRY RUN] Would attach {} to {}", gateway, transit);
            } else {
                println!("Attaching {} to {}", gateway, transit);
                let response = self
                    .client
                    .attach_spoke_to_transit(session, gateway, transit, &plan.spoke_route_table)
                    .await?;
                enforce_policy(plan.on_controller_error, Action::AttachSpoke, gateway, &response)?;
            }
            count += 1;
        }

        Ok(count)
    }

    async fn associate_all(
        &self,
        session: &Session,
        plan: &MigrationPlan,
        domains: &DomainSnapshot,
    ) -> Result<usize> {
        debug!(phase = %Phase::Associate, "Starting phase");
        let mut count = 0usize;

        for gateway in &plan.spoke_gateways {
            let domain = domains
                .domain_of(gateway)
                .ok_or_else(|| ShiftError::MissingField {
                    action: Action::GetSecurityDomainDetails.to_string(),
                    field: format!("domain of {}", gateway),
                })?;

            if self.dry_run {
                println!("[DRY RUN] Would associate {} with {}", gateway, domain);
            } else {
                println!("Associating {} with {}", gateway, domain);
                let response = self
                    .client
                    .associate_security_domain(session, gateway, domain)
                    .await?;
                println!("{}", response);
                enforce_policy(
                    plan.on_controller_error,
                    Action::AssociateSecurityDomain,
                    gateway,
                    &response,
                )?;
            }
            count += 1;
        }

        Ok(count)
    }

    async fn inspect_all(&self, session: &Session, plan: &MigrationPlan) -> Result<usize> {
        debug!(phase = %Phase::Inspect, "Starting phase");
        let firenet = &plan.new_transit_gateway;
        let mut count = 0usize;

        for gateway in &plan.spoke_gateways {
            if self.dry_run {
                println!("[DRY RUN] Would add {} to {} inspection policy", gateway, firenet);
            } else {
                println!("Adding {} to {} inspection policy", gateway, firenet);
                let response = self
                    .client
                    .add_spoke_to_inspection(session, gateway, firenet)
                    .await?;
                enforce_policy(
                    plan.on_controller_error,
                    Action::AddSpokeToInspection,
                    gateway,
                    &response,
                )?;
            }
            count += 1;
        }

        Ok(count)
    }
}

/// Apply the controller error policy to one response
///
/// Under `Ignore` the response is not looked at: a `return: false` answer
/// counts as done.
fn enforce_policy(
    policy: ControllerErrorPolicy,
    action: Action,
    gateway: &str,
    response: &Value,
) -> Result<()> {
    if policy == ControllerErrorPolicy::Ignore {
        return Ok(());
    }

    match reported_failure(response) {
        Some(reason) => {
            warn!(action = %action, gateway = %gateway, reason = %reason, "Controller rejected call");
            Err(ShiftError::ControllerRejected {
                action: action.to_string(),
                gateway: gateway.to_string(),
                reason,
            })
        }
        None => Ok(()),
    }
}
