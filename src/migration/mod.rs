// SPDX-License-Identifier: AGPL-3.0-or-later
//! Spoke migration between transit gateways
//!
//! A [`MigrationPlan`] lists the spokes to move. The [`Migrator`] records
//! each spoke's security domain, detaches it from the old transit, attaches
//! it to the new one and puts it back into the recorded domain.

mod executor;
mod plan;
mod snapshot;

pub use executor::{MigrationReport, Migrator, Phase};
pub use plan::{ControllerErrorPolicy, InspectionPhase, MigrationPlan};
pub use snapshot::DomainSnapshot;
