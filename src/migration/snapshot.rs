// SPDX-License-Identifier: AGPL-3.0-or-later
//! Security domains recorded before the spokes move

use std::collections::HashMap;
use std::fmt;

use crate::error::{Result, ShiftError};

/// Gateway name to security domain, remembering insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainSnapshot {
    order: Vec<String>,
    domains: HashMap<String, String>,
}

impl DomainSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the domain of a gateway; each gateway may be recorded once
    pub fn record(&mut self, gateway: impl Into<String>, domain: impl Into<String>) -> Result<()> {
        let gateway = gateway.into();
        if self.domains.contains_key(&gateway) {
            return Err(ShiftError::DuplicateGateway { name: gateway });
        }

        self.domains.insert(gateway.clone(), domain.into());
        self.order.push(gateway);
        Ok(())
    }

    /// Domain recorded for `gateway`
    pub fn domain_of(&self, gateway: &str) -> Option<&str> {
        self.domains.get(gateway).map(String::as_str)
    }

    /// `(gateway, domain)` pairs in the order they were recorded
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.order
            .iter()
            .map(move |gateway| (gateway.as_str(), self.domains[gateway].as_str()))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl fmt::Display for DomainSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (index, (gateway, domain)) in self.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", gateway, domain)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_lookup() {
        let mut snapshot = DomainSnapshot::new();
        snapshot.record("spoke2", "domainB").unwrap();
        snapshot.record("spoke1", "domainA").unwrap();

        assert_eq!(snapshot.domain_of("spoke1"), Some("domainA"));
        assert_eq!(snapshot.domain_of("spoke3"), None);
        assert_eq!(snapshot.len(), 2);

        let pairs: Vec<_> = snapshot.iter().collect();
        assert_eq!(pairs, vec![("spoke2", "domainB"), ("spoke1", "domainA")]);
    }

    #[test]
    fn test_record_twice() {
        let mut snapshot = DomainSnapshot::new();
        snapshot.record("spoke1", "domainA").unwrap();
        assert!(snapshot.record("spoke1", "domainB").is_err());
        assert_eq!(snapshot.domain_of("spoke1"), Some("domainA"));
    }

    #[test]
    fn test_display() {
        let mut snapshot = DomainSnapshot::new();
        assert_eq!(snapshot.to_string(), "{}");

        snapshot.record("spoke1", "domainA").unwrap();
        snapshot.record("spoke2", "domainB").unwrap();
        assert_eq!(snapshot.to_string(), "{spoke1: domainA, spoke2: domainB}");
    }
}
