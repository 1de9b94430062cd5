use crate::error::{self, Result};
use snafu::ensure;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// The controller names that currently have a bootstrap in progress.
#[derive(Clone, Debug, Default)]
pub struct BootstrapLeases {
    active: Arc<Mutex<HashSet<String>>>,
}

/// Exclusive claim on a controller name. Released when dropped.
#[derive(Debug)]
pub struct BootstrapLease {
    name: String,
    active: Arc<Mutex<HashSet<String>>>,
}

impl BootstrapLeases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `name`, failing if another bootstrap holds it.
    pub fn acquire(&self, name: &str) -> Result<BootstrapLease> {
        let mut active = lock(&self.active);
        ensure!(
            active.insert(name.to_string()),
            error::BootstrapInProgressSnafu { name }
        );
        Ok(BootstrapLease {
            name: name.to_string(),
            active: Arc::clone(&self.active),
        })
    }

    pub fn is_active(&self, name: &str) -> bool {
        lock(&self.active).contains(name)
    }
}

impl BootstrapLease {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for BootstrapLease {
    fn drop(&mut self) {
        lock(&self.active).remove(&self.name);
    }
}

// A panic while holding the lock cannot leave the set half updated, so poisoning is ignored.
fn lock(active: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
    active
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Error;

    #[test]
    fn one_lease_per_name() {
        let leases = BootstrapLeases::new();
        let lease = leases.acquire("acme-ctrl").unwrap();
        assert_eq!(lease.name(), "acme-ctrl");
        assert!(matches!(
            leases.acquire("acme-ctrl"),
            Err(Error::BootstrapInProgress { .. })
        ));
        let _other = leases.acquire("other-ctrl").unwrap();
        drop(lease);
        assert!(!leases.is_active("acme-ctrl"));
        assert!(leases.acquire("acme-ctrl").is_ok());
    }
}
