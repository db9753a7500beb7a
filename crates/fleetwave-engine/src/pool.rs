//! Candidate pool seam — where percentage stages draw targets from.

use anyhow::Result;

use fleetwave_state::TargetId;

/// Inventory/directory query for eligible targets.
///
/// Consumed only by percentage-based stages; explicit-list stages never
/// touch the pool.
pub trait TargetPool: Send + Sync {
    fn list_eligible_targets(&self) -> Result<Vec<TargetId>>;
}

/// A fixed in-memory pool, for plans with a static inventory and for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticPool {
    targets: Vec<TargetId>,
}

impl StaticPool {
    pub fn new(targets: Vec<TargetId>) -> Self {
        Self { targets }
    }
}

impl TargetPool for StaticPool {
    fn list_eligible_targets(&self) -> Result<Vec<TargetId>> {
        Ok(self.targets.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_pool_returns_its_targets() {
        let pool = StaticPool::new(vec!["m1".to_string(), "m2".to_string()]);
        assert_eq!(pool.list_eligible_targets().unwrap().len(), 2);
        assert!(StaticPool::default().list_eligible_targets().unwrap().is_empty());
    }
}
