//! Target selection — resolve the concrete target set for one stage.
//!
//! Selection always subtracts the exclusion set (every target already
//! attempted in the run), which is what makes a resumed run re-entrant:
//! a target is attempted at most once per run.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use fleetwave_state::TargetId;

use crate::error::{EngineError, EngineResult};
use crate::plan::{SelectorSpec, StageSpec};
use crate::pool::TargetPool;

/// Resolve the targets for a stage.
///
/// Explicit lists are returned in order, minus exclusions. Percentage
/// stages compute `floor(pool_len * percent / 100)` on the full pool and
/// draw that many distinct targets uniformly without replacement from
/// the pool minus exclusions; if fewer remain, the whole remainder is
/// returned. An empty pool yields an empty selection.
pub fn select_targets<R: Rng + ?Sized>(
    stage: &StageSpec,
    exclusions: &HashSet<TargetId>,
    pool: &dyn TargetPool,
    rng: &mut R,
) -> EngineResult<Vec<TargetId>> {
    let selected = match &stage.selector {
        SelectorSpec::Explicit { targets } => {
            let mut seen = HashSet::new();
            targets
                .iter()
                .filter(|t| !exclusions.contains(*t) && seen.insert(t.as_str()))
                .cloned()
                .collect()
        }
        SelectorSpec::Percentage { percent } => {
            let candidates = pool
                .list_eligible_targets()
                .map_err(|e| EngineError::Pool(e.to_string()))?;
            // Requested count is computed on the full pool, before exclusion.
            let count = candidates.len() * (*percent as usize) / 100;
            let remaining: Vec<TargetId> = candidates
                .into_iter()
                .filter(|t| !exclusions.contains(t))
                .collect();
            if count >= remaining.len() {
                remaining
            } else {
                remaining.choose_multiple(rng, count).cloned().collect()
            }
        }
    };
    debug!(
        stage = %stage.name,
        selected = selected.len(),
        excluded = exclusions.len(),
        "targets resolved"
    );
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::StaticPool;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ids(n: usize) -> Vec<TargetId> {
        (0..n).map(|i| format!("m{i}")).collect()
    }

    fn percentage_stage(percent: u32) -> StageSpec {
        StageSpec {
            name: "phase1".to_string(),
            ordinal: 1,
            selector: SelectorSpec::Percentage { percent },
            threshold: 0.9,
        }
    }

    fn explicit_stage(targets: &[&str]) -> StageSpec {
        StageSpec {
            name: "pilot".to_string(),
            ordinal: 0,
            selector: SelectorSpec::Explicit {
                targets: targets.iter().map(|t| t.to_string()).collect(),
            },
            threshold: 0.9,
        }
    }

    #[test]
    fn explicit_list_returned_in_order_minus_exclusions() {
        let stage = explicit_stage(&["a", "b", "c"]);
        let exclusions: HashSet<_> = ["b".to_string()].into();
        let pool = StaticPool::default();
        let mut rng = StdRng::seed_from_u64(7);

        let selected = select_targets(&stage, &exclusions, &pool, &mut rng).unwrap();
        assert_eq!(selected, vec!["a", "c"]);
    }

    #[test]
    fn explicit_duplicates_are_collapsed() {
        let stage = explicit_stage(&["a", "a", "b"]);
        let pool = StaticPool::default();
        let mut rng = StdRng::seed_from_u64(7);

        let selected = select_targets(&stage, &HashSet::new(), &pool, &mut rng).unwrap();
        assert_eq!(selected, vec!["a", "b"]);
    }

    #[test]
    fn percentage_count_is_floor_of_full_pool() {
        // floor(100 * 20 / 100) == 20
        let pool = StaticPool::new(ids(100));
        let mut rng = StdRng::seed_from_u64(7);
        let selected =
            select_targets(&percentage_stage(20), &HashSet::new(), &pool, &mut rng).unwrap();
        assert_eq!(selected.len(), 20);

        // floor(7 * 50 / 100) == 3
        let pool = StaticPool::new(ids(7));
        let selected =
            select_targets(&percentage_stage(50), &HashSet::new(), &pool, &mut rng).unwrap();
        assert_eq!(selected.len(), 3);
    }

    #[test]
    fn percentage_selection_is_distinct_and_from_pool() {
        let pool = StaticPool::new(ids(50));
        let mut rng = StdRng::seed_from_u64(42);
        let selected =
            select_targets(&percentage_stage(40), &HashSet::new(), &pool, &mut rng).unwrap();

        let unique: HashSet<_> = selected.iter().collect();
        assert_eq!(unique.len(), selected.len());
        let pool_set: HashSet<_> = ids(50).into_iter().collect();
        assert!(selected.iter().all(|t| pool_set.contains(t)));
    }

    #[test]
    fn exhausted_pool_returns_whole_remainder() {
        // count = floor(10 * 80 / 100) = 8, but only 3 remain after exclusion.
        let pool = StaticPool::new(ids(10));
        let exclusions: HashSet<_> = ids(7).into_iter().collect();
        let mut rng = StdRng::seed_from_u64(7);

        let selected =
            select_targets(&percentage_stage(80), &exclusions, &pool, &mut rng).unwrap();
        assert_eq!(selected.len(), 3);
        assert!(selected.iter().all(|t| !exclusions.contains(t)));
    }

    #[test]
    fn empty_pool_selects_nothing() {
        let pool = StaticPool::default();
        let mut rng = StdRng::seed_from_u64(7);
        let selected =
            select_targets(&percentage_stage(50), &HashSet::new(), &pool, &mut rng).unwrap();
        assert!(selected.is_empty());
    }

    #[test]
    fn pool_errors_surface_as_engine_errors() {
        struct BrokenPool;
        impl TargetPool for BrokenPool {
            fn list_eligible_targets(&self) -> anyhow::Result<Vec<TargetId>> {
                anyhow::bail!("directory unavailable")
            }
        }

        let mut rng = StdRng::seed_from_u64(7);
        let err =
            select_targets(&percentage_stage(50), &HashSet::new(), &BrokenPool, &mut rng)
                .unwrap_err();
        assert!(matches!(err, EngineError::Pool(_)));
    }
}
