//! Bounded task execution and pool-creation telemetry.
//!
//! The scheduler only materializes a pool when its computed width exceeds 1;
//! otherwise work runs inline on the calling task. `run_bounded` is the pool
//! itself: a sliding window over a `JoinSet` that keeps at most `width`
//! tasks in flight and refills the window as tasks finish.

use std::future::Future;

use tokio::task::JoinSet;
use tracing::error;

/// Which scheduler tier materialized a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolTier {
    /// Outer tier: one slot per parallel instance group.
    Groups,
    /// Inner tier: one slot per problem within a group.
    Problems,
}

/// One materialized pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSpawn {
    pub tier: PoolTier,
    pub width: usize,
}

/// Pool-creation telemetry for one resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Every pool the pass materialized, outer tier first.
    pub pools: Vec<PoolSpawn>,
}

impl PassStats {
    /// Number of pools materialized at the given tier.
    pub fn count(&self, tier: PoolTier) -> usize {
        self.pools.iter().filter(|p| p.tier == tier).count()
    }

    /// Widths of the pools materialized at the given tier.
    pub fn widths(&self, tier: PoolTier) -> Vec<usize> {
        self.pools
            .iter()
            .filter(|p| p.tier == tier)
            .map(|p| p.width)
            .collect()
    }
}

/// Run `tasks` with at most `width` in flight.
///
/// A width of 1 (or less) degenerates to awaiting the tasks in order on the
/// calling task, with no spawning. Panics inside spawned tasks are logged
/// and do not take down the window; the remaining tasks still run.
pub(crate) async fn run_bounded<F>(width: usize, tasks: Vec<F>)
where
    F: Future<Output = ()> + Send + 'static,
{
    if width <= 1 {
        for task in tasks {
            task.await;
        }
        return;
    }

    let mut pending = tasks.into_iter();
    let mut in_flight = JoinSet::new();
    for task in pending.by_ref().take(width) {
        in_flight.spawn(task);
    }
    while let Some(result) = in_flight.join_next().await {
        if let Err(e) = result {
            error!(error = %e, "resolution task aborted");
        }
        if let Some(task) = pending.next() {
            in_flight.spawn(task);
        }
    }
}
