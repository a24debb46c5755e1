// feedback-core/src/tasks/cache_maintenance.rs

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::Sweep;

/// Spawns a background task that periodically prunes expired cache entries
/// and stale rate-limit state.
pub fn spawn_cache_sweep_task(targets: Vec<Arc<dyn Sweep>>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        loop {
            ticker.tick().await;
            run_sweep(&targets);
        }
    })
}

/// One pass over every target. Returns the total number of items removed.
pub fn run_sweep(targets: &[Arc<dyn Sweep>]) -> usize {
    let mut total = 0;
    for target in targets {
        let removed = target.sweep();
        if removed > 0 {
            debug!("Swept {} expired item(s) from {}", removed, target.name());
        }
        total += removed;
    }
    total
}
