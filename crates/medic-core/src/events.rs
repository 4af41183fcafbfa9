//! Operator-facing progress events.
//!
//! The resolver reports per-problem progress through an injected
//! `EventLog` so the surrounding orchestrator can surface the lines to
//! whoever invoked the pass. Failures are not routed here; those go to
//! the `tracing` log stream with full context.

use tracing::info;

/// Sink for human-readable progress lines emitted during a resolution
/// pass. Purely observational; the resolver never reads anything back.
pub trait EventLog: Send + Sync {
    /// Open a named stage expected to advance `total` steps.
    fn begin_stage(&self, name: &str, total: u32);

    /// Record one progress line within the current stage.
    fn track(&self, line: &str);
}

/// Default event log that forwards progress lines to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventLog;

impl EventLog for TracingEventLog {
    fn begin_stage(&self, name: &str, total: u32) {
        info!(stage = name, steps = total, "stage started");
    }

    fn track(&self, line: &str) {
        info!("{line}");
    }
}
