//! ProblemResolver — applies operator resolutions across a deployment.
//!
//! A resolution pass takes a map of problem ids to resolution names, splits
//! the open problems by instance group, and works through them under the
//! deployment's concurrency budgets. Parallel groups run in an outer window
//! of at most `max_threads` groups; each group's problems run in an inner
//! window further bounded by the group's `max_in_flight`. Serial groups and
//! problems with no resolvable group run inline, one at a time, before the
//! parallel tier starts. Failures never cross a problem boundary: the pass
//! always completes and reports the processed count plus the last captured
//! failure line.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, error, info};

use medic_core::EventLog;
use medic_core::config::ResolverConfig;
use medic_core::types::{DeploymentPlan, Problem, ProblemId, ProblemState};
use medic_handlers::HandlerFactory;
use medic_store::FleetStore;

use crate::error::ResolverResult;
use crate::group_index::GroupIndex;
use crate::pool::{PassStats, PoolSpawn, PoolTier, run_bounded};

/// Result of one resolution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionOutcome {
    /// Problems processed to completion, remediation failures included.
    pub resolved: u32,
    /// Most recently captured failure line, if any problem failed.
    pub error: Option<String>,
}

/// One partition of open problems sharing a scheduling slot.
struct GroupBatch {
    /// Instance group name, `None` for an ungrouped singleton.
    group: Option<String>,
    serial: bool,
    max_in_flight: u32,
    problems: Vec<Problem>,
}

/// Shared state of one in-flight pass.
struct PassContext {
    store: FleetStore,
    factory: Arc<dyn HandlerFactory>,
    events: Arc<dyn EventLog>,
    resolutions: HashMap<ProblemId, String>,
    max_threads: usize,
    resolved: AtomicU32,
    last_error: Mutex<Option<String>>,
    pools: Mutex<Vec<PoolSpawn>>,
}

impl PassContext {
    fn record_pool(&self, tier: PoolTier, width: usize) {
        self.pools.lock().unwrap().push(PoolSpawn { tier, width });
    }

    fn capture_failure(&self, problem_id: ProblemId, err: &dyn std::fmt::Display) {
        error!(%problem_id, error = %err, "problem resolution failed");
        let line = format!("Error resolving problem '{problem_id}': {err}");
        *self.last_error.lock().unwrap() = Some(line);
    }
}

/// Applies problem resolutions for one deployment.
pub struct ProblemResolver {
    store: FleetStore,
    plan: Arc<DeploymentPlan>,
    factory: Arc<dyn HandlerFactory>,
    events: Arc<dyn EventLog>,
    config: ResolverConfig,
    groups: GroupIndex,
    last_stats: Mutex<PassStats>,
}

impl ProblemResolver {
    pub fn new(
        store: FleetStore,
        plan: DeploymentPlan,
        factory: Arc<dyn HandlerFactory>,
        events: Arc<dyn EventLog>,
        config: ResolverConfig,
    ) -> Self {
        let plan = Arc::new(plan);
        let groups = GroupIndex::new(store.clone(), plan.clone());
        Self {
            store,
            plan,
            factory,
            events,
            config,
            groups,
            last_stats: Mutex::new(PassStats::default()),
        }
    }

    /// Apply the requested resolutions.
    ///
    /// Keys are problem ids as decimal strings; ids that do not parse, are
    /// unknown to the store, or belong to another deployment are skipped
    /// silently. Values are resolution names handed to the problem's
    /// handler; a problem whose entry names no known resolution is still
    /// processed (and closed) with the failure captured.
    pub async fn apply_resolutions(
        &self,
        resolutions: &HashMap<String, String>,
    ) -> ResolverResult<ResolutionOutcome> {
        // BTreeMap key order is the stable processing order.
        let mut requested: BTreeMap<ProblemId, String> = BTreeMap::new();
        for (id, name) in resolutions {
            if let Ok(id) = id.parse::<ProblemId>() {
                requested.insert(id, name.clone());
            }
        }
        let mut problems = Vec::new();
        for id in requested.keys() {
            if let Some(problem) = self.store.get_problem(*id)? {
                if problem.deployment_id == self.plan.name {
                    problems.push(problem);
                }
            }
        }
        self.run_pass(problems, requested.into_iter().collect()).await
    }

    /// Resolve every open problem of the deployment with its handler's
    /// default resolution.
    pub async fn apply_auto_resolutions(&self) -> ResolverResult<ResolutionOutcome> {
        let problems = self.store.open_problems(&self.plan.name)?;
        self.run_pass(problems, HashMap::new()).await
    }

    /// Pool-creation telemetry from the most recent pass.
    pub fn pass_stats(&self) -> PassStats {
        self.last_stats.lock().unwrap().clone()
    }

    async fn run_pass(
        &self,
        problems: Vec<Problem>,
        resolutions: HashMap<ProblemId, String>,
    ) -> ResolverResult<ResolutionOutcome> {
        self.events
            .begin_stage("Applying problem resolutions", problems.len() as u32);

        let ctx = Arc::new(PassContext {
            store: self.store.clone(),
            factory: self.factory.clone(),
            events: self.events.clone(),
            resolutions,
            max_threads: self.config.max_threads.max(1),
            resolved: AtomicU32::new(0),
            last_error: Mutex::new(None),
            pools: Mutex::new(Vec::new()),
        });

        let batches = self.partition(&ctx, problems)?;
        self.dispatch(&ctx, batches).await;

        let outcome = ResolutionOutcome {
            resolved: ctx.resolved.load(Ordering::SeqCst),
            error: ctx.last_error.lock().unwrap().clone(),
        };
        *self.last_stats.lock().unwrap() = PassStats {
            pools: ctx.pools.lock().unwrap().clone(),
        };
        info!(
            deployment = %self.plan.name,
            resolved = outcome.resolved,
            failed = outcome.error.is_some(),
            "resolution pass finished"
        );
        Ok(outcome)
    }

    /// Split open problems into scheduling batches, preserving first-seen
    /// group order. Non-open problems get their skip line here and join no
    /// batch.
    fn partition(
        &self,
        ctx: &PassContext,
        problems: Vec<Problem>,
    ) -> ResolverResult<Vec<GroupBatch>> {
        let mut batches: Vec<GroupBatch> = Vec::new();
        let mut by_name: HashMap<String, usize> = HashMap::new();
        for problem in problems {
            if problem.state != ProblemState::Open {
                ctx.events.track(&format!(
                    "Ignoring problem {} (state is '{}')",
                    problem.id, problem.state
                ));
                continue;
            }
            match self.groups.policy_for(&problem)? {
                Some(slot) => {
                    if let Some(&i) = by_name.get(&slot.group) {
                        batches[i].problems.push(problem);
                    } else {
                        by_name.insert(slot.group.clone(), batches.len());
                        batches.push(GroupBatch {
                            group: Some(slot.group),
                            serial: slot.serial,
                            max_in_flight: slot.max_in_flight,
                            problems: vec![problem],
                        });
                    }
                }
                // No resolvable group: a serial singleton of its own.
                None => batches.push(GroupBatch {
                    group: None,
                    serial: true,
                    max_in_flight: 1,
                    problems: vec![problem],
                }),
            }
        }
        Ok(batches)
    }

    async fn dispatch(&self, ctx: &Arc<PassContext>, batches: Vec<GroupBatch>) {
        if !self.config.parallel_problem_resolution {
            for batch in batches {
                run_batch_inline(ctx, batch.problems).await;
            }
            return;
        }

        let (serial, parallel): (Vec<_>, Vec<_>) = batches.into_iter().partition(|b| b.serial);

        // Serial groups and singletons run first, inline, in stable order.
        for batch in serial {
            debug!(
                group = batch.group.as_deref().unwrap_or("<none>"),
                problems = batch.problems.len(),
                "running serial batch"
            );
            run_batch_inline(ctx, batch.problems).await;
        }

        if parallel.is_empty() {
            return;
        }
        let outer_width = ctx.max_threads.min(parallel.len());
        if outer_width <= 1 {
            for batch in parallel {
                run_group(ctx.clone(), batch).await;
            }
        } else {
            ctx.record_pool(PoolTier::Groups, outer_width);
            let tasks: Vec<_> = parallel
                .into_iter()
                .map(|batch| run_group(ctx.clone(), batch))
                .collect();
            run_bounded(outer_width, tasks).await;
        }
    }
}

/// Resolve one parallel group's problems under its inner budget.
async fn run_group(ctx: Arc<PassContext>, batch: GroupBatch) {
    let width = ctx
        .max_threads
        .min(batch.max_in_flight as usize)
        .min(batch.problems.len());
    debug!(
        group = batch.group.as_deref().unwrap_or("<none>"),
        problems = batch.problems.len(),
        width,
        "running group batch"
    );
    if width <= 1 {
        run_batch_inline(&ctx, batch.problems).await;
    } else {
        ctx.record_pool(PoolTier::Problems, width);
        let tasks: Vec<_> = batch
            .problems
            .into_iter()
            .map(|problem| process_problem(ctx.clone(), problem))
            .collect();
        run_bounded(width, tasks).await;
    }
}

async fn run_batch_inline(ctx: &Arc<PassContext>, problems: Vec<Problem>) {
    for problem in problems {
        process_problem(ctx.clone(), problem).await;
    }
}

/// Resolve one problem. Never returns an error: every failure is captured
/// into the pass context so sibling problems keep going.
async fn process_problem(ctx: Arc<PassContext>, problem: Problem) {
    // Re-read the record; another pass may have closed it since partition.
    let current = match ctx.store.get_problem(problem.id) {
        Ok(Some(p)) => p,
        Ok(None) => return,
        Err(e) => {
            ctx.capture_failure(problem.id, &e);
            return;
        }
    };
    if current.state != ProblemState::Open {
        ctx.events.track(&format!(
            "Ignoring problem {} (state is '{}')",
            current.id, current.state
        ));
        return;
    }

    let handler = match ctx.factory.create(&current) {
        Ok(handler) => handler,
        Err(e) => {
            ctx.capture_failure(current.id, &e);
            return;
        }
    };
    let resolution = match ctx.resolutions.get(&current.id) {
        Some(name) => name.clone(),
        None => handler.auto_resolution().to_string(),
    };
    let plan = handler
        .resolution_plan(&resolution)
        .unwrap_or("no resolution");
    ctx.events.track(&format!(
        "{} ({} {}): {}",
        handler.description(),
        current.ptype,
        current.id,
        plan
    ));

    // A failed remediation still closes the problem; only a store failure
    // below leaves it open.
    if let Err(e) = handler.apply(&resolution).await {
        ctx.capture_failure(current.id, &e);
    }
    if let Err(e) = ctx.store.mark_problem_resolved(current.id) {
        ctx.capture_failure(current.id, &e);
        return;
    }
    ctx.resolved.fetch_add(1, Ordering::SeqCst);
}
