//! Turns a scenario definition into a time-varying set of worker loops
//!
//! Every virtual user is one tokio task running [`Workload::iteration`] in a
//! loop. A VU checks its cancellation token only at the top of an iteration
//! and while thinking, so an in-flight request always completes (or times
//! out) before the loop exits. Tasks still alive when a grace window expires
//! are aborted and counted as forced stops.

use crate::scenario::{ScenarioDefinition, ScenarioKind};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Ramping scenarios re-evaluate their target this often
const RAMP_TICK: Duration = Duration::from_millis(100);

/// Per-VU state handed to each iteration
pub struct VuContext {
    pub scenario: Arc<str>,
    pub vu_id: u64,
    pub iteration: u64,
    pub rng: StdRng,
}

/// What one virtual user does per iteration
#[async_trait::async_trait]
pub trait Workload: Send + Sync {
    async fn iteration(&self, ctx: &mut VuContext);

    /// Pause after each iteration; cancellation cuts it short
    fn think_time(&self, _rng: &mut StdRng) -> Duration {
        Duration::ZERO
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioState {
    Pending,
    Running,
    Draining,
    Stopped,
}

impl fmt::Display for ScenarioState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScenarioState::Pending => "pending",
            ScenarioState::Running => "running",
            ScenarioState::Draining => "draining",
            ScenarioState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Live view of a running scenario, cheap to clone
#[derive(Debug, Clone)]
pub struct ScenarioMonitor {
    name: Arc<str>,
    state: watch::Receiver<ScenarioState>,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    iterations: Arc<AtomicU64>,
}

impl ScenarioMonitor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ScenarioState {
        *self.state.borrow()
    }

    /// Resolves once the scenario reaches `state` (or any later state)
    pub async fn wait_for(&mut self, state: ScenarioState) {
        let order = |s: ScenarioState| s as u8;
        let _ = self.state.wait_for(|s| order(*s) >= order(state)).await;
    }

    /// Worker tasks currently alive, including ones finishing after retirement
    pub fn active_vus(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }

    pub fn peak_vus(&self) -> usize {
        self.peak.load(Ordering::Relaxed)
    }

    pub fn iterations(&self) -> u64 {
        self.iterations.load(Ordering::Relaxed)
    }
}

/// Final accounting of one scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub name: String,
    pub iterations: u64,
    pub peak_vus: usize,
    /// VUs aborted because a grace window expired
    pub forced_stops: usize,
    pub elapsed: Duration,
}

/// Decrements the live count however the task ends, abort included
struct ActiveGuard(Arc<AtomicUsize>);

impl ActiveGuard {
    fn enter(active: &Arc<AtomicUsize>, peak: &AtomicUsize) -> Self {
        let now = active.fetch_add(1, Ordering::Relaxed) + 1;
        peak.fetch_max(now, Ordering::Relaxed);
        Self(Arc::clone(active))
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

struct LiveVu {
    token: CancellationToken,
    handle: AbortHandle,
}

/// Runs one scenario to completion
pub struct ScenarioRunner {
    definition: ScenarioDefinition,
    workload: Arc<dyn Workload>,
    // Every VU draws its own RNG from this stream
    seeds: StdRng,
    name: Arc<str>,
    state: watch::Sender<ScenarioState>,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    iterations: Arc<AtomicU64>,
    // Cancels every VU at the end of the scenario window
    stop: CancellationToken,
    workers: JoinSet<()>,
    next_vu: u64,
}

impl ScenarioRunner {
    /// `seed` drives every VU's RNG; each VU seeds its own stream from it in spawn order
    pub fn new(definition: ScenarioDefinition, workload: Arc<dyn Workload>, seed: u64) -> Self {
        let (state, _) = watch::channel(ScenarioState::Pending);
        let name: Arc<str> = Arc::from(definition.name.as_str());
        Self {
            definition,
            workload,
            seeds: StdRng::seed_from_u64(seed),
            name,
            state,
            active: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
            iterations: Arc::new(AtomicU64::new(0)),
            stop: CancellationToken::new(),
            workers: JoinSet::new(),
            next_vu: 0,
        }
    }

    pub fn monitor(&self) -> ScenarioMonitor {
        ScenarioMonitor {
            name: Arc::clone(&self.name),
            state: self.state.subscribe(),
            active: Arc::clone(&self.active),
            peak: Arc::clone(&self.peak),
            iterations: Arc::clone(&self.iterations),
        }
    }

    /// Run until the scenario window closes or `shutdown` fires, then drain
    pub async fn run(mut self, shutdown: CancellationToken) -> ScenarioSummary {
        let started = Instant::now();
        self.transition(ScenarioState::Running);

        let mut forced_stops = match self.definition.kind.clone() {
            ScenarioKind::Constant { vus, duration } => {
                self.run_constant(vus, duration, &shutdown).await;
                0
            }
            ScenarioKind::Ramping {
                start_vus,
                graceful_ramp_down,
                ..
            } => {
                self.run_ramping(start_vus, graceful_ramp_down, &shutdown)
                    .await
            }
        };

        self.transition(ScenarioState::Draining);
        self.stop.cancel();
        forced_stops += self.drain(self.definition.graceful_stop).await;
        if forced_stops > 0 {
            warn!(
                "Scenario '{}' force-stopped {} virtual users",
                self.name, forced_stops
            );
        }
        self.transition(ScenarioState::Stopped);

        let summary = ScenarioSummary {
            name: self.name.to_string(),
            iterations: self.iterations.load(Ordering::Relaxed),
            peak_vus: self.peak.load(Ordering::Relaxed),
            forced_stops,
            elapsed: started.elapsed(),
        };
        info!(
            "Scenario '{}' finished: {} iterations, peak {} VUs",
            summary.name, summary.iterations, summary.peak_vus
        );
        summary
    }

    async fn run_constant(&mut self, vus: u64, duration: Duration, shutdown: &CancellationToken) {
        for _ in 0..vus {
            self.spawn_vu();
        }
        debug!("Scenario '{}' started {} VUs", self.name, vus);

        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = shutdown.cancelled() => {
                info!("Scenario '{}' interrupted", self.name);
            }
        }
    }

    /// Returns the number of VUs aborted after their ramp-down grace expired
    async fn run_ramping(
        &mut self,
        start_vus: u64,
        graceful_ramp_down: Duration,
        shutdown: &CancellationToken,
    ) -> usize {
        let started = Instant::now();
        let total = self.definition.total_duration();
        let mut live: Vec<LiveVu> = Vec::new();
        let mut retiring: Vec<(AbortHandle, Option<Instant>)> = Vec::new();
        let mut forced = 0;

        for _ in 0..start_vus {
            live.push(self.spawn_vu());
        }

        let mut ticker = tokio::time::interval(RAMP_TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.cancelled() => {
                    info!("Scenario '{}' interrupted", self.name);
                    break;
                }
            }

            // Reap loops that already exited
            while self.workers.try_join_next().is_some() {}
            live.retain(|vu| !vu.handle.is_finished());

            let elapsed = started.elapsed();
            if elapsed >= total {
                break;
            }

            let now = Instant::now();
            retiring.retain(|(handle, deadline)| {
                if handle.is_finished() {
                    false
                } else if deadline.is_some_and(|d| now >= d) {
                    handle.abort();
                    forced += 1;
                    false
                } else {
                    true
                }
            });

            let target = self.definition.target_at(elapsed) as usize;
            while live.len() > target {
                // Shrink from the most recently spawned VU
                if let Some(vu) = live.pop() {
                    vu.token.cancel();
                    retiring.push((vu.handle, now.checked_add(graceful_ramp_down)));
                }
            }
            // Retiring VUs still occupy a slot until their task is gone
            while self.active.load(Ordering::Relaxed) < target {
                live.push(self.spawn_vu());
            }
        }

        forced
    }

    fn spawn_vu(&mut self) -> LiveVu {
        let vu_id = self.next_vu;
        self.next_vu += 1;

        let token = self.stop.child_token();
        let mut ctx = VuContext {
            scenario: Arc::clone(&self.name),
            vu_id,
            iteration: 0,
            rng: StdRng::from_rng(&mut self.seeds),
        };
        let workload = Arc::clone(&self.workload);
        let iterations = Arc::clone(&self.iterations);
        let guard = ActiveGuard::enter(&self.active, &self.peak);
        let cancel = token.clone();

        let handle = self.workers.spawn(async move {
            let _guard = guard;
            loop {
                if cancel.is_cancelled() {
                    break;
                }
                workload.iteration(&mut ctx).await;
                ctx.iteration += 1;
                iterations.fetch_add(1, Ordering::Relaxed);

                let pause = workload.think_time(&mut ctx.rng);
                if !pause.is_zero() {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(pause) => {}
                    }
                }
            }
        });

        LiveVu { token, handle }
    }

    /// Wait up to `grace` for every worker, then abort the rest
    async fn drain(&mut self, grace: Duration) -> usize {
        let Some(deadline) = Instant::now().checked_add(grace) else {
            while self.workers.join_next().await.is_some() {}
            return 0;
        };
        loop {
            match tokio::time::timeout_at(deadline, self.workers.join_next()).await {
                Ok(Some(_)) => continue,
                Ok(None) => return 0,
                Err(_) => {
                    let remaining = self.workers.len();
                    self.workers.abort_all();
                    while self.workers.join_next().await.is_some() {}
                    return remaining;
                }
            }
        }
    }

    fn transition(&self, state: ScenarioState) {
        debug!("Scenario '{}' -> {}", self.name, state);
        self.state.send_replace(state);
    }
}
