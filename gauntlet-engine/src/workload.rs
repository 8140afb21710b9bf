//! The login workload each virtual user runs by default

use crate::fixtures::FixtureProvider;
use crate::probe::RequestExecutor;
use crate::scheduler::{VuContext, Workload};
use crate::target::{TargetSelector, Targets};
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Pick a backend, pick an identity, probe, think
pub struct LoginWorkload {
    executor: Arc<RequestExecutor>,
    fixtures: FixtureProvider,
    targets: Arc<Targets>,
    selector: Arc<dyn TargetSelector>,
    max_think_time: Duration,
}

impl LoginWorkload {
    pub fn new(
        executor: Arc<RequestExecutor>,
        fixtures: FixtureProvider,
        targets: Arc<Targets>,
        selector: Arc<dyn TargetSelector>,
        max_think_time: Duration,
    ) -> Self {
        Self {
            executor,
            fixtures,
            targets,
            selector,
            max_think_time,
        }
    }
}

#[async_trait::async_trait]
impl Workload for LoginWorkload {
    async fn iteration(&self, ctx: &mut VuContext) {
        let backend = self.selector.select(&mut ctx.rng);
        let identity = self.fixtures.pick(&mut ctx.rng);
        let result = self.executor.probe(self.targets.get(backend), identity).await;
        trace!(
            scenario = %ctx.scenario,
            vu = ctx.vu_id,
            scope = %result.scope,
            status = result.status,
            "iteration {} done",
            ctx.iteration
        );
    }

    /// Uniform in `[0, max_think_time]`
    fn think_time(&self, rng: &mut StdRng) -> Duration {
        let max_ms = self.max_think_time.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rng.random_range(0..=max_ms))
    }
}
