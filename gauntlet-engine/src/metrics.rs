//! Standard metric names and the handles the request executor writes through

use crate::target::{Backend, Targets};
use gauntlet_config::IdentityCategory;
use gauntlet_metrics::{
    Counter, MetricRegistry, MetricRegistryBuilder, MetricsResult, Rate, Trend,
};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const TOTAL_REQUESTS: &str = "total_requests";
pub const CHECKS: &str = "checks";

pub fn login_duration(label: &str) -> String {
    format!("{}_login_duration", label)
}

/// Rate of failed probes (true = error)
pub fn error_rate(label: &str) -> String {
    format!("{}_error_rate", label)
}

pub fn success_count(label: &str) -> String {
    format!("{}_success", label)
}

pub fn error_count(label: &str) -> String {
    format!("{}_error", label)
}

/// Every metric that belongs to the backend labelled `label`
pub fn backend_metric_names(label: &str) -> [String; 4] {
    [
        login_duration(label),
        error_rate(label),
        success_count(label),
        error_count(label),
    ]
}

pub fn category_duration(category: IdentityCategory) -> String {
    format!("{}_user_duration", category.as_str())
}

/// Declare every standard metric for `targets`
pub fn declare(mut builder: MetricRegistryBuilder, targets: &Targets) -> MetricRegistryBuilder {
    builder = builder.counter(TOTAL_REQUESTS).rate(CHECKS);
    for target in targets.iter() {
        builder = builder
            .trend(login_duration(&target.label))
            .rate(error_rate(&target.label))
            .counter(success_count(&target.label))
            .counter(error_count(&target.label));
    }
    for category in IdentityCategory::ALL {
        builder = builder.trend(category_duration(category));
    }
    builder
}

/// Per-backend handles
#[derive(Debug, Clone)]
pub struct BackendMetrics {
    pub duration: Arc<Trend>,
    pub error_rate: Arc<Rate>,
    pub success: Arc<Counter>,
    pub error: Arc<Counter>,
}

impl BackendMetrics {
    fn resolve(registry: &MetricRegistry, label: &str) -> MetricsResult<Self> {
        Ok(Self {
            duration: registry.trend(&login_duration(label))?,
            error_rate: registry.rate(&error_rate(label))?,
            success: registry.counter(&success_count(label))?,
            error: registry.counter(&error_count(label))?,
        })
    }
}

/// Every handle a probe writes, resolved once before the run
#[derive(Debug, Clone)]
pub struct ProbeMetrics {
    pub total_requests: Arc<Counter>,
    pub checks: Arc<Rate>,
    backend_a: BackendMetrics,
    backend_b: BackendMetrics,
    categories: BTreeMap<IdentityCategory, Arc<Trend>>,
}

impl ProbeMetrics {
    pub fn resolve(registry: &MetricRegistry, targets: &Targets) -> MetricsResult<Self> {
        let mut categories = BTreeMap::new();
        for category in IdentityCategory::ALL {
            categories.insert(category, registry.trend(&category_duration(category))?);
        }

        Ok(Self {
            total_requests: registry.counter(TOTAL_REQUESTS)?,
            checks: registry.rate(CHECKS)?,
            backend_a: BackendMetrics::resolve(registry, targets.label(Backend::A))?,
            backend_b: BackendMetrics::resolve(registry, targets.label(Backend::B))?,
            categories,
        })
    }

    pub fn backend(&self, backend: Backend) -> &BackendMetrics {
        match backend {
            Backend::A => &self.backend_a,
            Backend::B => &self.backend_b,
        }
    }

    pub fn category(&self, category: IdentityCategory) -> Option<&Arc<Trend>> {
        self.categories.get(&category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gauntlet_config::{ProbeConfig, TargetsConfig};

    #[test]
    fn test_declares_standard_set() {
        let targets = Targets::from_config(&TargetsConfig::default(), &ProbeConfig::default());
        let registry = declare(MetricRegistry::builder(), &targets).build().unwrap();

        for name in [
            "total_requests",
            "checks",
            "elixir_login_duration",
            "elixir_error_rate",
            "elixir_success",
            "elixir_error",
            "python_login_duration",
            "migrated_user_duration",
            "legacy_user_duration",
            "invalid_user_duration",
        ] {
            assert!(registry.get(name).is_some(), "missing {}", name);
        }
        assert_eq!(registry.len(), 13);
        assert!(ProbeMetrics::resolve(&registry, &targets).is_ok());
    }
}
