//! The two backends under comparison and how iterations choose between them

use gauntlet_config::{ProbeConfig, TargetsConfig};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Backend {
    A,
    B,
}

impl Backend {
    pub const ALL: [Backend; 2] = [Backend::A, Backend::B];
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::A => f.write_str("backend_a"),
            Backend::B => f.write_str("backend_b"),
        }
    }
}

/// A backend's label and full login URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub backend: Backend,
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Targets {
    a: Target,
    b: Target,
}

impl Targets {
    pub fn new(a: Target, b: Target) -> Self {
        Self { a, b }
    }

    pub fn from_config(targets: &TargetsConfig, probe: &ProbeConfig) -> Self {
        let url = |base: &str| format!("{}{}", base.trim_end_matches('/'), probe.login_path);
        Self {
            a: Target {
                backend: Backend::A,
                label: targets.backend_a.label.clone(),
                url: url(&targets.backend_a.base_url),
            },
            b: Target {
                backend: Backend::B,
                label: targets.backend_b.label.clone(),
                url: url(&targets.backend_b.base_url),
            },
        }
    }

    pub fn get(&self, backend: Backend) -> &Target {
        match backend {
            Backend::A => &self.a,
            Backend::B => &self.b,
        }
    }

    pub fn label(&self, backend: Backend) -> &str {
        &self.get(backend).label
    }

    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        [&self.a, &self.b].into_iter()
    }
}

/// Sampling strategy for the backend an iteration probes
pub trait TargetSelector: Send + Sync {
    fn select(&self, rng: &mut StdRng) -> Backend;
}

/// 50/50 between the two backends
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformSelector;

impl TargetSelector for UniformSelector {
    fn select(&self, rng: &mut StdRng) -> Backend {
        if rng.random_bool(0.5) {
            Backend::A
        } else {
            Backend::B
        }
    }
}

/// Always the same backend
#[derive(Debug, Clone, Copy)]
pub struct FixedSelector(pub Backend);

impl TargetSelector for FixedSelector {
    fn select(&self, _rng: &mut StdRng) -> Backend {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_urls_join_base_and_login_path() {
        let mut config = TargetsConfig::default();
        config.backend_a.base_url = "http://localhost:4000/".to_string();
        let targets = Targets::from_config(&config, &ProbeConfig::default());

        assert_eq!(targets.get(Backend::A).url, "http://localhost:4000/login");
        assert_eq!(targets.get(Backend::B).url, "http://localhost:8000/login");
        assert_eq!(targets.label(Backend::B), "python");
    }

    #[test]
    fn test_uniform_selector_splits_evenly() {
        let mut rng = StdRng::seed_from_u64(3);
        let a = (0..10_000)
            .filter(|_| UniformSelector.select(&mut rng) == Backend::A)
            .count();
        assert!((4_700..5_300).contains(&a), "got {} of 10000 on A", a);
    }
}
