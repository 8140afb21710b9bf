//! Fixed pool of test identities

use crate::error::{EngineError, EngineResult};
use gauntlet_config::{FixtureConfig, IdentityCategory};
use rand::Rng;
use std::sync::Arc;

/// One set of credentials and the outcome it should produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestIdentity {
    pub username: String,
    pub password: String,
    pub category: IdentityCategory,
}

impl TestIdentity {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        category: IdentityCategory,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            category,
        }
    }

    /// HTTP status a correct backend answers with
    pub fn expected_status(&self) -> u16 {
        match self.category {
            IdentityCategory::Invalid => 401,
            IdentityCategory::Migrated | IdentityCategory::Legacy => 200,
        }
    }
}

impl From<&FixtureConfig> for TestIdentity {
    fn from(config: &FixtureConfig) -> Self {
        Self::new(&config.username, &config.password, config.category)
    }
}

/// Read-only identity pool; cloning shares the pool.
///
/// Picking takes the caller's RNG, so the provider itself holds no mutable
/// state and needs no synchronisation.
#[derive(Debug, Clone)]
pub struct FixtureProvider {
    pool: Arc<[TestIdentity]>,
}

impl FixtureProvider {
    /// Fails when `identities` is empty
    pub fn new(identities: Vec<TestIdentity>) -> EngineResult<Self> {
        if identities.is_empty() {
            return Err(EngineError::Configuration(
                "identity pool is empty".to_string(),
            ));
        }
        Ok(Self {
            pool: identities.into(),
        })
    }

    pub fn from_config(fixtures: &[FixtureConfig]) -> EngineResult<Self> {
        Self::new(fixtures.iter().map(TestIdentity::from).collect())
    }

    /// Uniformly random identity
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> &TestIdentity {
        &self.pool[rng.random_range(0..self.pool.len())]
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn identities(&self) -> &[TestIdentity] {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn pool() -> FixtureProvider {
        FixtureProvider::new(vec![
            TestIdentity::new("a@test.com", "pw", IdentityCategory::Migrated),
            TestIdentity::new("b@test.com", "pw", IdentityCategory::Legacy),
            TestIdentity::new("invalid@test.com", "wrong", IdentityCategory::Invalid),
        ])
        .unwrap()
    }

    #[test]
    fn test_empty_pool_is_configuration_error() {
        assert!(matches!(
            FixtureProvider::new(Vec::new()),
            Err(EngineError::Configuration(_))
        ));
    }

    #[test]
    fn test_pick_is_roughly_uniform() {
        let provider = pool();
        let mut rng = StdRng::seed_from_u64(7);
        let mut counts: HashMap<String, usize> = HashMap::new();
        for _ in 0..3000 {
            *counts
                .entry(provider.pick(&mut rng).username.clone())
                .or_default() += 1;
        }
        assert_eq!(counts.len(), 3);
        for count in counts.values() {
            assert!((800..1200).contains(count), "skewed pick: {:?}", counts);
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let provider = pool();
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        for _ in 0..50 {
            assert_eq!(provider.pick(&mut a), provider.pick(&mut b));
        }
    }

    #[test]
    fn test_expected_status() {
        let provider = pool();
        let statuses: Vec<u16> = provider
            .identities()
            .iter()
            .map(TestIdentity::expected_status)
            .collect();
        assert_eq!(statuses, vec![200, 200, 401]);
    }
}
