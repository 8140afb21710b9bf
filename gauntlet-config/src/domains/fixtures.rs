//! Test identity pool configuration

use crate::error::{ConfigError, ConfigResult};
use crate::validation::{validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Expected-outcome class of a test identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityCategory {
    /// Account already migrated to the new identity provider
    #[serde(alias = "existing")]
    Migrated,
    /// Account still on the legacy store (first authentication migrates it)
    Legacy,
    /// Wrong credentials; the backend must refuse them
    Invalid,
}

impl IdentityCategory {
    pub const ALL: [IdentityCategory; 3] = [
        IdentityCategory::Migrated,
        IdentityCategory::Legacy,
        IdentityCategory::Invalid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityCategory::Migrated => "migrated",
            IdentityCategory::Legacy => "legacy",
            IdentityCategory::Invalid => "invalid",
        }
    }
}

impl fmt::Display for IdentityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentityCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "migrated" | "existing" => Ok(IdentityCategory::Migrated),
            "legacy" => Ok(IdentityCategory::Legacy),
            "invalid" => Ok(IdentityCategory::Invalid),
            _ => Err(format!("Invalid identity category: {}", s)),
        }
    }
}

/// One test identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureConfig {
    pub username: String,
    pub password: String,
    #[serde(alias = "type")]
    pub category: IdentityCategory,
}

impl FixtureConfig {
    pub fn new(username: &str, password: &str, category: IdentityCategory) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            category,
        }
    }
}

impl Validatable for FixtureConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.username, "username", self.domain_name())
    }

    fn domain_name(&self) -> &'static str {
        "fixtures"
    }
}

/// The pool must be non-empty and every identity must have a username
pub fn validate_pool(pool: &[FixtureConfig]) -> ConfigResult<()> {
    if pool.is_empty() {
        return Err(ConfigError::DomainError {
            domain: "fixtures".to_string(),
            message: "identity pool cannot be empty".to_string(),
        });
    }

    for fixture in pool {
        fixture.validate()?;
    }

    Ok(())
}

pub fn default_pool() -> Vec<FixtureConfig> {
    vec![
        FixtureConfig::new(
            "migrated@test.com",
            "MigratedPass123!",
            IdentityCategory::Migrated,
        ),
        FixtureConfig::new("legacy@test.com", "LegacyPass123!", IdentityCategory::Legacy),
        FixtureConfig::new("admin@legacy.com", "AdminPass456!", IdentityCategory::Legacy),
        FixtureConfig::new(
            "newuser@test.com",
            "NewUserPass789!",
            IdentityCategory::Legacy,
        ),
        FixtureConfig::new("invalid@test.com", "WrongPass!", IdentityCategory::Invalid),
    ]
}
