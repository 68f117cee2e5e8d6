// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::MigrationError;
use std::str::FromStr;

/// What happens when a step runs before its predecessors have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderingPolicy {
    /// The run fails with an integrity error and is recorded as failed.
    #[default]
    Enforce,
    /// A warning is logged and the step runs anyway.
    Warn,
}

impl OrderingPolicy {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Enforce => "enforce",
            Self::Warn => "warn",
        }
    }
}

impl FromStr for OrderingPolicy {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "enforce" => Ok(Self::Enforce),
            "warn" => Ok(Self::Warn),
            _ => Err(MigrationError::UnknownOrderingPolicy(s.to_string())),
        }
    }
}

impl std::fmt::Display for OrderingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Orchestrator settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrchestratorConfig {
    pub ordering: OrderingPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_enforces_ordering() {
        assert_eq!(OrchestratorConfig::default().ordering, OrderingPolicy::Enforce);
    }

    #[test]
    fn test_policy_parsing() {
        assert!(matches!(" WARN ".parse(), Ok(OrderingPolicy::Warn)));
        assert!(matches!(
            OrderingPolicy::from_str("sometimes"),
            Err(MigrationError::UnknownOrderingPolicy(_))
        ));
    }
}
