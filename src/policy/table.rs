//! TTL Policy Table
//!
//! Maps operation names to how long their results stay fresh.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Name of the fallback policy.
pub const DEFAULT_OPERATION: &str = "default";

/// Freshness policy for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtlPolicy {
    pub ttl_seconds: u64,
}

impl TtlPolicy {
    pub const fn secs(ttl_seconds: u64) -> Self {
        Self { ttl_seconds }
    }
}

// == Policy Table ==
/// Operation name to TTL mapping.
///
/// The `default` policy lives in its own field so it can never be missing;
/// any operation without an explicit entry uses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyTable {
    policies: HashMap<String, TtlPolicy>,
    default: TtlPolicy,
}

impl PolicyTable {
    /// A table with only a default policy.
    pub fn new(default: TtlPolicy) -> Self {
        Self {
            policies: HashMap::new(),
            default,
        }
    }

    /// Builder form of [`PolicyTable::set`].
    pub fn with_policy(mut self, operation: impl Into<String>, ttl_seconds: u64) -> Self {
        self.set(operation, ttl_seconds);
        self
    }

    /// Sets the TTL for `operation`. Setting `"default"` replaces the fallback.
    pub fn set(&mut self, operation: impl Into<String>, ttl_seconds: u64) {
        let operation = operation.into();
        if operation == DEFAULT_OPERATION {
            self.default = TtlPolicy::secs(ttl_seconds);
        } else {
            self.policies.insert(operation, TtlPolicy::secs(ttl_seconds));
        }
    }

    /// Policy for `operation`, falling back to the default.
    pub fn policy_for(&self, operation: &str) -> TtlPolicy {
        self.policies.get(operation).copied().unwrap_or(self.default)
    }

    pub fn ttl_for(&self, operation: &str) -> u64 {
        self.policy_for(operation).ttl_seconds
    }

    pub fn default_policy(&self) -> TtlPolicy {
        self.default
    }

    /// Explicitly configured operations, excluding the default.
    pub fn operations(&self) -> impl Iterator<Item = (&str, TtlPolicy)> {
        self.policies.iter().map(|(name, policy)| (name.as_str(), *policy))
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::new(TtlPolicy::secs(1800))
            .with_policy("file_analysis", 1800)
            .with_policy("dependency_scan", 3600)
            .with_policy("pattern_analysis", 7200)
            .with_policy("meta_analysis", 3600)
            .with_policy("knowledge_hub", 14400)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_values() {
        let table = PolicyTable::default();
        assert_eq!(table.ttl_for("file_analysis"), 1800);
        assert_eq!(table.ttl_for("dependency_scan"), 3600);
        assert_eq!(table.ttl_for("pattern_analysis"), 7200);
        assert_eq!(table.ttl_for("meta_analysis"), 3600);
        assert_eq!(table.ttl_for("knowledge_hub"), 14400);
        assert_eq!(table.ttl_for("default"), 1800);
        assert_eq!(table.operations().count(), 5);
    }

    #[test]
    fn test_unknown_operation_uses_default() {
        let table = PolicyTable::new(TtlPolicy::secs(42));
        assert_eq!(table.ttl_for("anything"), 42);
    }

    #[test]
    fn test_override_and_default_replacement() {
        let mut table = PolicyTable::default();
        table.set("file_analysis", 5);
        table.set("default", 7);

        assert_eq!(table.ttl_for("file_analysis"), 5);
        assert_eq!(table.ttl_for("unlisted"), 7);
        assert_eq!(table.default_policy(), TtlPolicy::secs(7));
        assert!(table.operations().all(|(name, _)| name != "default"));
    }
}
