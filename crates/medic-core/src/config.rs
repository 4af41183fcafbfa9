//! Resolution engine configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a resolution pass, usually loaded from the
/// orchestrator's config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Global ceiling on concurrently running units at each pool tier.
    #[serde(default = "default_max_threads")]
    pub max_threads: usize,
    /// When false, every resolution pass runs strictly sequentially
    /// regardless of group policy.
    #[serde(default = "default_parallel")]
    pub parallel_problem_resolution: bool,
}

fn default_max_threads() -> usize {
    32
}

fn default_parallel() -> bool {
    true
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_threads: default_max_threads(),
            parallel_problem_resolution: default_parallel(),
        }
    }
}

impl ResolverConfig {
    /// Load from a TOML file. Missing keys fall back to defaults;
    /// `max_threads` is clamped to at least 1.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse from a TOML string. Missing keys fall back to defaults;
    /// `max_threads` is clamped to at least 1.
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let mut config: ResolverConfig = toml::from_str(content)?;
        config.max_threads = config.max_threads.max(1);
        Ok(config)
    }
}
