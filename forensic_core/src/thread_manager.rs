//! Worker Pool Sizing
//!
//! Batch analysis runs frames on a dedicated, bounded rayon pool so a large
//! batch never takes every core from the host process.

use crate::errors::{ForensicError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreadConfig {
    /// Percentage of logical cores to use (0-100)
    pub core_percentage: usize,
    pub min_threads: usize,
    pub max_threads: usize,
}

impl Default for ThreadConfig {
    fn default() -> Self {
        Self {
            core_percentage: 70,
            min_threads: 2,
            max_threads: 16,
        }
    }
}

impl ThreadConfig {
    /// Exactly `n` workers (`--threads N`).
    pub fn fixed(n: usize) -> Self {
        let n = n.max(1);
        Self {
            core_percentage: 100,
            min_threads: n,
            max_threads: n,
        }
    }
}

pub fn calculate_optimal_threads(config: &ThreadConfig) -> usize {
    let cpu_count = num_cpus::get();
    let calculated = (cpu_count * config.core_percentage / 100).max(1);
    let min = config.min_threads.max(1);
    calculated.clamp(min, config.max_threads.max(min))
}

pub fn build_pool(config: &ThreadConfig) -> Result<rayon::ThreadPool> {
    let threads = calculate_optimal_threads(config);
    tracing::debug!(threads, cpus = num_cpus::get(), "building analysis pool");
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("forensic-worker-{}", i))
        .build()
        .map_err(|e| ForensicError::ConfigurationError(format!("thread pool: {}", e)))
}
