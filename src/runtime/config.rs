//! Per-run configuration.

use std::time::Duration;

use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::warn;

use crate::utils::id_generator::IdGenerator;

/// Step fuse applied when neither the environment nor the caller says
/// otherwise.
pub const DEFAULT_STEP_LIMIT: u64 = 25;

/// Environment variable overriding the default step limit.
pub const STEP_LIMIT_ENV: &str = "WARPGRAPH_STEP_LIMIT";

/// Knobs for a single run.
///
/// `RunConfig::new` resolves the step limit from the environment (a `.env`
/// file is honored) and generates a fresh run id; builder methods override
/// the rest.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub run_id: String,
    /// Upper bound on supersteps. Exceeding it fails the run; cyclic graphs
    /// rely on this fuse to terminate when their predicates never route to
    /// End.
    pub step_limit: u64,
    /// Wall-clock budget for a single node invocation. `None` means
    /// unbounded.
    pub node_timeout: Option<Duration>,
    /// Free-form metadata attached to the run, surfaced in diagnostics.
    pub metadata: FxHashMap<String, Value>,
}

impl RunConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            run_id: IdGenerator::new().generate_run_id(),
            step_limit: resolve_step_limit(),
            node_timeout: None,
            metadata: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    #[must_use]
    pub fn with_step_limit(mut self, step_limit: u64) -> Self {
        self.step_limit = step_limit;
        self
    }

    #[must_use]
    pub fn with_node_timeout(mut self, timeout: Duration) -> Self {
        self.node_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve_step_limit() -> u64 {
    match dotenvy::var(STEP_LIMIT_ENV) {
        Ok(raw) => match raw.parse::<u64>() {
            Ok(limit) if limit > 0 => limit,
            _ => {
                warn!(
                    value = %raw,
                    "ignoring {STEP_LIMIT_ENV}: expected a positive integer"
                );
                DEFAULT_STEP_LIMIT
            }
        },
        Err(_) => DEFAULT_STEP_LIMIT,
    }
}
