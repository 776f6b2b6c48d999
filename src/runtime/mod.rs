//! Run orchestration: configuration, the scheduler, the superstep runner,
//! and handles for observing and cancelling in-flight runs.

pub mod config;
pub mod run;
pub mod runner;
pub mod scheduler;

pub use config::{RunConfig, DEFAULT_STEP_LIMIT, STEP_LIMIT_ENV};
pub use run::{RunHandle, RunReport, RunStatus, StepReport};
pub use runner::{GraphRunner, RunnerError};
pub use scheduler::{Disposition, NodeOutcome, Scheduler};
