//! Graph description and compilation.

pub mod builder;
pub mod compilation;
pub mod edges;

pub use builder::GraphBuilder;
pub use compilation::GraphValidationError;
pub use edges::{ConditionalEdge, EdgePredicate};
