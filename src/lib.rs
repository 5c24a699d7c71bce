//! Loadplan library
//!
//! Core functionality for the Loadplan pipeline resolver.

pub mod cli;
pub mod config;
pub mod plan;
pub mod resolver;
pub mod transform;
pub mod utils;

pub use cli::Cli;
pub use config::Config;
pub use plan::ExecutionPlan;
pub use resolver::{BuildMode, PipelineResolver};
