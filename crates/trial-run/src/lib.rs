//! Run plans for the trial sequencing engine and the helpers the CLI drives them with.

pub mod plan;
pub mod runner;

pub use plan::{ConditionSource, LoopConfig, RunPlan};
pub use runner::{drive_loop, prepare_loops, LoopSummary, PreparedLoop, RunSummary};
