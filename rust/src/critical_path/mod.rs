//! Critical path analysis.
//!
//! Works on the output of the forward/backward passes: a task is critical
//! when its total float is within tolerance, and a critical path is a chain
//! of critical tasks joined by driving (zero-slack) dependencies.

mod analysis;

pub use analysis::CriticalPathAnalyzer;
