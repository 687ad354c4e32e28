//! Critical path scheduling over the project work axis.
//!
//! The forward pass computes early dates from dependencies and constraints,
//! the backward pass computes late dates from the required finish, and float
//! falls out of the difference.

mod core;
mod passes;
mod state;

pub use core::ForwardBackwardScheduler;
pub use passes::{dependency_start_bound, edge_slack, PassInputs};
pub use state::{RawConflict, ScheduleState, TaskTiming};
