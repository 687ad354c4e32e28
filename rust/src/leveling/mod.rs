//! Resource leveling.
//!
//! Loads are bucketed per resource and working day. Over-allocated days are
//! relieved by delaying non-critical tasks inside their total float; critical
//! and pinned tasks never move, so leveling never extends the project.

mod engine;
mod timeline;

pub use engine::ResourceLevelingEngine;
pub use timeline::{DayBucket, DayDates, ResourcePool, ResourceProfile, ResourceTimeline, TaskLoad};
