//! Builder API for ergonomic machine construction.
//!
//! This module provides fluent builders and macros for describing machines
//! of parallel regions. Builders validate lazily: every definition problem is
//! collected and reported by `build()` at once.

pub mod error;
pub mod machine;
pub mod macros;
pub mod region;
pub mod transition;

pub use error::{BuildError, BuildErrors};
pub use machine::MachineBuilder;
pub use region::RegionBuilder;
pub use transition::TransitionBuilder;
