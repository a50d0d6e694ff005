//! State module for tracking archive progress across runs
//!
//! # Components
//!
//! - `ResumeStore`: the last archived page record of every title, persisted as JSON

mod resume;

pub use resume::{ResumeStore, StateError, StateResult};
