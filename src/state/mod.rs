//! State module for tracking scan progress
//!
//! # Components
//!
//! - `SiteStatus`: Tracks the status of individual sites (waiting, downloading, found, etc.)
//! - `RunState`: The scanner lifecycle (stopped, active, paused)
//! - `StateCell`: Atomic holder for the run state shared between the run loop and commands

mod run_state;
mod site_status;

// Re-export main types
pub use run_state::{RunState, StateCell};
pub use site_status::SiteStatus;
