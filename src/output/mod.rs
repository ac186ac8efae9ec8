//! Output module for scan notifications and reports
//!
//! This module handles:
//! - The observer interface the scan engine reports through
//! - Stock observers (channel forwarding, tracing)
//! - The end-of-run summary

mod observers;
pub mod stats;
mod traits;

pub use observers::{ChannelObserver, TracingObserver};
pub use stats::{print_summary, RunSummary};
pub use traits::{Disposition, ScanEvent, ScanObserver};
