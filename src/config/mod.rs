//! Configuration module for Ripple-Scan
//!
//! This module handles loading and validating the TOML configuration file and
//! the per-run [`ScanOptions`].
//!
//! # Example
//!
//! ```no_run
//! use ripple_scan::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scan.toml")).unwrap();
//! println!("Pause poll interval: {}ms", config.controller.pause_poll_ms);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ControllerConfig, FetcherConfig, PartialScanOptions, ScanOptions, ScannerConfig};

// Re-export parser and validation functions
pub use parser::{load_config, parse_config};
pub use validation::validate_scan_options;
