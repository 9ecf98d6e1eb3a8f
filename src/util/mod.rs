//! Utility functions and helpers
//!
//! ## Modules
//!
//! - [`fs`] - Recursive local directory copy

pub mod fs;

pub use fs::{copy_dir, copy_file};
