//! Infrastructure layer for file-based concerns.
//!
//! Loads the plot configuration and writes sampled curves to disk.

pub mod config;
pub mod export;

pub use config::*;
pub use export::*;
