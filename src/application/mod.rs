//! Application layer managing the formula list.
//!
//! This module sits between the domain layer, which compiles and samples
//! formulas, and the presentation layer, which reports on them.

pub mod state;

pub use state::*;
