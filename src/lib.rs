//! Plotscope - expression plotting library
//!
//! Compiles single-variable math expressions such as `2sin(x) + x^2` into
//! evaluable functions, samples them across a viewport, and exports the
//! resulting polylines.

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
pub use application::*;
