//! Presentation layer for the `plotscope` command line.
//!
//! Argument parsing lives in `cli`; `output` turns results into the text
//! printed on stdout.

pub mod cli;
pub mod output;

pub use cli::*;
pub use output::*;
