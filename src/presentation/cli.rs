use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::domain::{Activation, Viewport};
use crate::infrastructure::PlotConfig;

/// Compile, evaluate and sample single-variable math expressions
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// JSON plot config; built-in defaults when absent
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log compilation details
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse an expression and print its canonical form
    Check {
        expression: String,
    },

    /// Evaluate an expression at one or more x values
    Eval {
        expression: String,

        #[arg(short = 'x', required = true, num_args = 1.., allow_negative_numbers = true)]
        x: Vec<f64>,
    },

    /// Sample an expression across the viewport
    Sample(SampleArgs),

    /// Evaluate an activation curve at one or more x values
    Activation {
        /// linear, relu, leaky_relu, sigmoid, tanh, swish, gelu or gcu
        kind: Activation,

        #[arg(short = 'x', required = true, num_args = 1.., allow_negative_numbers = true)]
        x: Vec<f64>,
    },

    /// List the functions and constants expressions may use
    Vocabulary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
}

#[derive(Args, Debug)]
pub struct SampleArgs {
    pub expression: String,

    /// Pixels per math unit
    #[arg(long)]
    pub scale: Option<f64>,

    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub offset_x: f64,

    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub offset_y: f64,

    #[arg(long)]
    pub width: Option<u32>,

    #[arg(long)]
    pub height: Option<u32>,

    /// Horizontal pixels between samples
    #[arg(long)]
    pub density: Option<f64>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl SampleArgs {
    /// Folds the command-line overrides into `config`.
    pub fn apply_to(&self, config: &PlotConfig) -> PlotConfig {
        PlotConfig {
            sample_density: self.density.unwrap_or(config.sample_density),
            default_scale: self.scale.unwrap_or(config.default_scale),
            width: self.width.unwrap_or(config.width),
            height: self.height.unwrap_or(config.height),
            ..config.clone()
        }
    }

    pub fn viewport(&self, config: &PlotConfig) -> Viewport {
        Viewport {
            offset_x: self.offset_x,
            offset_y: self.offset_y,
            ..config.viewport()
        }
    }
}
