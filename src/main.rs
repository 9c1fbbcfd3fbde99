//! Plotscope - command-line expression plotter
//!
//! Checks, evaluates and samples single-variable math expressions and
//! activation curves. Sampled curves can be printed as a table or exported
//! as CSV or JSON.

use std::error::Error;
use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use log::{LevelFilter, info, warn};

use plotscope::domain::{MathVocabulary, compile, sample_curve};
use plotscope::infrastructure::{PlotConfig, SampleExporter};
use plotscope::presentation::{
    Cli, Command, OutputFormat, SampleArgs, format_evaluations, format_samples_table, format_vocabulary,
};

/// Entry point for the plotscope command line.
///
/// # Errors
///
/// Returns an error if the config file cannot be loaded, an expression
/// fails to compile outside of `check`, or output cannot be written.
fn main() -> Result<ExitCode, Box<dyn Error>> {
    let cli = Cli::parse();

    let level = if cli.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    env_logger::Builder::from_default_env().filter_level(level).init();

    let config = PlotConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Command::Check { expression } => match compile(&expression) {
            Ok(evaluable) => {
                println!("{}", evaluable.tree());
                if evaluable.is_nowhere_finite() {
                    warn!("'{expression}' is not finite at any probe point");
                }
            }
            Err(err) => {
                eprintln!("error: {err}");
                return Ok(ExitCode::FAILURE);
            }
        },
        Command::Eval { expression, x } => {
            let evaluable = compile(&expression)?;
            let results: Vec<(f64, f64)> = x.iter().map(|&x| (x, evaluable.eval(x))).collect();
            print!("{}", format_evaluations("f", &results));
        }
        Command::Sample(args) => run_sample(&args, &config)?,
        Command::Activation { kind, x } => {
            let results: Vec<(f64, f64)> = x.iter().map(|&x| (x, kind.apply(x))).collect();
            print!("{}", format_evaluations(kind.name(), &results));
        }
        Command::Vocabulary => print!("{}", format_vocabulary(MathVocabulary::shared())),
    }

    Ok(ExitCode::SUCCESS)
}

fn run_sample(args: &SampleArgs, base: &PlotConfig) -> Result<(), Box<dyn Error>> {
    let evaluable = compile(&args.expression)?;
    let config = args.apply_to(base);
    config.validate()?;

    let viewport = args.viewport(&config);
    let segments = sample_curve(
        |x| evaluable.eval(x),
        &viewport,
        config.sample_density,
        config.off_screen_margin,
    );
    let (from, to) = viewport.x_range();
    info!(
        "sampled '{}' over [{from}, {to}] into {} segments",
        evaluable.source(),
        segments.len()
    );

    match (&args.output, args.format) {
        (Some(path), OutputFormat::Csv) => SampleExporter::export_csv(&segments, path)?,
        (Some(path), OutputFormat::Json) => SampleExporter::export_json(evaluable.source(), &segments, path)?,
        (Some(path), OutputFormat::Table) => fs::write(path, format_samples_table(&segments))?,
        (None, OutputFormat::Csv) => SampleExporter::write_csv(&segments, io::stdout().lock())?,
        (None, OutputFormat::Json) => {
            let mut stdout = io::stdout().lock();
            SampleExporter::write_json(evaluable.source(), &segments, &mut stdout)?;
            writeln!(stdout)?;
        }
        (None, OutputFormat::Table) => print!("{}", format_samples_table(&segments)),
    }
    Ok(())
}
