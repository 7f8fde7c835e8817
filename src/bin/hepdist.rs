//! hepdist CLI: fill the dilepton histograms from an LHE file and export them as pickles and
//! SVG figures.

use anyhow::{Context, Result};
use clap::Parser;
use hepdist::{build_registry, data::io::LheReader, try_run};

#[derive(Parser)]
#[command(name = "hepdist")]
#[command(about = "Weighted dilepton distributions from Les Houches event files")]
#[command(version)]
struct Cli {
    /// Input LHE file
    input: String,

    /// Directory the histogram pickles and figures are written to (created if missing)
    #[arg(short, long, default_value = "plots")]
    output_dir: String,

    /// Only keep event weights whose names fully match this regular expression
    #[arg(long, default_value = "(1|.*Coup.*)")]
    weight_regex: String,

    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt().with_max_level(cli.log_level).with_target(false).init();

    let reader = LheReader::open(&cli.input)
        .with_context(|| format!("failed to open {}", cli.input))?
        .with_weight_filter(&cli.weight_regex)
        .context("invalid --weight-regex")?;
    let histograms = try_run(reader, build_registry())
        .with_context(|| format!("failed to process {}", cli.input))?;
    for (name, acc) in histograms.iter() {
        tracing::info!(
            histogram = name,
            weight = %acc.spec.weight,
            total = acc.histogram.total(),
            "filled"
        );
    }
    histograms
        .write_pickles(&cli.output_dir)
        .with_context(|| format!("failed to write histograms to {}", cli.output_dir))?;
    histograms
        .write_plots(&cli.output_dir)
        .with_context(|| format!("failed to draw histograms to {}", cli.output_dir))?;
    Ok(())
}
