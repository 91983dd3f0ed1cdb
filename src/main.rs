use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use delayplot::{ResultExt, figure, read_csv};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

/// Plots end-to-end delay from a simulation results CSV.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
  /// Results file: label in the first field, delay in the third.
  #[arg(default_value = figure::INPUT)]
  input: PathBuf,

  /// Output file. The extension picks the format.
  #[arg(short, long, default_value = figure::OUTPUT)]
  output: PathBuf,

  /// Skip the interactive window.
  #[arg(long)]
  no_show: bool,
}

fn main() -> Result<()> {
  let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  fmt::Subscriber::builder().with_env_filter(env).with_writer(std::io::stderr).init();

  let cli = Cli::parse();

  let data =
    read_csv(&cli.input).with_context(|| format!("reading {}", cli.input.display()))?;
  info!("plotting {} rows from {}", data.len(), cli.input.display());

  let plot = figure::delay_plot(&data);

  if !cli.no_show {
    // Without a display this logs and falls through to the file output.
    plot.show().log_err();
  }

  plot.save(&cli.output).with_context(|| format!("writing {}", cli.output.display()))?;

  Ok(())
}
