//! `dosecurve`: print, export and plot approximate stimulant PK curves.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use dosecurve::render::{render_svg, save_svg, write_csv, RenderConfig, SaveOptions};
use dosecurve::scenario::{Chart, ChartKind, Scenario};
use dosecurve::simulator::EffectMode;

/// Approximate one-compartment PK and perceived-effect curves for a day of doses.
#[derive(Parser, Debug)]
#[command(name = "dosecurve", version, about)]
struct Cli {
    /// Chart to build: vyvanse-with-dex, dex-only or pk-vs-perceived.
    ///
    /// Overrides the `chart` key of a scenario file.
    chart: Option<ChartKind>,

    /// Scenario TOML file replacing the built-in preset.
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Use PK or perceived-effect rate constants for Dex.
    ///
    /// Ignored by pk-vs-perceived, which always charts both.
    #[arg(long, short = 'm')]
    mode: Option<EffectMode>,

    /// Save the chart as SVG; without a path the generated file name is used.
    #[arg(long, value_name = "PATH", num_args = 0..=1)]
    save_fig: Option<Option<PathBuf>>,

    /// Replace existing output files.
    #[arg(long)]
    overwrite: bool,

    /// Create missing parent directories of output files.
    #[arg(long)]
    mkdirs: bool,

    /// Write every series to a CSV file.
    #[arg(long, value_name = "PATH")]
    export_csv: Option<PathBuf>,

    /// Print the computed chart as JSON instead of target samples.
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn scenario(&self) -> Result<Scenario> {
        let mut scenario = match &self.config {
            Some(path) => Scenario::from_file(path)
                .with_context(|| format!("failed to load scenario {}", path.display()))?,
            None => Scenario::preset(self.chart.unwrap_or(ChartKind::PkVsPerceived)),
        };
        if let (Some(_), Some(kind)) = (&self.config, self.chart) {
            scenario.chart = kind;
        }
        if let Some(mode) = self.mode {
            if !scenario.uses_mode() {
                warn!(%mode, chart = %scenario.chart, "--mode has no effect on this chart");
            }
            scenario = scenario.with_mode(mode);
        }
        Ok(scenario)
    }

    fn save_options(&self) -> SaveOptions {
        SaveOptions {
            overwrite: self.overwrite,
            mkdirs: self.mkdirs,
        }
    }
}

fn print_samples(chart: &Chart) {
    for set in &chart.samples {
        println!("{}", set.title);
        for sample in &set.samples {
            println!("  {}: {:.2}", sample.label, sample.value);
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let scenario = cli.scenario()?;
    debug!(chart = %scenario.chart, mode = %scenario.mode, "scenario ready");
    let chart = scenario
        .chart()
        .with_context(|| format!("failed to compute the {} chart", scenario.chart))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&chart)?);
    } else {
        print_samples(&chart);
    }

    if let Some(path) = &cli.export_csv {
        write_csv(&chart, path, cli.save_options())
            .with_context(|| format!("failed to export {}", path.display()))?;
    }

    if let Some(target) = &cli.save_fig {
        let path = target
            .clone()
            .unwrap_or_else(|| PathBuf::from(&chart.file_name));
        let svg = render_svg(&chart, &RenderConfig::default());
        save_svg(&svg, &path, cli.save_options())
            .with_context(|| format!("failed to save {}", path.display()))?;
        println!("Saved figure to: {}", path.display());
    } else {
        info!("no figure saved; pass --save-fig to write {}", chart.file_name);
    }
    Ok(())
}
