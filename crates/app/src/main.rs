use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use lexbridge_core::Profile;
use std::path::PathBuf;

mod config;
mod pipeline;

use config::{EnvConfig, Overrides, Settings};

#[derive(Parser, Debug)]
#[command(
    name = "lexbridge",
    version,
    about = "Convert Stripe balance history into a lexoffice bank import"
)]
struct Cli {
    /// Where records come from: CSV or API (overrides SOURCE_METHOD)
    #[arg(long)]
    source: Option<String>,

    /// Balance-history export to read (overrides INPUT_FILE)
    #[arg(short = 'i', long)]
    input: Option<PathBuf>,

    /// Output file (default: export.csv, or export_<start>_<end>.csv for the API)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// First day of the API listing window (YYYY-MM-DD)
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Last day of the API listing window (YYYY-MM-DD)
    #[arg(long)]
    end_date: Option<NaiveDate>,

    /// Report preset (overrides PROFILE)
    #[arg(long, conflicts_with = "profile_file")]
    profile: Option<String>,

    /// Custom profile definition in TOML
    #[arg(long)]
    profile_file: Option<PathBuf>,

    /// Pool fees into summary rows
    #[arg(long, conflicts_with = "no_aggregate_fees")]
    aggregate_fees: bool,

    /// Emit one fee row per transaction
    #[arg(long)]
    no_aggregate_fees: bool,

    /// Print the built-in profiles and exit
    #[arg(long)]
    list_profiles: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        let aggregate_fees = match (self.aggregate_fees, self.no_aggregate_fees) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        Overrides {
            source: self.source.clone(),
            input: self.input.clone(),
            output: self.output.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            profile: self.profile.clone(),
            profile_file: self.profile_file.clone(),
            aggregate_fees,
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    if cli.list_profiles {
        for profile in Profile::presets() {
            println!("{profile}");
        }
        return Ok(());
    }

    let env = EnvConfig::from_env()?;
    let settings = Settings::resolve(env, cli.overrides()).context("invalid configuration")?;
    tracing::info!(
        source = ?settings.source,
        profile = %settings.profile.name,
        aggregate_fees = settings.profile.aggregate_fees,
        output = %settings.output.display(),
        "starting conversion"
    );

    let summary = pipeline::run(&settings)?;
    println!(
        "Wrote {} rows from {} records to {}",
        summary.emitted + summary.fee_rows + summary.summary_rows,
        summary.records,
        settings.output.display()
    );
    Ok(())
}
