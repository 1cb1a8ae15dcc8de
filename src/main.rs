use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod aggregate;
mod config;
mod duration;
mod enrich;
mod error;
mod loader;
mod models;
mod month;
mod normalize;
mod pipeline;
mod report;
mod rolling;

use config::{PipelineConfig, UnparseablePolicy, DEFAULT_THRESHOLD_MINUTES, DEFAULT_WINDOW_MONTHS};

#[derive(Parser)]
#[command(name = "longterm-volunteers")]
#[command(about = "Monthly volunteer hours and long-term status report", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PipelineArgs {
    /// Directory of attendance exports (.xlsx, .xls, .ods or .csv)
    #[arg(long, default_value = "data")]
    input: PathBuf,
    /// Rolling total (minutes) a volunteer must exceed to count as long-term
    #[arg(long, default_value_t = DEFAULT_THRESHOLD_MINUTES)]
    threshold: u64,
    /// Rolling window length in months
    #[arg(long, default_value_t = DEFAULT_WINDOW_MONTHS)]
    window: usize,
    /// What to do with durations that cannot be read
    #[arg(long, value_enum, default_value_t = UnparseablePolicy::Skip)]
    unparseable: UnparseablePolicy,
}

impl PipelineArgs {
    fn config(&self) -> PipelineConfig {
        PipelineConfig {
            threshold_minutes: self.threshold,
            window_months: self.window,
            unparseable: self.unparseable,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build the report and write it to the output directory
    Report {
        #[command(flatten)]
        args: PipelineArgs,
        #[arg(long, default_value = "output")]
        output: PathBuf,
        /// Date stamped into the report name (defaults to today)
        #[arg(long)]
        generated_on: Option<NaiveDate>,
    },
    /// List long-term volunteers for the latest month
    Score {
        #[command(flatten)]
        args: PipelineArgs,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Show how a single duration text is read
    Parse { text: String },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            args,
            output,
            generated_on,
        } => {
            let raw = loader::load_dir(&args.input)
                .with_context(|| format!("failed to load input from {}", args.input.display()))?;
            let result = pipeline::run(&raw, &args.config()).context("failed to build report")?;
            let generated_on = generated_on.unwrap_or_else(|| Local::now().date_naive());
            let target = report::write_report(&output, &result.views, &result.quality, generated_on)
                .context("failed to write report")?;
            println!("Report written to {}.", target.display());
        }
        Commands::Score { args, limit } => {
            let raw = loader::load_dir(&args.input)
                .with_context(|| format!("failed to load input from {}", args.input.display()))?;
            let result = pipeline::run(&raw, &args.config()).context("failed to score volunteers")?;
            let views = &result.views;

            let mut longterm: Vec<_> = views.work.iter().chain(views.did_not_work.iter()).collect();
            if longterm.is_empty() {
                println!("No long-term volunteers in {}.", views.latest_month.label());
                return Ok(());
            }
            longterm.sort_by(|a, b| b.rolling_sum.cmp(&a.rolling_sum));

            println!("Long-term volunteers in {}:", views.latest_month.label());
            for row in longterm.iter().take(limit) {
                println!(
                    "- {} ({}, {}) {} min this month, {} min rolling, since {}",
                    row.full_name.as_deref().unwrap_or("(no name)"),
                    row.volunteer_id,
                    row.city.as_deref().unwrap_or("unknown city"),
                    row.total_minutes,
                    row.rolling_sum,
                    row.first_month_longterm
                        .map(|m| m.label())
                        .unwrap_or_else(|| "-".to_string())
                );
            }
            if result.quality.unparseable_count() > 0 {
                println!(
                    "{} records had unreadable durations and were counted as no time.",
                    result.quality.unparseable_count()
                );
            }
        }
        Commands::Parse { text } => match duration::parse_minutes(&text) {
            duration::UNPARSEABLE => println!("unparseable"),
            minutes => println!("{minutes}"),
        },
    }

    Ok(())
}
