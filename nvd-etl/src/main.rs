use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use cve_db::db::{PostgresRepository, DEFAULT_BATCH_SIZE};
use cve_db::feed::{FeedClient, FetchWindow, DEFAULT_FEED_URL};
use cve_db::pipeline::{self, RunOutcome};
use dotenvy::dotenv;
use env_logger::Env;

mod configuration;

#[derive(Parser)]
#[command(author, version, about)]
#[command(disable_help_subcommand = true)]
struct Opts {
    /// First publication day of the ingestion window (YYYY-MM-DD)
    #[arg(long = "from", value_parser = parse_date)]
    from: NaiveDate,

    /// Last publication day of the ingestion window, inclusive (YYYY-MM-DD)
    #[arg(long = "to", value_parser = parse_date)]
    to: NaiveDate,

    /// Entries committed per transaction
    #[arg(long = "batch-size", default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Feed endpoint override
    #[arg(long = "feed-url", default_value_t = String::from(DEFAULT_FEED_URL))]
    feed_url: String,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("{s}: {e}"))
}

fn main() -> Result<()> {
    let opts = Opts::parse();

    dotenv().ok();

    // Setup logger
    {
        #[cfg(debug_assertions)]
        let default_env_filter = "debug";
        #[cfg(not(debug_assertions))]
        let default_env_filter = "info";

        let env = Env::default().default_filter_or(default_env_filter);
        env_logger::Builder::from_env(env)
            .try_init()
            .context("Failed to setup logger")?;
    }

    // Repository
    let repository = {
        let database_url = configuration::database_url()
            .context("Missing or incomplete database settings in the environment")?;

        PostgresRepository::new(&database_url).context("Cannot connect to database")?
    };

    let window = FetchWindow::for_dates(opts.from, opts.to);
    let client = FeedClient::new(opts.feed_url);

    match pipeline::run(&repository, &client, &window, opts.batch_size)? {
        RunOutcome::FetchFailed(e) => {
            log::warn!("run closed without loading anything: {e}");
        }
        RunOutcome::Empty => {
            log::info!("no records to load for this window");
        }
        RunOutcome::Loaded {
            records,
            skipped,
            report,
        } => {
            log::info!(
                "{} feed records, {} skipped, {} entries committed in {} batches",
                records,
                skipped,
                report.committed_entries(),
                report.committed_batches()
            );
            if let Some(failure) = report.failure() {
                log::warn!("load stopped early: {failure}");
            }
        }
    }

    log::info!("closing database connection");

    Ok(())
}
