//! Runs one ingestion pass: ensure schema, fetch the window, normalize,
//! load in batches. Strictly sequential over a single pooled connection.

use anyhow::{Context, Result};

use crate::db::{LoadReport, PostgresRepository};
use crate::feed::{normalize, FeedClient, FetchError, FetchWindow};

/// How a run ended. Only schema or connection failures bubble up as `Err`
/// from [`run`]; everything else is an outcome the caller can log and
/// judge for itself.
#[derive(Debug)]
pub enum RunOutcome {
    /// The feed could not be fetched; nothing was loaded.
    FetchFailed(FetchError),
    /// The feed had no usable records for the window; nothing to load.
    Empty,
    Loaded {
        /// Raw records in the fetched page.
        records: usize,
        /// Records dropped by the normalizer for lacking an id.
        skipped: usize,
        report: LoadReport,
    },
}

pub fn run(
    repository: &PostgresRepository,
    client: &FeedClient,
    window: &FetchWindow,
    batch_size: usize,
) -> Result<RunOutcome> {
    repository
        .ensure_schema()
        .context("could not set up the database schema")?;

    let page = match client.fetch(window) {
        Ok(page) => page,
        Err(e) => {
            log::error!("fetch failed, nothing to load: {e}");
            return Ok(RunOutcome::FetchFailed(e));
        }
    };

    let records = page.vulnerabilities.len();
    if records == 0 {
        log::warn!("the feed returned no vulnerabilities for this window");
        return Ok(RunOutcome::Empty);
    }

    let entries = normalize::normalize(page);
    let skipped = records - entries.len();
    if skipped > 0 {
        log::warn!("skipped {} of {} records during normalization", skipped, records);
    }
    if entries.is_empty() {
        log::warn!("no records survived normalization, nothing to load");
        return Ok(RunOutcome::Empty);
    }

    log::info!("loading {} entries ...", entries.len());
    let report = repository.load(&entries, batch_size)?;
    log::info!(
        "committed {} entries in {} batches",
        report.committed_entries(),
        report.committed_batches()
    );

    Ok(RunOutcome::Loaded {
        records,
        skipped,
        report,
    })
}
