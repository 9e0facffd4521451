use anyhow::{anyhow, Context, Result};
use diesel::insert_into;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub mod models;
pub mod schema;

use crate::feed::normalize::NormalizedEntry;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

pub const DEFAULT_BATCH_SIZE: usize = 1000;

#[derive(thiserror::Error, Debug)]
#[error("database error")]
pub struct DatabaseError {
    #[from]
    source: diesel::r2d2::PoolError,
}

/// A storage failure that aborted one batch. The batch transaction has been
/// rolled back; batches committed before it are untouched.
#[derive(thiserror::Error, Debug)]
#[error("batch {batch_index} failed while inserting {cve_id}")]
pub struct BatchLoadError {
    pub batch_index: usize,
    pub cve_id: String,
    #[source]
    pub source: diesel::result::Error,
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub index: usize,
    pub entries: usize,
    pub result: Result<(), BatchLoadError>,
}

/// Per-batch outcomes of one load pass, in batch order. A failed batch is
/// always the last element, since the loader stops at the first failure.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub batches: Vec<BatchOutcome>,
}

impl LoadReport {
    pub fn committed_batches(&self) -> usize {
        self.batches.iter().filter(|b| b.result.is_ok()).count()
    }

    pub fn committed_entries(&self) -> usize {
        self.batches
            .iter()
            .filter(|b| b.result.is_ok())
            .map(|b| b.entries)
            .sum()
    }

    pub fn failure(&self) -> Option<&BatchLoadError> {
        self.batches.iter().find_map(|b| b.result.as_ref().err())
    }

    pub fn is_complete(&self) -> bool {
        self.failure().is_none()
    }
}

pub struct PostgresRepository {
    pool: Pool<ConnectionManager<PgConnection>>,
}

impl PostgresRepository {
    pub fn new(database_url: &str) -> Result<Self, DatabaseError> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = Pool::new(manager)?;
        Ok(Self { pool })
    }

    /// Applies any embedded migrations that have not run yet. Safe to call on
    /// every process start.
    pub fn ensure_schema(&self) -> Result<()> {
        let mut conn = self.pool.get()?;

        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| anyhow!(e))
            .context("failed to apply schema migrations")?;

        for version in applied {
            log::info!("applied migration {}", version);
        }

        Ok(())
    }

    /// Loads normalized entries in contiguous batches, one transaction per
    /// batch. Stops at the first failed batch; batches committed earlier
    /// stay committed. Storage failures land in the returned report, only
    /// losing the connection pool itself is an `Err`.
    pub fn load(
        &self,
        entries: &[NormalizedEntry],
        batch_size: usize,
    ) -> Result<LoadReport, DatabaseError> {
        let batch_size = batch_size.max(1);
        let mut conn = self.pool.get()?;
        let mut report = LoadReport::default();

        for (index, batch) in entries.chunks(batch_size).enumerate() {
            match load_batch(&mut conn, index, batch) {
                Ok(()) => {
                    log::info!("batch {} committed ({} entries)", index, batch.len());
                    report.batches.push(BatchOutcome {
                        index,
                        entries: batch.len(),
                        result: Ok(()),
                    });
                }
                Err(e) => {
                    log::error!("{e}, rolled back; skipping remaining batches");
                    report.batches.push(BatchOutcome {
                        index,
                        entries: batch.len(),
                        result: Err(e),
                    });
                    break;
                }
            }
        }

        Ok(report)
    }
}

fn load_batch(
    conn: &mut PgConnection,
    batch_index: usize,
    batch: &[NormalizedEntry],
) -> Result<(), BatchLoadError> {
    // Remembers which entry poisoned the transaction so the error carries
    // its CVE id; stays None if BEGIN/COMMIT themselves fail.
    let mut failed_id: Option<String> = None;

    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        for entry in batch {
            insert_entry(conn, entry).map_err(|e| {
                failed_id = Some(entry.cve_id.clone());
                e
            })?;
            log::debug!("loaded {}", entry.cve_id);
        }
        Ok(())
    })
    .map_err(|source| BatchLoadError {
        batch_index,
        cve_id: failed_id.unwrap_or_else(|| "N/A".into()),
        source,
    })
}

fn insert_entry(conn: &mut PgConnection, entry: &NormalizedEntry) -> QueryResult<()> {
    let entry_id: i32 = insert_into(schema::cve_entries::table)
        .values(models::NewCveEntry {
            cve_id: &entry.cve_id,
            source_identifier: &entry.source_identifier,
            published: entry.published,
            last_modified: entry.last_modified,
            vuln_status: &entry.vuln_status,
        })
        .returning(schema::cve_entries::id)
        .get_result(conn)?;

    let description_rows = entry
        .descriptions
        .iter()
        .map(|d| models::NewDescription {
            cve_entry_id: entry_id,
            lang: &d.lang,
            description: &d.value,
        })
        .collect::<Vec<_>>();
    if !description_rows.is_empty() {
        insert_into(schema::descriptions::table)
            .values(&description_rows)
            .execute(conn)?;
    }

    let metric_rows = entry
        .metrics
        .iter()
        .map(|m| models::NewMetric {
            cve_entry_id: entry_id,
            version: &m.version,
            vector_string: &m.vector_string,
            attack_vector: &m.attack_vector,
            attack_complexity: &m.attack_complexity,
            privileges_required: &m.privileges_required,
            user_interaction: &m.user_interaction,
            scope: &m.scope,
            confidentiality_impact: &m.confidentiality_impact,
            integrity_impact: &m.integrity_impact,
            availability_impact: &m.availability_impact,
            base_score: m.base_score,
            base_severity: &m.base_severity,
            exploitability_score: m.exploitability_score,
            impact_score: m.impact_score,
        })
        .collect::<Vec<_>>();
    if !metric_rows.is_empty() {
        insert_into(schema::metrics::table)
            .values(&metric_rows)
            .execute(conn)?;
    }

    let weakness_rows = entry
        .weaknesses
        .iter()
        .map(|w| models::NewWeakness {
            cve_entry_id: entry_id,
            source: &w.source,
            description: &w.description,
        })
        .collect::<Vec<_>>();
    if !weakness_rows.is_empty() {
        insert_into(schema::weaknesses::table)
            .values(&weakness_rows)
            .execute(conn)?;
    }

    // Configurations before their products, so every product row has a
    // committed parent id to reference.
    for configuration in &entry.configurations {
        let config_id: i32 = insert_into(schema::configurations::table)
            .values(models::NewConfiguration {
                cve_entry_id: entry_id,
                operator: &configuration.operator,
                negate: configuration.negate,
            })
            .returning(schema::configurations::id)
            .get_result(conn)?;

        let product_rows = configuration
            .products
            .iter()
            .map(|p| models::NewProduct {
                config_id,
                vulnerable: p.vulnerable,
                criteria: &p.criteria,
                part: &p.part,
                vendor: &p.vendor,
                product: &p.product,
                version: &p.version,
                version_end_excluding: &p.version_end_excluding,
            })
            .collect::<Vec<_>>();
        if !product_rows.is_empty() {
            insert_into(schema::products::table)
                .values(&product_rows)
                .execute(conn)?;
        }
    }

    let reference_rows = entry
        .references
        .iter()
        .map(|r| models::NewReference {
            cve_entry_id: entry_id,
            url: &r.url,
            source: &r.source,
            tags: &r.tags,
        })
        .collect::<Vec<_>>();
    if !reference_rows.is_empty() {
        insert_into(schema::cve_references::table)
            .values(&reference_rows)
            .execute(conn)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn committed(index: usize, entries: usize) -> BatchOutcome {
        BatchOutcome {
            index,
            entries,
            result: Ok(()),
        }
    }

    fn failed(index: usize, entries: usize, cve_id: &str) -> BatchOutcome {
        BatchOutcome {
            index,
            entries,
            result: Err(BatchLoadError {
                batch_index: index,
                cve_id: cve_id.into(),
                source: diesel::result::Error::RollbackTransaction,
            }),
        }
    }

    #[test]
    fn report_counts_only_committed_batches() {
        let report = LoadReport {
            batches: vec![committed(0, 1000), committed(1, 1000), failed(2, 400, "CVE-2024-0001")],
        };

        assert_eq!(report.committed_batches(), 2);
        assert_eq!(report.committed_entries(), 2000);
        assert!(!report.is_complete());

        let failure = report.failure().unwrap();
        assert_eq!(failure.batch_index, 2);
        assert_eq!(failure.cve_id, "CVE-2024-0001");
    }

    #[test]
    fn empty_report_is_complete() {
        let report = LoadReport::default();
        assert!(report.is_complete());
        assert_eq!(report.committed_entries(), 0);
    }
}
