use serde::Serialize;
use tracing::info;

use super::{Database, Record, StoreError, Table};
use crate::seed::{self, SeedConfig};

/// What the bootstrap step did to each table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BootstrapReport {
    pub jobs_seeded: usize,
    pub applications_seeded: usize,
    pub assessments_seeded: usize,
}

impl BootstrapReport {
    pub fn seeded_anything(&self) -> bool {
        self.jobs_seeded + self.applications_seeded + self.assessments_seeded > 0
    }
}

/// Seeds every table whose count is zero. Tables holding at least one row are
/// left untouched, so running this repeatedly never changes existing data.
pub async fn seed_if_empty(
    db: &Database,
    config: &SeedConfig,
) -> Result<BootstrapReport, StoreError> {
    let fixtures = seed::generate_all(config);

    let report = BootstrapReport {
        jobs_seeded: seed_table(&db.jobs, fixtures.jobs).await?,
        applications_seeded: seed_table(&db.applications, fixtures.applications).await?,
        assessments_seeded: seed_table(&db.assessments, fixtures.assessments).await?,
    };

    if report.seeded_anything() {
        db.flush().await?;
    }
    Ok(report)
}

async fn seed_table<T: Record>(table: &Table<T>, rows: Vec<T>) -> Result<usize, StoreError> {
    let count = table.count().await;
    if count > 0 {
        info!("{}: {count} existing rows, skipping seed", table.name());
        return Ok(0);
    }
    let added = table.bulk_add(rows).await?;
    info!("{}: seeded {added} rows", table.name());
    Ok(added)
}
