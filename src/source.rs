use tracing::debug;

use crate::db::queries::observations;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::{FlatRecord, QueryParams};

/// Produces the flat records the aggregation engine works on.
pub trait RecordSource: Send + Sync {
    fn fetch(&self, query: &QueryParams) -> AppResult<Vec<FlatRecord>>;
}

/// Record source backed by the `mortality_records` table.
#[derive(Clone)]
pub struct SqliteRecordSource {
    db: DbPool,
}

impl SqliteRecordSource {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }
}

impl RecordSource for SqliteRecordSource {
    fn fetch(&self, query: &QueryParams) -> AppResult<Vec<FlatRecord>> {
        let conn = self.db.get()?;
        let records: Vec<FlatRecord> = observations::list_observations(&conn, query)?
            .iter()
            .map(|o| o.to_flat_record(query.granularity))
            .collect();

        debug!(
            from = %query.range.from,
            to = %query.range.to,
            granularity = query.granularity.as_str(),
            count = records.len(),
            "Fetched records"
        );
        Ok(records)
    }
}

/// Fixed in-memory record set, for callers that already hold their data.
#[derive(Debug, Clone, Default)]
pub struct StaticRecordSource {
    records: Vec<FlatRecord>,
}

impl StaticRecordSource {
    pub fn new(records: Vec<FlatRecord>) -> Self {
        Self { records }
    }
}

impl RecordSource for StaticRecordSource {
    fn fetch(&self, _query: &QueryParams) -> AppResult<Vec<FlatRecord>> {
        Ok(self.records.clone())
    }
}
