use crate::config::Config;
use crate::db::DbPool;
use crate::source::{RecordSource, SqliteRecordSource};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Arc<Config>,
    pub records: Arc<dyn RecordSource>,
}

impl AppState {
    /// State whose record source reads from the same pool.
    pub fn new(db: DbPool, config: Config) -> Self {
        Self {
            records: Arc::new(SqliteRecordSource::new(db.clone())),
            db,
            config: Arc::new(config),
        }
    }
}
