//! SQLite-backed repository implementations.

mod documents;
mod tags;
mod util;

pub use util::map_sqlx_error;

use std::{path::Path, sync::Arc, time::Duration};

use sqlx::{
    Sqlite, Transaction,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions},
    query,
};
use tokio::sync::Mutex;
use tracing::info;

use crate::infra::error::InfraError;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct SqliteRepositories {
    pool: Arc<SqlitePool>,
    write_gate: Arc<Mutex<()>>,
}

impl SqliteRepositories {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool: Arc::new(pool),
            write_gate: Arc::new(Mutex::new(())),
        }
    }

    /// Connect, apply pending migrations, and return a ready store.
    pub async fn open(path: &Path, max_connections: u32) -> Result<Self, InfraError> {
        let pool = Self::connect(path, max_connections).await.map_err(|err| {
            InfraError::store_unavailable(format!("open {}: {err}", path.display()))
        })?;
        Self::run_migrations(&pool)
            .await
            .map_err(|err| InfraError::store_unavailable(format!("migrate: {err}")))?;

        info!(
            target = "infra::db",
            path = %path.display(),
            max_connections,
            "store ready"
        );
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn begin(&self) -> Result<Transaction<'_, Sqlite>, sqlx::Error> {
        self.pool.begin().await
    }

    pub async fn connect(path: &Path, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
    }

    pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }

    fn convert_count(value: i64) -> Result<u64, crate::application::repos::RepoError> {
        value.try_into().map_err(|_| {
            crate::application::repos::RepoError::from_persistence("count exceeds supported range")
        })
    }
}
