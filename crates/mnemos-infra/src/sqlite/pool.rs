//! SQLite connection pools for the profile and fragment stores.
//!
//! Schema writes must be serialized (owner creation relies on a single
//! transaction seeing the UNIQUE constraint), so all writes share one
//! connection. Reads use a separate read-only pool. Both run in WAL mode so
//! readers never block the writer.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

const READER_CONNECTIONS: u32 = 8;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// The reader/writer pool pair handed to every SQLite store.
#[derive(Clone)]
pub struct DatabasePool {
    /// Read-only, up to `READER_CONNECTIONS` connections.
    pub reader: SqlitePool,
    /// Exactly one connection; every INSERT/UPDATE/DELETE goes here.
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Open (creating if needed) the database at `database_url` and apply
    /// pending migrations before the reader pool connects.
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let options = connect_options(database_url)?;

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options.clone())
            .await?;
        sqlx::migrate!("../../migrations").run(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(READER_CONNECTIONS)
            .connect_with(options.read_only(true))
            .await?;

        tracing::debug!(database_url, "Opened database pool");
        Ok(Self { reader, writer })
    }

    /// Close both pools, waiting for in-flight queries.
    pub async fn close(&self) {
        self.writer.close().await;
        self.reader.close().await;
    }
}

fn connect_options(database_url: &str) -> Result<SqliteConnectOptions, sqlx::Error> {
    Ok(SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT))
}

/// `sqlite://{data_dir}/mnemos.db`
pub fn database_url(data_dir: &Path) -> String {
    format!("sqlite://{}/mnemos.db", data_dir.display())
}

/// The database URL inside [`crate::config::data_dir`].
pub fn default_database_url() -> String {
    database_url(&crate::config::data_dir())
}
