use std::{str::FromStr, time::Duration};

use sqlx::{SqlitePool, sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions}};
use tracing::info;
use uuid::Uuid;

/// Opens the pool and brings the schema up to date.
///
/// `sqlite::memory:` works too, but every connection then gets its own
/// database, so pass `max_connections = 1` for it.
pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let db_pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    sqlx::migrate!().run(&db_pool).await?;
    info!("database ready at {database_url}");

    Ok(db_pool)
}

/// Orders a pair so that `{a, b}` and `{b, a}` map to the same key.
pub(crate) fn ordered_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a < b { (a, b) } else { (b, a) }
}
