use std::{str::FromStr, time::Duration};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    SqlitePool,
};
use tokio::sync::Mutex;

use super::*;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS score (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    score INTEGER NOT NULL CHECK (score >= 0),
    created_at INTEGER NOT NULL
)";

const CREATE_RANKING_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS score_ranking ON score (score DESC, created_at ASC, id ASC)";

const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

#[derive(sqlx::FromRow)]
struct ScoreRow {
    id: i64,
    name: String,
    score: i64,
    created_at: i64,
}

impl TryFrom<ScoreRow> for ScoreRecord {
    type Error = StorageError;

    fn try_from(row: ScoreRow) -> StorageResult<Self> {
        Ok(Self {
            id: row.id,
            name: row.name,
            score: row.score,
            created_at: micros_to_datetime(row.created_at)?,
        })
    }
}

/// Durable backend on a SQLite file.
///
/// Inserts go through a single writer lock, so ids and `created_at`
/// advance together. Reads never take the writer lock.
pub struct SqliteBackend {
    pool: SqlitePool,
    writer: Mutex<InsertClock>,
}

impl SqliteBackend {
    /// Opens (creating if absent) the database at `database_url` and
    /// initializes the schema.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        timeout: Duration,
    ) -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Full)
            .busy_timeout(timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(timeout)
            .connect_with(options)
            .await?;

        sqlx::query(CREATE_TABLE).execute(&pool).await?;
        sqlx::query(CREATE_RANKING_INDEX).execute(&pool).await?;

        let last: Option<i64> = sqlx::query_scalar("SELECT MAX(created_at) FROM score")
            .fetch_one(&pool)
            .await?;

        Ok(Self {
            pool,
            writer: Mutex::new(InsertClock::starting_at(last.unwrap_or(0))),
        })
    }

    /// Waits for open connections to finish and closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[rocket::async_trait]
impl ScoreBackend for SqliteBackend {
    async fn insert(&self, entry: NewScore, timeout: Duration) -> StorageResult<ScoreId> {
        let mut clock = within(timeout, self.writer.lock()).await?;
        let mut connection = within(timeout, self.pool.acquire()).await??;
        let created_at = clock.stamp();

        // Once issued, the statement runs to completion; `busy_timeout` bounds it.
        let result = sqlx::query("INSERT INTO score (name, score, created_at) VALUES (?, ?, ?)")
            .bind(entry.name())
            .bind(entry.score())
            .bind(created_at)
            .execute(&mut *connection)
            .await?;

        Ok(result.last_insert_rowid())
    }

    async fn list_top(&self, limit: usize) -> StorageResult<Vec<ScoreRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query_as::<_, ScoreRow>(
            "SELECT id, name, score, created_at FROM score
             ORDER BY score DESC, created_at ASC, id ASC
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ScoreRecord::try_from).collect()
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::PoolTimedOut => Self::Timeout,
            sqlx::Error::PoolClosed | sqlx::Error::WorkerCrashed => {
                Self::Unavailable(error.to_string())
            }
            sqlx::Error::Io(error) => Self::Unavailable(error.to_string()),
            sqlx::Error::Configuration(error) => Self::Unavailable(error.to_string()),
            sqlx::Error::Database(error) => {
                let code = error
                    .code()
                    .and_then(|code| code.parse::<i32>().ok())
                    .map(|code| code & 0xff);
                match code {
                    Some(SQLITE_BUSY) | Some(SQLITE_LOCKED) => Self::Busy,
                    _ => Self::Backend(error.to_string()),
                }
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                Self::Corrupt(error.to_string())
            }
            error => Self::Backend(error.to_string()),
        }
    }
}
