use std::time::Duration;

use chrono::{DateTime, Utc};

use super::{NewScore, ScoreId, ScoreRecord, StorageError, StorageResult};

mod memory;
mod sqlite;

pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

/// Persistence capability behind the record store.
///
/// Implementations assign `id` and `created_at`, make each insert atomic
/// and must tolerate concurrent callers.
#[rocket::async_trait]
pub trait ScoreBackend: Send + Sync {
    /// Appends one record and returns its id once it is committed.
    ///
    /// Callers never cancel an insert, so the backend bounds its own waiting
    /// by `timeout`. It may only give up before the write is issued: an
    /// error must mean that nothing was stored.
    async fn insert(&self, entry: NewScore, timeout: Duration) -> StorageResult<ScoreId>;

    /// Returns at most `limit` records. Backends that can order in place
    /// should return them ranked; callers re-rank regardless.
    async fn list_top(&self, limit: usize) -> StorageResult<Vec<ScoreRecord>>;
}

/// Insertion timestamps in microseconds since the Unix epoch.
/// Never goes backwards, even if the wall clock does.
#[derive(Debug, Default)]
pub struct InsertClock {
    last: i64,
}

impl InsertClock {
    pub fn starting_at(last: i64) -> Self {
        Self { last }
    }

    pub fn stamp(&mut self) -> i64 {
        self.stamp_at(Utc::now().timestamp_micros())
    }

    fn stamp_at(&mut self, now: i64) -> i64 {
        self.last = self.last.max(now);
        self.last
    }
}

/// Waits for `operation` at most `timeout`. Only for steps that are safe to abandon.
pub(crate) async fn within<T, F>(timeout: Duration, operation: F) -> StorageResult<T>
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(timeout, operation)
        .await
        .map_err(|_| StorageError::Timeout)
}

pub(crate) fn micros_to_datetime(micros: i64) -> StorageResult<DateTime<Utc>> {
    let seconds = micros.div_euclid(1_000_000);
    let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
    DateTime::from_timestamp(seconds, nanos)
        .ok_or_else(|| StorageError::Corrupt(format!("created_at {} is out of range", micros)))
}
