use std::{future::Future, sync::Arc, time::Duration};

use crate::leaderboard::Leaderboard;

pub mod backend;
mod request_error;
pub mod requests;
mod score;

pub use backend::{MemoryBackend, ScoreBackend, SqliteBackend};
pub use request_error::*;
pub use score::*;

/// Default bound on every storage operation.
pub const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(5);

/// The record store the handlers talk to: validates submissions,
/// bounds storage waits by a timeout and ranks what comes back.
#[derive(Clone)]
pub struct RecordStore {
    backend: Arc<dyn ScoreBackend>,
    rules: NameRules,
    timeout: Duration,
}

impl RecordStore {
    pub fn new(backend: Arc<dyn ScoreBackend>, rules: NameRules, timeout: Duration) -> Self {
        Self {
            backend,
            rules,
            timeout,
        }
    }

    /// A store over a fresh [`MemoryBackend`] with default rules.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryBackend::new()),
            NameRules::default(),
            DEFAULT_STORAGE_TIMEOUT,
        )
    }

    /// Validates and appends one record. Nothing reaches the backend
    /// unless validation passes.
    ///
    /// The insert is never abandoned midway: the backend applies the timeout
    /// itself and only to waits that come before the write.
    pub async fn insert(&self, name: &str, score: GameScore) -> Result<ScoreId, StoreError> {
        let entry = NewScore::new(name, score, &self.rules)?;
        let id = self.backend.insert(entry, self.timeout).await?;
        Ok(id)
    }

    /// The best `n` records in ranking order. Empty when nothing has been stored.
    pub async fn list_top(&self, n: usize) -> StorageResult<Leaderboard<ScoreRecord>> {
        let records = self.bounded(self.backend.list_top(n)).await?;
        Ok(Leaderboard::top(records, n))
    }

    /// For reads only; dropping a read leaves nothing behind.
    async fn bounded<T, F>(&self, operation: F) -> StorageResult<T>
    where
        F: Future<Output = StorageResult<T>>,
    {
        tokio::time::timeout(self.timeout, operation)
            .await
            .map_err(|_| StorageError::Timeout)?
    }
}
