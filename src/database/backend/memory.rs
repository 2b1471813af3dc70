use tokio::sync::RwLock;

use super::*;
use crate::leaderboard::Leaderboard;

#[derive(Default)]
struct Table {
    records: Vec<ScoreRecord>,
    next_id: ScoreId,
    clock: InsertClock,
}

/// Volatile backend for tests and embedding. Nothing survives the process.
#[derive(Default)]
pub struct MemoryBackend {
    table: RwLock<Table>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[rocket::async_trait]
impl ScoreBackend for MemoryBackend {
    async fn insert(&self, entry: NewScore, timeout: Duration) -> StorageResult<ScoreId> {
        let mut table = within(timeout, self.table.write()).await?;
        table.next_id += 1;
        let id = table.next_id;
        let created_at = micros_to_datetime(table.clock.stamp())?;
        table.records.push(entry.into_record(id, created_at));
        Ok(id)
    }

    async fn list_top(&self, limit: usize) -> StorageResult<Vec<ScoreRecord>> {
        let records = self.table.read().await.records.clone();
        Ok(Leaderboard::top(records, limit).into_vec())
    }
}
