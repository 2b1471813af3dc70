use std::cmp::Ordering;

use crate::database::{LeaderboardEntry, ScoreRecord};

/// Number of entries served by `GET /scores`.
pub const LEADERBOARD_SIZE: usize = 10;

/// A collection kept in ranking order: the item that compares `Less` ranks first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Leaderboard<T: LeaderboardItem> {
    collection: Vec<T>,
}

impl<T: LeaderboardItem> Leaderboard<T> {
    pub fn new(mut collection: Vec<T>) -> Self {
        collection.sort();
        Self { collection }
    }

    /// Ranks `collection` and keeps the best `n`.
    pub fn top(collection: Vec<T>, n: usize) -> Self {
        let mut leaderboard = Self::new(collection);
        leaderboard.truncate(n);
        leaderboard
    }

    pub fn truncate(&mut self, n: usize) {
        self.collection.truncate(n);
    }

    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.collection.iter()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.collection
    }
}

impl Leaderboard<ScoreRecord> {
    pub fn entries(&self) -> Vec<LeaderboardEntry> {
        self.iter().map(ScoreRecord::entry).collect()
    }
}

pub trait LeaderboardItem: Ord {}

impl<T: Ord> LeaderboardItem for T {}

/// Ranking order: higher score first, then earlier submission,
/// then lower id. The remaining fields only keep `Ord` consistent with `Eq`.
impl Ord for ScoreRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .cmp(&self.score)
            .then_with(|| self.created_at.cmp(&other.created_at))
            .then_with(|| self.id.cmp(&other.id))
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl PartialOrd for ScoreRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
