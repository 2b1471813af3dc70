use chrono::{DateTime, Utc};
use rocket::serde::{Deserialize, Serialize};

use super::ValidationError;

// SQLite stores both as INTEGER (i64), so scores are capped at i64::MAX.
pub type GameScore = i64;
pub type ScoreId = i64;

/// Upper bound on a player name the store will accept.
pub const DEFAULT_NAME_MAX_LEN: usize = 32;

/// One completed game run, as persisted by the store.
/// Never mutated once created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoreRecord {
    pub id: ScoreId,
    pub name: String,
    pub score: GameScore,
    pub created_at: DateTime<Utc>,
}

impl ScoreRecord {
    pub fn entry(&self) -> LeaderboardEntry {
        LeaderboardEntry {
            name: self.name.clone(),
            score: self.score,
        }
    }
}

/// The public view of a record: what `GET /scores` returns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: GameScore,
}

impl LeaderboardEntry {
    pub fn new(name: impl Into<String>, score: GameScore) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

/// Inclusive bounds on a player name, counted in characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NameRules {
    pub min_len: usize,
    pub max_len: usize,
}

impl Default for NameRules {
    fn default() -> Self {
        Self {
            min_len: 1,
            max_len: DEFAULT_NAME_MAX_LEN,
        }
    }
}

impl NameRules {
    pub fn new(min_len: usize, max_len: usize) -> Self {
        Self { min_len, max_len }
    }

    /// The three letter bound of the arcade-style name prompt.
    pub fn arcade() -> Self {
        Self::new(1, 3)
    }

    pub fn validate(&self, name: &str) -> Result<(), ValidationError> {
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if name.chars().any(char::is_control) {
            return Err(ValidationError::InvalidCharacter);
        }
        let len = name.chars().count();
        if len < self.min_len {
            return Err(ValidationError::NameTooShort {
                len,
                min: self.min_len,
            });
        }
        if len > self.max_len {
            return Err(ValidationError::NameTooLong {
                len,
                max: self.max_len,
            });
        }
        Ok(())
    }
}

pub fn validate_score(score: GameScore) -> Result<(), ValidationError> {
    if score < 0 {
        return Err(ValidationError::NegativeScore { score });
    }
    Ok(())
}

/// A submission that has passed validation and is ready to be appended.
/// Only constructible through [`NewScore::new`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewScore {
    name: String,
    score: GameScore,
}

impl NewScore {
    pub fn new(name: &str, score: GameScore, rules: &NameRules) -> Result<Self, ValidationError> {
        rules.validate(name)?;
        validate_score(score)?;
        Ok(Self {
            name: name.to_owned(),
            score,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn score(&self) -> GameScore {
        self.score
    }

    /// Stamps the entry with its store-assigned identity.
    pub fn into_record(self, id: ScoreId, created_at: DateTime<Utc>) -> ScoreRecord {
        ScoreRecord {
            id,
            name: self.name,
            score: self.score,
            created_at,
        }
    }
}
