use crate::database::{GameScore, LeaderboardEntry, RecordStore, StoreError};
use crate::leaderboard::LEADERBOARD_SIZE;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// The submission itself was refused; retrying it unchanged will not help.
    #[error("{0}")]
    Rejected(String),
    /// The service could not be reached or could not complete the request.
    #[error("{0}")]
    Unavailable(String),
}

/// The two leaderboard requests the client workflow makes.
#[rocket::async_trait]
pub trait ScoreService: Send + Sync {
    async fn submit(&self, name: &str, score: GameScore) -> Result<(), ServiceError>;

    async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, ServiceError>;
}

#[rocket::async_trait]
impl ScoreService for RecordStore {
    async fn submit(&self, name: &str, score: GameScore) -> Result<(), ServiceError> {
        match self.insert(name, score).await {
            Ok(_) => Ok(()),
            Err(StoreError::Validation(error)) => Err(ServiceError::Rejected(error.to_string())),
            Err(StoreError::Storage(error)) => {
                Err(ServiceError::Unavailable(error.public_message().to_owned()))
            }
        }
    }

    async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, ServiceError> {
        self.list_top(LEADERBOARD_SIZE)
            .await
            .map(|leaderboard| leaderboard.entries())
            .map_err(|error| ServiceError::Unavailable(error.public_message().to_owned()))
    }
}
