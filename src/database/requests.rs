use rocket::serde::json::{self, Json, Value};
use rocket::serde::{Deserialize, Serialize};
use rocket::{get, post, State};

use crate::leaderboard::LEADERBOARD_SIZE;

use super::*;

/// Body of `POST /scores`, kept loose so every shape problem can be
/// reported as the constraint it violates.
#[derive(Debug, Serialize, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct ScoreSubmission {
    pub name: Option<Value>,
    pub score: Option<Value>,
}

impl ScoreSubmission {
    pub fn new(name: &str, score: GameScore) -> Self {
        Self {
            name: Some(Value::from(name)),
            score: Some(Value::from(score)),
        }
    }

    /// Checks that both fields are present and well-typed.
    /// Length and range bounds are left to the store.
    pub fn parse(&self) -> Result<(&str, GameScore), ValidationError> {
        let name = match &self.name {
            None | Some(Value::Null) => return Err(ValidationError::MissingField("name")),
            Some(Value::String(name)) => name.as_str(),
            Some(_) => return Err(ValidationError::NameNotString),
        };

        let score = match &self.score {
            None | Some(Value::Null) => return Err(ValidationError::MissingField("score")),
            Some(Value::Number(number)) => {
                if let Some(score) = number.as_i64() {
                    score
                } else if number.is_u64() {
                    return Err(ValidationError::ScoreOutOfRange);
                } else {
                    return Err(ValidationError::ScoreNotInteger);
                }
            }
            Some(_) => return Err(ValidationError::ScoreNotInteger),
        };

        Ok((name, score))
    }
}

/// Records a finished run. Validation failures are answered with 400,
/// storage failures with 500, and in neither case is a record written.
#[post("/scores", data = "<submission>")]
pub async fn add_score(
    submission: Result<Json<ScoreSubmission>, json::Error<'_>>,
    store: &State<RecordStore>,
) -> RequestResult<()> {
    let submission = submission.map_err(|error| {
        let error = ValidationError::MalformedBody(error.to_string());
        log::warn!("Rejected score submission: {}", error);
        error
    })?;

    let (name, score) = submission.parse().map_err(|error| {
        log::warn!("Rejected score submission: {}", error);
        error
    })?;

    match store.insert(name, score).await {
        Ok(id) => {
            log::info!("Recorded score {} for {:?} as #{}", score, name, id);
            Ok(())
        }
        Err(error) => {
            log_store_error("score submission", &error);
            Err(RequestError::submit(error))
        }
    }
}

/// Serves the current top of the leaderboard.
#[get("/scores")]
pub async fn get_scores(store: &State<RecordStore>) -> RequestResult<Json<Vec<LeaderboardEntry>>> {
    let leaderboard = store.list_top(LEADERBOARD_SIZE).await.map_err(|error| {
        log_storage_error("leaderboard query", &error);
        RequestError::Query(error)
    })?;

    Ok(Json(leaderboard.entries()))
}

fn log_store_error(operation: &str, error: &StoreError) {
    match error {
        StoreError::Validation(error) => log::warn!("Rejected {}: {}", operation, error),
        StoreError::Storage(error) => log_storage_error(operation, error),
    }
}

fn log_storage_error(operation: &str, error: &StorageError) {
    if error.is_transient() {
        log::warn!("Transient storage failure during {}: {}", operation, error);
    } else {
        log::error!("Storage failure during {}: {}", operation, error);
    }
}

#[cfg(test)]
mod tests {
    use rocket::serde::json::serde_json;

    use super::*;

    fn parse(body: &str) -> Result<(String, GameScore), ValidationError> {
        let submission: ScoreSubmission = serde_json::from_str(body).unwrap();
        submission
            .parse()
            .map(|(name, score)| (name.to_owned(), score))
    }

    #[test]
    fn accepts_well_formed_bodies() {
        assert_eq!(
            parse(r#"{"name": "AAA", "score": 50}"#),
            Ok(("AAA".to_owned(), 50))
        );
    }

    #[test]
    fn reports_missing_fields() {
        assert_eq!(
            parse(r#"{"score": 50}"#),
            Err(ValidationError::MissingField("name"))
        );
        assert_eq!(
            parse(r#"{"name": "AAA"}"#),
            Err(ValidationError::MissingField("score"))
        );
        assert_eq!(
            parse(r#"{"name": null, "score": 1}"#),
            Err(ValidationError::MissingField("name"))
        );
    }

    #[test]
    fn reports_wrongly_typed_fields() {
        assert_eq!(
            parse(r#"{"name": 12, "score": 50}"#),
            Err(ValidationError::NameNotString)
        );
        assert_eq!(
            parse(r#"{"name": "AAA", "score": 1.5}"#),
            Err(ValidationError::ScoreNotInteger)
        );
        assert_eq!(
            parse(r#"{"name": "AAA", "score": "50"}"#),
            Err(ValidationError::ScoreNotInteger)
        );
        assert_eq!(
            parse(r#"{"name": "AAA", "score": 18446744073709551615}"#),
            Err(ValidationError::ScoreOutOfRange)
        );
    }

    #[test]
    fn negative_scores_pass_shape_checks() {
        // Range is enforced by the store, not the body parser.
        assert_eq!(parse(r#"{"name": "AB", "score": -1}"#), Ok(("AB".to_owned(), -1)));
    }
}
