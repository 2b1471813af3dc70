use rocket::{
    http::Status,
    response::{self, Responder},
    serde::{json::Json, Serialize},
    Request, Response,
};

/// Malformed or out-of-bound submission input. Always rejected
/// before the store is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("name must be a string")]
    NameNotString,
    #[error("name must not be empty")]
    EmptyName,
    #[error("name must not contain control characters")]
    InvalidCharacter,
    #[error("name is {len} characters long, at least {min} required")]
    NameTooShort { len: usize, min: usize },
    #[error("name is {len} characters long, at most {max} allowed")]
    NameTooLong { len: usize, max: usize },
    #[error("score must be an integer")]
    ScoreNotInteger,
    #[error("score {score} is negative")]
    NegativeScore { score: i64 },
    #[error("score is too large")]
    ScoreOutOfRange,
    #[error("malformed request body: {0}")]
    MalformedBody(String),
}

/// The durable store could not complete an operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("storage is unavailable: {0}")]
    Unavailable(String),
    #[error("storage is busy")]
    Busy,
    #[error("storage operation timed out")]
    Timeout,
    #[error("storage operation failed: {0}")]
    Backend(String),
    #[error("stored record is corrupt: {0}")]
    Corrupt(String),
}

impl StorageError {
    /// Whether retrying the same operation later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Busy | Self::Timeout)
    }

    /// Message safe to show outside the service.
    pub fn public_message(&self) -> &'static str {
        if self.is_transient() {
            "score storage is temporarily unavailable, try again"
        } else {
            "score storage failed to complete the request"
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors reported by the HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    /// Storage failure while writing a submission.
    #[error("submission failed: {0}")]
    Submit(StorageError),
    /// Storage failure while reading the leaderboard.
    #[error("leaderboard query failed: {0}")]
    Query(StorageError),
}

impl RequestError {
    pub fn submit(error: StoreError) -> Self {
        match error {
            StoreError::Validation(error) => Self::Invalid(error),
            StoreError::Storage(error) => Self::Submit(error),
        }
    }

    pub fn status(&self) -> Status {
        match self {
            Self::Invalid(_) => Status::BadRequest,
            Self::Submit(_) => Status::InternalServerError,
            // Matches the long-standing contract of `GET /scores`
            Self::Query(_) => Status::BadRequest,
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::Invalid(error) => error.to_string(),
            Self::Submit(error) | Self::Query(error) => error.public_message().to_owned(),
        }
    }
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ErrorBody {
    pub error: String,
}

impl<'r> Responder<'r, 'static> for RequestError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        let body = Json(ErrorBody {
            error: self.public_message(),
        });
        Response::build_from(body.respond_to(request)?)
            .status(status)
            .ok()
    }
}

pub type RequestResult<T, E = RequestError> = std::result::Result<T, E>;
