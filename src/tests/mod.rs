use std::sync::Arc;
use std::time::Duration;

use rocket::{
    futures::future::join_all,
    http::{ContentType, Status},
    local::asynchronous::{Client, LocalResponse},
    serde::json::{json, Value},
};
use tempfile::TempDir;

use crate::{
    config::ServerConfig,
    database::{
        requests::ScoreSubmission, LeaderboardEntry, NameRules, NewScore, RecordStore,
        ScoreBackend, ScoreId, ScoreRecord, StorageError, StorageResult,
    },
};

/// Backend whose medium is gone.
struct BrokenBackend;

#[rocket::async_trait]
impl ScoreBackend for BrokenBackend {
    async fn insert(&self, _entry: NewScore, _timeout: Duration) -> StorageResult<ScoreId> {
        Err(StorageError::Backend("disk I/O error in /srv/db.sqlite".to_owned()))
    }

    async fn list_top(&self, _limit: usize) -> StorageResult<Vec<ScoreRecord>> {
        Err(StorageError::Unavailable("unable to open /srv/db.sqlite".to_owned()))
    }
}

async fn spawn_client(store: RecordStore) -> Client {
    Client::tracked(super::server_with_store(store))
        .await
        .expect("valid rocket instance")
}

fn sqlite_config(dir: &TempDir) -> ServerConfig {
    ServerConfig {
        database_url: format!("sqlite://{}", dir.path().join("db.sqlite").display()),
        ..ServerConfig::default()
    }
}

async fn sqlite_client(dir: &TempDir) -> Client {
    let store = super::open_store(&sqlite_config(dir))
        .await
        .expect("store opens");
    spawn_client(store).await
}

async fn add_score<'a>(client: &'a Client, name: &str, score: i64) -> LocalResponse<'a> {
    client
        .post("/scores")
        .json(&ScoreSubmission::new(name, score))
        .dispatch()
        .await
}

async fn post_raw<'a>(client: &'a Client, body: &str) -> LocalResponse<'a> {
    client
        .post("/scores")
        .header(ContentType::JSON)
        .body(body.to_owned())
        .dispatch()
        .await
}

async fn get_scores(client: &Client) -> Vec<LeaderboardEntry> {
    let response = client.get("/scores").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    response
        .into_json::<Vec<LeaderboardEntry>>()
        .await
        .expect("leaderboard json")
}

async fn error_message(response: LocalResponse<'_>) -> String {
    let body = response.into_json::<Value>().await.expect("error json");
    body["error"].as_str().expect("error field").to_owned()
}

#[rocket::async_test]
async fn index_banner() {
    let client = spawn_client(RecordStore::in_memory()).await;
    let response = client.get("/").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    assert!(response.into_string().await.unwrap().contains("leaderboard"));
}

/// Submits three scores and reads them back with the tie broken by submission order
#[rocket::async_test]
async fn submit_then_query() {
    let dir = TempDir::new().unwrap();
    let client = sqlite_client(&dir).await;

    for (name, score) in [("AAA", 50), ("BBB", 80), ("CCC", 80)] {
        let response = add_score(&client, name, score).await;
        assert_eq!(response.status(), Status::Ok);
    }

    assert_eq!(
        get_scores(&client).await,
        vec![
            LeaderboardEntry::new("BBB", 80),
            LeaderboardEntry::new("CCC", 80),
            LeaderboardEntry::new("AAA", 50),
        ]
    );
}

#[rocket::async_test]
async fn response_only_exposes_name_and_score() {
    let client = spawn_client(RecordStore::in_memory()).await;
    add_score(&client, "AAA", 1).await;

    let response = client.get("/scores").dispatch().await;
    let body = response.into_json::<Value>().await.unwrap();
    assert_eq!(body, json!([{ "name": "AAA", "score": 1 }]));
}

#[rocket::async_test]
async fn empty_leaderboard_is_not_an_error() {
    let dir = TempDir::new().unwrap();
    let client = sqlite_client(&dir).await;
    assert!(get_scores(&client).await.is_empty());
}

#[rocket::async_test]
async fn leaderboard_holds_ten_entries() {
    let client = spawn_client(RecordStore::in_memory()).await;
    for score in 1..=15 {
        let response = add_score(&client, &format!("P{}", score), score).await;
        assert_eq!(response.status(), Status::Ok);
    }

    let scores: Vec<_> = get_scores(&client).await.iter().map(|e| e.score).collect();
    assert_eq!(scores, vec![15, 14, 13, 12, 11, 10, 9, 8, 7, 6]);
}

/// Every malformed submission is answered with 400 and leaves the store untouched
#[rocket::async_test]
async fn invalid_submissions_are_rejected() {
    let client = spawn_client(RecordStore::in_memory()).await;

    let long_name = "A".repeat(33);
    let cases = [
        (json!({ "name": "", "score": 10 }), "empty"),
        (json!({ "name": long_name, "score": 10 }), "at most 32"),
        (json!({ "name": "AB", "score": -1 }), "negative"),
        (json!({ "name": "AB", "score": 2.5 }), "integer"),
        (json!({ "name": "AB", "score": "12" }), "integer"),
        (json!({ "name": "AB" }), "score"),
        (json!({ "score": 3 }), "name"),
        (json!({ "name": 7, "score": 3 }), "string"),
    ];

    for (body, expected) in cases {
        let response = post_raw(&client, &body.to_string()).await;
        assert_eq!(response.status(), Status::BadRequest, "{}", body);
        let message = error_message(response).await;
        assert!(message.contains(expected), "{}: {}", body, message);
    }

    let response = post_raw(&client, "{not json").await;
    assert_eq!(response.status(), Status::BadRequest);
    assert!(error_message(response).await.contains("malformed"));

    assert!(get_scores(&client).await.is_empty());
}

#[rocket::async_test]
async fn configured_name_bounds_apply() {
    let store = RecordStore::new(
        Arc::new(crate::database::MemoryBackend::new()),
        NameRules::arcade(),
        Duration::from_secs(1),
    );
    let client = spawn_client(store).await;

    assert_eq!(add_score(&client, "ABC", 1).await.status(), Status::Ok);
    assert_eq!(
        add_score(&client, "ABCD", 1).await.status(),
        Status::BadRequest
    );
}

/// Storage failures surface as 500 on submission and 400 on query, without internals
#[rocket::async_test]
async fn storage_failures() {
    let store = RecordStore::new(
        Arc::new(BrokenBackend),
        NameRules::default(),
        Duration::from_secs(1),
    );
    let client = spawn_client(store).await;

    let response = add_score(&client, "AAA", 1).await;
    assert_eq!(response.status(), Status::InternalServerError);
    let message = error_message(response).await;
    assert!(!message.contains("/srv"), "{}", message);

    let response = client.get("/scores").dispatch().await;
    assert_eq!(response.status(), Status::BadRequest);
    let message = error_message(response).await;
    assert!(message.contains("try again"), "{}", message);

    // Validation still comes first
    let response = add_score(&client, "", 1).await;
    assert_eq!(response.status(), Status::BadRequest);
}

/// Scores accepted before a restart are still served after it
#[rocket::async_test]
async fn scores_survive_restart() {
    let dir = TempDir::new().unwrap();

    {
        let client = sqlite_client(&dir).await;
        assert_eq!(add_score(&client, "OLD", 30).await.status(), Status::Ok);
    }

    let client = sqlite_client(&dir).await;
    assert_eq!(add_score(&client, "NEW", 30).await.status(), Status::Ok);
    assert_eq!(
        get_scores(&client).await,
        vec![
            LeaderboardEntry::new("OLD", 30),
            LeaderboardEntry::new("NEW", 30),
        ]
    );
}

#[rocket::async_test]
async fn concurrent_submissions() {
    let dir = TempDir::new().unwrap();
    let client = sqlite_client(&dir).await;

    let requests = (0..20).map(|i| {
        let client = &client;
        async move { add_score(client, &format!("P{}", i), i).await.status() }
    });
    let statuses = join_all(requests).await;
    assert!(statuses.iter().all(|status| *status == Status::Ok));

    let scores: Vec<_> = get_scores(&client).await.iter().map(|e| e.score).collect();
    assert_eq!(scores, (10..20).rev().collect::<Vec<_>>());
}
