//! Score persistence and ranking service for a browser-hosted game.
//!
//! Players submit a name and score with `POST /scores`; `GET /scores`
//! returns the ten best runs ordered by score, then by submission time.
//! The [`workflow`] module drives the client side of that exchange.

use std::sync::Arc;

use rocket::fairing::AdHoc;
use rocket::{get, routes, Build, Rocket};

pub mod config;
pub mod database;
pub mod leaderboard;
pub mod workflow;

#[cfg(test)]
mod tests;

use config::ServerConfig;
use database::{requests, RecordStore, SqliteBackend};

/// The service as launched by the binary: configuration is read and the
/// SQLite store opened during ignition, aborting launch if either fails.
pub fn server() -> Rocket<Build> {
    mount(rocket::build()).attach(AdHoc::try_on_ignite("Score store", |rocket| async move {
        let config = match ServerConfig::from_env() {
            Ok(config) => config,
            Err(error) => {
                log::error!("Invalid configuration: {}", error);
                return Err(rocket);
            }
        };

        match open_store(&config).await {
            Ok(store) => {
                log::info!("Score store ready at {}", config.database_url);
                Ok(rocket.manage(store))
            }
            Err(error) => {
                log::error!("Failed to open score store at {}: {}", config.database_url, error);
                Err(rocket)
            }
        }
    }))
}

/// The service over an already opened store.
pub fn server_with_store(store: RecordStore) -> Rocket<Build> {
    mount(rocket::build()).manage(store)
}

pub async fn open_store(config: &ServerConfig) -> database::StorageResult<RecordStore> {
    let backend = SqliteBackend::connect(
        &config.database_url,
        config.max_connections,
        config.storage_timeout,
    )
    .await?;

    Ok(RecordStore::new(
        Arc::new(backend),
        config.name_rules,
        config.storage_timeout,
    ))
}

fn mount(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket.mount("/", routes![index, requests::add_score, requests::get_scores])
}

#[get("/")]
fn index() -> &'static str {
    "This is the game's leaderboard server!"
}
