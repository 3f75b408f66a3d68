use std::time::Duration;

use mongodb::{bson::doc, Client as MongoClient};
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::model::{common::vote::VoteScope, mongodb::ensure_collections_exist};
use crate::vote_service::VoteService;

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    vote_scope: VoteScope,
    #[serde(default = "default_transaction_timeout_ms")]
    transaction_timeout_ms: u64,
}

impl Config {
    /// Whether a student gets one vote overall or one per election.
    pub fn vote_scope(&self) -> VoteScope {
        self.vote_scope
    }

    /// How long a vote keeps retrying transient conflicts and unknown commit
    /// results before giving up. The first attempt always runs.
    pub fn transaction_timeout(&self) -> Duration {
        Duration::from_millis(self.transaction_timeout_ms)
    }
}

fn default_transaction_timeout_ms() -> u64 {
    10_000
}

/// A fairing that loads the application config and puts it in managed state.
/// This could easily be achieved using `AdHoc::config`, but is written out
/// explicitly for symmetry with the database fairing and control over error
/// messages.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        info!(
            "Vote scope is {:?}, transactions retried for up to {:?}",
            config.vote_scope(),
            config.transaction_timeout()
        );

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Configuration for the database.
#[derive(Deserialize)]
struct DbConfig {
    // secrets
    db_uri: String,
    // non-secrets
    db_name: Option<String>,
}

/// A fairing that connects to MongoDB, creates any missing collections, and
/// places a `Client`, a `Database` and the `VoteService` into managed state.
///
/// Must be attached after [`ConfigFairing`].
pub struct DatabaseFairing {
    connection: Option<(MongoClient, String)>,
}

impl DatabaseFairing {
    /// Connect using `db_uri` and `db_name` from the Rocket config.
    pub fn from_config() -> Self {
        Self { connection: None }
    }

    /// Use an existing client and database name instead of the config.
    pub fn from_client(client: MongoClient, db_name: &str) -> Self {
        Self {
            connection: Some((client, db_name.to_string())),
        }
    }
}

#[rocket::async_trait]
impl Fairing for DatabaseFairing {
    fn info(&self) -> Info {
        Info {
            name: "MongoDB",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        let (client, db_name) = match &self.connection {
            Some((client, db_name)) => (client.clone(), db_name.clone()),
            None => {
                // Load the config.
                let config = match rocket.figment().extract::<DbConfig>() {
                    Ok(config) => config,
                    Err(e) => {
                        error!("Failed to load database config");
                        rocket::config::pretty_print_error(e);
                        return Err(rocket);
                    }
                };
                info!("Loaded database config, connecting...");
                // Construct the connection.
                match MongoClient::with_uri_str(config.db_uri).await {
                    Ok(client) => (client, config.db_name.unwrap_or_else(get_database_name)),
                    Err(e) => {
                        error!("Failed to connect to database: {e}");
                        return Err(rocket);
                    }
                }
            }
        };
        let db = client.database(&db_name);

        // The driver connects lazily, so make sure the server is really there.
        if let Err(e) = db.run_command(doc! { "ping": 1 }, None).await {
            error!("Failed to connect to database: {e}");
            return Err(rocket);
        }

        // Collections can't be created implicitly inside every transaction.
        if let Err(e) = ensure_collections_exist(&db).await {
            error!("Failed to prepare collections: {e}");
            return Err(rocket);
        }
        info!("...database connection online!");

        let vote_service = match rocket.state::<Config>() {
            Some(config) => VoteService::new(client.clone(), &db, config),
            None => {
                error!("Database fairing attached before config fairing");
                return Err(rocket);
            }
        };

        // Manage the state.
        rocket = rocket.manage(client).manage(db).manage(vote_service);
        Ok(rocket)
    }
}

/// Get the name of the database to use (production version).
#[cfg(not(test))]
pub(crate) fn get_database_name() -> String {
    "elections".to_string()
}

/// Get the name of the database to use (test version).
/// Use a random name to avoid collisions between tests.
#[cfg(test)]
pub(crate) fn get_database_name() -> String {
    let random: u32 = rand::random();
    let db = format!("test{random}");
    info!("Using database {db}");
    db
}
