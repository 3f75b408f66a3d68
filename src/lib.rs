#[macro_use]
extern crate rocket;

#[macro_use]
extern crate log;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod vote_service;

pub use config::Config;

use config::{ConfigFairing, DatabaseFairing};
use logging::LoggerFairing;

/// Build the server, connecting to the database named in the config.
pub fn build() -> Rocket<Build> {
    rocket_with_db(DatabaseFairing::from_config())
}

fn rocket_with_db(database: DatabaseFairing) -> Rocket<Build> {
    rocket::build()
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(database)
        .mount("/", api::routes())
        .register("/", api::catchers())
}

/// Build the server on top of an existing database connection.
#[cfg(test)]
pub(crate) fn rocket_for_db(client: mongodb::Client, db_name: &str) -> Rocket<Build> {
    rocket_with_db(DatabaseFairing::from_client(client, db_name))
}

/// Connect to the database server named by `db_uri` in the config.
#[cfg(test)]
pub(crate) async fn db_client() -> mongodb::Client {
    let db_uri = rocket::Config::figment()
        .extract_inner::<String>("db_uri")
        .expect("`db_uri` not set");
    mongodb::Client::with_uri_str(&db_uri)
        .await
        .expect("Could not connect to database")
}

/// A fresh database name for a single test.
#[cfg(test)]
pub(crate) fn database() -> String {
    config::get_database_name()
}
