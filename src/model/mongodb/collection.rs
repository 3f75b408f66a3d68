use std::ops::Deref;

use mongodb::{error::Error as DbError, Collection, Database};
use rocket::{
    request::{self, FromRequest, Request},
    State,
};

use crate::model::db::{Election, Student, Vote};

use super::is_namespace_exists_error;

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r, T> FromRequest<'r> for Coll<T>
where
    T: MongoCollection,
{
    type Error = ();

    /// Get the database connection from the managed state and wrap it in a collection.
    ///
    /// Panics iff the [`Database`] is not managed by [`rocket::Rocket`].
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let db = req.guard::<&State<Database>>().await.unwrap();
        request::Outcome::Success(Coll::from_db(db))
    }
}

impl MongoCollection for Student {
    const NAME: &'static str = "students_data";
}

impl MongoCollection for Election {
    const NAME: &'static str = "elections_data";
}

impl MongoCollection for Vote {
    const NAME: &'static str = "votes_data";
}

/// Create any of the application's collections that don't exist yet.
///
/// Vote transactions write to all three, and a transaction can't always
/// create a collection on first use. This operation is idempotent.
pub async fn ensure_collections_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collections exist");

    let existing = db.list_collection_names(None).await?;
    for name in [Student::NAME, Election::NAME, Vote::NAME] {
        if existing.iter().any(|n| n == name) {
            continue;
        }
        match db.create_collection(name, None).await {
            Ok(()) => info!("Created collection {name}"),
            Err(err) if is_namespace_exists_error(&err) => {}
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[backend_test]
    async fn collections_exist_after_ignition(db: Database) {
        let mut names = db.list_collection_names(None).await.unwrap();
        names.sort();
        assert_eq!(names, vec!["elections_data", "students_data", "votes_data"]);

        // Running it again changes nothing.
        ensure_collections_exist(&db).await.unwrap();
        assert_eq!(db.list_collection_names(None).await.unwrap().len(), 3);
    }
}
