use std::ops::{Deref, DerefMut};

use mongodb::bson::doc;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    api::election::ElectionRecord,
    common::election::ElectionDetails,
    mongodb::{is_duplicate_key_error, Coll},
};

/// An election from the database, keyed by its election ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Election {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub details: ElectionDetails,
}

impl Election {
    /// Insert a new election, failing if the ID is already taken.
    pub async fn create(elections: &Coll<Election>, election: Election) -> Result<Election> {
        election.validate()?;
        match elections.insert_one(&election, None).await {
            Ok(_) => Ok(election),
            Err(err) if is_duplicate_key_error(&err) => Err(Error::AlreadyExists(format!(
                "Election '{}'",
                election.id
            ))),
            Err(err) => Err(err.into()),
        }
    }

    /// Fetch the election with the given ID.
    pub async fn find(elections: &Coll<Election>, elec_id: &str) -> Result<Election> {
        elections
            .find_one(doc! { "_id": elec_id }, None)
            .await?
            .ok_or_else(|| Error::election_not_found(elec_id))
    }

    /// Delete the election with the given ID, returning the removed record.
    /// Votes already cast in the election are left in place.
    pub async fn delete(elections: &Coll<Election>, elec_id: &str) -> Result<Election> {
        elections
            .find_one_and_delete(doc! { "_id": elec_id }, None)
            .await?
            .ok_or_else(|| Error::election_not_found(elec_id))
    }
}

impl From<ElectionRecord> for Election {
    fn from(mut record: ElectionRecord) -> Self {
        // The natural key is the document ID; a client-supplied one is dropped.
        record.extra.remove("_id");
        Self {
            id: record.elec_id,
            details: record.details,
        }
    }
}

impl Deref for Election {
    type Target = ElectionDetails;

    fn deref(&self) -> &Self::Target {
        &self.details
    }
}

impl DerefMut for Election {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.details
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl Election {
        pub fn example() -> Self {
            ElectionRecord::example().into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[backend_test]
    async fn create_find_delete(elections: Coll<Election>) {
        let created = Election::create(&elections, Election::example())
            .await
            .unwrap();
        assert_eq!(created, Election::example());

        let duplicate = Election::create(&elections, Election::example()).await;
        assert!(matches!(duplicate, Err(Error::AlreadyExists(_))));

        let found = Election::find(&elections, "E1").await.unwrap();
        assert_eq!(found, created);

        Election::delete(&elections, "E1").await.unwrap();
        let result = Election::find(&elections, "E1").await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[backend_test]
    async fn illegal_candidates_are_not_stored(elections: Coll<Election>) {
        let mut election = Election::example();
        election.candidates.insert("$gt".to_string(), 0);
        let result = Election::create(&elections, election).await;
        assert!(matches!(result, Err(Error::BadRequest(_))));

        let count = elections.count_documents(None, None).await.unwrap();
        assert_eq!(count, 0);
    }
}
