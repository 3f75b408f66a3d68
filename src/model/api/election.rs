use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::{common::election::ElectionDetails, db::Election};

/// An election record as seen by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionRecord {
    pub elec_id: String,
    #[serde(flatten)]
    pub details: ElectionDetails,
}

impl From<Election> for ElectionRecord {
    fn from(election: Election) -> Self {
        Self {
            elec_id: election.id,
            details: election.details,
        }
    }
}

impl Deref for ElectionRecord {
    type Target = ElectionDetails;

    fn deref(&self) -> &Self::Target {
        &self.details
    }
}

impl DerefMut for ElectionRecord {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.details
    }
}

#[cfg(test)]
mod examples {
    use super::*;

    impl ElectionRecord {
        pub fn example() -> Self {
            Self {
                elec_id: "E1".to_string(),
                details: ElectionDetails::example(),
            }
        }
    }
}
