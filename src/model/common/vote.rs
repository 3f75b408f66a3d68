use mongodb::bson::{doc, Document};
use serde::{Deserialize, Serialize};

/// A single vote, as submitted by a student.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoteRecord {
    pub stu_id: String,
    pub elec_id: String,
    pub candidate: String,
}

/// How widely the one-vote-per-student rule applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteScope {
    /// A student may cast a single vote, ever.
    #[default]
    Global,
    /// A student may cast one vote in each election.
    PerElection,
}

impl VoteScope {
    /// The unique key of the slot a vote occupies. Two votes with the same
    /// slot cannot both be stored.
    pub fn slot(self, vote: &VoteRecord) -> Document {
        match self {
            Self::Global => doc! { "stu_id": &vote.stu_id },
            Self::PerElection => doc! { "stu_id": &vote.stu_id, "elec_id": &vote.elec_id },
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_slot_ignores_election() {
        let vote = VoteRecord::example();
        let other = VoteRecord {
            elec_id: "E2".to_string(),
            ..VoteRecord::example()
        };
        assert_eq!(VoteScope::Global.slot(&vote), VoteScope::Global.slot(&other));
    }

    #[test]
    fn per_election_slot_includes_election() {
        let vote = VoteRecord::example();
        let other = VoteRecord {
            elec_id: "E2".to_string(),
            ..VoteRecord::example()
        };
        assert_ne!(
            VoteScope::PerElection.slot(&vote),
            VoteScope::PerElection.slot(&other)
        );
        assert_eq!(
            VoteScope::PerElection.slot(&vote),
            doc! { "stu_id": "S1", "elec_id": "E1" }
        );
    }

    #[test]
    fn scope_config_names() {
        let scope: VoteScope = rocket::serde::json::from_str("\"per_election\"").unwrap();
        assert_eq!(scope, VoteScope::PerElection);
        assert_eq!(VoteScope::default(), VoteScope::Global);
    }
}
