use chrono::{DateTime, Utc};
use mongodb::bson::{serde_helpers::chrono_datetime_as_bson_datetime, Document};
use serde::{Deserialize, Serialize};

use crate::model::common::vote::{VoteRecord, VoteScope};

/// A vote from the database. The `_id` is the vote slot, so the store itself
/// rejects a second vote for an occupied slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    #[serde(rename = "_id")]
    pub slot: Document,
    pub stu_id: String,
    pub elec_id: String,
    pub candidate: String,
    /// Whether the vote was added to a candidate tally.
    pub counted: bool,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub cast_at: DateTime<Utc>,
}

impl Vote {
    pub fn new(vote: VoteRecord, scope: VoteScope, counted: bool) -> Self {
        Self {
            slot: scope.slot(&vote),
            stu_id: vote.stu_id,
            elec_id: vote.elec_id,
            candidate: vote.candidate,
            counted,
            cast_at: Utc::now(),
        }
    }
}

impl From<Vote> for VoteRecord {
    fn from(vote: Vote) -> Self {
        Self {
            stu_id: vote.stu_id,
            elec_id: vote.elec_id,
            candidate: vote.candidate,
        }
    }
}
