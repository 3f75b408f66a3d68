//! API-compatible types.
//!
//! The types in this module are shaped the way clients send and receive them:
//! natural keys are named `stu_id` / `elec_id` rather than `_id`.

pub mod election;
pub mod student;

pub use crate::model::common::vote::VoteRecord;
