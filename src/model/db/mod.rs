//! DB-compatible types.
//!
//! Every record is keyed by its natural ID, stored as the document `_id`.

mod election;
pub use election::Election;

mod student;
pub use student::Student;

mod vote;
pub use vote::Vote;
