//! For some reason, the mongodb crate doesn't provide error code constants.
//! This module fills in the gaps.

use mongodb::error::{Error as DbError, ErrorKind, WriteFailure};

pub const DUPLICATE_KEY: i32 = 11000;
pub const NAMESPACE_EXISTS: i32 = 48;

/// Return true if the given error is a duplicate key error.
///
/// Outside a transaction this surfaces as a write error; inside one the
/// server may report it as a command error instead.
pub fn is_duplicate_key_error(err: &DbError) -> bool {
    match *err.kind {
        ErrorKind::Write(WriteFailure::WriteError(ref e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(ref e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

/// Return true if the given error reports that a collection already exists,
/// e.g. because another server instance created it first.
pub fn is_namespace_exists_error(err: &DbError) -> bool {
    matches!(*err.kind, ErrorKind::Command(ref e) if e.code == NAMESPACE_EXISTS)
}
