mod collection;
mod errors;

pub use collection::{ensure_collections_exist, Coll, MongoCollection};
pub use errors::{is_duplicate_key_error, is_namespace_exists_error};
