//! Convenience extension traits and methods.

use bson::{ Bson, Document };
use crate::ID_KEY;
use crate::error::{ Error, ErrorKind, Result };

/// Checked field access on encoded documents.
#[allow(clippy::module_name_repetitions)]
pub trait DocumentExt {
    /// Returns the value under `key`, or a `MissingField` error naming it.
    fn try_get(&self, key: &str) -> Result<&Bson>;

    /// The `_id` field, if any.
    fn identity(&self) -> Option<&Bson>;

    /// The name of the first field, if any.
    fn first_key(&self) -> Option<&str>;
}

impl DocumentExt for Document {
    fn try_get(&self, key: &str) -> Result<&Bson> {
        self.get(key).ok_or_else(|| missing_field(key))
    }

    fn identity(&self) -> Option<&Bson> {
        self.get(ID_KEY)
    }

    fn first_key(&self) -> Option<&str> {
        self.keys().next().map(String::as_str)
    }
}

/// The error for a field that is absent from a document.
fn missing_field(key: &str) -> Error {
    Error::new(ErrorKind::MissingField, format!("missing field `{}`", key))
}
