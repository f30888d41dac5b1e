//! # Tabula: BSON for dynamically-typed host tables
//!
//! Embedded scripting hosts represent structured data as nested
//! associative tables, with no distinction between arrays and records and
//! no dedicated types for object identifiers, dates or a BSON-level null.
//! This library converts such tables to BSON documents and back.
//!
//! ### Values
//!
//! Host data is modelled by [`Value`](value/enum.Value.html): booleans,
//! integers, floats, strings, [`Table`](value/struct.Table.html)s and
//! tagged host [`Object`](value/struct.Object.html)s. A table keyed
//! exactly `1..=n` is a sequence and becomes a BSON array; every other
//! table, the empty one included, becomes a BSON document.
//!
//! ```
//! # use bson::doc;
//! # use tabula::value::{ Table, Value };
//! # fn main() -> tabula::error::Result<()> {
//! let mut person = Value::Table(
//!     Table::new()
//!         .with("name", "Ada")
//!         .with("langs", Table::sequence(vec!["en", "fr"]))
//!         .with("height", 1.65)
//!         .with("age", 36.0)
//! );
//! let document = tabula::encode(&mut person, false)?;
//!
//! assert_eq!(document, doc!{
//!     "name": "Ada",
//!     "langs": ["en", "fr"],
//!     "height": 1.65,
//!     "age": 36_i64,
//! });
//! # Ok(())
//! # }
//! ```
//!
//! ### Identity
//!
//! Documents to be inserted need an `_id`. When one is required and the
//! table doesn't have it, a fresh `ObjectId` becomes the first field of
//! the document, and is stored in the table too:
//!
//! ```
//! # use tabula::value::{ Table, Value };
//! # fn main() -> tabula::error::Result<()> {
//! let mut job = Value::Table(Table::new().with("salary", 1000));
//! let document = tabula::encode(&mut job, true)?;
//! let id = job.as_table().and_then(|t| t.get("_id")).and_then(Value::as_object_id);
//!
//! assert_eq!(document.keys().next().map(String::as_str), Some("_id"));
//! assert_eq!(document.get_object_id("_id").ok(), id);
//! # Ok(())
//! # }
//! ```
//!
//! ### Special values
//!
//! Object identifiers, the BSON null and dates are host objects, known to
//! the codec through its [`Registry`](registry/struct.Registry.html) of
//! extension types. Its default contents handle these three; BSON types
//! beyond them (binary data, regular expressions, timestamps, ...) fail
//! to decode with `ErrorKind::UnsupportedType` unless a custom
//! [`ExtensionType`](registry/trait.ExtensionType.html) is registered.
//!
//! ### The codec
//!
//! The free functions of this crate use a default
//! [`Codec`](codec/struct.Codec.html). Build one explicitly for custom
//! limits, extension types or identifier generation. Codecs are cheap to
//! clone and can be shared across threads.

#![doc(html_root_url = "https://docs.rs/tabula/0.1.0")]
#![deny(missing_debug_implementations, missing_copy_implementations,
        trivial_casts, trivial_numeric_casts,
        unsafe_code,
        unstable_features,
        unused_import_braces, unused_qualifications, missing_docs,
        anonymous_parameters, bare_trait_objects)]
#![allow(clippy::single_match, clippy::match_same_arms, clippy::match_ref_pats,
         clippy::clone_on_ref_ptr, clippy::needless_pass_by_value)]
#![deny(clippy::wrong_self_convention, clippy::used_underscore_binding,
        clippy::similar_names,
        clippy::missing_docs_in_private_items,
        clippy::non_ascii_literal, clippy::unicode_not_nfc,
        clippy::map_unwrap_or,
        clippy::shadow_unrelated, clippy::int_plus_one,
        clippy::string_add_assign, clippy::if_not_else,
        clippy::invalid_upcast_comparisons,
        clippy::cast_precision_loss, clippy::cast_lossless,
        clippy::cast_possible_wrap, clippy::cast_possible_truncation,
        clippy::mut_mut, clippy::items_after_statements,
        clippy::print_stdout, clippy::mem_forget, clippy::maybe_infinite_iter)]

#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate serde_derive;

pub mod value;
pub mod shape;
pub mod literal;
pub mod uid;
pub mod registry;
pub mod builtin;
pub mod config;
pub mod encode;
mod decode;
pub mod bsn;
pub mod ext;
pub mod codec;
pub mod error;
pub mod prelude;

use bson::Document;
use bson::oid::ObjectId;
use crate::codec::Codec;
use crate::error::Result;
use crate::value::Value;

pub use crate::shape::is_array_shaped;

/// The identity field of MongoDB documents.
pub const ID_KEY: &str = "_id";

/// Encodes a table with the default codec. See `Codec::encode()`.
pub fn encode(value: &mut Value, identity_required: bool) -> Result<Document> {
    Codec::default().encode(value, identity_required)
}

/// Decodes a document with the default codec. See `Codec::decode()`.
pub fn decode(document: &Document, as_array: bool) -> Result<Value> {
    Codec::default().decode(document, as_array)
}

/// A fresh `ObjectId`, the kind synthesized for missing `_id`s.
pub fn new_identifier() -> ObjectId {
    uid::new_identifier()
}
