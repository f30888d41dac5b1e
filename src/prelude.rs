//! The Tabula prelude provides re-exports of the most commonly used traits
//! and types for convenience, including ones from crate `bson`.

pub use crate::value::{ Key, Value, Table, Object };
pub use crate::codec::{ Codec, EncodeFlags, EncodedBatch };
pub use crate::config::CodecConfig;
pub use crate::registry::{ Registry, ExtensionType };
pub use crate::uid::{ IdGenerator, ObjectIdGenerator, SequentialIdGenerator };
pub use crate::ext::DocumentExt;
pub use crate::error::{ Error, ErrorKind, ErrorExt, Result, ResultExt };
pub use crate::{ encode, decode, is_array_shaped, new_identifier };
pub use bson::{ Bson, Document, oid::ObjectId };
