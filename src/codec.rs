//! The codec context: configuration, extension types and identifier
//! generation, bundled and passed around explicitly.

use std::sync::Arc;
use bson::{ Bson, Document };
use bson::oid::ObjectId;
use tracing::trace;
use crate::ID_KEY;
use crate::bsn::validate_document;
use crate::config::CodecConfig;
use crate::decode::Decoder;
use crate::encode::{ Encoded, Encoder };
use crate::error::{ Error, ErrorKind, Result, ResultExt };
use crate::ext::DocumentExt;
use crate::registry::Registry;
use crate::uid::{ IdGenerator, ObjectIdGenerator };
use crate::value::Value;

bitflags! {
    /// Options of a single encode call.
    ///
    /// ```
    /// # use tabula::codec::{ Codec, EncodeFlags };
    /// # use tabula::value::{ Table, Value };
    /// # fn main() -> tabula::error::Result<()> {
    /// let codec = Codec::default();
    /// let mut value = Value::Table(Table::new().with("a", 1));
    /// let document = codec.encode_with(
    ///     &mut value,
    ///     EncodeFlags::IDENTITY_REQUIRED | EncodeFlags::VALIDATE,
    /// )?;
    ///
    /// assert_eq!(document.keys().next().map(String::as_str), Some("_id"));
    /// # Ok(())
    /// # }
    /// ```
    #[derive(Default)]
    pub struct EncodeFlags: u8 {
        /// Make sure the document has an `_id`, and write it first.
        const IDENTITY_REQUIRED = 0b0000_0001;
        /// Structurally validate the finished document.
        const VALIDATE          = 0b0000_0010;
    }
}

/// The result of encoding a batch of documents to be inserted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodedBatch {
    /// The documents, in input order.
    pub documents: Vec<Document>,
    /// The `_id` of each document, supplied or synthesized, in input order.
    pub ids: Vec<Value>,
}

/// A BSON codec, the context of every encode and decode.
///
/// Independent codecs may coexist. A codec is cheap to clone and can be
/// shared between threads; the only state mutated by its operations is
/// the counter of its identifier generator.
#[derive(Debug, Clone)]
pub struct Codec {
    /// Limits and defaults.
    config: CodecConfig,
    /// Special host values.
    registry: Arc<Registry>,
    /// Source of synthesized `_id`s.
    ids: Arc<dyn IdGenerator>,
}

impl Codec {
    /// Creates a codec with the built-in extension types.
    pub fn new(config: CodecConfig) -> Result<Self> {
        config.check()?;

        Ok(Codec {
            config,
            registry: Arc::new(Registry::default()),
            ids: Arc::new(ObjectIdGenerator),
        })
    }

    /// Replaces the extension types.
    pub fn with_registry(self, registry: Registry) -> Self {
        Codec { registry: Arc::new(registry), ..self }
    }

    /// Replaces the generator of synthesized `_id`s.
    pub fn with_id_generator<G>(self, ids: G) -> Self where G: IdGenerator + 'static {
        Codec { ids: Arc::new(ids), ..self }
    }

    /// The configuration.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// The extension types.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes a table into a new document, validating it if the
    /// configuration says so.
    ///
    /// If `identity_required` and the table has no `_id`, a fresh
    /// `ObjectId` is written as the first field of the document, and
    /// stored in the table under `_id` once encoding succeeded.
    pub fn encode(&self, value: &mut Value, identity_required: bool) -> Result<Document> {
        let mut flags = EncodeFlags::empty();

        flags.set(EncodeFlags::IDENTITY_REQUIRED, identity_required);
        flags.set(EncodeFlags::VALIDATE, self.config.validate);

        self.encode_with(value, flags)
    }

    /// Encodes a table into a new document.
    pub fn encode_with(&self, value: &mut Value, flags: EncodeFlags) -> Result<Document> {
        let mut document = Document::new();
        self.encode_into(&mut document, value, flags)?;
        Ok(document)
    }

    /// Encodes a table into `document`, which must be empty. On error,
    /// neither `document` nor `value` is modified.
    pub fn encode_into(
        &self,
        document: &mut Document,
        value: &mut Value,
        flags: EncodeFlags,
    ) -> Result<()> {
        if !document.is_empty() {
            return Err(Error::new(
                ErrorKind::EncodingError,
                "document to encode into is not empty",
            ));
        }

        let encoded = self.build(value, flags)?;

        if let Some(oid) = encoded.generated_id {
            write_back_identity(value, oid);
        }

        *document = encoded.document;

        Ok(())
    }

    /// Encodes the documents of an insertion, identity required. Nothing
    /// is written back to `values` unless all of them encode.
    pub fn encode_many(&self, values: &mut [Value]) -> Result<EncodedBatch> {
        let mut flags = EncodeFlags::IDENTITY_REQUIRED;
        flags.set(EncodeFlags::VALIDATE, self.config.validate);

        let mut batch = EncodedBatch {
            documents: Vec::with_capacity(values.len()),
            ids: Vec::with_capacity(values.len()),
        };
        let mut generated = Vec::with_capacity(values.len());

        for value in values.iter() {
            let encoded = self.build(value, flags)?;
            let id = match encoded.generated_id {
                Some(oid) => Value::object_id(oid),
                None => supplied_identity(value)?,
            };

            batch.documents.push(encoded.document);
            batch.ids.push(id);
            generated.push(encoded.generated_id);
        }

        for (value, oid) in values.iter_mut().zip(generated) {
            if let Some(oid) = oid {
                write_back_identity(value, oid);
            }
        }

        Ok(batch)
    }

    /// Decodes a document into a table. If `as_array`, the values are
    /// keyed by position, `1..=n`.
    pub fn decode(&self, document: &Document, as_array: bool) -> Result<Value> {
        self.decoder().decode_document(document, as_array).map(Value::Table)
    }

    /// Decodes query results, each as a document-shaped table.
    pub fn decode_many<'a, I>(&self, documents: I) -> Result<Vec<Value>>
        where I: IntoIterator<Item = &'a Document>
    {
        documents
            .into_iter()
            .map(|document| self.decode(document, false))
            .collect()
    }

    /// Decodes the single field `key` of `document`, if it exists.
    pub fn field_value(&self, document: &Document, key: &str) -> Result<Option<Value>> {
        document
            .get(key)
            .map(|bson| self.decoder().decode_value(bson, 1).within(key))
            .transpose()
    }

    /// Decodes the `_id` of a document, e.g. one returned by the server
    /// after an insertion.
    pub fn decode_identity(&self, document: &Document) -> Result<Value> {
        let id = document.try_get(ID_KEY)?;

        match *id {
            Bson::Document(_) => Err(Error::new(
                ErrorKind::TypeError,
                "`_id` can't be a document",
            )),
            Bson::Array(_) => Err(Error::new(
                ErrorKind::TypeError,
                "`_id` can't be an array",
            )),
            _ => self.decoder().decode_value(id, 1).within(ID_KEY),
        }
    }

    /// Encodes without writing anything back.
    fn build(&self, value: &Value, flags: EncodeFlags) -> Result<Encoded> {
        let table = value.as_table().ok_or_else(|| Error::new(
            ErrorKind::TypeError,
            format!("not a table: {}", value.type_name()),
        ))?;

        let encoder = Encoder::new(&self.registry, &*self.ids, &self.config);
        let encoded = encoder.encode_table(table, flags.contains(EncodeFlags::IDENTITY_REQUIRED))?;

        if flags.contains(EncodeFlags::VALIDATE) {
            validate_document(&encoded.document)?;
        }

        Ok(encoded)
    }

    /// A decoder borrowing this codec's registry and limits.
    fn decoder(&self) -> Decoder<'_> {
        Decoder::new(&self.registry, &self.config)
    }
}

/// The built-in extension types, a standard identifier generator and the
/// default limits.
impl Default for Codec {
    fn default() -> Self {
        Codec {
            config: CodecConfig::default(),
            registry: Arc::new(Registry::default()),
            ids: Arc::new(ObjectIdGenerator),
        }
    }
}

/// Stores a synthesized `_id` in the source table.
fn write_back_identity(value: &mut Value, oid: ObjectId) {
    if let Some(table) = value.as_table_mut() {
        trace!(id = %oid, "writing back synthesized identity");
        table.insert(ID_KEY, Value::object_id(oid));
    }
}

/// The `_id` the caller put in the table.
fn supplied_identity(value: &Value) -> Result<Value> {
    value
        .as_table()
        .and_then(|table| table.get_str(ID_KEY))
        .cloned()
        .ok_or_else(|| Error::new(ErrorKind::MissingField, "missing field `_id`"))
}
