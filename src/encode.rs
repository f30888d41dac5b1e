//! Host tables to BSON documents.

use bson::{ Bson, Document };
use bson::oid::ObjectId;
use tracing::trace;
use crate::ID_KEY;
use crate::config::CodecConfig;
use crate::error::{ Error, ErrorKind, Result, ResultExt };
use crate::registry::Registry;
use crate::shape::array_len;
use crate::uid::IdGenerator;
use crate::value::{ Table, Value };

/// 2<sup>63</sup>, the smallest float too large for an `i64`.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

/// The numeric coercion policy: finite floats with no fractional part
/// that fit an `i64` become `Int64`, every other float stays a `Double`.
/// ```
/// # use bson::Bson;
/// # use tabula::encode::coerce_number;
/// assert_eq!(coerce_number(5.0), Bson::Int64(5));
/// assert_eq!(coerce_number(5.5), Bson::Double(5.5));
/// assert_eq!(coerce_number(1e300), Bson::Double(1e300));
/// ```
pub fn coerce_number(x: f64) -> Bson {
    integral_value(x).map_or(Bson::Double(x), Bson::Int64)
}

/// `x` as an `i64`, if it is finite, has no fractional part and is
/// within range, so that the conversion is exact.
#[allow(clippy::float_cmp, clippy::cast_possible_truncation)]
pub(crate) fn integral_value(x: f64) -> Option<i64> {
    if x.is_finite() && x.trunc() == x && x >= -I64_LIMIT && x < I64_LIMIT {
        Some(x as i64)
    } else {
        None
    }
}

/// A finished top-level document, and the identifier synthesized for it,
/// which still has to be written back to the source table.
#[derive(Debug)]
pub(crate) struct Encoded {
    /// The document, `_id` first if identity was required.
    pub document: Document,
    /// The `_id` created because the table had none.
    pub generated_id: Option<ObjectId>,
}

/// One encode call's view of the codec.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Encoder<'a> {
    /// Converts host objects.
    registry: &'a Registry,
    /// Synthesizes missing `_id`s.
    ids: &'a dyn IdGenerator,
    /// Nesting limit.
    config: &'a CodecConfig,
}

impl<'a> Encoder<'a> {
    /// Bundles the parts of a codec needed for encoding.
    pub fn new(registry: &'a Registry, ids: &'a dyn IdGenerator, config: &'a CodecConfig) -> Self {
        Encoder { registry, ids, config }
    }

    /// Encodes a top-level table into a fresh document. The table is not
    /// modified; a synthesized `_id` is reported in the result instead.
    pub fn encode_table(&self, table: &Table, identity: bool) -> Result<Encoded> {
        let depth = 1;
        self.config.check_depth(depth)?;

        let mut document = Document::new();
        let mut generated_id = None;

        if identity {
            match table.get_str(ID_KEY) {
                Some(id) => {
                    let id = self.encode_value(id, depth).within(ID_KEY)?;
                    document.insert(ID_KEY, id);
                }
                None => {
                    let oid = self.ids.generate();
                    trace!(id = %oid, "synthesized identity");
                    document.insert(ID_KEY, oid);
                    generated_id = Some(oid);
                }
            }
        }

        // With identity required the table has an `_id` by now, at least
        // logically, so it's never a sequence.
        let is_sequence = !identity && array_len(table).is_some();

        if is_sequence {
            for (index, item) in self.encode_items(table, depth)?.into_iter().enumerate() {
                document.insert(index.to_string(), item);
            }
        } else {
            self.append_fields(&mut document, table, identity, depth)?;
        }

        Ok(Encoded { document, generated_id })
    }

    /// Appends the entries of a document-shaped table to `document`.
    fn append_fields(
        &self,
        document: &mut Document,
        table: &Table,
        identity: bool,
        depth: usize,
    ) -> Result<()> {
        for (key, value) in table {
            let name = key.field_name()?;

            if identity && name == ID_KEY {
                trace!("`_id` already written, skipping");
                continue;
            }

            if document.contains_key(name.as_ref()) {
                return Err(Error::new(
                    ErrorKind::TypeError,
                    format!("duplicate key `{}`", name),
                ));
            }

            let bson = self.encode_value(value, depth).within(&name)?;
            document.insert(name.into_owned(), bson);
        }

        Ok(())
    }

    /// Encodes the items of an array-shaped table in ascending key order,
    /// whatever the order of the table's entries.
    fn encode_items(&self, table: &Table, depth: usize) -> Result<Vec<Bson>> {
        let mut entries: Vec<_> = table
            .iter()
            .filter_map(|(key, value)| key.as_integer().map(|index| (index, value)))
            .collect();

        entries.sort_by_key(|&(index, _)| index);

        entries
            .into_iter()
            .map(|(index, value)| {
                self.encode_value(value, depth).within(&(index - 1).to_string())
            })
            .collect()
    }

    /// Encodes a value found at nesting level `depth`.
    fn encode_value(&self, value: &Value, depth: usize) -> Result<Bson> {
        match *value {
            Value::Boolean(b) => Ok(Bson::Boolean(b)),
            Value::Integer(i) => Ok(Bson::Int64(i)),
            Value::Float(x) => Ok(coerce_number(x)),
            Value::String(ref s) => Ok(Bson::String(s.clone())),
            Value::Table(ref table) => self.encode_nested(table, depth + 1),
            Value::Object(ref object) => match self.registry.matching(value) {
                Some(ty) => ty.to_bson(object),
                None => Err(Error::new(
                    ErrorKind::TypeError,
                    format!("invalid value type: {}", object.class()),
                )),
            },
        }
    }

    /// Encodes a nested table, at nesting level `depth`, into a fresh
    /// sub-array or sub-document.
    fn encode_nested(&self, table: &Table, depth: usize) -> Result<Bson> {
        self.config.check_depth(depth)?;

        if array_len(table).is_some() {
            self.encode_items(table, depth).map(Bson::Array)
        } else {
            let mut document = Document::new();
            self.append_fields(&mut document, table, false, depth)?;
            Ok(Bson::Document(document))
        }
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;
    use super::*;
    use crate::error::ErrorExt;
    use crate::uid::SequentialIdGenerator;

    fn encode(table: &Table, identity: bool) -> Result<Encoded> {
        let registry = Registry::default();
        let ids = SequentialIdGenerator::new(1, [0; 5]);
        let config = CodecConfig::default();

        Encoder::new(&registry, &ids, &config).encode_table(table, identity)
    }

    #[test]
    fn number_coercion() {
        assert_eq!(coerce_number(-0.0), Bson::Int64(0));
        assert_eq!(coerce_number(-3.0), Bson::Int64(-3));
        assert_eq!(coerce_number(-I64_LIMIT), Bson::Int64(i64::MIN));
        assert_eq!(coerce_number(I64_LIMIT), Bson::Double(I64_LIMIT));
        assert_eq!(coerce_number(0.1), Bson::Double(0.1));
        assert!(matches!(coerce_number(f64::NAN), Bson::Double(x) if x.is_nan()));
        assert_eq!(coerce_number(f64::INFINITY), Bson::Double(f64::INFINITY));
    }

    #[test]
    fn integral_values_are_exact() {
        assert_eq!(integral_value(42.0), Some(42));
        assert_eq!(integral_value(-I64_LIMIT), Some(i64::MIN));
        assert_eq!(integral_value(I64_LIMIT), None);
        assert_eq!(integral_value(1e300), None);
        assert_eq!(integral_value(-1e300), None);
        assert_eq!(integral_value(2.5), None);
        assert_eq!(integral_value(f64::NAN), None);
    }

    #[test]
    fn sequences_follow_key_order() -> Result<()> {
        let shuffled = Table::new().with(3, "c").with(1, "a").with(2, "b");
        let outer = Table::new().with("letters", shuffled.clone());

        assert_eq!(encode(&shuffled, false)?.document,
                   doc!{ "0": "a", "1": "b", "2": "c" });
        assert_eq!(encode(&outer, false)?.document,
                   doc!{ "letters": ["a", "b", "c"] });

        Ok(())
    }

    #[test]
    fn integer_keys_of_documents_become_text() -> Result<()> {
        let table = Table::new().with(1, "a").with(5, "e");

        assert_eq!(encode(&table, false)?.document, doc!{ "1": "a", "5": "e" });

        Ok(())
    }

    #[test]
    fn duplicate_field_names_are_rejected() {
        let table = Table::new().with(1, "number").with("1", "text").with("x", 0);
        let error = encode(&table, false).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::TypeError);
        assert!(error.message().contains("duplicate key `1`"));
    }

    #[test]
    fn identity_table_is_never_a_sequence() -> Result<()> {
        let table = Table::sequence(vec!["a", "b"]);
        let encoded = encode(&table, true)?;
        let keys: Vec<&str> = encoded.document.keys().map(String::as_str).collect();

        assert_eq!(keys, ["_id", "1", "2"]);
        assert!(encoded.generated_id.is_some());

        Ok(())
    }

    #[test]
    fn unknown_objects_are_rejected() {
        let table = Table::new().with("f", crate::value::Object::new("Function"));
        let error = encode(&table, false).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::TypeError);
        assert!(error.message().contains("invalid value type: Function"));
        assert_eq!(error.field_path().as_deref(), Some("f"));
    }

    #[test]
    fn boolean_keys_are_rejected() {
        let table = Table::new().with(true, "yes");
        let error = encode(&table, false).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::TypeError);
        assert!(error.message().contains("invalid key type"));
    }
}
