//! BSON documents to host tables.

use bson::{ Bson, Document };
use tracing::debug;
use crate::config::CodecConfig;
use crate::error::{ Error, Result, ResultExt };
use crate::registry::Registry;
use crate::shape::is_bson_array;
use crate::value::{ Table, Value };

/// One decode call's view of the codec.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Decoder<'a> {
    /// Materializes the element types without a structural counterpart.
    registry: &'a Registry,
    /// Nesting limit.
    config: &'a CodecConfig,
}

impl<'a> Decoder<'a> {
    /// Bundles the parts of a codec needed for decoding.
    pub fn new(registry: &'a Registry, config: &'a CodecConfig) -> Self {
        Decoder { registry, config }
    }

    /// Decodes a top-level document. If `as_array`, the values are keyed
    /// by their position `1..=n` and the field names are ignored.
    pub fn decode_document(&self, document: &Document, as_array: bool) -> Result<Table> {
        self.decode_fields(document, as_array, 1)
    }

    /// Decodes a value found at nesting level `depth`.
    pub fn decode_value(&self, bson: &Bson, depth: usize) -> Result<Value> {
        match *bson {
            Bson::Double(x) => Ok(Value::Float(x)),
            Bson::String(ref s) => Ok(Value::String(s.clone())),
            Bson::Boolean(b) => Ok(Value::Boolean(b)),
            Bson::Int32(i) => Ok(Value::Integer(i.into())),
            Bson::Int64(i) => Ok(Value::Integer(i)),
            Bson::Document(ref document) => {
                let as_array = is_bson_array(document);
                self.decode_fields(document, as_array, depth + 1).map(Value::Table)
            }
            Bson::Array(ref items) => self.decode_items(items, depth + 1).map(Value::Table),
            _ => self.decode_extension(bson),
        }
    }

    /// Decodes the fields of a document at nesting level `depth`.
    fn decode_fields(&self, document: &Document, as_array: bool, depth: usize) -> Result<Table> {
        self.config.check_depth(depth)?;

        let mut table = Table::with_capacity(document.len());

        for ((key, bson), index) in document.iter().zip(1_i64..) {
            let value = self.decode_value(bson, depth).within(key)?;

            if as_array {
                table.insert(index, value);
            } else {
                table.insert(key.as_str(), value);
            }
        }

        Ok(table)
    }

    /// Decodes the items of a BSON array at nesting level `depth`.
    fn decode_items(&self, items: &[Bson], depth: usize) -> Result<Table> {
        self.config.check_depth(depth)?;

        let mut table = Table::with_capacity(items.len());

        for (bson, index) in items.iter().zip(1_i64..) {
            let value = self.decode_value(bson, depth).within(&(index - 1).to_string())?;
            table.insert(index, value);
        }

        Ok(table)
    }

    /// Hands a non-structural element to the extension type claiming its
    /// element type.
    fn decode_extension(&self, bson: &Bson) -> Result<Value> {
        let element_type = bson.element_type();

        match self.registry.for_element_type(element_type) {
            Some(ty) => ty.from_bson(bson),
            None => {
                debug!(?element_type, "no extension type to decode with");
                Err(Error::unsupported(element_type))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bson::{ doc, Binary, Decimal128, JavaScriptCodeWithScope, Regex, Timestamp };
    use bson::spec::{ BinarySubtype, ElementType };
    use super::*;
    use crate::error::{ ErrorExt, ErrorKind };

    fn decode(document: &Document) -> Result<Table> {
        let registry = Registry::default();
        let config = CodecConfig::default();

        Decoder::new(&registry, &config).decode_document(document, false)
    }

    #[test]
    fn scalars_keep_their_kind() -> Result<()> {
        let table = decode(&doc!{
            "small": 7_i32,
            "large": 7_i64,
            "float": 7.0,
            "text": "seven",
            "flag": false,
        })?;

        assert_eq!(table.get("small"), Some(&Value::Integer(7)));
        assert_eq!(table.get("large"), Some(&Value::Integer(7)));
        assert_eq!(table.get("float"), Some(&Value::Float(7.0)));
        assert_eq!(table.get("text"), Some(&Value::from("seven")));
        assert_eq!(table.get("flag"), Some(&Value::Boolean(false)));

        Ok(())
    }

    #[test]
    fn arrays_and_array_like_documents_are_sequences() -> Result<()> {
        let table = decode(&doc!{
            "array": [10, 20],
            "indexed": { "0": "a", "1": "b" },
            "named": { "1": "a", "2": "b" },
        })?;

        assert_eq!(table.get("array"), Some(&Value::Table(Table::sequence(vec![10, 20]))));
        assert_eq!(table.get("indexed"), Some(&Value::Table(Table::sequence(vec!["a", "b"]))));
        assert_eq!(table.get("named"),
                   Some(&Value::Table(Table::new().with("1", "a").with("2", "b"))));

        Ok(())
    }

    #[test]
    fn top_level_as_array_ignores_names() -> Result<()> {
        let registry = Registry::default();
        let config = CodecConfig::default();
        let decoder = Decoder::new(&registry, &config);
        let table = decoder.decode_document(&doc!{ "x": 1, "y": 2 }, true)?;

        assert_eq!(table, Table::sequence(vec![1, 2]));

        Ok(())
    }

    #[test]
    fn unclaimed_element_types_are_unsupported() {
        let pattern = Regex { pattern: "^a".into(), options: "i".into() };
        let bytes = Binary { subtype: BinarySubtype::Generic, bytes: vec![1, 2, 3] };
        let regex = doc!{ "outer": { "r": pattern } };
        let binary = doc!{ "b": bytes };

        let error = decode(&regex).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::UnsupportedType);
        assert_eq!(error.element_type(), Some(ElementType::RegularExpression));
        assert_eq!(error.field_path().as_deref(), Some("outer.r"));

        let error = decode(&binary).unwrap_err();
        assert_eq!(error.element_type(), Some(ElementType::Binary));
    }

    #[test]
    fn every_unclaimed_element_type_is_reported() {
        let values = vec![
            (Bson::Timestamp(Timestamp { time: 1, increment: 2 }), ElementType::Timestamp),
            (Bson::Symbol("s".into()), ElementType::Symbol),
            (Bson::MinKey, ElementType::MinKey),
            (Bson::MaxKey, ElementType::MaxKey),
            (Bson::Decimal128(Decimal128::from_bytes([0; 16])), ElementType::Decimal128),
            (Bson::JavaScriptCode("x".into()), ElementType::JavaScriptCode),
            (
                Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope {
                    code: "x".into(),
                    scope: doc!{},
                }),
                ElementType::JavaScriptCodeWithScope,
            ),
            (Bson::Undefined, ElementType::Undefined),
        ];

        for (value, element_type) in values {
            let error = decode(&doc!{ "list": [1, value] }).unwrap_err();

            assert_eq!(error.kind(), ErrorKind::UnsupportedType);
            assert_eq!(error.element_type(), Some(element_type));
            assert_eq!(error.field_path().as_deref(), Some("list.1"));
        }
    }

    #[test]
    fn empty_registry_leaves_builtins_unsupported() {
        let registry = Registry::empty();
        let config = CodecConfig::default();
        let decoder = Decoder::new(&registry, &config);
        let error = decoder.decode_document(&doc!{ "n": Bson::Null }, false).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::UnsupportedType);
        assert_eq!(error.element_type(), Some(ElementType::Null));
    }

    #[test]
    fn nesting_limit_applies_to_arrays_too() {
        let registry = Registry::default();
        let config = CodecConfig::default().with_max_depth(2);
        let decoder = Decoder::new(&registry, &config);

        assert!(decoder.decode_document(&doc!{ "a": [1] }, false).is_ok());

        let error = decoder.decode_document(&doc!{ "a": [[1]] }, false).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ResourceExhausted);
    }
}
