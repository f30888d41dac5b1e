//! Structural validation of built BSON documents.

use bson::{ Bson, Document, RawBsonRef, RawDocument };
use bson::raw;
use tracing::warn;
use crate::error::{ Error, ErrorKind, Result, ResultExt };

/// Message of every validation failure.
const MALFORMED: &str = "malformed bson document";

/// Checks that `document` serializes to well-formed BSON which reads back
/// with the same number of elements at every level.
///
/// Keys and regular expressions containing a NUL byte can't be written as
/// C strings, whatever a `Document` in memory allows.
/// ```
/// # use bson::doc;
/// # use tabula::bsn::validate_document;
/// assert!(validate_document(&doc!{ "a": [1, { "b": "c" }] }).is_ok());
/// assert!(validate_document(&doc!{ "a\0b": 1 }).is_err());
/// ```
pub fn validate_document(document: &Document) -> Result<()> {
    check_names(document)?;

    let mut bytes = Vec::new();
    document.to_writer(&mut bytes).chain(MALFORMED)?;

    let raw = RawDocument::from_bytes(&bytes).chain(MALFORMED)?;
    let expected = document_len(document);
    let actual = raw_document_len(raw).chain(MALFORMED)?;

    if actual == expected {
        Ok(())
    } else {
        warn!(expected, actual, "element count mismatch after serialization");
        Err(Error::new(ErrorKind::EncodingError, MALFORMED))
    }
}

/// Looks for NUL bytes in the C strings of BSON: keys and regexes.
fn check_names(document: &Document) -> Result<()> {
    for (key, value) in document {
        if key.contains('\0') {
            warn!(key = %key.escape_debug(), "field name contains a NUL byte");
            return Err(Error::new(ErrorKind::EncodingError, MALFORMED).within(key));
        }

        check_value_names(value).within(key)?;
    }

    Ok(())
}

/// `check_names()` for a single value.
fn check_value_names(value: &Bson) -> Result<()> {
    match *value {
        Bson::Document(ref document) => check_names(document),
        Bson::Array(ref items) => {
            for (index, item) in items.iter().enumerate() {
                check_value_names(item).within(&index.to_string())?;
            }
            Ok(())
        }
        Bson::RegularExpression(ref regex)
            if regex.pattern.contains('\0') || regex.options.contains('\0') => {
            warn!("regular expression contains a NUL byte");
            Err(Error::new(ErrorKind::EncodingError, MALFORMED))
        }
        _ => Ok(()),
    }
}

/// Number of elements in `document`, nested ones included.
fn document_len(document: &Document) -> usize {
    document.values().map(|value| 1 + nested_len(value)).sum()
}

/// Number of elements nested inside `value`.
fn nested_len(value: &Bson) -> usize {
    match *value {
        Bson::Document(ref document) => document_len(document),
        Bson::Array(ref items) => items.iter().map(|item| 1 + nested_len(item)).sum(),
        _ => 0,
    }
}

/// `document_len()` for the serialized form.
fn raw_document_len(document: &RawDocument) -> raw::Result<usize> {
    let mut len = 0;

    for element in document {
        let (_, value) = element?;
        len += 1 + raw_nested_len(value)?;
    }

    Ok(len)
}

/// `nested_len()` for the serialized form.
fn raw_nested_len(value: RawBsonRef) -> raw::Result<usize> {
    match value {
        RawBsonRef::Document(document) => raw_document_len(document),
        RawBsonRef::Array(items) => {
            let mut len = 0;

            for item in items {
                len += 1 + raw_nested_len(item?)?;
            }

            Ok(len)
        }
        _ => Ok(0),
    }
}
