//! Array-versus-document inference, for tables and for BSON documents.
//!
//! Neither representation has a structural array type: a table is a
//! sequence when keyed exactly `1..=n`, a BSON document is an array when
//! keyed exactly `"0".."n-1"` in order.

use bson::Document;
use crate::value::{ Key, Table, Value };

/// Returns the length of `table` if it is array-shaped.
///
/// The empty table is not array-shaped: empty-array and empty-document
/// intent are indistinguishable, and it defaults to a document.
pub fn array_len(table: &Table) -> Option<usize> {
    let len = table.len();

    if len == 0 {
        return None;
    }

    // Keys are unique, so `len` distinct keys within `1..=len` are
    // exactly `1..=len`.
    let contiguous = table.keys().all(|key| match *key {
        Key::Integer(i) => i >= 1 && (i as u64) <= len as u64,
        _ => false,
    });

    if contiguous {
        Some(len)
    } else {
        None
    }
}

/// Whether `value` is a table that encodes as a BSON array.
/// ```
/// # use tabula::value::{ Table, Value };
/// # use tabula::shape::is_array_shaped;
/// let seq = Table::sequence(vec!["a", "b", "c"]);
/// let gap = Table::new().with(1, "a").with(3, "c");
///
/// assert!(is_array_shaped(&Value::Table(seq)));
/// assert!(!is_array_shaped(&Value::Table(gap)));
/// assert!(!is_array_shaped(&Value::Table(Table::new())));
/// assert!(!is_array_shaped(&Value::from("abc")));
/// ```
pub fn is_array_shaped(value: &Value) -> bool {
    value.as_table().and_then(array_len).is_some()
}

/// Whether the keys of `doc` are exactly `"0","1",...,"n-1"` in order.
/// The empty document qualifies.
pub fn is_bson_array(doc: &Document) -> bool {
    doc.keys().enumerate().all(|(index, key)| is_index_key(key, index))
}

/// Whether `key` is the canonical decimal rendering of `index`.
fn is_index_key(key: &str, index: usize) -> bool {
    // Rejects "01", "+1" and the like, which `parse` would accept.
    let canonical = key == "0" || !key.starts_with('0');
    canonical
        && key.bytes().all(|b| b.is_ascii_digit())
        && key.parse::<usize>().ok() == Some(index)
}
