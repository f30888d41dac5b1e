//! The dynamically-typed host value model: scalars, tables and tagged
//! host objects.

use std::fmt;
use std::borrow::Cow;
use std::iter::FromIterator;
use indexmap::IndexMap;
use crate::error::{ Error, ErrorKind, Result };

/// A key of a `Table`.
///
/// Hosts key tables by arbitrary values; only text and integers can
/// become BSON field names. `Boolean` exists so that such tables can
/// still be represented, and rejected at encode time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    /// An integral numeric key. Sequences are keyed `1..=n`.
    Integer(i64),
    /// A text key.
    String(String),
    /// A boolean key. Never encodable.
    Boolean(bool),
}

impl Key {
    /// Name of the kind of this key, for error messages.
    pub fn type_name(&self) -> &'static str {
        match *self {
            Key::Integer(_) => "number",
            Key::String(_)  => "string",
            Key::Boolean(_) => "boolean",
        }
    }

    /// The BSON field name for this key. Integers are rendered in decimal.
    pub fn field_name(&self) -> Result<Cow<'_, str>> {
        match *self {
            Key::String(ref s) => Ok(Cow::Borrowed(s.as_str())),
            Key::Integer(i) => Ok(Cow::Owned(i.to_string())),
            Key::Boolean(_) => Err(Error::new(
                ErrorKind::TypeError,
                format!("invalid key type: {}", self.type_name()),
            )),
        }
    }

    /// Returns the key as a sequence index if it is an integer.
    pub fn as_integer(&self) -> Option<i64> {
        match *self {
            Key::Integer(i) => Some(i),
            _ => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Key::Integer(i)    => write!(formatter, "{}", i),
            Key::String(ref s) => formatter.write_str(s),
            Key::Boolean(b)    => write!(formatter, "{}", b),
        }
    }
}

impl From<&str> for Key {
    fn from(key: &str) -> Self {
        Key::String(key.to_owned())
    }
}

impl From<String> for Key {
    fn from(key: String) -> Self {
        Key::String(key)
    }
}

impl From<i64> for Key {
    fn from(key: i64) -> Self {
        Key::Integer(key)
    }
}

impl From<i32> for Key {
    fn from(key: i32) -> Self {
        Key::Integer(key.into())
    }
}

impl From<bool> for Key {
    fn from(key: bool) -> Self {
        Key::Boolean(key)
    }
}

/// A host value, the input of encoding and the output of decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `true` or `false`.
    Boolean(bool),
    /// An integral number.
    Integer(i64),
    /// A floating-point number. Integral values encode as integers.
    Float(f64),
    /// A text string.
    String(String),
    /// A nested table, either array-shaped or document-shaped.
    Table(Table),
    /// A tagged host object, e.g. an `ObjectId` or a `BSONNull`.
    Object(Object),
}

impl Value {
    /// Name of the dynamic kind of this value, for error messages.
    /// Objects report their class.
    pub fn type_name(&self) -> &str {
        match *self {
            Value::Boolean(_)     => "boolean",
            Value::Integer(_)     => "number",
            Value::Float(_)       => "number",
            Value::String(_)      => "string",
            Value::Table(_)       => "table",
            Value::Object(ref o)  => o.class(),
        }
    }

    /// Returns the table if this value is one.
    pub fn as_table(&self) -> Option<&Table> {
        match *self {
            Value::Table(ref table) => Some(table),
            _ => None,
        }
    }

    /// Returns the table mutably if this value is one.
    pub fn as_table_mut(&mut self) -> Option<&mut Table> {
        match *self {
            Value::Table(ref mut table) => Some(table),
            _ => None,
        }
    }

    /// Returns the object if this value is one.
    pub fn as_object(&self) -> Option<&Object> {
        match *self {
            Value::Object(ref object) => Some(object),
            _ => None,
        }
    }

    /// Returns the string slice if this value is a string.
    pub fn as_str(&self) -> Option<&str> {
        match *self {
            Value::String(ref s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Returns the integer if this value is an integer.
    pub fn as_integer(&self) -> Option<i64> {
        match *self {
            Value::Integer(i) => Some(i),
            _ => None,
        }
    }

    /// Returns the float if this value is a float.
    pub fn as_float(&self) -> Option<f64> {
        match *self {
            Value::Float(x) => Some(x),
            _ => None,
        }
    }

    /// Returns the boolean if this value is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Boolean(b) => Some(b),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Table> for Value {
    fn from(value: Table) -> Self {
        Value::Table(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}

/// An associative container, the only structured host value.
///
/// Entries iterate in insertion order. Equality doesn't depend on order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// The entries.
    entries: IndexMap<Key, Value>,
}

impl Table {
    /// Creates an empty table.
    pub fn new() -> Self {
        Table::default()
    }

    /// Creates an empty table with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Table { entries: IndexMap::with_capacity(capacity) }
    }

    /// Creates a sequence, keying the items `1..=n`.
    /// ```
    /// # use tabula::value::{ Table, Value };
    /// let seq = Table::sequence(vec!["a", "b"]);
    /// assert_eq!(seq.get(1), Some(&Value::from("a")));
    /// assert_eq!(seq.get(2), Some(&Value::from("b")));
    /// ```
    pub fn sequence<I>(items: I) -> Self
        where I: IntoIterator,
              I::Item: Into<Value>,
    {
        items
            .into_iter()
            .zip(1_i64..)
            .map(|(item, index)| {
                let value: Value = item.into();
                (Key::Integer(index), value)
            })
            .collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up the value under `key`.
    pub fn get<K: Into<Key>>(&self, key: K) -> Option<&Value> {
        let key: Key = key.into();
        self.entries.get(&key)
    }

    /// Looks up the value under the text key `key`, without allocating
    /// a `Key` on the caller's side.
    pub fn get_str(&self, key: &str) -> Option<&Value> {
        self.entries.get(&Key::from(key))
    }

    /// Looks up the value under `key` mutably.
    pub fn get_mut<K: Into<Key>>(&mut self, key: K) -> Option<&mut Value> {
        let key: Key = key.into();
        self.entries.get_mut(&key)
    }

    /// Whether there is a value under `key`.
    pub fn contains_key<K: Into<Key>>(&self, key: K) -> bool {
        let key: Key = key.into();
        self.entries.contains_key(&key)
    }

    /// Sets `key` to `value`, returning the previous value if any.
    /// An existing key keeps its position.
    pub fn insert<K, V>(&mut self, key: K, value: V) -> Option<Value>
        where K: Into<Key>,
              V: Into<Value>,
    {
        self.entries.insert(key.into(), value.into())
    }

    /// Builder-style `insert`.
    pub fn with<K, V>(mut self, key: K, value: V) -> Self
        where K: Into<Key>,
              V: Into<Value>,
    {
        self.insert(key, value);
        self
    }

    /// Removes the value under `key`, preserving the order of the rest.
    pub fn remove<K: Into<Key>>(&mut self, key: K) -> Option<Value> {
        let key: Key = key.into();
        self.entries.shift_remove(&key)
    }

    /// Iterates over the entries in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, Key, Value> {
        self.entries.iter()
    }

    /// Iterates over the keys in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, Key, Value> {
        self.entries.keys()
    }
}

impl<K, V> FromIterator<(K, V)> for Table where K: Into<Key>, V: Into<Value> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Table {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
        }
    }
}

impl IntoIterator for Table {
    type Item = (Key, Value);
    type IntoIter = indexmap::map::IntoIter<Key, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = (&'a Key, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, Key, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// A host object: a table of fields tagged with the name of its class.
///
/// The class is what extension types recognize, so that e.g. an
/// `ObjectId` is never mistaken for an ordinary table with a `key` field.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    /// Name of the host class.
    class: Cow<'static, str>,
    /// The object's own fields.
    fields: Table,
}

impl Object {
    /// Creates an object of the given class with no fields.
    pub fn new<C: Into<Cow<'static, str>>>(class: C) -> Self {
        Object { class: class.into(), fields: Table::new() }
    }

    /// Builder-style setter for a field.
    pub fn with_field<V: Into<Value>>(mut self, name: &str, value: V) -> Self {
        self.fields.insert(name, value);
        self
    }

    /// Name of the host class.
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Looks up the field called `name`.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get_str(name)
    }

    /// All fields of the object.
    pub fn fields(&self) -> &Table {
        &self.fields
    }

    /// All fields of the object, mutably.
    pub fn fields_mut(&mut self) -> &mut Table {
        &mut self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_of_keys() -> Result<()> {
        assert_eq!(Key::from("name").field_name()?, "name");
        assert_eq!(Key::from(42).field_name()?, "42");
        assert_eq!(Key::from(-7_i64).field_name()?, "-7");

        let error = Key::from(true).field_name().unwrap_err();
        assert_eq!(crate::error::ErrorExt::kind(&error), ErrorKind::TypeError);
        assert!(error.message().contains("invalid key type: boolean"));

        Ok(())
    }

    #[test]
    fn table_keeps_insertion_order() {
        let table = Table::new()
            .with("zeta", 1)
            .with("alpha", 2)
            .with(3, "three");

        let keys: Vec<String> = table.keys().map(ToString::to_string).collect();
        assert_eq!(keys, ["zeta", "alpha", "3"]);
    }

    #[test]
    fn table_equality_ignores_order() {
        let a = Table::new().with("x", 1).with("y", 2);
        let b = Table::new().with("y", 2).with("x", 1);

        assert_eq!(a, b);
        assert_ne!(a, b.with("z", 3));
    }

    #[test]
    fn removal_preserves_order() {
        let mut table = Table::sequence(vec![10, 20, 30]);

        assert_eq!(table.remove(2), Some(Value::Integer(20)));
        assert_eq!(table.keys().cloned().collect::<Vec<_>>(),
                   [Key::Integer(1), Key::Integer(3)]);
        assert!(!table.contains_key(2));
    }
}
