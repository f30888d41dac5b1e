//! The built-in extension types: `ObjectId`, `BSONNull` and `Date`.

use bson::{ Bson, DateTime };
use bson::oid::ObjectId;
use bson::spec::ElementType;
use crate::encode::integral_value;
use crate::error::{ Error, ErrorKind, Result, ResultExt };
use crate::registry::ExtensionType;
use crate::value::{ Object, Value };

/// Host class of object identifiers.
pub const OBJECT_ID_CLASS: &str = "ObjectId";
/// Host class of the BSON null sentinel.
pub const NULL_CLASS: &str = "BSONNull";
/// Host class of dates.
pub const DATE_CLASS: &str = "Date";

/// Field of an `ObjectId` object holding its 24-digit hex rendering.
pub const OBJECT_ID_KEY_FIELD: &str = "key";
/// Field of a `Date` object holding milliseconds since the Unix epoch.
pub const DATE_MILLIS_FIELD: &str = "millis";

/// Whether `value` is an object of class `class`.
fn has_class(value: &Value, class: &str) -> bool {
    value.as_object().map_or(false, |object| object.class() == class)
}

/// Object identifiers: `ObjectId.new(hex)`, stored as BSON object-id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjectIdType;

impl ExtensionType for ObjectIdType {
    fn name(&self) -> &str {
        OBJECT_ID_CLASS
    }

    fn element_type(&self) -> ElementType {
        ElementType::ObjectId
    }

    fn is_instance(&self, value: &Value) -> bool {
        has_class(value, OBJECT_ID_CLASS)
    }

    fn construct(&self, args: &[Value]) -> Result<Value> {
        match args {
            [Value::String(hex)] => {
                let oid = ObjectId::parse_str(hex)
                    .chain(|| format!("`{}` is not a 24-digit hex ObjectId", hex))?;
                Ok(Value::object_id(oid))
            }
            _ => Err(Error::new(
                ErrorKind::TypeError,
                "ObjectId.new() expects a single string argument",
            )),
        }
    }

    fn to_bson(&self, object: &Object) -> Result<Bson> {
        let hex = match object.field(OBJECT_ID_KEY_FIELD) {
            Some(&Value::String(ref hex)) => hex,
            _ => return Err(Error::new(
                ErrorKind::TypeError,
                "ObjectId:getKey() did not return a string",
            )),
        };

        ObjectId::parse_str(hex)
            .map(Bson::ObjectId)
            .chain(|| format!("`{}` is not a 24-digit hex ObjectId", hex))
    }

    fn from_bson(&self, bson: &Bson) -> Result<Value> {
        match *bson {
            Bson::ObjectId(oid) => self.construct(&[Value::String(oid.to_hex())]),
            _ => Err(unexpected(bson, OBJECT_ID_CLASS)),
        }
    }
}

/// The BSON null, distinct from the host's own absence of a value:
/// `BSONNull.new()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NullType;

impl ExtensionType for NullType {
    fn name(&self) -> &str {
        NULL_CLASS
    }

    fn element_type(&self) -> ElementType {
        ElementType::Null
    }

    fn is_instance(&self, value: &Value) -> bool {
        has_class(value, NULL_CLASS)
    }

    fn construct(&self, args: &[Value]) -> Result<Value> {
        if args.is_empty() {
            Ok(Value::bson_null())
        } else {
            Err(Error::new(ErrorKind::TypeError, "BSONNull.new() takes no arguments"))
        }
    }

    fn to_bson(&self, _: &Object) -> Result<Bson> {
        Ok(Bson::Null)
    }

    fn from_bson(&self, bson: &Bson) -> Result<Value> {
        match *bson {
            Bson::Null => self.construct(&[]),
            _ => Err(unexpected(bson, NULL_CLASS)),
        }
    }
}

/// Dates with millisecond precision: `Date.new(millis)`, stored as
/// BSON UTC datetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateType;

impl ExtensionType for DateType {
    fn name(&self) -> &str {
        DATE_CLASS
    }

    fn element_type(&self) -> ElementType {
        ElementType::DateTime
    }

    fn is_instance(&self, value: &Value) -> bool {
        has_class(value, DATE_CLASS)
    }

    fn construct(&self, args: &[Value]) -> Result<Value> {
        let millis = match *args {
            [Value::Integer(millis)] => Some(millis),
            [Value::Float(millis)] => integral_value(millis),
            _ => None,
        };

        millis.map(Value::date).ok_or_else(|| Error::new(
            ErrorKind::TypeError,
            "Date.new() expects integral milliseconds since the epoch, within 64 bits",
        ))
    }

    fn to_bson(&self, object: &Object) -> Result<Bson> {
        match object.field(DATE_MILLIS_FIELD) {
            Some(&Value::Integer(millis)) => Ok(Bson::DateTime(DateTime::from_millis(millis))),
            _ => Err(Error::new(
                ErrorKind::TypeError,
                "Date object has no integral `millis` field",
            )),
        }
    }

    fn from_bson(&self, bson: &Bson) -> Result<Value> {
        match *bson {
            Bson::DateTime(dt) => self.construct(&[Value::Integer(dt.timestamp_millis())]),
            _ => Err(unexpected(bson, DATE_CLASS)),
        }
    }
}

/// A BSON value of the wrong kind was handed to a constructor.
fn unexpected(bson: &Bson, class: &str) -> Error {
    Error::new(
        ErrorKind::TypeError,
        format!("can't construct {} from BSON {:?}", class, bson.element_type()),
    )
}

/// Constructors and accessors for the built-in host objects.
impl Value {
    /// An `ObjectId` object wrapping `oid`.
    pub fn object_id(oid: ObjectId) -> Self {
        Object::new(OBJECT_ID_CLASS)
            .with_field(OBJECT_ID_KEY_FIELD, oid.to_hex())
            .into()
    }

    /// The `BSONNull` sentinel.
    pub fn bson_null() -> Self {
        Object::new(NULL_CLASS).into()
    }

    /// A `Date` object, `millis` after the Unix epoch.
    pub fn date(millis: i64) -> Self {
        Object::new(DATE_CLASS)
            .with_field(DATE_MILLIS_FIELD, millis)
            .into()
    }

    /// The identifier, if this is a well-formed `ObjectId` object.
    pub fn as_object_id(&self) -> Option<ObjectId> {
        if !has_class(self, OBJECT_ID_CLASS) {
            return None;
        }

        self.as_object()
            .and_then(|object| object.field(OBJECT_ID_KEY_FIELD))
            .and_then(Value::as_str)
            .and_then(|hex| ObjectId::parse_str(hex).ok())
    }

    /// Whether this is the `BSONNull` sentinel.
    pub fn is_bson_null(&self) -> bool {
        has_class(self, NULL_CLASS)
    }

    /// Milliseconds since the epoch, if this is a `Date` object.
    pub fn as_date_millis(&self) -> Option<i64> {
        if !has_class(self, DATE_CLASS) {
            return None;
        }

        self.as_object()
            .and_then(|object| object.field(DATE_MILLIS_FIELD))
            .and_then(Value::as_integer)
    }
}
