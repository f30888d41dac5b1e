//! The extension type registry: recognizers and constructors for host
//! values that have no structural representation as a table.
//!
//! Object identifiers, the BSON null and dates can't be told apart from
//! ordinary data in an untyped table model, so the host materializes them
//! as tagged objects. An `ExtensionType` knows how to recognize one such
//! object, how to construct it from host-level arguments, and how to
//! convert it to and from its BSON form.

use std::fmt::Debug;
use std::sync::Arc;
use bson::Bson;
use bson::spec::ElementType;
use crate::builtin::{ ObjectIdType, NullType, DateType };
use crate::error::{ Error, ErrorKind, Result };
use crate::value::{ Object, Value };

/// A named special value kind, defined by the embedding host.
pub trait ExtensionType: Debug + Send + Sync {
    /// The name the host knows the type by, e.g. `"ObjectId"`.
    fn name(&self) -> &str;

    /// The BSON element type values of this type are stored as.
    fn element_type(&self) -> ElementType;

    /// Whether `value` is an instance of this type.
    fn is_instance(&self, value: &Value) -> bool;

    /// Constructs an instance from host-level arguments, the way a
    /// script would call the type's constructor.
    fn construct(&self, args: &[Value]) -> Result<Value>;

    /// Converts an instance to BSON. Only called with objects for which
    /// `is_instance` returned `true`.
    fn to_bson(&self, object: &Object) -> Result<Bson>;

    /// Materializes a BSON value of `element_type()` as an instance.
    fn from_bson(&self, bson: &Bson) -> Result<Value>;
}

/// An ordered set of extension types, consulted in registration order.
#[derive(Debug, Clone)]
pub struct Registry {
    /// The registered types.
    types: Vec<Arc<dyn ExtensionType>>,
}

impl Registry {
    /// A registry without any types. Encoding any host object and decoding
    /// object-ids, nulls and dates fails with it.
    pub fn empty() -> Self {
        Registry { types: Vec::new() }
    }

    /// Adds a type. A type already registered under the same name is
    /// replaced in place, and returned.
    pub fn register<T>(&mut self, ty: T) -> Option<Arc<dyn ExtensionType>>
        where T: ExtensionType + 'static
    {
        let ty: Arc<dyn ExtensionType> = Arc::new(ty);

        match self.types.iter_mut().find(|existing| existing.name() == ty.name()) {
            Some(existing) => Some(std::mem::replace(existing, ty)),
            None => {
                self.types.push(ty);
                None
            }
        }
    }

    /// Builder-style `register`.
    pub fn with<T>(mut self, ty: T) -> Self where T: ExtensionType + 'static {
        self.register(ty);
        self
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no types are registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Looks up a type by name.
    pub fn get(&self, name: &str) -> Option<&dyn ExtensionType> {
        self.types.iter().find(|ty| ty.name() == name).map(|ty| &**ty)
    }

    /// The first type `value` is an instance of.
    pub fn matching(&self, value: &Value) -> Option<&dyn ExtensionType> {
        self.types.iter().find(|ty| ty.is_instance(value)).map(|ty| &**ty)
    }

    /// The first type stored as `element_type` in BSON.
    pub fn for_element_type(&self, element_type: ElementType) -> Option<&dyn ExtensionType> {
        self.types
            .iter()
            .find(|ty| ty.element_type() == element_type)
            .map(|ty| &**ty)
    }

    /// Calls the constructor of the type named `name`.
    /// ```
    /// # use tabula::registry::Registry;
    /// # use tabula::value::Value;
    /// # fn main() -> tabula::error::Result<()> {
    /// let registry = Registry::default();
    /// let id = registry.construct("ObjectId", &[Value::from("5f0000000102030405000000")])?;
    /// let null = registry.construct("BSONNull", &[])?;
    ///
    /// assert!(id.as_object_id().is_some());
    /// assert!(null.is_bson_null());
    /// assert!(registry.construct("Regex", &[]).is_err());
    /// # Ok(())
    /// # }
    /// ```
    pub fn construct(&self, name: &str, args: &[Value]) -> Result<Value> {
        match self.get(name) {
            Some(ty) => ty.construct(args),
            None => Err(Error::new(
                ErrorKind::TypeError,
                format!("no extension type named `{}`", name),
            )),
        }
    }
}

/// The built-in types: `ObjectId`, `BSONNull` and `Date`.
impl Default for Registry {
    fn default() -> Self {
        Registry::empty()
            .with(ObjectIdType)
            .with(NullType)
            .with(DateType)
    }
}
