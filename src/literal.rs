//! Names of BSON element types, as used by MongoDB's `$type` aliases.

use bson::spec::ElementType;

/// Alias of every BSON element type. Aliases of the types not accepted
/// by `$type` (e.g. `undefined`) follow the same naming scheme.
static TYPE_NAMES: &[(ElementType, &str)] = &[
    (ElementType::Double,                  "double"),
    (ElementType::String,                  "string"),
    (ElementType::EmbeddedDocument,        "object"),
    (ElementType::Array,                   "array"),
    (ElementType::Binary,                  "binData"),
    (ElementType::Undefined,               "undefined"),
    (ElementType::ObjectId,                "objectId"),
    (ElementType::Boolean,                 "bool"),
    (ElementType::DateTime,                "date"),
    (ElementType::Null,                    "null"),
    (ElementType::RegularExpression,       "regex"),
    (ElementType::DbPointer,               "dbPointer"),
    (ElementType::JavaScriptCode,          "javascript"),
    (ElementType::Symbol,                  "symbol"),
    (ElementType::JavaScriptCodeWithScope, "javascriptWithScope"),
    (ElementType::Int32,                   "int"),
    (ElementType::Timestamp,               "timestamp"),
    (ElementType::Int64,                   "long"),
    (ElementType::Decimal128,              "decimal"),
    (ElementType::MaxKey,                  "maxKey"),
    (ElementType::MinKey,                  "minKey"),
];

/// Returns the alias of a BSON element type.
/// ```
/// # use bson::spec::ElementType;
/// # use tabula::literal::type_alias;
/// assert_eq!(type_alias(ElementType::ObjectId), "objectId");
/// assert_eq!(type_alias(ElementType::RegularExpression), "regex");
/// ```
pub fn type_alias(element_type: ElementType) -> &'static str {
    TYPE_NAMES
        .iter()
        .find(|&&(ty, _)| ty == element_type)
        .map_or("unknown", |&(_, name)| name)
}
