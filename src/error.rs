//! `Error` and `Result` types arising out of encoding and decoding.

use std::fmt;
use std::error;
use std::result;
use std::ops::Deref;
use std::borrow::Cow;
use bson::spec::ElementType;
use backtrace::Backtrace;
use crate::literal::type_alias;

/// Longest message an `Error` will carry, in bytes. Longer messages are
/// truncated at the nearest preceding character boundary.
pub const MAX_MESSAGE_LEN: usize = 504;

/// Slightly augmented trait for backtrace-able errors.
#[allow(clippy::module_name_repetitions)]
pub trait ErrorExt: error::Error {
    /// Similar to `std::error::Error::source()`, but with richer type info.
    fn reason(&self) -> Option<&(dyn ErrorExt + 'static)> {
        None
    }

    /// Returns the deepest possible backtrace, if any.
    fn backtrace(&self) -> Option<&Backtrace> {
        self.reason().and_then(ErrorExt::backtrace)
    }

    /// Structured error kind.
    fn kind(&self) -> ErrorKind;

    /// Until subtrait coercions are implemented, this helper method
    /// should return the receiver as an `&std::error::Error` trait object.
    fn as_std_error(&self) -> &(dyn error::Error + 'static);
}

/// A trait for conveniently propagating errors up the call stack.
pub trait ResultExt<T>: Sized {
    /// If this `Result` is an `Err`, then prepend the specified error
    /// to the front of the linked list of causes.
    /// ```
    /// # use tabula::error::{ Error, ErrorKind, ErrorExt, Result, ResultExt };
    /// #
    /// # fn main() -> Result<()> {
    /// let ok: Result<_> = Ok("success!");
    /// let ok_chained = ok.chain("dummy error message")?;
    /// assert_eq!(ok_chained, "success!");
    ///
    /// let err: Result<i32> = Err(Error::new(
    ///     ErrorKind::TypeError, "chained cause"
    /// ));
    /// let err_chained = err.chain("top-level message").unwrap_err();
    /// assert_eq!(err_chained.message(), "top-level message");
    /// assert_eq!(err_chained.kind(), ErrorKind::TypeError);
    /// # Ok(())
    /// # }
    /// ```
    fn chain<M: ErrMsg>(self, message: M) -> Result<T>;

    /// If this `Result` is an `Err`, record that it happened inside the
    /// field named `key`.
    fn within(self, key: &str) -> Result<T>;
}

/// Values that can act as or generate an error message.
pub trait ErrMsg: Sized {
    /// Convert the value to an error message.
    fn into_message(self) -> Cow<'static, str>;
}

/// Type alias for a `Result` containing a Tabula `Error`.
pub type Result<T> = result::Result<T, Error>;

impl<T, E> ResultExt<T> for result::Result<T, E> where E: Into<Error> {
    fn chain<M: ErrMsg>(self, message: M) -> Result<T> {
        self.map_err(|cause| Error::with_cause(message.into_message(), Into::<Error>::into(cause)))
    }

    fn within(self, key: &str) -> Result<T> {
        self.map_err(|cause| Into::<Error>::into(cause).within(key))
    }
}

/// Blanket `impl ErrMsg` for string literals.
impl ErrMsg for &'static str {
    fn into_message(self) -> Cow<'static, str> {
        Cow::Borrowed(self)
    }
}

/// Blanket `impl ErrMsg` for error message formatting functions.
impl<F> ErrMsg for F where F: FnOnce() -> String {
    fn into_message(self) -> Cow<'static, str> {
        Cow::Owned(self())
    }
}

/// A structured, "machine-readable" error kind.
#[allow(clippy::module_name_repetitions)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// A value or key has a kind the codec can't encode or decode, or an
    /// extension constructor was called with bad arguments.
    TypeError,
    /// Nesting is deeper than the configured limit.
    ResourceExhausted,
    /// A built document failed structural validation, or the document
    /// to be filled wasn't empty.
    EncodingError,
    /// A recognized BSON kind which this codec doesn't materialize.
    UnsupportedType,
    /// A field expected to be present in a document was not found.
    MissingField,
    /// The codec configuration could not be parsed or is out of range.
    Config,
}

impl ErrorKind {
    /// Returns a human-readable error description for this kind.
    pub fn as_str(self) -> &'static str {
        use self::ErrorKind::*;

        match self {
            TypeError         => "type error",
            ResourceExhausted => "resource exhausted",
            EncodingError     => "BSON encoding error",
            UnsupportedType   => "unsupported BSON type",
            MissingField      => "document field not found",
            Config            => "invalid codec configuration",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// The central error type for Tabula.
#[derive(Debug)]
pub struct Error {
    /// The structured, "machine-readable" kind of this error.
    kind: ErrorKind,
    /// The human-readable description.
    message: Cow<'static, str>,
    /// The underlying error, if any.
    cause: Option<Box<dyn ErrorExt>>,
    /// The backtrace, if any.
    backtrace: Option<Backtrace>,
    /// Keys of the enclosing fields, innermost first.
    path: Vec<String>,
    /// The BSON element type that could not be handled, if any.
    element_type: Option<ElementType>,
}

impl Error {
    /// Creates an error with the specified kind, message, no cause,
    /// and a backtrace.
    /// ```
    /// # use tabula::error::{ Error, ErrorKind, ErrorExt };
    /// #
    /// let error = Error::new(ErrorKind::MissingField, "sample error message");
    /// assert_eq!(error.message(), "sample error message");
    /// assert_eq!(error.kind(), ErrorKind::MissingField);
    /// assert!(error.reason().is_none());
    /// assert!(error.backtrace().is_some());
    /// ```
    pub fn new<S>(kind: ErrorKind, message: S) -> Self
        where S: Into<Cow<'static, str>>
    {
        Error {
            kind,
            message: truncate(message.into()),
            cause: None,
            backtrace: Some(Backtrace::new()),
            path: Vec::new(),
            element_type: None,
        }
    }

    /// Creates an error with the specified message and cause. If the cause has
    /// no backtrace, this method will create it and add it to the new instance.
    /// The kind is inherited from the cause.
    pub fn with_cause<S, E>(message: S, cause: E) -> Self
        where S: Into<Cow<'static, str>>,
              E: ErrorExt + 'static
    {
        let kind = cause.kind();
        let message = truncate(message.into());
        let backtrace = if cause.backtrace().is_none() {
            Some(Backtrace::new())
        } else {
            None
        };
        let cause: Option<Box<dyn ErrorExt>> = Some(Box::new(cause));

        Error { kind, message, cause, backtrace, path: Vec::new(), element_type: None }
    }

    /// Creates an `UnsupportedType` error for the given BSON element type.
    pub fn unsupported(element_type: ElementType) -> Self {
        let message = format!("BSON type `{}` is not supported", type_alias(element_type));
        let mut error = Error::new(ErrorKind::UnsupportedType, message);
        error.element_type = Some(element_type);
        error
    }

    /// The human-readable message, without cause or backtrace.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The BSON element type this error is about, if any.
    pub fn element_type(&self) -> Option<ElementType> {
        self.element_type
    }

    /// Dotted path of the field the error occurred in, e.g. `a.b.2`.
    /// `None` if the error is not attributed to any field.
    pub fn field_path(&self) -> Option<String> {
        if self.path.is_empty() {
            None
        } else {
            let keys: Vec<&str> = self.path.iter().rev().map(String::as_str).collect();
            Some(keys.join("."))
        }
    }

    /// Records that the error happened inside the field named `key`.
    /// Called from the innermost field outwards.
    pub fn within(mut self, key: &str) -> Self {
        self.path.push(key.to_owned());
        self
    }
}

/// Caps the message at `MAX_MESSAGE_LEN` bytes.
fn truncate(message: Cow<'static, str>) -> Cow<'static, str> {
    if message.len() <= MAX_MESSAGE_LEN {
        return message;
    }

    let mut end = MAX_MESSAGE_LEN;

    while !message.is_char_boundary(end) {
        end -= 1;
    }

    Cow::Owned(message[..end].to_owned())
}

impl ErrorExt for Error {
    fn reason(&self) -> Option<&(dyn ErrorExt + 'static)> {
        self.cause.as_ref().map(Deref::deref)
    }

    #[allow(clippy::or_fun_call)]
    fn backtrace(&self) -> Option<&Backtrace> {
        self.reason().and_then(ErrorExt::backtrace).or(self.backtrace.as_ref())
    }

    fn kind(&self) -> ErrorKind {
        self.kind
    }

    fn as_std_error(&self) -> &(dyn error::Error + 'static) {
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;

        if let Some(path) = self.field_path() {
            write!(f, " (at `{}`)", path)?
        }

        if let Some(cause) = self.cause.as_ref() {
            write!(f, ", caused by: {}", cause)?
        }

        if let Some(backtrace) = self.backtrace.as_ref() {
            write!(f, "; {:#?}", backtrace)?
        }

        Ok(())
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.reason().map(ErrorExt::as_std_error)
    }
}

/// Implementing `ErrorExt` and `From` boilerplate.
macro_rules! impl_error_type {
    ($ty:path, $kind:ident, $message:expr) => {
        impl From<$ty> for Error {
            fn from(error: $ty) -> Self {
                Self::with_cause($message, error)
            }
        }

        impl ErrorExt for $ty {
            fn kind(&self) -> ErrorKind {
                ErrorKind::$kind
            }

            fn as_std_error(&self) -> &(dyn error::Error + 'static) {
                self
            }
        }
    }
}

impl_error_type! { bson::ser::Error, EncodingError, "BSON serialization error" }
impl_error_type! { bson::raw::Error, EncodingError, "malformed bson document" }
impl_error_type! { bson::oid::Error, TypeError,     "invalid ObjectId" }
impl_error_type! { serde_json::Error, Config,       "can't parse codec configuration" }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::non_ascii_literal)]
    fn long_messages_are_truncated() {
        let long = "é".repeat(MAX_MESSAGE_LEN);
        let error = Error::new(ErrorKind::TypeError, long);

        assert!(error.message().len() <= MAX_MESSAGE_LEN);
        assert!(error.message().len() >= MAX_MESSAGE_LEN - 1);
        assert!(error.message().chars().all(|c| c == 'é'));
    }

    #[test]
    fn field_path_is_outermost_first() {
        let error = Error::new(ErrorKind::TypeError, "bad")
            .within("2")
            .within("tags")
            .within("meta");

        assert_eq!(error.field_path().as_deref(), Some("meta.tags.2"));
        assert!(error.to_string().contains("(at `meta.tags.2`)"));
        assert!(Error::new(ErrorKind::TypeError, "bad").field_path().is_none());
    }

    #[test]
    fn chained_error_keeps_kind_of_cause() {
        let cause = bson::oid::ObjectId::parse_str("not hex").unwrap_err();
        let result: Result<()> = Err(cause).chain("can't read identifier");
        let error = result.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::TypeError);
        assert_eq!(error.message(), "can't read identifier");
        assert!(error.reason().is_some());
    }

    #[test]
    fn unsupported_error_names_element_type() {
        let error = Error::unsupported(ElementType::RegularExpression);

        assert_eq!(error.kind(), ErrorKind::UnsupportedType);
        assert_eq!(error.element_type(), Some(ElementType::RegularExpression));
        assert!(error.message().contains("regex"));
    }
}
