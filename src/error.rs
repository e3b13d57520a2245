//! Contains the error-related types for the `lazybson` crate.

use thiserror::Error;

use crate::spec::{BinarySubtype, ElementType};
use crate::uuid::UuidRepresentation;

/// The result type for all methods that can return an error in the `lazybson` crate.
pub type Result<T> = std::result::Result<T, Error>;

/// An error that can occur in the `lazybson` crate.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,

    /// The document key associated with the error, if any.
    pub key: Option<String>,

    /// The array index associated with the error, if any.
    pub index: Option<usize>,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(key) = self.key.as_deref() {
            write!(f, "Error at key \"{key}\": ")?;
        } else if let Some(index) = self.index {
            write!(f, "Error at array index {index}: ")?;
        }

        write!(f, "{}", self.kind)
    }
}

/// The types of errors that can occur in the `lazybson` crate.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Malformed BSON bytes were encountered.
    #[error("Malformed BSON: {message}")]
    #[non_exhaustive]
    MalformedBytes { message: String },

    /// Invalid UTF-8 bytes were encountered.
    #[error("Invalid UTF-8")]
    Utf8Encoding,

    /// A document could not be encoded because its shape is not allowed.
    #[error("Invalid document: {message}")]
    #[non_exhaustive]
    InvalidDocument { message: String },

    /// A value had no built-in BSON encoding and no transformer claimed it.
    #[error("cannot convert value of type {type_name} to BSON")]
    #[non_exhaustive]
    UnsupportedType { type_name: String },

    /// A registered transformer hook failed.
    #[error("Transformer failed: {message}")]
    #[non_exhaustive]
    Transform { message: String },

    /// An error occurred when attempting to access a value in a document.
    #[error("An error occurred when attempting to access a document value: {kind}")]
    #[non_exhaustive]
    ValueAccess {
        /// The kind of error that occurred.
        kind: ValueAccessErrorKind,
    },

    /// An error related to the [`Uuid`](crate::uuid::Uuid) type occurred.
    #[error("A UUID-related error occurred: {kind}")]
    #[non_exhaustive]
    Uuid {
        /// The kind of error that occurred.
        kind: UuidErrorKind,
    },

    /// An error related to [`ObjectId`](crate::oid::ObjectId) parsing occurred.
    #[error("Invalid ObjectId: {message}")]
    #[non_exhaustive]
    ObjectId { message: String },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind,
            key: None,
            index: None,
        }
    }
}

/// The types of errors that can occur when attempting to access a value in a document.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum ValueAccessErrorKind {
    /// No value for the specified key was present in the document.
    #[error("The key was not present in the document")]
    NotPresent,

    /// The type of the value in the document did not match the requested type.
    #[error("Expected type {expected:?}, got type {actual:?}")]
    #[non_exhaustive]
    UnexpectedType {
        /// The actual type of the value, or `None` for a custom value with no wire type.
        actual: Option<ElementType>,

        /// The expected type of the value.
        expected: ElementType,
    },
}

/// The kinds of errors that can occur when working with the [`Uuid`](crate::uuid::Uuid) type.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum UuidErrorKind {
    /// An invalid string was used to construct a UUID.
    #[error("invalid UUID string: {message}")]
    #[non_exhaustive]
    InvalidString { message: String },

    /// The requested `UuidRepresentation` does not match the binary subtype of a `Binary`
    /// value.
    #[error(
        "expected binary subtype {expected_binary_subtype:?} for representation \
         {requested_representation:?}, got {actual_binary_subtype:?}"
    )]
    #[non_exhaustive]
    RepresentationMismatch {
        /// The subtype that was expected given the requested representation.
        expected_binary_subtype: BinarySubtype,

        /// The actual subtype of the binary value.
        actual_binary_subtype: BinarySubtype,

        /// The requested representation.
        requested_representation: UuidRepresentation,
    },

    /// An invalid length of bytes was used to construct a UUID value.
    #[error("expected length of 16 bytes, got {length}")]
    #[non_exhaustive]
    InvalidLength {
        /// The actual length of the data.
        length: usize,
    },
}

impl Error {
    /// Attaches a key to this error unless a more specific location is already recorded.
    pub(crate) fn with_key(mut self, key: impl Into<String>) -> Self {
        if self.key.is_none() && self.index.is_none() {
            self.key = Some(key.into());
        }
        self
    }

    /// Attaches an array index to this error unless a more specific location is already recorded.
    pub(crate) fn with_index(mut self, index: usize) -> Self {
        if self.key.is_none() && self.index.is_none() {
            self.index = Some(index);
        }
        self
    }

    pub(crate) fn malformed_bytes(message: impl ToString) -> Self {
        ErrorKind::MalformedBytes {
            message: message.to_string(),
        }
        .into()
    }

    pub(crate) fn invalid_document(message: impl ToString) -> Self {
        ErrorKind::InvalidDocument {
            message: message.to_string(),
        }
        .into()
    }

    pub(crate) fn unsupported_type(type_name: impl ToString) -> Self {
        ErrorKind::UnsupportedType {
            type_name: type_name.to_string(),
        }
        .into()
    }

    /// Creates an error to be returned from a transformer hook.
    pub fn transform(message: impl ToString) -> Self {
        ErrorKind::Transform {
            message: message.to_string(),
        }
        .into()
    }

    pub(crate) fn value_access_not_present() -> Self {
        ErrorKind::ValueAccess {
            kind: ValueAccessErrorKind::NotPresent,
        }
        .into()
    }

    pub(crate) fn value_access_unexpected_type(
        actual: Option<ElementType>,
        expected: ElementType,
    ) -> Self {
        ErrorKind::ValueAccess {
            kind: ValueAccessErrorKind::UnexpectedType { actual, expected },
        }
        .into()
    }

    pub(crate) fn invalid_uuid_string(message: impl ToString) -> Self {
        ErrorKind::Uuid {
            kind: UuidErrorKind::InvalidString {
                message: message.to_string(),
            },
        }
        .into()
    }

    pub(crate) fn uuid_representation_mismatch(
        requested_representation: UuidRepresentation,
        actual_binary_subtype: BinarySubtype,
        expected_binary_subtype: BinarySubtype,
    ) -> Self {
        ErrorKind::Uuid {
            kind: UuidErrorKind::RepresentationMismatch {
                expected_binary_subtype,
                actual_binary_subtype,
                requested_representation,
            },
        }
        .into()
    }

    pub(crate) fn invalid_uuid_length(length: usize) -> Self {
        ErrorKind::Uuid {
            kind: UuidErrorKind::InvalidLength { length },
        }
        .into()
    }

    pub(crate) fn invalid_object_id(message: impl ToString) -> Self {
        ErrorKind::ObjectId {
            message: message.to_string(),
        }
        .into()
    }

    /// Whether this error was caused by malformed BSON bytes.
    pub fn is_malformed_bytes(&self) -> bool {
        matches!(self.kind, ErrorKind::MalformedBytes { .. })
    }

    /// Whether this error was caused by a document that may not be encoded.
    pub fn is_invalid_document(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidDocument { .. })
    }

    /// Whether this error was caused by a value with no BSON representation.
    pub fn is_unsupported_type(&self) -> bool {
        matches!(self.kind, ErrorKind::UnsupportedType { .. })
    }

    #[cfg(test)]
    pub(crate) fn is_value_access_not_present(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::ValueAccess {
                kind: ValueAccessErrorKind::NotPresent,
                ..
            }
        )
    }

    #[cfg(test)]
    pub(crate) fn is_value_access_unexpected_type(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::ValueAccess {
                kind: ValueAccessErrorKind::UnexpectedType { .. },
                ..
            }
        )
    }
}
