//! Error types for the Quill relational core.

use alloc::string::String;
use core::fmt;

/// Result type alias for Quill operations.
pub type Result<T> = core::result::Result<T, Error>;

/// The error taxonomy shared by planning, evaluation and backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Incompatible or unresolvable types.
    Type,
    /// Duplicate names, unresolved references, schema mismatches.
    Schema,
    /// Integer division by zero, checked overflow, decimal precision loss.
    Arithmetic,
    /// Invalid operator parameters.
    Config,
    /// A backend cannot fulfill a requested operator or feature.
    Unsupported,
    /// Any other failure reported by a backend.
    Backend,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Type => "TypeError",
            ErrorKind::Schema => "SchemaError",
            ErrorKind::Arithmetic => "ArithmeticError",
            ErrorKind::Config => "ConfigError",
            ErrorKind::Unsupported => "UnsupportedOperationError",
            ErrorKind::Backend => "BackendError",
        };
        f.write_str(name)
    }
}

/// Error types for Quill operations.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// Incompatible types, e.g. `string + binary` or a non-boolean predicate.
    Type {
        message: String,
    },
    /// Duplicate output names, unresolved columns, schema mismatch.
    Schema {
        message: String,
    },
    /// Arithmetic failure during evaluation.
    Arithmetic {
        message: String,
    },
    /// Invalid operator parameters.
    Config {
        message: String,
    },
    /// The backend does not support the requested operator or feature.
    Unsupported {
        backend: String,
        feature: String,
    },
    /// Backend-specific failure.
    Backend {
        backend: String,
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Type { message } => write!(f, "Type error: {}", message),
            Error::Schema { message } => write!(f, "Schema error: {}", message),
            Error::Arithmetic { message } => write!(f, "Arithmetic error: {}", message),
            Error::Config { message } => write!(f, "Invalid configuration: {}", message),
            Error::Unsupported { backend, feature } => {
                write!(f, "Backend {} does not support {}", backend, feature)
            }
            Error::Backend { backend, message } => {
                write!(f, "Backend {} failed: {}", backend, message)
            }
        }
    }
}

impl Error {
    /// Creates a type error.
    pub fn type_error(message: impl Into<String>) -> Self {
        Error::Type {
            message: message.into(),
        }
    }

    /// Creates a schema error.
    pub fn schema(message: impl Into<String>) -> Self {
        Error::Schema {
            message: message.into(),
        }
    }

    /// Creates an arithmetic error.
    pub fn arithmetic(message: impl Into<String>) -> Self {
        Error::Arithmetic {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Creates an unsupported-operation error.
    pub fn unsupported(backend: impl Into<String>, feature: impl Into<String>) -> Self {
        Error::Unsupported {
            backend: backend.into(),
            feature: feature.into(),
        }
    }

    /// Creates a generic backend error.
    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Backend {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Returns the taxonomy tag of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Type { .. } => ErrorKind::Type,
            Error::Schema { .. } => ErrorKind::Schema,
            Error::Arithmetic { .. } => ErrorKind::Arithmetic,
            Error::Config { .. } => ErrorKind::Config,
            Error::Unsupported { .. } => ErrorKind::Unsupported,
            Error::Backend { .. } => ErrorKind::Backend,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_error_display() {
        let err = Error::type_error("string vs binary");
        assert!(err.to_string().contains("Type error"));

        let err = Error::unsupported("partitioned", "RANGE window frames");
        assert!(err.to_string().contains("partitioned"));
        assert!(err.to_string().contains("RANGE"));
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(Error::schema("dup").kind(), ErrorKind::Schema);
        assert_eq!(Error::arithmetic("div").kind(), ErrorKind::Arithmetic);
        assert_eq!(Error::config("limit").kind(), ErrorKind::Config);
        assert_eq!(Error::backend("memory", "x").kind(), ErrorKind::Backend);
        assert_eq!(ErrorKind::Unsupported.to_string(), "UnsupportedOperationError");
    }
}
