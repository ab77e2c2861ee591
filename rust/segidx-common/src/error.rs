use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    /// Returns `true` when the error means a persisted index must be discarded
    /// and rebuilt from the segment.
    pub fn is_corrupt_index(&self) -> bool {
        matches!(self.kind(), ErrorKind::CorruptIndex { .. })
    }

    pub fn invalid_format(name: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidFormat {
                element: name.into(),
                message: Default::default(),
            }
            .into(),
        )
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn corrupt_index(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::CorruptIndex {
                message: message.into(),
                source: None,
            }
            .into(),
        )
    }

    /// Wraps a lower-level failure (truncated payload, bad column block) into
    /// a `CorruptIndex` error.
    pub fn corrupt_index_from(message: impl Into<String>, source: Error) -> Error {
        Error(
            ErrorKind::CorruptIndex {
                message: message.into(),
                source: Some(source),
            }
            .into(),
        )
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::Io {
                context: context.into(),
                source,
            }
            .into(),
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid storage format for '{element}': {message}")]
    InvalidFormat { element: String, message: String },

    #[error("corrupt offset index: {message}")]
    CorruptIndex {
        message: String,
        #[source]
        source: Option<Error>,
    },

    #[error("IO error for '{context}': {source}'")]
    Io {
        context: String,
        source: std::io::Error,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io("", e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrupt_index_kind() {
        let inner = Error::invalid_format("column payload");
        let err = Error::corrupt_index_from("primary column", inner);
        assert!(err.is_corrupt_index());
        assert!(err.to_string().contains("primary column"));
        assert!(std::error::Error::source(&err).is_some());

        assert!(!Error::invalid_arg("step", "must be positive").is_corrupt_index());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        let err: Error = io.into();
        assert!(matches!(err.kind(), ErrorKind::Io { .. }));
    }
}
