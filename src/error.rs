use std::io;

/// The error type reported by the conversion functions and stream adapters.
///
/// Conversion functions return this type directly. The stream adapters
/// ([`ConvReader`] and [`ConvWriter`]) report it in the form of a
/// [`std::io::Error`] wrapping an instance of this type. Callers need to unwrap
/// and downcast the inner error of a reported error, which can be shortcut by
/// [`ConvError::wrapped_in`].
///
/// [`ConvReader`]: crate::ConvReader
/// [`ConvWriter`]: crate::ConvWriter
///
/// # Examples
///
/// ```rust
/// use charset_conv::{to_utf8, ConvError, ErrorPolicy};
///
/// match to_utf8(b"g\xFFr", "UTF-8", ErrorPolicy::Stop) {
///     Err(ConvError::InvalidSequence { offset }) => assert_eq!(offset, 1),
///     ret => panic!("assertion failed: {:?}", ret),
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ConvError {
    /// The requested encoding name does not resolve to a usable codec.
    ///
    /// This error is fatal regardless of the error policy in effect.
    #[error("unknown character encoding: {0:?}")]
    UnknownEncoding(String),

    /// A malformed byte sequence or unrepresentable character was encountered.
    ///
    /// `offset` is the index of the first invalid unit: a byte offset when
    /// decoding bytes, a code-unit offset when transcoding between UTF forms,
    /// and a code-point index when encoding to a byte encoding.
    #[error("invalid or unrepresentable sequence at offset {offset}")]
    InvalidSequence { offset: usize },
}

impl ConvError {
    pub(crate) fn unknown_encoding(name: &str) -> Self {
        Self::UnknownEncoding(name.to_owned())
    }

    pub(crate) fn invalid_sequence(offset: usize) -> Self {
        Self::InvalidSequence { offset }
    }

    /// Returns the offset of the first invalid unit, if this error carries one.
    #[inline]
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::UnknownEncoding(_) => None,
            Self::InvalidSequence { offset } => Some(*offset),
        }
    }

    /// Wraps `self` in a [`std::io::Error`].
    pub(crate) fn wrap(self) -> io::Error {
        io::Error::new(io::ErrorKind::InvalidData, self)
    }

    /// Returns a reference to the `ConvError` value wrapped by a
    /// [`std::io::Error`] if it contains an inner error whose type is
    /// `ConvError`, or returns `None` otherwise.
    #[inline]
    pub fn wrapped_in(io_error: &io::Error) -> Option<&Self> {
        match io_error.get_ref() {
            Some(e) => e.downcast_ref::<Self>(),
            None => None,
        }
    }
}

impl From<ConvError> for io::Error {
    fn from(e: ConvError) -> Self {
        e.wrap()
    }
}

/// Builds the error reported by every stream operation after the stream has
/// latched its failed state.
pub(crate) fn stream_failed() -> io::Error {
    io::Error::new(
        io::ErrorKind::Other,
        "stream is in failed state after a previous conversion error",
    )
}

#[cfg(test)]
mod tests {
    use super::{io, ConvError};

    #[test]
    fn unwrap_conv_error() {
        assert!(ConvError::wrapped_in(&io::Error::new(
            io::ErrorKind::InvalidData,
            ConvError::invalid_sequence(3)
        ))
        .is_some());
        assert!(ConvError::wrapped_in(&io::Error::new(
            io::ErrorKind::Other,
            ConvError::unknown_encoding("x-unknown")
        ))
        .is_some());

        assert!(ConvError::wrapped_in(&io::ErrorKind::InvalidData.into()).is_none());
        assert!(ConvError::wrapped_in(&io::Error::new(
            io::ErrorKind::InvalidData,
            "invalid or unrepresentable sequence at offset 3"
        ))
        .is_none());
    }

    #[test]
    fn error_offset() {
        assert_eq!(ConvError::invalid_sequence(7).offset(), Some(7));
        assert_eq!(ConvError::unknown_encoding("utf-9").offset(), None);
    }
}
