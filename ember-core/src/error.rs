use thiserror::Error;

/// Main error type for Ember+ operations
///
/// The variants follow the decoder's error taxonomy:
/// - structural errors (`BerDecoding`, `DepthExceeded`, `ReaderFaulted`) are
///   fatal to the stream being decoded and require a reset;
/// - value errors (`InvalidData`, `UnsupportedEncoding`) are reported and
///   skipped by the Glow layer;
/// - framing errors (`FrameInvalid`, `BufferOverflow`) discard only the
///   message in flight.
///
/// Running out of input is not an error at all; see
/// `ember_ber::DecodeStatus::NeedMore`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmberError {
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("BER encoding error: {0}")]
    BerEncoding(String),

    #[error("BER decoding error: {0}")]
    BerDecoding(String),

    #[error("Maximum depth of {max} exceeded")]
    DepthExceeded { max: usize },

    #[error("Reader faulted by a previous error, reset required")]
    ReaderFaulted,

    #[error("Frame invalid: {0}")]
    FrameInvalid(String),

    #[error("Reassembly buffer overflow (capacity {capacity} bytes)")]
    BufferOverflow { capacity: usize },
}

impl EmberError {
    /// Whether the error stops the affected reader until it is reset
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EmberError::BerDecoding(_) | EmberError::DepthExceeded { .. } | EmberError::ReaderFaulted
        )
    }

    /// Whether the error belongs to the framing layer
    pub fn is_framing(&self) -> bool {
        matches!(self, EmberError::FrameInvalid(_) | EmberError::BufferOverflow { .. })
    }
}

/// Result type alias for Ember+ operations
pub type EmberResult<T> = Result<T, EmberError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(EmberError::DepthExceeded { max: 4 }.is_fatal());
        assert!(EmberError::BerDecoding("x".to_string()).is_fatal());
        assert!(!EmberError::InvalidData("x".to_string()).is_fatal());
        assert!(EmberError::BufferOverflow { capacity: 16 }.is_framing());
        assert!(!EmberError::ReaderFaulted.is_framing());
    }

    #[test]
    fn test_error_display() {
        let err = EmberError::DepthExceeded { max: 64 };
        assert_eq!(err.to_string(), "Maximum depth of 64 exceeded");
    }
}
