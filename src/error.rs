//! Error types for fragment encoding and reassembly.
//!
//! All errors implement [`std::error::Error`] and carry structured context.
//! The taxonomy distinguishes errors that are fatal to the *current*
//! reassembly instance (slot conflicts, decoder failures) from transient
//! per-fragment noise that the collector swallows:
//!
//! ```rust
//! use qrweave::QrError;
//!
//! let err = QrError::slot_conflict(2, 5);
//! assert!(err.is_instance_fatal());
//!
//! let noise = QrError::parse("specter header", "missing 'of' separator");
//! assert!(!noise.is_instance_fatal());
//! ```

use thiserror::Error;

/// Result type alias for fragment operations.
pub type Result<T, E = QrError> = std::result::Result<T, E>;

/// Main error type for fragment encoding and reassembly.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum QrError {
    /// Invalid scheme/payload-kind combination at encode time.
    #[error("invalid encode configuration: {reason}")]
    Configuration { reason: String },

    /// The same slot was received twice with different content. The correct
    /// content is ambiguous, so the instance cannot be repaired.
    #[error("slot {index} of {total} received twice with different content")]
    SlotConflict { index: usize, total: usize },

    /// The fountain decoder reported an unrecoverable inconsistency.
    /// The diagnostic is passed through verbatim.
    #[error("fountain decode failed: {detail}")]
    DecodeFailure { detail: String },

    /// A single inbound fragment failed its scheme-local grammar.
    /// Transient: the collector ignores the fragment and keeps state.
    #[error("parse error in {context}: {detail}")]
    Parse { context: &'static str, detail: String },

    /// An external codec (container codec, record parser) failed.
    #[error("codec error in {context}")]
    Codec {
        context: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The CBOR typed envelope could not be encoded or decoded.
    #[error("envelope error: {detail}")]
    Envelope { detail: String },
}

impl QrError {
    /// Returns whether this error terminates the current reassembly
    /// instance. The collector discards the instance and the caller must
    /// start over; non-fatal errors leave instance state untouched.
    pub fn is_instance_fatal(&self) -> bool {
        match self {
            QrError::SlotConflict { .. } => true,
            QrError::DecodeFailure { .. } => true,
            QrError::Codec { .. } => true,
            QrError::Envelope { .. } => true,
            QrError::Configuration { .. } => false,
            QrError::Parse { .. } => false,
        }
    }

    /// Helper constructor for encode configuration errors.
    pub fn configuration(reason: impl Into<String>) -> Self {
        QrError::Configuration { reason: reason.into() }
    }

    /// Helper constructor for slot conflicts.
    pub fn slot_conflict(index: usize, total: usize) -> Self {
        QrError::SlotConflict { index, total }
    }

    /// Helper constructor for fountain decoder failures.
    pub fn decode_failure(detail: impl Into<String>) -> Self {
        QrError::DecodeFailure { detail: detail.into() }
    }

    /// Helper constructor for transient per-fragment parse errors.
    pub fn parse(context: &'static str, detail: impl Into<String>) -> Self {
        QrError::Parse { context, detail: detail.into() }
    }

    /// Helper constructor for external codec errors.
    pub fn codec(
        context: &'static str,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        QrError::Codec { context, source }
    }

    /// Helper constructor for envelope serialization errors.
    pub fn envelope(detail: impl Into<String>) -> Self {
        QrError::Envelope { detail: detail.into() }
    }
}
