//! Fountain-coded (UR) scheme engine.
//!
//! Fragments are self-describing parts of an erasure-coded stream; any
//! sufficient subset reconstructs the CBOR envelope. The engine wraps the
//! injected encoder/decoder pair and never reimplements the coding
//! itself. Completion and failure are decoder-reported; progress is
//! best-effort until the decoder can state an expected part count.

use tracing::{debug, trace};

use crate::codec::{FountainDecoder, FountainEncoder};
use crate::envelope::Envelope;
use crate::error::{QrError, Result};
use crate::types::Progress;

enum Mode {
    Encode(Box<dyn FountainEncoder>),
    Decode(Box<dyn FountainDecoder>),
}

/// State machine wrapping the external fountain codec.
pub struct FountainEngine {
    mode: Mode,
}

impl FountainEngine {
    /// Encode-side engine over a prepared encoder.
    pub fn for_encoding(encoder: Box<dyn FountainEncoder>) -> Self {
        Self { mode: Mode::Encode(encoder) }
    }

    /// Decode-side engine over a fresh decoder.
    pub fn for_decoding(decoder: Box<dyn FountainDecoder>) -> Self {
        Self { mode: Mode::Decode(decoder) }
    }

    /// Forward one raw fragment to the decoder.
    ///
    /// A decoder-reported terminal failure surfaces as a fatal
    /// [`QrError::DecodeFailure`] carrying the diagnostic verbatim;
    /// per-part parse errors are transient.
    pub fn accept(&mut self, text: &str) -> Result<()> {
        let Mode::Decode(decoder) = &mut self.mode else {
            return Err(QrError::parse("ur fragment", "engine is in encode mode"));
        };
        decoder.receive_part(text)?;
        trace!(received = decoder.received_part_count(), "ur part received");

        if decoder.is_complete() && !decoder.is_success() {
            return Err(QrError::decode_failure(decoder.result_error()));
        }
        if decoder.is_complete() {
            debug!("ur decode complete");
        }
        Ok(())
    }

    /// Whether the decoder recovered the payload (always true for the
    /// encode side, which owns the full payload by construction).
    pub fn is_complete(&self) -> bool {
        match &self.mode {
            Mode::Encode(_) => true,
            Mode::Decode(decoder) => decoder.is_complete() && decoder.is_success(),
        }
    }

    /// The recovered envelope of a completed decode.
    pub fn envelope(&self) -> Result<Envelope> {
        match &self.mode {
            Mode::Encode(_) => Err(QrError::parse("ur fragment", "engine is in encode mode")),
            Mode::Decode(decoder) => decoder.result_envelope(),
        }
    }

    /// Best-effort progress: expected part count falls back to 0 until
    /// the decoder can determine it.
    pub fn progress(&self) -> Progress {
        match &self.mode {
            Mode::Encode(encoder) => {
                let total = encoder.sequence_length();
                Progress { received: total, total }
            }
            Mode::Decode(decoder) => Progress {
                received: decoder.received_part_count(),
                total: decoder.expected_part_count().unwrap_or(0),
            },
        }
    }

    /// Pure-part count of one encoder pass (0 on the decode side until
    /// determinable).
    pub fn total(&self) -> usize {
        match &self.mode {
            Mode::Encode(encoder) => encoder.sequence_length(),
            Mode::Decode(decoder) => decoder.expected_part_count().unwrap_or(0),
        }
    }

    /// The encoder's own sequence number, mirrored for display only; the
    /// part stream cycles indefinitely and is not bounded by
    /// [`Self::total`].
    pub fn cursor(&self) -> usize {
        match &self.mode {
            Mode::Encode(encoder) => encoder.sequence_number().saturating_sub(1),
            Mode::Decode(_) => 0,
        }
    }

    /// Produce the next part, uppercased for QR alphanumeric density.
    pub fn next_emission(&mut self) -> String {
        match &mut self.mode {
            Mode::Encode(encoder) => encoder.next_part().to_uppercase(),
            Mode::Decode(_) => String::new(),
        }
    }
}

impl std::fmt::Debug for FountainEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match &self.mode {
            Mode::Encode(_) => "encode",
            Mode::Decode(_) => "decode",
        };
        f.debug_struct("FountainEngine").field("mode", &mode).finish()
    }
}
