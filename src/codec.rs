//! Contracts for the external codec collaborators.
//!
//! The fountain-coding algorithm, the BBQr packing algorithm and the typed
//! binary record parsers are out of scope for this crate; they are consumed
//! as opaque components behind these traits, injected once as a [`Codecs`]
//! bundle at construction time. In-repo implementations exist only as test
//! doubles.

use std::sync::Arc;

use crate::envelope::Envelope;
use crate::error::Result;

/// Encode side of the fountain codec.
///
/// Produces an unbounded, cyclic, restartable part sequence; any
/// sufficiently large subset of parts reconstructs the envelope.
pub trait FountainEncoder: Send {
    /// Number of pure parts in one pass over the payload.
    fn sequence_length(&self) -> usize;

    /// Sequence number of the most recently produced part (1-based),
    /// maintained by the encoder itself and not bounded by
    /// [`Self::sequence_length`].
    fn sequence_number(&self) -> usize;

    /// Produce the next part's fragment text.
    fn next_part(&mut self) -> String;
}

/// Decode side of the fountain codec.
pub trait FountainDecoder: Send {
    /// Feed one raw fragment. Errors are scheme-local parse failures and
    /// are treated as transient by the caller.
    fn receive_part(&mut self, part: &str) -> Result<()>;

    /// Whether decoding has terminated (successfully or not).
    fn is_complete(&self) -> bool;

    /// Whether a completed decode recovered the payload.
    fn is_success(&self) -> bool;

    /// Expected number of parts, once determinable.
    fn expected_part_count(&self) -> Option<usize>;

    /// Number of distinct parts received so far.
    fn received_part_count(&self) -> usize;

    /// The recovered envelope of a successful decode.
    fn result_envelope(&self) -> Result<Envelope>;

    /// Diagnostic message of a failed decode.
    fn result_error(&self) -> String;
}

/// Factory for fountain encoders and decoders.
pub trait FountainCodec: Send + Sync {
    /// Build an encoder over the envelope with the given maximum part size.
    fn encoder(&self, envelope: Envelope, max_part_size: usize) -> Result<Box<dyn FountainEncoder>>;

    /// Build a fresh decoder.
    fn decoder(&self) -> Box<dyn FountainDecoder>;
}

/// One record of the container codec's encode output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerFragment {
    /// Complete fragment text, header already embedded.
    pub text: String,
    /// 0-based sequence position.
    pub index: usize,
    /// Total number of fragments in the sequence.
    pub total: usize,
}

/// The structured-container (BBQr) codec.
pub trait ContainerCodec: Send + Sync {
    /// Compress and split a payload into a lazy fragment sequence. The
    /// size bound is in the codec's native unit (wire-payload characters,
    /// excluding header overhead).
    fn encode(
        &self,
        payload: &[u8],
        max_size: usize,
    ) -> Result<Box<dyn Iterator<Item = ContainerFragment> + Send>>;

    /// Reassemble the original bytes from the ordered fragment bodies
    /// (header already stripped) plus the declared tags.
    fn decode(&self, parts: &[String], encoding: char, file_type: char) -> Result<Vec<u8>>;
}

/// A decoded PSBT record: either already textual, or raw bytes that still
/// need a pass through the binary transaction-format parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PsbtRecord {
    /// Canonical string form, ready for display.
    Text(String),
    /// Raw transaction bytes.
    Raw(Vec<u8>),
}

/// Typed binary record parsers used by the typed-payload resolver and the
/// encode-side PSBT pre-serialization step.
pub trait RecordParsers: Send + Sync {
    /// Parse an account record and return its first output descriptor's
    /// canonical string.
    fn account_descriptor(&self, record: &[u8]) -> Result<String>;

    /// Parse an output-descriptor record and return its canonical string.
    fn output_descriptor(&self, record: &[u8]) -> Result<String>;

    /// Parse a PSBT record into its two-case union.
    fn psbt(&self, record: &[u8]) -> Result<PsbtRecord>;

    /// Parse raw transaction bytes into their canonical string form.
    fn psbt_from_raw(&self, raw: &[u8]) -> Result<String>;

    /// Parse PSBT text into its binary serialization (encode side).
    fn psbt_to_bytes(&self, text: &str) -> Result<Vec<u8>>;
}

/// Bundle of injected codec collaborators, cloned freely across sessions.
#[derive(Clone)]
pub struct Codecs {
    /// Fountain codec factory.
    pub fountain: Arc<dyn FountainCodec>,
    /// Structured-container codec.
    pub container: Arc<dyn ContainerCodec>,
    /// Typed binary record parsers.
    pub parsers: Arc<dyn RecordParsers>,
}

impl Codecs {
    /// Bundle the three collaborators.
    pub fn new(
        fountain: Arc<dyn FountainCodec>,
        container: Arc<dyn ContainerCodec>,
        parsers: Arc<dyn RecordParsers>,
    ) -> Self {
        Self { fountain, container, parsers }
    }
}

impl std::fmt::Debug for Codecs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codecs").finish_non_exhaustive()
    }
}
