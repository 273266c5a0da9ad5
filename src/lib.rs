//! Multi-part QR payload fragmentation and reassembly engine.
//!
//! qrweave splits an arbitrary text/binary payload into a rotating series
//! of size-bounded fragments for display as animated QR codes, and
//! reassembles fragments received in any order (duplicated, reordered,
//! or interleaved with a competing format) back into the original
//! payload.
//!
//! # Features
//!
//! - **Three schemes**: Specter (`p1of3 ...`), UR fountain codes, and
//!   BBQr containers, auto-detected from fragment content
//! - **Order-independent reassembly**: duplicates tolerated, conflicts
//!   detected, never a false completion
//! - **Async sessions**: scan and display activities as independent
//!   tokio tasks with stream-based consumption
//! - **Pluggable codecs**: fountain and container algorithms injected
//!   behind trait seams
//!
//! # Example
//!
//! ```rust,no_run
//! use qrweave::{EncodeOptions, Qrweave, Scheme};
//! use futures::StreamExt;
//!
//! # fn codecs() -> qrweave::Codecs { unimplemented!() }
//! #[tokio::main]
//! async fn main() -> qrweave::Result<()> {
//!     let opts = EncodeOptions {
//!         scheme: Scheme::Specter,
//!         max_fragment_size: Some(100),
//!         ..Default::default()
//!     };
//!     let sequence = Qrweave::encode("payload to split", &opts, &codecs())?;
//!     let session = Qrweave::display(sequence, Default::default());
//!
//!     let mut frames = session.frames();
//!     while let Some(frame) = frames.next().await {
//!         println!("{} [{}]", frame.text, frame.label);
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
pub mod envelope;
pub mod format;
#[cfg(test)]
pub(crate) mod test_utils;
pub mod types;

// Fragmentation pipeline
pub mod builder;
pub mod codec;
pub mod collector;
pub mod resolver;
pub mod schemes;

// Stream-based session architecture
pub mod driver;
pub mod session;
pub mod source;

// Core exports
pub use builder::{EncodeOptions, FragmentedPayload, QrSequence, SingleFragment};
pub use codec::{Codecs, ContainerCodec, FountainCodec, PsbtRecord, RecordParsers};
pub use collector::Collector;
pub use envelope::{Envelope, PayloadKind, TypeTag};
pub use error::{QrError, Result};
pub use format::Scheme;
pub use schemes::ContainerSizing;
pub use types::{Accepted, Progress, QrFrame, Reassembled};

// Session exports
pub use driver::{DisplayTiming, ScanEvent};
pub use session::{DisplaySession, ScanSession};
pub use source::{ChannelSource, FragmentSender, FragmentSource};

/// Unified entry point for encode and decode sessions.
///
/// # Examples
///
/// ## Encoding
/// ```rust,no_run
/// use qrweave::{EncodeOptions, Qrweave};
///
/// # fn codecs() -> qrweave::Codecs { unimplemented!() }
/// # fn main() -> qrweave::Result<()> {
/// let opts = EncodeOptions { max_fragment_size: Some(200), ..Default::default() };
/// let mut sequence = Qrweave::encode("payload", &opts, &codecs())?;
/// let frame = sequence.next();
/// # Ok(())
/// # }
/// ```
///
/// ## Scanning
/// ```rust,no_run
/// use qrweave::{Qrweave, source};
///
/// # fn codecs() -> qrweave::Codecs { unimplemented!() }
/// #[tokio::main]
/// async fn main() {
///     let (sender, fragments) = source::channel(16);
///     let mut session = Qrweave::scan(fragments, codecs());
///     sender.send("p1of1 payload").await;
///     if let Some(payload) = session.wait().await {
///         println!("{:?}", payload);
///     }
/// }
/// ```
pub struct Qrweave;

impl Qrweave {
    /// Build a fragment sequence for a payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the scheme/kind combination is invalid or an
    /// external codec rejects the payload.
    pub fn encode(payload: &str, opts: &EncodeOptions, codecs: &Codecs) -> Result<QrSequence> {
        QrSequence::build(payload, opts, codecs)
    }

    /// Start a display session emitting one frame per tick.
    pub fn display(sequence: QrSequence, timing: DisplayTiming) -> DisplaySession {
        DisplaySession::start(sequence, timing)
    }

    /// Start a scan session consuming fragments from a source.
    pub fn scan<S: FragmentSource>(source: S, codecs: Codecs) -> ScanSession {
        ScanSession::start(source, codecs)
    }
}
