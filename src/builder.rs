//! Encode side: turn a payload into a restartable fragment sequence.
//!
//! [`QrSequence::build`] selects between a single-shot payload and a
//! scheme engine, then the caller pulls one [`QrFrame`] per display tick
//! via [`QrSequence::next`]. The builder never partially mutates caller
//! state on failure.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::codec::Codecs;
use crate::envelope::{Envelope, PayloadKind};
use crate::error::{QrError, Result};
use crate::format::Scheme;
use crate::schemes::{
    ContainerBuild, ContainerEngine, ContainerSizing, Engine, FountainEngine, SpecterEngine,
};
use crate::types::QrFrame;

/// Maximum part size handed to the fountain encoder when the caller
/// requests no bound; effectively unbounded.
const DEFAULT_FOUNTAIN_PART_SIZE: usize = 100_000;

/// Encode-time options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodeOptions {
    /// Fragmentation scheme to produce.
    pub scheme: Scheme,
    /// Maximum fragment size in characters. `None` disables splitting for
    /// the slot-based schemes.
    pub max_fragment_size: Option<usize>,
    /// Payload kind; required by (and only meaningful for) the
    /// fountain-coded scheme.
    pub kind: Option<PayloadKind>,
    /// Size-domain remap for the container codec.
    pub sizing: ContainerSizing,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            scheme: Scheme::Specter,
            max_fragment_size: None,
            kind: None,
            sizing: ContainerSizing::default(),
        }
    }
}

/// A payload that fit within the size bound unmodified: always `1/1`,
/// completed at creation, immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleFragment {
    text: String,
}

impl SingleFragment {
    /// Wrap a payload that needs no fragmentation.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The complete payload text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The single frame this payload renders as.
    pub fn frame(&self) -> QrFrame {
        QrFrame { text: self.text.clone(), label: "1/1".to_string() }
    }
}

/// The general multi-fragment case: a scheme engine driven in emission
/// mode.
#[derive(Debug)]
pub struct FragmentedPayload {
    engine: Engine,
}

impl FragmentedPayload {
    /// The active scheme.
    pub fn scheme(&self) -> Scheme {
        self.engine.scheme()
    }

    /// Total fragments in one pass over the payload.
    pub fn total(&self) -> usize {
        self.engine.total()
    }

    /// Produce the next frame, advancing the cursor with wraparound.
    /// Fountain sequences cycle indefinitely and are not bounded by
    /// [`Self::total`].
    pub fn next(&mut self) -> QrFrame {
        match &mut self.engine {
            Engine::Fountain(engine) => {
                // The encoder advances its own sequence counter; the
                // cursor mirrors it for display only.
                let text = engine.next_emission();
                let label = format!("{}/{}", engine.cursor() + 1, engine.total());
                QrFrame { text, label }
            }
            engine => {
                let label = format!("{}/{}", engine.cursor() + 1, engine.total());
                let text = engine.next_emission();
                QrFrame { text, label }
            }
        }
    }

    /// Display label for the fragment at the current cursor.
    pub fn step(&self) -> String {
        format!("{}/{}", self.engine.cursor() + 1, self.engine.total())
    }
}

/// An ordered, finite, restartable sequence of fragment frames.
#[derive(Debug)]
pub enum QrSequence {
    /// Payload small enough (or forced) to be one code.
    Single(SingleFragment),
    /// Rotating multi-fragment sequence.
    Multi(FragmentedPayload),
}

impl QrSequence {
    /// Build a fragment sequence for a payload.
    ///
    /// Returns a [`QrSequence::Single`] when the payload fits the bound
    /// (or no bound is set) and the scheme does not force fragmentation;
    /// the fountain-coded scheme always fragments and requires a
    /// [`PayloadKind`].
    pub fn build(payload: &str, opts: &EncodeOptions, codecs: &Codecs) -> Result<QrSequence> {
        let len = payload.chars().count();

        match opts.scheme {
            Scheme::Ur => Self::build_fountain(payload, opts, codecs),
            Scheme::SingleShot => Ok(QrSequence::Single(SingleFragment::new(payload))),
            Scheme::Specter | Scheme::Bbqr => {
                let Some(max) = opts.max_fragment_size.filter(|&max| max > 0 && len > max)
                else {
                    debug!(len, "payload fits in a single code");
                    return Ok(QrSequence::Single(SingleFragment::new(payload)));
                };
                if opts.scheme == Scheme::Specter {
                    let engine = SpecterEngine::from_payload(payload, max);
                    info!(total = engine.total(), "built specter sequence");
                    Ok(QrSequence::Multi(FragmentedPayload { engine: Engine::Specter(engine) }))
                } else {
                    Self::build_container(payload, max, opts, codecs)
                }
            }
        }
    }

    fn build_container(
        payload: &str,
        max: usize,
        opts: &EncodeOptions,
        codecs: &Codecs,
    ) -> Result<QrSequence> {
        // The codec's native size unit is wire-payload characters, not
        // whole-fragment size including header overhead.
        let scaled = opts.sizing.rescale(max);
        match ContainerEngine::from_payload(codecs.container.clone(), payload.as_bytes(), scaled)? {
            ContainerBuild::Single(text) => {
                debug!("container codec produced a single fragment");
                Ok(QrSequence::Single(SingleFragment::new(text)))
            }
            ContainerBuild::Multi(engine) => {
                info!(total = engine.total(), scaled, "built container sequence");
                Ok(QrSequence::Multi(FragmentedPayload { engine: Engine::Container(engine) }))
            }
        }
    }

    fn build_fountain(payload: &str, opts: &EncodeOptions, codecs: &Codecs) -> Result<QrSequence> {
        let kind = opts.kind.ok_or_else(|| {
            QrError::configuration("fountain encoding requires a payload kind")
        })?;
        let data = match kind {
            PayloadKind::Psbt => codecs.parsers.psbt_to_bytes(payload)?,
            _ => payload.as_bytes().to_vec(),
        };
        let envelope = Envelope::new(kind.type_tag(), data);
        let max_part = opts.max_fragment_size.unwrap_or(DEFAULT_FOUNTAIN_PART_SIZE);
        let encoder = codecs.fountain.encoder(envelope, max_part)?;
        let engine = FountainEngine::for_encoding(encoder);
        info!(total = engine.total(), max_part, "built fountain sequence");
        Ok(QrSequence::Multi(FragmentedPayload { engine: Engine::Fountain(engine) }))
    }

    /// Produce the next frame to display.
    pub fn next(&mut self) -> QrFrame {
        match self {
            QrSequence::Single(single) => single.frame(),
            QrSequence::Multi(multi) => multi.next(),
        }
    }

    /// Display label for the current cursor position.
    pub fn step(&self) -> String {
        match self {
            QrSequence::Single(_) => "1/1".to_string(),
            QrSequence::Multi(multi) => multi.step(),
        }
    }

    /// Total fragments in one pass.
    pub fn total(&self) -> usize {
        match self {
            QrSequence::Single(_) => 1,
            QrSequence::Multi(multi) => multi.total(),
        }
    }

    /// Whether the sequence rotates over multiple fragments.
    pub fn is_multi(&self) -> bool {
        matches!(self, QrSequence::Multi(_))
    }
}
