//! Structured-container (BBQr) scheme engine.
//!
//! Fragments carry an 8-character header declaring an encoding tag, a
//! file-type tag and a base-36 sequence position. Compression, packing
//! and final byte assembly belong to the injected [`ContainerCodec`]; the
//! engine owns slot bookkeeping and per-instance metadata. The declared
//! tags live inside the engine instance, scoped to its lifetime, so
//! nothing leaks across decode sessions.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::codec::ContainerCodec;
use crate::error::{QrError, Result};
use crate::format::BbqrHeader;
use crate::types::Progress;

/// Encoding and file-type tags captured from the first fragment of a
/// decode session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerMeta {
    /// Declared payload encoding.
    pub encoding: char,
    /// Declared payload file type.
    pub file_type: char,
}

/// Linear remap from the caller's whole-fragment size domain into the
/// container codec's native wire-payload unit.
///
/// The defaults (10–500 onto 23–100) encode empirically tuned QR symbol
/// capacity limits; adjust them only if the downstream optical-code
/// capacity differs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContainerSizing {
    /// Accepted caller-side bound range.
    pub input: (usize, usize),
    /// Codec-side bound range the input maps onto.
    pub output: (usize, usize),
}

impl Default for ContainerSizing {
    fn default() -> Self {
        Self { input: (10, 500), output: (23, 100) }
    }
}

impl ContainerSizing {
    /// Rescale a caller-side bound into the codec's domain, clamping to
    /// the input range first.
    pub fn rescale(&self, bound: usize) -> usize {
        let (in_min, in_max) = self.input;
        let (out_min, out_max) = self.output;
        let bound = bound.clamp(in_min, in_max) as f64;
        let scaled = out_min as f64
            + (bound - in_min as f64) * (out_max - out_min) as f64 / (in_max - in_min) as f64;
        scaled.round() as usize
    }
}

/// Result of splitting a payload through the container codec.
#[derive(Debug)]
pub enum ContainerBuild {
    /// The codec produced a single fragment; no multi-part bookkeeping.
    Single(String),
    /// The general multi-fragment case.
    Multi(ContainerEngine),
}

/// Slot-based state machine for the BBQr scheme.
pub struct ContainerEngine {
    codec: Arc<dyn ContainerCodec>,
    meta: Option<ContainerMeta>,
    /// Decode side: fragment bodies, header stripped. Encode side:
    /// complete fragment texts, emitted verbatim.
    slots: Vec<Option<String>>,
    received: usize,
    cursor: usize,
    assembled: Option<Vec<u8>>,
}

impl ContainerEngine {
    /// Empty decode-side engine.
    pub fn new(codec: Arc<dyn ContainerCodec>) -> Self {
        Self { codec, meta: None, slots: Vec::new(), received: 0, cursor: 0, assembled: None }
    }

    /// Encode-side engine: delegate splitting to the codec and collect
    /// its output until the sequence is exhausted.
    pub fn from_payload(
        codec: Arc<dyn ContainerCodec>,
        payload: &[u8],
        max_size: usize,
    ) -> Result<ContainerBuild> {
        let mut slots: Vec<Option<String>> = Vec::new();
        let mut declared_total = 0;
        for fragment in codec.encode(payload, max_size)? {
            if slots.is_empty() {
                declared_total = fragment.total;
                slots = vec![None; fragment.total];
            }
            if fragment.index < slots.len() {
                slots[fragment.index] = Some(fragment.text);
            }
            if fragment.index + 1 >= declared_total {
                break;
            }
        }
        if slots.is_empty() || slots.iter().any(Option::is_none) {
            return Err(QrError::codec(
                "container encode",
                "codec produced an incomplete fragment sequence".into(),
            ));
        }
        debug!(total = declared_total, "container payload split");

        if declared_total == 1 {
            let only = slots.remove(0).unwrap_or_default();
            return Ok(ContainerBuild::Single(only));
        }

        let received = slots.len();
        Ok(ContainerBuild::Multi(Self {
            codec,
            meta: None,
            slots,
            received,
            cursor: 0,
            assembled: Some(payload.to_vec()),
        }))
    }

    /// Incorporate one parsed fragment.
    ///
    /// The first fragment fixes the session's metadata and slot count;
    /// later fragments disagreeing with either are transient parse
    /// errors. Conflicting slot rewrites are fatal.
    pub fn accept(&mut self, header: BbqrHeader, body: &str) -> Result<()> {
        let meta = ContainerMeta { encoding: header.encoding, file_type: header.file_type };
        if self.slots.is_empty() {
            debug!(total = header.total, encoding = %meta.encoding, file_type = %meta.file_type,
                "allocating container slots");
            self.slots = vec![None; header.total];
            self.meta = Some(meta);
        } else if header.total != self.slots.len() || self.meta != Some(meta) {
            return Err(QrError::parse(
                "bbqr fragment",
                "header does not match the active session",
            ));
        }

        match &self.slots[header.index] {
            Some(existing) if existing != body => {
                return Err(QrError::slot_conflict(header.index, header.total));
            }
            Some(_) => {
                trace!(index = header.index, "duplicate container fragment");
            }
            None => {
                self.slots[header.index] = Some(body.to_string());
                self.received += 1;
            }
        }

        if self.received == self.slots.len() && self.assembled.is_none() {
            let parts: Vec<String> =
                self.slots.iter().map(|s| s.clone().unwrap_or_default()).collect();
            let bytes = self.codec.decode(&parts, meta.encoding, meta.file_type)?;
            debug!(total = self.slots.len(), len = bytes.len(), "container payload complete");
            self.assembled = Some(bytes);
        }
        Ok(())
    }

    /// Whether every slot is filled and the codec produced the payload.
    pub fn is_complete(&self) -> bool {
        self.assembled.is_some()
    }

    /// The reconstructed bytes, once complete.
    pub fn reassembled(&self) -> Option<&[u8]> {
        self.assembled.as_deref()
    }

    /// Filled-slot count over declared total.
    pub fn progress(&self) -> Progress {
        Progress { received: self.received, total: self.slots.len() }
    }

    /// Declared total number of fragments.
    pub fn total(&self) -> usize {
        self.slots.len()
    }

    /// Current 0-based emission position.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Emit the fragment at the cursor verbatim (header already embedded
    /// by the codec) and advance with wraparound. An engine with no slots
    /// yet (decode side before the first fragment) emits nothing.
    pub fn next_emission(&mut self) -> String {
        if self.slots.is_empty() {
            return String::new();
        }
        let text = self.slots[self.cursor].clone().unwrap_or_default();
        self.cursor = (self.cursor + 1) % self.slots.len();
        text
    }
}

impl std::fmt::Debug for ContainerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerEngine")
            .field("meta", &self.meta)
            .field("total", &self.slots.len())
            .field("received", &self.received)
            .field("complete", &self.assembled.is_some())
            .finish()
    }
}
