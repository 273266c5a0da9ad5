//! Simple-indexed (Specter) scheme engine.
//!
//! Fragments carry a 1-based `p<i>of<n> ` header. Reassembly is a vector
//! of write-once slots; completion means every slot is filled and the
//! payload is the in-order concatenation. The same state machine drives
//! encode-side emission: the producer pre-fills every slot and the cursor
//! wraps over them.

use tracing::{debug, trace};

use crate::error::{QrError, Result};
use crate::types::Progress;

/// Slot-based state machine for the Specter scheme.
#[derive(Debug, Default)]
pub struct SpecterEngine {
    slots: Vec<Option<String>>,
    received: usize,
    cursor: usize,
    assembled: Option<String>,
}

impl SpecterEngine {
    /// Empty decode-side engine; slots are allocated on the first
    /// fragment's declared total.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode-side engine: slice the payload into chunks of exactly
    /// `max` characters (the last chunk may be shorter). All slots are
    /// pre-filled and the engine is complete at creation.
    pub fn from_payload(payload: &str, max: usize) -> Self {
        debug_assert!(max > 0);
        let mut slots = Vec::new();
        let mut chunk = String::with_capacity(max);
        let mut chunk_len = 0;
        for ch in payload.chars() {
            chunk.push(ch);
            chunk_len += 1;
            if chunk_len == max {
                slots.push(Some(std::mem::take(&mut chunk)));
                chunk_len = 0;
            }
        }
        if !chunk.is_empty() {
            slots.push(Some(chunk));
        }
        let received = slots.len();
        Self { slots, received, cursor: 0, assembled: Some(payload.to_string()) }
    }

    /// Incorporate one fragment. `index` is 1-based.
    ///
    /// Filling an already-filled slot with identical content is a no-op;
    /// differing content is a fatal [`QrError::SlotConflict`]. A total
    /// differing from the first fragment's is a transient parse error.
    pub fn accept(&mut self, index: usize, total: usize, body: &str) -> Result<()> {
        if self.slots.is_empty() {
            debug!(total, "allocating specter slots");
            self.slots = vec![None; total];
        } else if total != self.slots.len() {
            return Err(QrError::parse(
                "specter fragment",
                format!("declared total {total} does not match session total {}", self.slots.len()),
            ));
        }
        if index == 0 || index > self.slots.len() {
            return Err(QrError::parse(
                "specter fragment",
                format!("index {index} out of range"),
            ));
        }

        // total == 1 completes without slot bookkeeping; a rewrite with
        // different content is still a conflict.
        if total == 1 {
            match &self.assembled {
                Some(existing) if existing != body => {
                    return Err(QrError::slot_conflict(index, total));
                }
                Some(_) => {}
                None => {
                    self.received = 1;
                    self.assembled = Some(body.to_string());
                }
            }
            return Ok(());
        }

        match &self.slots[index - 1] {
            Some(existing) if existing != body => {
                return Err(QrError::slot_conflict(index, total));
            }
            Some(_) => {
                trace!(index, "duplicate specter fragment");
            }
            None => {
                self.slots[index - 1] = Some(body.to_string());
                self.received += 1;
            }
        }

        if self.received == self.slots.len() {
            let mut data = String::new();
            for slot in &self.slots {
                if let Some(chunk) = slot {
                    data.push_str(chunk);
                }
            }
            debug!(total, len = data.len(), "specter payload complete");
            self.assembled = Some(data);
        }
        Ok(())
    }

    /// Whether every slot is filled.
    pub fn is_complete(&self) -> bool {
        self.assembled.is_some()
    }

    /// The reconstructed payload, once complete.
    pub fn reassembled(&self) -> Option<&str> {
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

    /// Emit the fragment at the cursor, prefixed with its header, and
    /// advance with wraparound. An engine with no slots yet (decode side
    /// before the first fragment) emits nothing.
    pub fn next_emission(&mut self) -> String {
        let total = self.slots.len();
        if total == 0 {
            return String::new();
        }
        let body = self.slots[self.cursor].as_deref().unwrap_or("");
        let text = format!("p{}of{} {}", self.cursor + 1, total, body);
        self.cursor = (self.cursor + 1) % total;
        text
    }
}
