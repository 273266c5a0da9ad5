//! Shared value types of the fragment pipeline.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Accumulation progress of a decode session.
///
/// `total` is 0 while the fountain decoder cannot yet determine the
/// expected part count; [`Progress::ratio`] reports 0.0 in that case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Progress {
    /// Distinct fragments incorporated so far.
    pub received: usize,
    /// Declared total, or 0 when not yet determinable.
    pub total: usize,
}

impl Progress {
    /// Completion ratio in `0.0..=1.0`. Rounding to a percentage is the
    /// caller's concern.
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.received as f64 / self.total as f64
        }
    }

    /// Display label in the `received/total` form.
    pub fn label(&self) -> String {
        format!("{}/{}", self.received, self.total)
    }
}

/// A fully reassembled payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reassembled {
    /// Textual payload (or a typed record resolved to its canonical
    /// string form).
    Text(String),
    /// Binary payload that is not valid UTF-8.
    Binary(Vec<u8>),
    /// A fountain payload whose declared type is unrecognized. The raw
    /// bytes are retained rather than dropped; no final string exists.
    Unresolved {
        /// The unrecognized registry tag.
        type_tag: String,
        /// The recovered payload bytes.
        raw: Vec<u8>,
    },
}

impl Reassembled {
    /// The payload as text, when a canonical string form exists.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Reassembled::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The payload bytes, whatever the form.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Reassembled::Text(text) => text.as_bytes(),
            Reassembled::Binary(bytes) => bytes,
            Reassembled::Unresolved { raw, .. } => raw,
        }
    }
}

/// Collector verdict for one accepted fragment.
#[derive(Debug, Clone)]
pub enum Accepted {
    /// Accumulation continues; current progress.
    Progress(Progress),
    /// The payload is complete. Repeat fragments return this again
    /// without changing state.
    Complete(Arc<Reassembled>),
}

/// One emission of the encode side: the fragment text to render next and
/// its `position/total` display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrFrame {
    /// Fragment text to render as a QR code.
    pub text: String,
    /// Display label in the `position/total` form.
    pub label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_handles_unknown_total() {
        assert_eq!(Progress { received: 3, total: 0 }.ratio(), 0.0);
        assert_eq!(Progress { received: 1, total: 4 }.ratio(), 0.25);
        assert_eq!(Progress { received: 4, total: 4 }.ratio(), 1.0);
    }

    #[test]
    fn label_formats_received_over_total() {
        assert_eq!(Progress { received: 2, total: 9 }.label(), "2/9");
        assert_eq!(Progress::default().label(), "0/0");
    }

    #[test]
    fn reassembled_exposes_bytes_for_every_form() {
        assert_eq!(Reassembled::Text("abc".into()).as_bytes(), b"abc");
        assert_eq!(Reassembled::Binary(vec![1, 2]).as_bytes(), &[1, 2]);
        let unresolved =
            Reassembled::Unresolved { type_tag: "crypto-hdkey".into(), raw: vec![9] };
        assert_eq!(unresolved.as_bytes(), &[9]);
        assert!(unresolved.as_text().is_none());
    }
}
