//! Capture sources for inbound fragments.

use tokio::sync::mpsc;

use crate::Result;

/// Trait for inbound fragment sources.
///
/// Sources abstract over where decoded QR text comes from (camera,
/// screen capture, network) and handle their own timing internally. No
/// guarantee is made against duplicates or reordering; the collector is
/// built to tolerate both.
#[async_trait::async_trait]
pub trait FragmentSource: Send + 'static {
    /// Get the next decoded fragment text.
    ///
    /// Returns:
    /// - `Ok(Some(text))` - one successfully read code
    /// - `Ok(None)` - source ended (normal termination)
    /// - `Err(e)` - read error occurred
    async fn next_fragment(&mut self) -> Result<Option<String>>;
}

/// Create a channel-backed source plus its sender handle.
///
/// Lets any producer (camera loop, test harness, network reader) hand
/// decoded fragment text into a scan session. Dropping the sender ends
/// the source.
pub fn channel(capacity: usize) -> (FragmentSender, ChannelSource) {
    let (tx, rx) = mpsc::channel(capacity);
    (FragmentSender { tx }, ChannelSource { rx })
}

/// Sending half of a channel-backed fragment source.
#[derive(Clone)]
pub struct FragmentSender {
    tx: mpsc::Sender<String>,
}

impl FragmentSender {
    /// Send one decoded fragment. Returns `false` once the scan session
    /// has gone away.
    pub async fn send(&self, text: impl Into<String>) -> bool {
        self.tx.send(text.into()).await.is_ok()
    }
}

/// Receiving half of a channel-backed fragment source.
pub struct ChannelSource {
    rx: mpsc::Receiver<String>,
}

#[async_trait::async_trait]
impl FragmentSource for ChannelSource {
    async fn next_fragment(&mut self) -> Result<Option<String>> {
        Ok(self.rx.recv().await)
    }
}
