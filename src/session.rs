//! User-facing scan and display sessions.
//!
//! Thin wrappers over the driver tasks: they expose the watch channels
//! as Streams, snapshot accessors, and cancel the underlying task when
//! dropped. Each session owns exactly one payload instance at a time;
//! stopping one session leaves any other session's state untouched.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::builder::QrSequence;
use crate::codec::Codecs;
use crate::collector::Collector;
use crate::driver::{DisplayDriver, DisplayTiming, ScanDriver, ScanEvent};
use crate::source::FragmentSource;
use crate::types::{QrFrame, Reassembled};

/// A running capture/decode activity.
pub struct ScanSession {
    events: watch::Receiver<Option<ScanEvent>>,
    cancel: CancellationToken,
}

impl ScanSession {
    /// Start scanning fragments from a source.
    pub fn start<S>(source: S, codecs: Codecs) -> Self
    where
        S: FragmentSource,
    {
        let channels = ScanDriver::spawn(source, Collector::new(codecs));
        Self { events: channels.events, cancel: channels.cancel }
    }

    /// Scan events as a stream.
    pub fn events(&self) -> impl Stream<Item = ScanEvent> + 'static {
        WatchStream::new(self.events.clone()).filter_map(|opt| futures::future::ready(opt))
    }

    /// The most recent event, if any.
    pub fn latest(&self) -> Option<ScanEvent> {
        self.events.borrow().clone()
    }

    /// Wait for the payload to complete. Returns `None` if the task ends
    /// (source exhausted or session stopped) without completing.
    pub async fn wait(&mut self) -> Option<Arc<Reassembled>> {
        loop {
            if let Some(ScanEvent::Completed(payload)) = &*self.events.borrow_and_update() {
                return Some(payload.clone());
            }
            if self.events.changed().await.is_err() {
                return None;
            }
        }
    }

    /// Stop the scan task. The partial instance is discarded; nothing
    /// else is affected.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        debug!("dropping scan session");
        self.cancel.cancel();
    }
}

/// A running emission/display activity.
pub struct DisplaySession {
    frames: watch::Receiver<Option<Arc<QrFrame>>>,
    cancel: CancellationToken,
}

impl DisplaySession {
    /// Start displaying a fragment sequence at the given cadence.
    pub fn start(sequence: QrSequence, timing: DisplayTiming) -> Self {
        let channels = DisplayDriver::spawn(sequence, timing);
        Self { frames: channels.frames, cancel: channels.cancel }
    }

    /// Frames to render, as a stream.
    pub fn frames(&self) -> impl Stream<Item = Arc<QrFrame>> + 'static {
        WatchStream::new(self.frames.clone()).filter_map(|opt| futures::future::ready(opt))
    }

    /// The frame currently on display, if any.
    pub fn current_frame(&self) -> Option<Arc<QrFrame>> {
        self.frames.borrow().clone()
    }

    /// Stop the display task between fragments.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for DisplaySession {
    fn drop(&mut self) {
        debug!("dropping display session");
        self.cancel.cancel();
    }
}
