//! Drivers spawn and manage the scan and display tasks.
//!
//! The two activities are independent: each task owns its payload
//! instance outright and is its sole mutator; they share nothing but the
//! watch channels handed to the caller. Cancelling one never disturbs
//! the other.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::builder::QrSequence;
use crate::collector::Collector;
use crate::error::QrError;
use crate::source::FragmentSource;
use crate::types::{Accepted, Progress, QrFrame, Reassembled};

/// Event published by the scan task.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// Accumulation advanced.
    Progress(Progress),
    /// The payload is complete; the task ends after publishing this.
    Completed(Arc<Reassembled>),
    /// The active instance failed fatally and was discarded; scanning
    /// continues with a fresh instance.
    Failed(Arc<QrError>),
}

/// Result of spawning the scan task.
pub struct ScanChannels {
    /// Receiver for scan events.
    pub events: watch::Receiver<Option<ScanEvent>>,
    /// Cancellation token for graceful shutdown.
    pub cancel: CancellationToken,
}

/// Spawns the scan task: owns the fragment source and the collector.
pub struct ScanDriver;

impl ScanDriver {
    /// Spawn the scan task for the given source and collector.
    pub fn spawn<S>(source: S, collector: Collector) -> ScanChannels
    where
        S: FragmentSource,
    {
        let (event_tx, event_rx) = watch::channel(None);
        let cancel = CancellationToken::new();
        let cancel_task = cancel.clone();

        tokio::spawn(async move {
            Self::scan_task(source, collector, event_tx, cancel_task).await;
        });

        ScanChannels { events: event_rx, cancel }
    }

    async fn scan_task<S>(
        mut source: S,
        mut collector: Collector,
        event_tx: watch::Sender<Option<ScanEvent>>,
        cancel: CancellationToken,
    ) where
        S: FragmentSource,
    {
        info!("scan task started");
        let mut fragment_count = 0u64;
        let mut error_count = 0u32;
        const MAX_ERRORS: u32 = 10;

        loop {
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("scan task cancelled");
                    break;
                }
                result = source.next_fragment() => result,
            };

            match result {
                Ok(Some(text)) => {
                    fragment_count += 1;
                    error_count = 0;
                    trace!(fragment_count, len = text.len(), "fragment read");

                    match collector.accept(&text) {
                        Ok(Accepted::Progress(progress)) => {
                            if event_tx.send(Some(ScanEvent::Progress(progress))).is_err() {
                                debug!("event receiver dropped, shutting down");
                                break;
                            }
                        }
                        Ok(Accepted::Complete(payload)) => {
                            info!(fragment_count, "payload complete");
                            let _ = event_tx.send(Some(ScanEvent::Completed(payload)));
                            break;
                        }
                        Err(err) => {
                            // Instance already discarded by the collector;
                            // surface the failure and keep scanning fresh.
                            warn!(%err, "instance failed");
                            if event_tx.send(Some(ScanEvent::Failed(Arc::new(err)))).is_err() {
                                break;
                            }
                        }
                    }
                }
                Ok(None) => {
                    info!(fragment_count, "fragment source ended");
                    break;
                }
                Err(e) => {
                    error_count += 1;
                    error!("source error ({}/{}): {}", error_count, MAX_ERRORS, e);
                    if error_count >= MAX_ERRORS {
                        error!("too many source errors, shutting down");
                        break;
                    }
                    // Exponential backoff: 50ms, 100ms, 200ms, ...
                    let backoff = Duration::from_millis(50 * (1 << error_count.min(5)));
                    tokio::time::sleep(backoff).await;
                }
            }
        }

        info!(fragment_count, "scan task ended");
    }
}

/// Display cadence of the emission task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayTiming {
    /// Delay between frames.
    pub delay: Duration,
    /// Extra hold on the first frame so a viewer can lock on before the
    /// rotation starts.
    pub first_frame_hold: Duration,
}

impl Default for DisplayTiming {
    fn default() -> Self {
        Self { delay: Duration::from_millis(300), first_frame_hold: Duration::from_millis(900) }
    }
}

/// Result of spawning the display task.
pub struct DisplayChannels {
    /// Receiver for frames to render.
    pub frames: watch::Receiver<Option<Arc<QrFrame>>>,
    /// Cancellation token for graceful shutdown.
    pub cancel: CancellationToken,
}

/// Spawns the display task: owns the fragment sequence and emits exactly
/// one frame per tick.
pub struct DisplayDriver;

impl DisplayDriver {
    /// Spawn the display task for the given sequence.
    pub fn spawn(sequence: QrSequence, timing: DisplayTiming) -> DisplayChannels {
        let (frame_tx, frame_rx) = watch::channel(None);
        let cancel = CancellationToken::new();
        let cancel_task = cancel.clone();

        tokio::spawn(async move {
            Self::display_task(sequence, timing, frame_tx, cancel_task).await;
        });

        DisplayChannels { frames: frame_rx, cancel }
    }

    async fn display_task(
        mut sequence: QrSequence,
        timing: DisplayTiming,
        frame_tx: watch::Sender<Option<Arc<QrFrame>>>,
        cancel: CancellationToken,
    ) {
        info!(total = sequence.total(), multi = sequence.is_multi(), "display task started");

        if !sequence.is_multi() {
            // Static code: render once and hold until cancelled.
            let _ = frame_tx.send(Some(Arc::new(sequence.next())));
            cancel.cancelled().await;
            info!("display task ended");
            return;
        }

        let mut first = true;
        loop {
            let frame = sequence.next();
            trace!(label = %frame.label, "emitting frame");
            if frame_tx.send(Some(Arc::new(frame))).is_err() {
                debug!("frame receiver dropped, shutting down");
                break;
            }

            let hold = if first { timing.delay + timing.first_frame_hold } else { timing.delay };
            first = false;
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("display task cancelled");
                    break;
                }
                _ = tokio::time::sleep(hold) => {}
            }
        }

        info!("display task ended");
    }
}
