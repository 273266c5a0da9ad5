//! Decode side: accumulate inbound fragments into a payload.
//!
//! The collector owns at most one active scheme engine at a time. A
//! fragment identifying as a different scheme than the active instance
//! starts a fresh instance and the prior partial accumulation is
//! discarded; schemes are never merged. Per-fragment parse noise is
//! swallowed; slot conflicts and decoder failures discard the instance
//! and surface to the caller.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::codec::Codecs;
use crate::error::Result;
use crate::format::{self, Scheme};
use crate::resolver;
use crate::schemes::{ContainerEngine, Engine, FountainEngine, SpecterEngine};
use crate::types::{Accepted, Progress, Reassembled};

struct Active {
    engine: Engine,
    result: Option<Arc<Reassembled>>,
}

/// Fragment-sequence collector: feed fragments one at a time, observe
/// progress, completion or a fatal mismatch.
pub struct Collector {
    codecs: Codecs,
    active: Option<Active>,
}

impl Collector {
    /// A collector with no active instance.
    pub fn new(codecs: Codecs) -> Self {
        Self { codecs, active: None }
    }

    /// Discard any partial accumulation.
    pub fn reset(&mut self) {
        if self.active.take().is_some() {
            debug!("discarded partial instance");
        }
    }

    /// Progress of the active instance, if any.
    pub fn progress(&self) -> Progress {
        self.active.as_ref().map(|a| a.engine.progress()).unwrap_or_default()
    }

    /// Incorporate one inbound fragment.
    ///
    /// Malformed fragments are ignored (state untouched, current progress
    /// returned). Instance-fatal errors discard the active instance
    /// before propagating. Fragments arriving after completion are
    /// no-ops that return [`Accepted::Complete`] again.
    pub fn accept(&mut self, text: &str) -> Result<Accepted> {
        let scheme = Scheme::identify(text);

        if scheme == Scheme::SingleShot {
            // Whole text is one complete payload; replaces any partial
            // multi-fragment accumulation, as a competing encoding would.
            debug!("single-shot fragment completes immediately");
            let result = Arc::new(Reassembled::Text(text.to_string()));
            self.active = None;
            return Ok(Accepted::Complete(result));
        }

        match &self.active {
            Some(active) if active.engine.scheme() == scheme => {
                if let Some(result) = &active.result {
                    trace!("fragment for completed instance ignored");
                    return Ok(Accepted::Complete(result.clone()));
                }
            }
            Some(active) => {
                debug!(
                    old = ?active.engine.scheme(),
                    new = ?scheme,
                    "scheme changed, starting fresh instance"
                );
                self.active = None;
            }
            None => {}
        }

        if self.active.is_none() {
            self.active = Some(Active { engine: self.start_engine(scheme), result: None });
        }
        let Some(active) = self.active.as_mut() else {
            return Ok(Accepted::Progress(Progress::default()));
        };
        let outcome = Self::feed(&mut active.engine, text);
        match outcome {
            Ok(()) => {}
            Err(err) if err.is_instance_fatal() => {
                warn!(%err, "fatal fragment error, discarding instance");
                self.active = None;
                return Err(err);
            }
            Err(err) => {
                // Noisy read; keep accumulating.
                debug!(%err, "ignoring malformed fragment");
                return Ok(Accepted::Progress(active.engine.progress()));
            }
        }

        if active.engine.is_complete() {
            let result = match Self::finalize(&active.engine, &self.codecs) {
                Ok(result) => Arc::new(result),
                Err(err) => {
                    self.active = None;
                    return Err(err);
                }
            };
            active.result = Some(result.clone());
            return Ok(Accepted::Complete(result));
        }

        Ok(Accepted::Progress(active.engine.progress()))
    }

    fn start_engine(&self, scheme: Scheme) -> Engine {
        debug!(?scheme, "starting new instance");
        match scheme {
            Scheme::Specter => Engine::Specter(SpecterEngine::new()),
            Scheme::Ur => Engine::Fountain(FountainEngine::for_decoding(
                self.codecs.fountain.decoder(),
            )),
            Scheme::Bbqr => Engine::Container(ContainerEngine::new(self.codecs.container.clone())),
            // Handled before an engine is ever started.
            Scheme::SingleShot => unreachable!("single-shot fragments never reach an engine"),
        }
    }

    fn feed(engine: &mut Engine, text: &str) -> Result<()> {
        match engine {
            Engine::Specter(engine) => {
                let (header, body) = format::parse_specter(text)?;
                engine.accept(header.index, header.total, body)
            }
            Engine::Fountain(engine) => engine.accept(text),
            Engine::Container(engine) => {
                let (header, body) = format::parse_bbqr(text)?;
                engine.accept(header, body)
            }
        }
    }

    fn finalize(engine: &Engine, codecs: &Codecs) -> Result<Reassembled> {
        match engine {
            Engine::Specter(engine) => {
                Ok(Reassembled::Text(engine.reassembled().unwrap_or_default().to_string()))
            }
            Engine::Container(engine) => {
                let bytes = engine.reassembled().unwrap_or_default();
                Ok(match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => Reassembled::Text(text),
                    Err(err) => Reassembled::Binary(err.into_bytes()),
                })
            }
            Engine::Fountain(engine) => {
                let envelope = engine.envelope()?;
                resolver::resolve(&envelope, codecs.parsers.as_ref())
            }
        }
    }
}

impl std::fmt::Debug for Collector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collector")
            .field("active_scheme", &self.active.as_ref().map(|a| a.engine.scheme()))
            .field("progress", &self.progress())
            .finish()
    }
}
