//! Scheme engines: one state machine per fragmentation scheme.
//!
//! Scheme behavior is a closed set of tagged variants dispatched through
//! [`Engine`] rather than scattered conditionals; exactly one engine is
//! active per payload instance and the scheme never changes once the
//! first fragment is processed.

pub mod container;
pub mod fountain;
pub mod specter;

pub use container::{ContainerBuild, ContainerEngine, ContainerMeta, ContainerSizing};
pub use fountain::FountainEngine;
pub use specter::SpecterEngine;

use crate::format::Scheme;
use crate::types::Progress;

/// Closed dispatch over the scheme engines.
#[derive(Debug)]
pub enum Engine {
    /// Simple-indexed slot engine.
    Specter(SpecterEngine),
    /// Fountain-coded engine.
    Fountain(FountainEngine),
    /// Structured-container engine.
    Container(ContainerEngine),
}

impl Engine {
    /// The scheme this engine implements.
    pub fn scheme(&self) -> Scheme {
        match self {
            Engine::Specter(_) => Scheme::Specter,
            Engine::Fountain(_) => Scheme::Ur,
            Engine::Container(_) => Scheme::Bbqr,
        }
    }

    /// Whether the payload is fully reconstructed.
    pub fn is_complete(&self) -> bool {
        match self {
            Engine::Specter(e) => e.is_complete(),
            Engine::Fountain(e) => e.is_complete(),
            Engine::Container(e) => e.is_complete(),
        }
    }

    /// Current accumulation progress.
    pub fn progress(&self) -> Progress {
        match self {
            Engine::Specter(e) => e.progress(),
            Engine::Fountain(e) => e.progress(),
            Engine::Container(e) => e.progress(),
        }
    }

    /// Declared (or best-effort) total fragment count.
    pub fn total(&self) -> usize {
        match self {
            Engine::Specter(e) => e.total(),
            Engine::Fountain(e) => e.total(),
            Engine::Container(e) => e.total(),
        }
    }

    /// Current 0-based emission position.
    pub fn cursor(&self) -> usize {
        match self {
            Engine::Specter(e) => e.cursor(),
            Engine::Fountain(e) => e.cursor(),
            Engine::Container(e) => e.cursor(),
        }
    }

    /// Produce the next fragment text and advance the cursor.
    pub fn next_emission(&mut self) -> String {
        match self {
            Engine::Specter(e) => e.next_emission(),
            Engine::Fountain(e) => e.next_emission(),
            Engine::Container(e) => e.next_emission(),
        }
    }
}
