//! Liveness flags for cancelling stale async work.
//!
//! A view takes a [`LivenessGuard`] before starting async work and
//! checks it before applying the result. Tearing the view down (or
//! switching identity) invalidates every outstanding guard at once.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Generation counter shared by a view and its in-flight work.
#[derive(Debug, Clone, Default)]
pub struct Liveness {
    generation: Arc<AtomicU64>,
}

impl Liveness {
    /// Creates a new counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures the current generation.
    pub fn guard(&self) -> LivenessGuard {
        LivenessGuard {
            generation: self.generation.load(Ordering::Acquire),
            shared: Arc::clone(&self.generation),
        }
    }

    /// Invalidates every guard taken so far.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}

/// A captured generation.
#[derive(Debug, Clone)]
pub struct LivenessGuard {
    generation: u64,
    shared: Arc<AtomicU64>,
}

impl LivenessGuard {
    /// Whether the view that issued this guard is still the same one.
    pub fn is_live(&self) -> bool {
        self.shared.load(Ordering::Acquire) == self.generation
    }
}
