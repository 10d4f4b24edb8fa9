//! Cooperative shutdown flag for background loops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared "shutdown requested" flag
///
/// The host keeps one clone and calls [`request`](Self::request) when it is
/// going away; every background loop holds another clone and checks
/// [`is_requested`](Self::is_requested) between iterations. Nothing is
/// interrupted forcibly.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    requested: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal shutdown. Idempotent.
    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}
