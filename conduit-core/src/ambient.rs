use std::sync::atomic::{AtomicBool, Ordering};

/// Tells whether an externally coordinated transaction currently surrounds the caller.
///
/// Local transactions refuse to start while one is active, this layer only
/// detects ambient transactions and never takes part in them.
pub trait AmbientTransaction: Send + Sync {
    fn is_active(&self) -> bool;
}

/// No external coordinator: ambient transactions never exist.
#[derive(Default, Debug, Clone, Copy)]
pub struct NoAmbientTransaction;

impl AmbientTransaction for NoAmbientTransaction {
    fn is_active(&self) -> bool {
        false
    }
}

/// Switch flipped by an external coordinator when it opens and closes its transaction.
#[derive(Default, Debug)]
pub struct AmbientFlag {
    active: AtomicBool,
}

impl AmbientFlag {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }
}

impl AmbientTransaction for AmbientFlag {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}
