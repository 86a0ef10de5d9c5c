use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// What the loop saw when it read the flags this iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlState {
    pub paused: bool,
    pub stopped: bool,
}

/// Operator pause/stop flags.
///
/// Single-writer (whatever channel the operator uses), single-reader (the
/// loop, once per iteration via [`ControlFlags::read`]). Clones share the
/// same flags.
#[derive(Clone, Debug, Default)]
pub struct ControlFlags {
    paused: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
}

impl ControlFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    /// Request a clean shutdown: the loop finishes its current step first.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn read(&self) -> ControlState {
        ControlState {
            paused: self.paused.load(Ordering::SeqCst),
            stopped: self.stopped.load(Ordering::SeqCst),
        }
    }
}
