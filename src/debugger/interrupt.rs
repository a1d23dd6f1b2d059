use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// User interrupt request (Ctrl-C while a long unwind is in progress).
///
/// Handle is cheap to clone, all clones share a single flag: a signal handler keeps one clone,
/// frame lists keep others. Unwind loop consumes the flag when it observes it,
/// so a single Ctrl-C aborts a single walk.
#[derive(Clone, Debug, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request interruption of current long-running operation.
    pub fn interrupt(&self) {
        self.0.store(true, Ordering::SeqCst)
    }

    /// Return true and reset the flag if interruption was requested.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }

    /// Drop pending interruption request, called before a new command starts.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst)
    }
}
