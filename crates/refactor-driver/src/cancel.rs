//! Cooperative cancellation (spec §5: "Cancellation is cooperative at
//! the granularity of a file: the driver checks a cancellation token
//! between files and between passes.").

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A cheaply cloneable flag a host can flip from another thread to stop
/// a package run at its next file/pass boundary. Checking is the
/// driver's job; nothing in `refactor-rules` ever looks at this.
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
