use std::sync::atomic::{AtomicI64, Ordering};

use plume_types::UnixTimestamp;

/// Source of creation timestamps for the program.
pub trait Clock: Send + Sync {
    fn now(&self) -> UnixTimestamp;
}

/// Wall-clock seconds.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> UnixTimestamp {
        UnixTimestamp::now()
    }
}

/// A manually driven clock for tests and deterministic replays.
#[derive(Debug, Default)]
pub struct FixedClock {
    secs: AtomicI64,
}

impl FixedClock {
    pub fn new(start: UnixTimestamp) -> Self {
        Self {
            secs: AtomicI64::new(start.as_secs()),
        }
    }

    pub fn set(&self, to: UnixTimestamp) {
        self.secs.store(to.as_secs(), Ordering::SeqCst);
    }

    pub fn advance(&self, secs: i64) {
        self.secs.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> UnixTimestamp {
        UnixTimestamp::from_secs(self.secs.load(Ordering::SeqCst))
    }
}
