use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation flag shared between a search and whoever wants
/// to stop it. Timeouts are implemented by cancelling from a timer.
#[derive(Debug, Default)]
pub struct Cancellable {
    cancelled: AtomicBool,
}

impl Cancellable {
    pub const fn new() -> Cancellable {
        Cancellable {
            cancelled: AtomicBool::new(false),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Looks at the flag only every `period` calls. The first call always looks.
pub struct PeriodicPollCancellable<'a> {
    cancellable: &'a Cancellable,
    period: u32,
    count: u32,
}

impl<'a> PeriodicPollCancellable<'a> {
    pub fn new(cancellable: &'a Cancellable, period: u32) -> PeriodicPollCancellable<'a> {
        PeriodicPollCancellable {
            cancellable,
            period: period.max(1),
            count: 0,
        }
    }

    pub fn is_cancelled(&mut self) -> bool {
        let poll = self.count % self.period == 0;
        self.count = self.count.wrapping_add(1);
        poll && self.cancellable.is_cancelled()
    }
}
