//! Fault injection and counters for exercising error paths against the in-memory store.

use std::{
    sync::atomic::{AtomicBool, AtomicU64, Ordering},
    time::Duration,
};

/// Switches that make the next store calls fail or slow down.
///
/// All switches are off by default and can be flipped at any time from any task.
#[derive(Debug, Default)]
pub struct Faults {
    connect: AtomicBool,
    disconnect: AtomicBool,
    ping: AtomicBool,
    find: AtomicBool,
    cursor_close: AtomicBool,
    no_documents: AtomicBool,
    latency_ms: AtomicU64,
}

impl Faults {
    /// Makes `connect` fail.
    pub fn fail_connect(&self, fail: bool) {
        self.connect.store(fail, Ordering::SeqCst);
    }

    /// Makes `disconnect` fail.
    pub fn fail_disconnect(&self, fail: bool) {
        self.disconnect.store(fail, Ordering::SeqCst);
    }

    /// Makes `ping` fail, as if the primary were unreachable.
    pub fn fail_ping(&self, fail: bool) {
        self.ping.store(fail, Ordering::SeqCst);
    }

    /// Makes `find` fail before a cursor is opened.
    pub fn fail_find(&self, fail: bool) {
        self.find.store(fail, Ordering::SeqCst);
    }

    /// Makes cursor release fail.
    pub fn fail_cursor_close(&self, fail: bool) {
        self.cursor_close.store(fail, Ordering::SeqCst);
    }

    /// Makes `find` report "no documents" instead of returning an empty cursor.
    pub fn report_no_documents(&self, report: bool) {
        self.no_documents.store(report, Ordering::SeqCst);
    }

    /// Delays every round trip (including each cursor fetch) by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms.store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    pub(crate) fn connect_fails(&self) -> bool {
        self.connect.load(Ordering::SeqCst)
    }

    pub(crate) fn disconnect_fails(&self) -> bool {
        self.disconnect.load(Ordering::SeqCst)
    }

    pub(crate) fn ping_fails(&self) -> bool {
        self.ping.load(Ordering::SeqCst)
    }

    pub(crate) fn find_fails(&self) -> bool {
        self.find.load(Ordering::SeqCst)
    }

    pub(crate) fn cursor_close_fails(&self) -> bool {
        self.cursor_close.load(Ordering::SeqCst)
    }

    pub(crate) fn reports_no_documents(&self) -> bool {
        self.no_documents.load(Ordering::SeqCst)
    }

    pub(crate) fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms.load(Ordering::SeqCst))
    }
}

/// Counters of store activity.
#[derive(Debug, Default)]
pub struct Stats {
    round_trips: AtomicU64,
    cursors_opened: AtomicU64,
    cursors_released: AtomicU64,
}

impl Stats {
    /// Number of round trips started against the store.
    pub fn round_trips(&self) -> u64 {
        self.round_trips.load(Ordering::SeqCst)
    }

    pub fn cursors_opened(&self) -> u64 {
        self.cursors_opened.load(Ordering::SeqCst)
    }

    pub fn cursors_released(&self) -> u64 {
        self.cursors_released.load(Ordering::SeqCst)
    }

    /// Cursors opened and not yet successfully released.
    pub fn open_cursors(&self) -> u64 {
        self.cursors_opened().saturating_sub(self.cursors_released())
    }

    pub(crate) fn record_round_trip(&self) {
        self.round_trips.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_cursor_opened(&self) {
        self.cursors_opened.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_cursor_released(&self) {
        self.cursors_released.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_cursors_never_underflows() {
        let stats = Stats::default();
        stats.record_cursor_released();

        assert_eq!(stats.open_cursors(), 0);

        stats.record_cursor_opened();
        stats.record_cursor_opened();
        assert_eq!(stats.open_cursors(), 1);
    }
}
