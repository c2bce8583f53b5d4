//! Advisory listener-leak warnings.
//!
//! When an event accumulates more listeners than the emitter's limit, the
//! emitter reports it once to a [`WarningSink`]. The warning is a hint at a
//! likely bug (listeners registered in a loop and never removed); it never
//! affects registration.

use std::fmt;
use std::sync::Mutex;

use tracing::warn;

use crate::name::EventName;

/// A listener count exceeded the configured maximum for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerLeakWarning {
    /// Event whose listener count exceeded the limit.
    pub event: EventName,
    /// Listener count after the registration that crossed the limit.
    pub count: usize,
    /// Limit in effect at that registration.
    pub max_listeners: usize,
}

impl fmt::Display for ListenerLeakWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "possible listener leak detected: {} listeners added for '{}' (limit {}); \
             use set_max_listeners() to increase the limit",
            self.count, self.event, self.max_listeners
        )
    }
}

/// Receives advisory warnings from an emitter.
///
/// Sinks are called after the emitter's internal lock is released, so they
/// may inspect the emitter.
pub trait WarningSink: Send + Sync {
    /// Called once per event when its listener count first exceeds the limit.
    fn listener_leak(&self, warning: &ListenerLeakWarning);
}

/// Default sink: logs through `tracing` at WARN level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl WarningSink for TracingSink {
    fn listener_leak(&self, warning: &ListenerLeakWarning) {
        warn!(
            event = %warning.event,
            count = warning.count,
            max_listeners = warning.max_listeners,
            "{}",
            warning
        );
    }
}

/// Sink that keeps every warning in memory.
///
/// Useful for asserting on warnings in tests.
#[derive(Debug, Default)]
pub struct CollectingSink {
    warnings: Mutex<Vec<ListenerLeakWarning>>,
}

impl CollectingSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the warnings received so far, oldest first.
    pub fn warnings(&self) -> Vec<ListenerLeakWarning> {
        self.warnings
            .lock()
            .map(|w| w.clone())
            .unwrap_or_default()
    }

    /// Returns the number of warnings received so far.
    pub fn len(&self) -> usize {
        self.warnings.lock().map(|w| w.len()).unwrap_or(0)
    }

    /// Returns true if no warnings were received.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl WarningSink for CollectingSink {
    fn listener_leak(&self, warning: &ListenerLeakWarning) {
        if let Ok(mut warnings) = self.warnings.lock() {
            warnings.push(warning.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Arc;

    fn make_warning() -> ListenerLeakWarning {
        ListenerLeakWarning {
            event: "tick".into(),
            count: 11,
            max_listeners: 10,
        }
    }

    #[test]
    fn test_warning_display() {
        let message = make_warning().to_string();

        assert!(message.contains("11 listeners added for 'tick'"));
        assert!(message.contains("limit 10"));
    }

    #[test]
    fn test_collecting_sink() {
        let sink = CollectingSink::new();
        assert!(sink.is_empty());

        sink.listener_leak(&make_warning());

        assert_eq!(sink.len(), 1);
        assert_eq!(sink.warnings()[0], make_warning());
    }

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl io::Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_tracing_sink_logs_warning() {
        let buf = SharedBuf::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            TracingSink.listener_leak(&make_warning());
        });

        let output = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"));
        assert!(output.contains("possible listener leak detected"));
        assert!(output.contains("event=tick"));
    }
}
