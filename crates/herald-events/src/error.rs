//! Error types for emitter operations.

use thiserror::Error;

use crate::name::EventName;

/// Error returned by a listener's handler.
///
/// Handlers can fail with any error type; the emitter only forwards it.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while dispatching an event.
///
/// Registration and removal never fail, so dispatch is the only source of
/// errors.
#[derive(Error, Debug)]
pub enum EmitterError {
    /// A listener's handler failed. Listeners after it were not invoked.
    #[error("listener for '{event}' failed: {source}")]
    Handler {
        /// Event that was being dispatched.
        event: EventName,
        /// Error returned by the handler.
        #[source]
        source: HandlerError,
    },
}

impl EmitterError {
    /// Returns the event being dispatched when the error occurred.
    pub fn event(&self) -> &EventName {
        match self {
            EmitterError::Handler { event, .. } => event,
        }
    }
}

/// Result type alias for emitter operations.
pub type Result<T> = std::result::Result<T, EmitterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_error_display() {
        let err = EmitterError::Handler {
            event: "save".into(),
            source: "disk full".into(),
        };

        assert_eq!(err.to_string(), "listener for 'save' failed: disk full");
        assert_eq!(err.event().as_str(), "save");
    }

    #[test]
    fn test_handler_error_source() {
        use std::error::Error as _;

        let err = EmitterError::Handler {
            event: "save".into(),
            source: "disk full".into(),
        };

        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "disk full");
    }
}
