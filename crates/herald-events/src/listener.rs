//! Listener subscriptions.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use crate::arg::{Arg, Scope};
use crate::emitter::{Emitter, Shared};
use crate::handler::{Call, Handler, HandlerResult};
use crate::name::EventName;

/// One handler registered against one event.
///
/// A listener is created by a registration call and stays active until it is
/// removed, either explicitly or, for one-shot listeners, right after it
/// fires. Once removed it never becomes active again; registering the same
/// handler again creates a new listener.
///
/// `Listener` is a cheap handle. Clones refer to the same subscription.
#[derive(Clone)]
pub struct Listener {
    inner: Arc<ListenerInner>,
}

struct ListenerInner {
    /// Registration order across the whole emitter.
    seq: u64,
    event: EventName,
    handler: Handler,
    scope: Option<Scope>,
    once: bool,
    /// Set when a one-shot listener starts its single invocation.
    fired: AtomicBool,
    /// Non-owning; the emitter owns its listeners.
    owner: Weak<Shared>,
}

impl Listener {
    pub(crate) fn new(
        seq: u64,
        event: EventName,
        handler: Handler,
        scope: Option<Scope>,
        once: bool,
        owner: Weak<Shared>,
    ) -> Self {
        Self {
            inner: Arc::new(ListenerInner {
                seq,
                event,
                handler,
                scope,
                once,
                fired: AtomicBool::new(false),
                owner,
            }),
        }
    }

    /// Returns the event this listener is registered under.
    pub fn event(&self) -> &EventName {
        &self.inner.event
    }

    /// Returns the handler.
    pub fn handler(&self) -> &Handler {
        &self.inner.handler
    }

    /// Returns the scope given at registration.
    pub fn scope(&self) -> Option<&Scope> {
        self.inner.scope.as_ref()
    }

    /// Returns true if this listener is removed after its first invocation.
    pub fn is_once(&self) -> bool {
        self.inner.once
    }

    /// Returns true if both handles refer to the same subscription.
    pub fn ptr_eq(&self, other: &Listener) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns true if the listener is still registered with its emitter.
    pub fn is_active(&self) -> bool {
        self.inner
            .owner
            .upgrade()
            .map(|shared| shared.contains(self))
            .unwrap_or(false)
    }

    /// Removes this listener from its emitter.
    ///
    /// Returns false if it had already been removed or the emitter is gone.
    pub fn remove(&self) -> bool {
        self.inner
            .owner
            .upgrade()
            .map(|shared| shared.detach(self))
            .unwrap_or(false)
    }

    pub(crate) fn seq(&self) -> u64 {
        self.inner.seq
    }

    /// Invokes the handler.
    ///
    /// Returns `None` without invoking if this is a one-shot listener that
    /// has already fired (reentrant dispatch of the same event). A one-shot
    /// listener is removed when its invocation ends, however it ends.
    pub(crate) fn fire(&self, emitter: &Emitter, args: &[Arg]) -> Option<HandlerResult> {
        if self.inner.once && self.inner.fired.swap(true, Ordering::AcqRel) {
            return None;
        }

        let _guard = self.inner.once.then(|| {
            scopeguard::guard((), |()| {
                self.remove();
            })
        });
        Some(self.inner.handler.invoke(&Call::new(emitter, self, args)))
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("event", &self.inner.event)
            .field("handler", &self.inner.handler)
            .field("scope", &self.inner.scope)
            .field("once", &self.inner.once)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Handler {
        Handler::new(|_| Ok(()))
    }

    #[test]
    fn test_listener_accessors() {
        let emitter = Emitter::new();
        let handler = noop();
        let scope = Scope::new("ctx");

        emitter.once_with_scope("ready", handler.clone(), scope.clone());

        let listener = emitter.listeners("ready").unwrap().remove(0);
        assert_eq!(listener.event(), "ready");
        assert!(listener.handler().ptr_eq(&handler));
        assert!(listener.scope().unwrap().ptr_eq(&scope));
        assert!(listener.is_once());
    }

    #[test]
    fn test_remove_self() {
        let emitter = Emitter::new();
        emitter.on("ready", noop()).on("ready", noop());

        let listeners = emitter.listeners("ready").unwrap();
        assert!(listeners[0].is_active());

        assert!(listeners[0].remove());
        assert!(!listeners[0].is_active());
        assert!(!listeners[0].remove());

        let remaining = emitter.listeners("ready").unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(remaining[0].ptr_eq(&listeners[1]));
    }

    #[test]
    fn test_remove_last_deletes_event() {
        let emitter = Emitter::new();
        emitter.on("ready", noop());

        let listener = emitter.listeners("ready").unwrap().remove(0);
        listener.remove();

        assert!(emitter.listeners("ready").is_none());
        assert!(!emitter.has_listeners("ready"));
    }

    #[test]
    fn test_outlives_emitter() {
        let emitter = Emitter::new();
        emitter.on("ready", noop());
        let listener = emitter.listeners("ready").unwrap().remove(0);

        drop(emitter);

        assert!(!listener.is_active());
        assert!(!listener.remove());
    }

    #[test]
    fn test_clones_share_identity() {
        let emitter = Emitter::new();
        emitter.on("ready", noop()).on("ready", noop());

        let first = emitter.listeners("ready").unwrap();
        let second = emitter.listeners("ready").unwrap();

        assert!(first[0].ptr_eq(&second[0]));
        assert!(!first[0].ptr_eq(&first[1]));
    }
}
