//! Listener handlers and the invocation context passed to them.

use std::fmt;
use std::sync::Arc;

use crate::arg::{Arg, Scope};
use crate::emitter::Emitter;
use crate::error::HandlerError;
use crate::listener::Listener;
use crate::name::EventName;

/// Result returned by a handler.
pub type HandlerResult = std::result::Result<(), HandlerError>;

type HandlerFn = dyn Fn(&Call<'_>) -> HandlerResult + Send + Sync;

/// A callable registered against an event.
///
/// Handlers are compared by identity: two handlers are the same only if one
/// is a clone of the other. Keep a clone of the handler you register if you
/// intend to remove it later with [`Emitter::remove_listener`].
///
/// # Example
///
/// ```
/// use herald_events::{Emitter, Handler};
///
/// let emitter = Emitter::new();
/// let log = Handler::new(|call| {
///     println!("{} fired with {} args", call.event(), call.args().len());
///     Ok(())
/// });
///
/// emitter.on("saved", log.clone());
/// emitter.remove_listener("saved", &log);
/// assert!(emitter.listeners("saved").is_none());
/// ```
#[derive(Clone)]
pub struct Handler(Arc<HandlerFn>);

impl Handler {
    /// Wraps a closure as a handler.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Call<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Returns true if both handles refer to the same handler.
    pub fn ptr_eq(&self, other: &Handler) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn invoke(&self, call: &Call<'_>) -> HandlerResult {
        (self.0)(call)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// The value a handler is bound to while it runs.
#[derive(Debug, Clone, Copy)]
pub enum This<'a> {
    /// The scope given at registration.
    Scope(&'a Scope),
    /// The listener itself, when no scope was given.
    Listener(&'a Listener),
}

impl<'a> This<'a> {
    /// Returns the scope, if one was bound.
    pub fn scope(&self) -> Option<&'a Scope> {
        match self {
            This::Scope(scope) => Some(scope),
            This::Listener(_) => None,
        }
    }

    /// Returns the listener, if no scope was bound.
    pub fn listener(&self) -> Option<&'a Listener> {
        match self {
            This::Scope(_) => None,
            This::Listener(listener) => Some(listener),
        }
    }
}

/// A single handler invocation.
///
/// Gives the handler its arguments, its bound context, and the emitter that
/// is dispatching, so the handler can register, remove or emit reentrantly.
pub struct Call<'a> {
    emitter: &'a Emitter,
    listener: &'a Listener,
    args: &'a [Arg],
}

impl<'a> Call<'a> {
    pub(crate) fn new(emitter: &'a Emitter, listener: &'a Listener, args: &'a [Arg]) -> Self {
        Self {
            emitter,
            listener,
            args,
        }
    }

    /// Returns the event being dispatched.
    pub fn event(&self) -> &'a EventName {
        self.listener.event()
    }

    /// Returns the dispatch arguments.
    pub fn args(&self) -> &'a [Arg] {
        self.args
    }

    /// Returns the argument at `index`.
    pub fn arg(&self, index: usize) -> Option<&'a Arg> {
        self.args.get(index)
    }

    /// Returns the bound context: the registration scope, or the listener.
    pub fn this(&self) -> This<'a> {
        match self.listener.scope() {
            Some(scope) => This::Scope(scope),
            None => This::Listener(self.listener),
        }
    }

    /// Returns the listener being invoked.
    pub fn listener(&self) -> &'a Listener {
        self.listener
    }

    /// Returns the emitter dispatching this call.
    pub fn emitter(&self) -> &'a Emitter {
        self.emitter
    }
}

impl fmt::Debug for Call<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Call")
            .field("event", self.event())
            .field("args", &self.args)
            .finish()
    }
}
