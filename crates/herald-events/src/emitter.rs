//! Emitter - synchronous listener registry.
//!
//! Listeners are stored per event in registration order. Dispatch walks the
//! live sequence with a cursor instead of a snapshot, so handlers may add or
//! remove listeners (themselves included) while an event is being emitted:
//!
//! - a listener removed before the cursor never causes the next one to be
//!   skipped;
//! - a listener removed after the cursor is not invoked;
//! - a listener added during dispatch is invoked later in the same dispatch.
//!
//! State lives behind `Arc<RwLock<_>>`. The lock is never held while a handler
//! or warning sink runs, and removed listeners are dropped only after it is
//! released, so user code never runs under it.
//!
//! A separate reentrant dispatch lock is held for the whole of every `emit`
//! and every mutation. The thread that holds it may reenter freely; other
//! threads wait until the in-progress dispatch or mutation has finished.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use parking_lot::ReentrantMutex;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::arg::{Arg, Scope};
use crate::config::EmitterConfig;
use crate::error::{EmitterError, Result};
use crate::handler::Handler;
use crate::listener::Listener;
use crate::name::{EventName, NEW_LISTENER};
use crate::warning::{ListenerLeakWarning, TracingSink, WarningSink};

/// Synchronous in-process event emitter.
///
/// `Emitter` is a cheap handle; clones share the same registry. Mutating
/// methods return `&Self` so calls can be chained.
///
/// # Example
///
/// ```
/// use herald_events::{Arg, Emitter, Handler};
/// use std::sync::{Arc, Mutex};
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = seen.clone();
///
/// let emitter = Emitter::new();
/// emitter
///     .on("greet", Handler::new(move |call| {
///         let name = call.arg(0).and_then(Arg::as_str).unwrap_or("nobody");
///         sink.lock().unwrap().push(format!("hello {name}"));
///         Ok(())
///     }))
///     .emit("greet", &["Alice".into()])
///     .unwrap();
///
/// assert_eq!(*seen.lock().unwrap(), vec!["hello Alice"]);
/// ```
///
/// # Ownership
///
/// Listeners hold only a weak reference to their emitter. A handler or a
/// [`Scope`] that owns a clone of its own emitter forms a reference cycle:
/// the emitter and everything registered on it leak until that listener is
/// removed, for example with `remove_all_listeners(None)`. Inside a handler,
/// use [`Call::emitter`](crate::Call::emitter) instead of capturing a clone.
#[derive(Clone)]
pub struct Emitter {
    shared: Arc<Shared>,
}

/// Registry state shared by every emitter handle and referenced weakly by
/// listeners.
pub(crate) struct Shared {
    /// Held across a whole dispatch or mutation; reentrant on its thread.
    dispatch: ReentrantMutex<()>,
    state: RwLock<State>,
    sink: Arc<dyn WarningSink>,
}

struct State {
    events: HashMap<EventName, Sequence>,
    max_listeners: usize,
    next_seq: u64,
}

/// Listeners of one event. Never empty while stored.
struct Sequence {
    /// Sequence number of the listener that created this sequence. Tells a
    /// sequence apart from one recreated under the same name.
    id: u64,
    /// Sorted by listener sequence number.
    listeners: Vec<Listener>,
    /// Set once the leak warning was issued for this sequence.
    warned: bool,
}

impl Shared {
    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn contains(&self, listener: &Listener) -> bool {
        self.read()
            .events
            .get(listener.event().as_str())
            .map(|seq| seq.listeners.iter().any(|l| l.ptr_eq(listener)))
            .unwrap_or(false)
    }

    pub(crate) fn detach(&self, listener: &Listener) -> bool {
        let _dispatch = self.dispatch.lock();
        let removed = self
            .write()
            .remove_matching(listener.event().as_str(), |l| l.ptr_eq(listener));
        if !removed.is_empty() {
            debug!(event = %listener.event(), once = listener.is_once(), "listener removed");
        }
        !removed.is_empty()
    }
}

impl State {
    /// Splits the matching listeners out of `event`'s sequence.
    ///
    /// The caller must drop the returned listeners after releasing the lock:
    /// the last handle owns the handler and scope, whose `Drop` may call back
    /// into the emitter.
    #[must_use]
    fn remove_matching(
        &mut self,
        event: &str,
        matches: impl Fn(&Listener) -> bool,
    ) -> Vec<Listener> {
        let Some(sequence) = self.events.get_mut(event) else {
            return Vec::new();
        };

        let (removed, kept): (Vec<Listener>, Vec<Listener>) =
            std::mem::take(&mut sequence.listeners)
                .into_iter()
                .partition(|l| matches(l));
        sequence.listeners = kept;

        if sequence.listeners.is_empty() {
            self.events.remove(event);
        }
        removed
    }

    /// Starts a dispatch walk: the sequence id and its first listener.
    fn first(&self, event: &str) -> Option<(u64, Listener)> {
        let sequence = self.events.get(event)?;
        let first = sequence.listeners.first()?;
        Some((sequence.id, first.clone()))
    }

    /// Advances a dispatch walk past the listener numbered `fired`.
    ///
    /// The cursor is re-derived from the live sequence: everything removed
    /// at or before the fired listener has shifted the remaining entries left,
    /// and the first entry registered after it is the next one to visit.
    /// Returns `None` when the walk is finished or its sequence was deleted.
    fn after(&self, event: &str, sequence_id: u64, fired: u64) -> Option<Listener> {
        let sequence = self.events.get(event).filter(|s| s.id == sequence_id)?;
        let cursor = sequence.listeners.partition_point(|l| l.seq() <= fired);
        sequence.listeners.get(cursor).cloned()
    }
}

impl Emitter {
    /// Creates an emitter with default configuration that logs warnings
    /// through `tracing`.
    pub fn new() -> Self {
        Self::with_config(EmitterConfig::default())
    }

    /// Creates an emitter with the given configuration.
    pub fn with_config(config: EmitterConfig) -> Self {
        Self::with_sink(config, Arc::new(TracingSink))
    }

    /// Creates an emitter that reports leak warnings to `sink`.
    pub fn with_sink(config: EmitterConfig, sink: Arc<dyn WarningSink>) -> Self {
        Self {
            shared: Arc::new(Shared {
                dispatch: ReentrantMutex::new(()),
                state: RwLock::new(State {
                    events: HashMap::new(),
                    max_listeners: config.max_listeners,
                    next_seq: 0,
                }),
                sink,
            }),
        }
    }

    /// Registers `handler` to run every time `event` is emitted.
    ///
    /// The handler's bound context is its own [`Listener`].
    pub fn on(&self, event: impl Into<EventName>, handler: Handler) -> &Self {
        self.register(event.into(), handler, None, false)
    }

    /// Alias for [`Emitter::on`].
    pub fn add_listener(&self, event: impl Into<EventName>, handler: Handler) -> &Self {
        self.on(event, handler)
    }

    /// Registers `handler` bound to `scope`.
    pub fn on_with_scope(
        &self,
        event: impl Into<EventName>,
        handler: Handler,
        scope: Scope,
    ) -> &Self {
        self.register(event.into(), handler, Some(scope), false)
    }

    /// Registers `handler` to run the next time `event` is emitted only.
    pub fn once(&self, event: impl Into<EventName>, handler: Handler) -> &Self {
        self.register(event.into(), handler, None, true)
    }

    /// Registers a one-shot `handler` bound to `scope`.
    pub fn once_with_scope(
        &self,
        event: impl Into<EventName>,
        handler: Handler,
        scope: Scope,
    ) -> &Self {
        self.register(event.into(), handler, Some(scope), true)
    }

    fn register(
        &self,
        event: EventName,
        handler: Handler,
        scope: Option<Scope>,
        once: bool,
    ) -> &Self {
        let _dispatch = self.shared.dispatch.lock();

        // Announce before inserting so the new listener never sees its own
        // notification.
        self.announce(&event, &handler, scope.as_ref(), once);

        let (count, warning) = {
            let mut state = self.shared.write();
            let seq = state.next_seq;
            state.next_seq += 1;
            let max_listeners = state.max_listeners;

            let listener = Listener::new(
                seq,
                event.clone(),
                handler,
                scope,
                once,
                Arc::downgrade(&self.shared),
            );
            let sequence = state
                .events
                .entry(event.clone())
                .or_insert_with(|| Sequence {
                    id: seq,
                    listeners: Vec::new(),
                    warned: false,
                });
            sequence.listeners.push(listener);

            let count = sequence.listeners.len();
            let warning = if max_listeners != 0 && count > max_listeners && !sequence.warned {
                sequence.warned = true;
                Some(ListenerLeakWarning {
                    event: event.clone(),
                    count,
                    max_listeners,
                })
            } else {
                None
            };
            (count, warning)
        };

        debug!(event = %event, count, once, "listener registered");

        if let Some(warning) = warning {
            self.shared.sink.listener_leak(&warning);
        }
        self
    }

    fn announce(&self, event: &EventName, handler: &Handler, scope: Option<&Scope>, once: bool) {
        if !self.has_listeners(NEW_LISTENER) {
            return;
        }

        let args = [
            Arg::from(event.as_str()),
            Arg::Handler(handler.clone()),
            scope
                .cloned()
                .map(Arg::Scope)
                .unwrap_or(Arg::Value(Value::Null)),
            Arg::from(once),
        ];

        // Registration is never rejected; an observer failure is only logged.
        if let Err(e) = self.emit(NEW_LISTENER, &args) {
            warn!(event = %event, error = %e, "newListener observer failed");
        }
    }

    /// Removes every listener of `event` whose handler is `handler`.
    ///
    /// Matching is by identity (see [`Handler::ptr_eq`]). Does nothing if
    /// the event or handler is unknown.
    pub fn remove_listener(&self, event: impl AsRef<str>, handler: &Handler) -> &Self {
        let event = event.as_ref();
        let _dispatch = self.shared.dispatch.lock();
        let removed = self
            .shared
            .write()
            .remove_matching(event, |l| l.handler().ptr_eq(handler));

        if !removed.is_empty() {
            debug!(event, removed = removed.len(), "listeners removed");
        }
        drop(removed);
        self
    }

    /// Alias for [`Emitter::remove_listener`].
    pub fn off(&self, event: impl AsRef<str>, handler: &Handler) -> &Self {
        self.remove_listener(event, handler)
    }

    /// Removes every listener of `event`, or of every event if `None`.
    pub fn remove_all_listeners(&self, event: Option<&str>) -> &Self {
        let _dispatch = self.shared.dispatch.lock();
        let removed: Vec<Sequence> = {
            let mut state = self.shared.write();
            match event {
                Some(event) => state.events.remove(event).into_iter().collect(),
                None => std::mem::take(&mut state.events).into_values().collect(),
            }
        };

        match event {
            Some(event) => {
                if let Some(sequence) = removed.first() {
                    debug!(event, removed = sequence.listeners.len(), "all listeners removed");
                }
            }
            None => debug!(events = removed.len(), "all listeners of all events removed"),
        }
        drop(removed);
        self
    }

    /// Returns the listeners of `event` in registration order.
    ///
    /// Returns `None` if the event has no listeners; a returned list is never
    /// empty. The list is a snapshot: changing it does not affect the emitter.
    pub fn listeners(&self, event: impl AsRef<str>) -> Option<Vec<Listener>> {
        self.shared
            .read()
            .events
            .get(event.as_ref())
            .map(|sequence| sequence.listeners.clone())
    }

    /// Returns the number of listeners of `event`.
    pub fn listener_count(&self, event: impl AsRef<str>) -> usize {
        self.shared
            .read()
            .events
            .get(event.as_ref())
            .map(|sequence| sequence.listeners.len())
            .unwrap_or(0)
    }

    /// Returns true if `event` has at least one listener.
    pub fn has_listeners(&self, event: impl AsRef<str>) -> bool {
        self.shared.read().events.contains_key(event.as_ref())
    }

    /// Returns the events that have listeners, in order of first registration.
    pub fn event_names(&self) -> Vec<EventName> {
        let state = self.shared.read();
        let mut names: Vec<(u64, EventName)> = state
            .events
            .iter()
            .map(|(name, sequence)| (sequence.id, name.clone()))
            .collect();
        names.sort_by_key(|(id, _)| *id);
        names.into_iter().map(|(_, name)| name).collect()
    }

    /// Sets the listener count per event above which a leak warning is
    /// issued. `0` disables the warning.
    ///
    /// Events that already warned do not warn again.
    pub fn set_max_listeners(&self, max: usize) -> &Self {
        let _dispatch = self.shared.dispatch.lock();
        self.shared.write().max_listeners = max;
        self
    }

    /// Returns the current listener limit per event.
    pub fn max_listeners(&self) -> usize {
        self.shared.read().max_listeners
    }

    /// Invokes every listener of `event` in registration order.
    ///
    /// Does nothing if the event has no listeners. If a handler fails,
    /// dispatch stops, later listeners are not invoked, and the error is
    /// returned. One-shot listeners are removed right after they run,
    /// whether they succeed or not.
    ///
    /// Registrations, removals and emits from other threads wait until this
    /// dispatch has finished; the dispatching thread itself may reenter.
    pub fn emit(&self, event: impl AsRef<str>, args: &[Arg]) -> Result<&Self> {
        let event = event.as_ref();
        let _dispatch = self.shared.dispatch.lock();
        let Some((sequence_id, first)) = self.shared.read().first(event) else {
            return Ok(self);
        };

        trace!(event, args = args.len(), "dispatching");

        let mut next = Some(first);
        while let Some(listener) = next {
            trace!(event, once = listener.is_once(), "invoking listener");

            if let Some(Err(source)) = listener.fire(self, args) {
                debug!(event, error = %source, "listener failed, dispatch stopped");
                return Err(EmitterError::Handler {
                    event: listener.event().clone(),
                    source,
                });
            }

            next = self.shared.read().after(event, sequence_id, listener.seq());
        }
        Ok(self)
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.read();
        f.debug_struct("Emitter")
            .field("events", &state.events.len())
            .field("max_listeners", &state.max_listeners)
            .finish()
    }
}
