//! Synchronous in-process listener registry.
//!
//! This crate provides the `Emitter` for decoupling producers of state changes
//! from their consumers within one process:
//! - Persistent (`on`) and one-shot (`once`) listeners, invoked in
//!   registration order
//! - Reentrant dispatch: handlers may add, remove and emit while an event is
//!   being dispatched
//! - Advisory leak warnings when an event accumulates too many listeners
//! - A `newListener` notification announcing every registration
//!
//! # Example
//!
//! ```
//! use herald_events::{Arg, Emitter, Handler, Scope};
//!
//! struct Greeter {
//!     greeting: &'static str,
//! }
//!
//! let emitter = Emitter::new();
//! let greet = Handler::new(|call| {
//!     let greeter = call
//!         .this()
//!         .scope()
//!         .and_then(Scope::downcast_ref::<Greeter>)
//!         .ok_or("unbound greeter")?;
//!     let name = call.arg(0).and_then(Arg::as_str).unwrap_or("stranger");
//!     println!("{}, {}!", greeter.greeting, name);
//!     Ok(())
//! });
//!
//! emitter
//!     .on_with_scope("greet", greet.clone(), Scope::new(Greeter { greeting: "Hello" }))
//!     .emit("greet", &["Alice".into()])
//!     .unwrap();
//!
//! emitter.remove_listener("greet", &greet);
//! assert!(emitter.listeners("greet").is_none());
//! ```

pub mod arg;
pub mod config;
pub mod emitter;
pub mod error;
pub mod handler;
pub mod listener;
pub mod name;
pub mod warning;

pub use arg::{Arg, Scope};
pub use config::{EmitterConfig, DEFAULT_MAX_LISTENERS, MAX_LISTENERS_ENV};
pub use emitter::Emitter;
pub use error::{EmitterError, HandlerError, Result};
pub use handler::{Call, Handler, HandlerResult, This};
pub use listener::Listener;
pub use name::{EventName, NEW_LISTENER};
pub use warning::{CollectingSink, ListenerLeakWarning, TracingSink, WarningSink};
