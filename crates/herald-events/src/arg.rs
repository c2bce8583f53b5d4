//! Dispatch arguments and invocation scopes.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::handler::Handler;

/// Context object bound to a listener's invocation.
///
/// A scope wraps any `Send + Sync` value. Handlers recover the concrete type
/// with [`Scope::downcast_ref`]. Clones share the same underlying value, so
/// [`Scope::ptr_eq`] can be used to check identity.
#[derive(Clone)]
pub struct Scope(Arc<dyn Any + Send + Sync>);

impl Scope {
    /// Wraps a value as a scope.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Wraps an already shared value without another allocation.
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self(value)
    }

    /// Returns the scope value if it is of type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Returns true if both scopes share the same underlying value.
    pub fn ptr_eq(&self, other: &Scope) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Scope")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// A single dispatch argument.
///
/// Ordinary events carry JSON values. The [`NEW_LISTENER`](crate::NEW_LISTENER)
/// notification also carries the registered handler and scope so observers
/// can compare them by identity.
#[derive(Debug, Clone)]
pub enum Arg {
    /// Plain data.
    Value(Value),
    /// A listener handler.
    Handler(Handler),
    /// A listener scope.
    Scope(Scope),
}

impl Arg {
    /// Returns the JSON value, if this is a value argument.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Arg::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the string contents of a string value argument.
    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    /// Returns the boolean contents of a boolean value argument.
    pub fn as_bool(&self) -> Option<bool> {
        self.as_value().and_then(Value::as_bool)
    }

    /// Returns true if this is a JSON `null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Arg::Value(Value::Null))
    }

    /// Returns the handler, if this is a handler argument.
    pub fn as_handler(&self) -> Option<&Handler> {
        match self {
            Arg::Handler(handler) => Some(handler),
            _ => None,
        }
    }

    /// Returns the scope, if this is a scope argument.
    pub fn as_scope(&self) -> Option<&Scope> {
        match self {
            Arg::Scope(scope) => Some(scope),
            _ => None,
        }
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg::Value(value)
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::Value(Value::from(s))
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg::Value(Value::from(s))
    }
}

impl From<bool> for Arg {
    fn from(b: bool) -> Self {
        Arg::Value(Value::from(b))
    }
}

impl From<i64> for Arg {
    fn from(n: i64) -> Self {
        Arg::Value(Value::from(n))
    }
}

impl From<Handler> for Arg {
    fn from(handler: Handler) -> Self {
        Arg::Handler(handler)
    }
}

impl From<Scope> for Arg {
    fn from(scope: Scope) -> Self {
        Arg::Scope(scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq)]
    struct Greeter {
        prefix: String,
    }

    #[test]
    fn test_scope_downcast() {
        let scope = Scope::new(Greeter {
            prefix: "Hello".to_string(),
        });

        let greeter = scope.downcast_ref::<Greeter>().unwrap();
        assert_eq!(greeter.prefix, "Hello");
        assert!(scope.downcast_ref::<String>().is_none());
    }

    #[test]
    fn test_scope_identity() {
        let scope = Scope::new(1u32);
        let clone = scope.clone();
        let other = Scope::new(1u32);

        assert!(scope.ptr_eq(&clone));
        assert!(!scope.ptr_eq(&other));
    }

    #[test]
    fn test_arg_accessors() {
        let name = Arg::from("Alice");
        assert_eq!(name.as_str(), Some("Alice"));
        assert!(name.as_handler().is_none());

        let flag = Arg::from(true);
        assert_eq!(flag.as_bool(), Some(true));

        let data = Arg::from(json!({ "id": 7 }));
        assert_eq!(data.as_value().unwrap()["id"], 7);

        assert!(Arg::from(Value::Null).is_null());
    }

    #[test]
    fn test_scope_arg() {
        let scope = Scope::new("ctx");
        let arg = Arg::from(scope.clone());

        assert!(arg.as_scope().unwrap().ptr_eq(&scope));
        assert!(arg.as_value().is_none());
    }
}
