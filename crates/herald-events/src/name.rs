//! Event names.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Event name emitted on every registration, before the new listener is added.
///
/// Its arguments are `(event, handler, scope, once)`: the event name as a
/// string, the handler, the scope (or `null`) and the one-shot flag.
pub const NEW_LISTENER: &str = "newListener";

/// Name of a class of events, chosen by the application.
///
/// Cheap to clone; compares and hashes as its string contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventName(Arc<str>);

impl EventName {
    /// Creates a new event name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if this is the reserved [`NEW_LISTENER`] event.
    pub fn is_new_listener(&self) -> bool {
        self.as_str() == NEW_LISTENER
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for EventName {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl From<&String> for EventName {
    fn from(s: &String) -> Self {
        Self::new(s)
    }
}

impl From<&EventName> for EventName {
    fn from(name: &EventName) -> Self {
        name.clone()
    }
}

impl Borrow<str> for EventName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EventName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for EventName {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for EventName {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_event_name_conversions() {
        let a = EventName::from("greet");
        let b = EventName::from(String::from("greet"));

        assert_eq!(a, b);
        assert_eq!(a, "greet");
        assert_eq!(a.to_string(), "greet");
    }

    #[test]
    fn test_lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(EventName::from("greet"), 1);

        assert_eq!(map.get("greet"), Some(&1));
        assert_eq!(map.get("other"), None);
    }

    #[test]
    fn test_is_new_listener() {
        assert!(EventName::from(NEW_LISTENER).is_new_listener());
        assert!(!EventName::from("greet").is_new_listener());
    }
}
