//! Names visible to executed code.

use std::fmt::{self, Write};

use indexmap::IndexMap;

use super::value::Value;
use crate::channel::IncomingMessage;

/// Binding that holds the most recent successful result.
pub const LAST_RESULT: &str = "_";

/// Ordered mapping of names to values, shared with the engine during a call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    bindings: IndexMap<String, Value>,
}

impl Environment {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a binding.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// Bind `name`, returning the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.bindings.insert(name.into(), value.into())
    }

    /// Remove a binding, preserving the order of the rest.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.bindings.shift_remove(name)
    }

    /// Check if a name is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// The last-result slot.
    pub fn last_result(&self) -> &Value {
        self.bindings.get(LAST_RESULT).unwrap_or(&Value::None)
    }

    /// Overwrite the last-result slot.
    pub fn set_last_result(&mut self, value: Value) {
        self.bindings.insert(LAST_RESULT.to_string(), value);
    }

    /// Bound names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    /// Iterate over all bindings.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check if the environment has no bindings.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl<K: Into<String>> Extend<(K, Value)> for Environment {
    fn extend<I: IntoIterator<Item = (K, Value)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.bindings.insert(name.into(), value);
        }
    }
}

/// Provider of an extra binding computed per invocation.
///
/// A provider that fails does not abort the invocation; its error message is
/// bound as [`Value::Error`] instead.
pub trait EnvExtension: Send + Sync {
    /// Produce the value for the invoking message.
    fn provide(&self, message: &IncomingMessage) -> Result<Value, String>;
}

impl<F> EnvExtension for F
where
    F: Fn(&IncomingMessage) -> Result<Value, String> + Send + Sync,
{
    fn provide(&self, message: &IncomingMessage) -> Result<Value, String> {
        self(message)
    }
}

/// Text written by executed code during one call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputCapture {
    buffer: String,
}

impl OutputCapture {
    /// Create an empty capture buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append text.
    pub fn print(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    /// Append text followed by a newline.
    pub fn println(&mut self, text: &str) {
        self.buffer.push_str(text);
        self.buffer.push('\n');
    }

    /// Captured text so far.
    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// Check if nothing was written.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Take the captured text.
    pub fn into_string(self) -> String {
        self.buffer
    }
}

impl Write for OutputCapture {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.buffer.push_str(s);
        Ok(())
    }
}
