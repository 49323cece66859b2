//! Engine-neutral values and bounded await resolution.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use futures_core::future::BoxFuture;
use futures_util::FutureExt;

use super::error::RuntimeError;

/// A value produced by, or bound for, executed code.
#[derive(Clone)]
pub enum Value {
    /// No value.
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    /// A failure captured in place of a value (e.g. a failed environment extension).
    Error(String),
    /// A host object the console only carries around.
    Opaque(Opaque),
    /// A value that has not been produced yet.
    Pending(Awaitable),
}

impl Value {
    /// Whether this is [`Value::None`].
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Whether this value still needs to be awaited.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Wrap a host object.
    pub fn opaque<T: Any + Send + Sync>(object: T) -> Self {
        Self::Opaque(Opaque::new(object))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Str(s) => f.write_str(s),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match item {
                        Self::Str(s) => write!(f, "{:?}", s)?,
                        other => write!(f, "{}", other)?,
                    }
                }
                f.write_str("]")
            }
            Self::Error(message) => f.write_str(message),
            Self::Opaque(opaque) => write!(f, "<{}>", opaque.type_name),
            Self::Pending(_) => f.write_str("<awaitable>"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Self::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Self::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
            Self::Error(message) => f.debug_tuple("Error").field(message).finish(),
            Self::Opaque(opaque) => f.debug_tuple("Opaque").field(&opaque.type_name).finish(),
            Self::Pending(awaitable) => f.debug_tuple("Pending").field(awaitable).finish(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Error(a), Self::Error(b)) => a == b,
            (Self::Opaque(a), Self::Opaque(b)) => Arc::ptr_eq(&a.object, &b.object),
            (Self::Pending(a), Self::Pending(b)) => Arc::ptr_eq(&a.future, &b.future),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

/// A shared host object.
#[derive(Clone)]
pub struct Opaque {
    type_name: &'static str,
    object: Arc<dyn Any + Send + Sync>,
}

impl Opaque {
    /// Wrap `object`.
    pub fn new<T: Any + Send + Sync>(object: T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            object: Arc::new(object),
        }
    }

    /// Name of the wrapped type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Borrow the object as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.object.downcast_ref::<T>()
    }
}

type PendingFuture = BoxFuture<'static, Result<Value, RuntimeError>>;

/// A value that resolves later. It can be awaited once; clones share the
/// same underlying future.
#[derive(Clone)]
pub struct Awaitable {
    future: Arc<Mutex<Option<PendingFuture>>>,
}

impl Awaitable {
    /// Wrap a future.
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Result<Value, RuntimeError>> + Send + 'static,
    {
        Self {
            future: Arc::new(Mutex::new(Some(future.boxed()))),
        }
    }

    /// An awaitable that yields `value` immediately.
    pub fn ready(value: Value) -> Self {
        Self::new(async move { Ok(value) })
    }

    /// Whether the underlying future was already taken by a waiter.
    pub fn is_consumed(&self) -> bool {
        self.future
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Drive the future to completion.
    ///
    /// The second wait on the same awaitable fails.
    pub async fn wait(&self) -> Result<Value, RuntimeError> {
        let future = self
            .future
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match future {
            Some(future) => future.await,
            None => Err(RuntimeError::new(
                "RuntimeError",
                "cannot reuse already awaited awaitable",
            )),
        }
    }
}

impl fmt::Debug for Awaitable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Awaitable")
            .field("consumed", &self.is_consumed())
            .finish()
    }
}

/// Await `value` up to `max_steps` times.
///
/// A value that is still pending after the last step is returned as-is.
pub async fn resolve(mut value: Value, max_steps: usize) -> Result<Value, RuntimeError> {
    for _ in 0..max_steps {
        match value {
            Value::Pending(awaitable) => value = awaitable.wait().await?,
            other => return Ok(other),
        }
    }
    Ok(value)
}
