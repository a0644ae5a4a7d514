//! Binding values and the policy used to compare them.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::component::Mosaic;
use crate::dom::EventHandler;

// =============================================================================
// Dynamic Value
// =============================================================================

/// The value bound to one Part on one render pass.
///
/// Scalars are owned. Everything else is behind a shared pointer, so
/// [`ComparePolicy::Identity`] can tell "same value" from "new value with the
/// same contents".
#[derive(Clone)]
pub enum DynamicValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(Rc<str>),
    /// Structured JSON (an array or object).
    Json(Rc<Value>),
    Handler(EventHandler),
    Component(Mosaic),
    List(Rc<[DynamicValue]>),
}

impl DynamicValue {
    /// Text used for child/text content and attribute values.
    ///
    /// `Null`, handlers and components render as the empty string; whole
    /// numbers render without a fractional part.
    pub fn to_text(&self) -> String {
        match self {
            Self::Null | Self::Handler(_) | Self::Component(_) => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => format_number(*n),
            Self::Text(text) => text.to_string(),
            Self::Json(value) => value.to_string(),
            Self::List(items) => items.iter().map(DynamicValue::to_text).collect(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_component(&self) -> Option<&Mosaic> {
        match self {
            Self::Component(mosaic) => Some(mosaic),
            _ => None,
        }
    }

    pub fn as_handler(&self) -> Option<&EventHandler> {
        match self {
            Self::Handler(handler) => Some(handler),
            _ => None,
        }
    }

    /// Build a list binding.
    pub fn list<T: Into<DynamicValue>>(items: impl IntoIterator<Item = T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl fmt::Debug for DynamicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Json(value) => f.debug_tuple("Json").field(value).finish(),
            Self::Handler(_) => f.write_str("Handler(..)"),
            Self::Component(mosaic) => f.debug_tuple("Component").field(mosaic).finish(),
            Self::List(items) => f.debug_list().entries(items.iter()).finish(),
        }
    }
}

impl From<bool> for DynamicValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

macro_rules! number_from {
    ($($ty:ty),*) => {
        $(impl From<$ty> for DynamicValue {
            fn from(value: $ty) -> Self {
                Self::Number(value as f64)
            }
        })*
    };
}

number_from!(i32, i64, u32, u64, usize, f32, f64);

impl From<&str> for DynamicValue {
    fn from(value: &str) -> Self {
        Self::Text(Rc::from(value))
    }
}

impl From<String> for DynamicValue {
    fn from(value: String) -> Self {
        Self::Text(Rc::from(value))
    }
}

impl From<Value> for DynamicValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => Self::Text(Rc::from(s)),
            structured => Self::Json(Rc::new(structured)),
        }
    }
}

impl From<Option<Value>> for DynamicValue {
    fn from(value: Option<Value>) -> Self {
        value.map_or(Self::Null, Self::from)
    }
}

/// Keeps the pointer of a structured value, so a handle from
/// [`Observable::shared`](crate::reactive::Observable::shared) compares equal
/// under [`ComparePolicy::Identity`] until it is replaced.
impl From<Rc<Value>> for DynamicValue {
    fn from(value: Rc<Value>) -> Self {
        match &*value {
            Value::Array(_) | Value::Object(_) => Self::Json(value),
            scalar => Self::from(scalar.clone()),
        }
    }
}

impl From<Option<Rc<Value>>> for DynamicValue {
    fn from(value: Option<Rc<Value>>) -> Self {
        value.map_or(Self::Null, Self::from)
    }
}

impl From<EventHandler> for DynamicValue {
    fn from(value: EventHandler) -> Self {
        Self::Handler(value)
    }
}

impl From<Mosaic> for DynamicValue {
    fn from(value: Mosaic) -> Self {
        Self::Component(value)
    }
}

impl From<&Mosaic> for DynamicValue {
    fn from(value: &Mosaic) -> Self {
        Self::Component(value.clone())
    }
}

impl From<Vec<DynamicValue>> for DynamicValue {
    fn from(value: Vec<DynamicValue>) -> Self {
        Self::List(value.into())
    }
}

// =============================================================================
// Compare Policy
// =============================================================================

/// How a Part decides whether its new value differs from the last one.
///
/// `Identity` compares scalars by value and shared payloads (JSON, lists,
/// handlers, components) by pointer, so a list rebuilt on every render is
/// always dirty. `Structural` compares JSON and lists by contents and
/// components with [`Mosaic::equals`]. Handlers compare by pointer under both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComparePolicy {
    #[default]
    Identity,
    Structural,
}

impl ComparePolicy {
    pub fn same(self, a: &DynamicValue, b: &DynamicValue) -> bool {
        use DynamicValue as V;
        match (a, b) {
            (V::Null, V::Null) => true,
            (V::Bool(a), V::Bool(b)) => a == b,
            (V::Number(a), V::Number(b)) => a == b,
            (V::Text(a), V::Text(b)) => a == b,
            (V::Handler(a), V::Handler(b)) => Rc::ptr_eq(a, b),
            (V::Json(a), V::Json(b)) => match self {
                Self::Identity => Rc::ptr_eq(a, b),
                Self::Structural => a == b,
            },
            (V::Component(a), V::Component(b)) => match self {
                Self::Identity => a.ptr_eq(b),
                Self::Structural => a.equals(b),
            },
            (V::List(a), V::List(b)) => match self {
                Self::Identity => Rc::ptr_eq(a, b),
                Self::Structural => {
                    a.len() == b.len() && a.iter().zip(b.iter()).all(|(a, b)| self.same(a, b))
                }
            },
            _ => false,
        }
    }

    /// Whether `next` must be committed given the last committed value.
    /// Nothing committed yet always counts as a change.
    pub fn changed(self, last: Option<&DynamicValue>, next: &DynamicValue) -> bool {
        last.is_none_or(|last| !self.same(last, next))
    }
}
