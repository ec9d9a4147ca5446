use std::borrow::Cow;
use crate::context::{Context, ContextRef};
pub use serde_json::Value as JsonValue;


impl Context for JsonValue {
    fn child(&self, name: &str) -> Option<ContextRef<'_>> {
        match self {
            JsonValue::Object(obj) => obj.get(name).map(
                |value| value as ContextRef<'_>
            ),
            _ => None
        }
    }

    fn children(&self) -> Option<Vec<ContextRef<'_>>> {
        match self {
            JsonValue::Array(seq) =>
                Some(
                    seq.iter()
                        .map(|value| value as ContextRef<'_>)
                        .collect::<_>()
                ),
            _ => None
        }
    }

    fn value(&self) -> Option<Cow<'_, str>> {
        match self {
            JsonValue::String(s) => Some(Cow::Borrowed(s.as_str())),
            JsonValue::Number(n) => Some(Cow::Owned(n.to_string())),
            JsonValue::Bool(b) => Some(Cow::Owned(b.to_string())),
            _ => None
        }
    }

    fn is_truthy(&self) -> bool {
        match self {
            JsonValue::Null => false,
            JsonValue::Bool(b) => *b,
            JsonValue::Number(n) => n.as_f64().map_or(true, |n| n != 0.0),
            JsonValue::String(s) => !s.is_empty(),
            JsonValue::Array(seq) => !seq.is_empty(),
            JsonValue::Object(_) => true
        }
    }

    fn is_null(&self) -> bool {
        self.is_null()
    }
}
