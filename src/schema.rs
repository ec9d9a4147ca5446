//! Declared shape of the data a template renders against.
//!
//! A [Schema] is the root object of the render context. It can be built
//! three ways:
//!
//! - by hand with [Schema::field] and the [Kind] helpers,
//! - from a shape document in JSON or YAML ([Schema::from_json],
//!   [Schema::from_yaml]),
//! - from native types implementing [Shape] ([Schema::of]).
//!
//! In a shape document the string `scalar` is a scalar, a one element
//! sequence `[k]` is a list of `k`, a mapping is an object and a key
//! ending with `?` marks its field optional:
//!
//! ```yaml
//! title: scalar
//! todos:
//!   - title: scalar
//!     done: scalar
//! author?:
//!   name: scalar
//! ```
use std::collections::BTreeMap;
use std::fmt;
use crate::error::SchemaError;
use crate::JsonValue;

pub type Fields = BTreeMap<String, Kind>;


#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    Scalar,
    List(Box<Kind>),
    Object(Fields),
    Optional(Box<Kind>),
}

impl Kind {
    pub fn list(element: Kind) -> Kind {
        Kind::List(Box::new(element))
    }

    pub fn object<I, S>(fields: I) -> Kind
    where I: IntoIterator<Item = (S, Kind)>, S: Into<String> {
        Kind::Object(
            fields.into_iter()
                .map(|(name, kind)| (name.into(), kind))
                .collect()
        )
    }

    pub fn optional(kind: Kind) -> Kind {
        match kind {
            Kind::Optional(_) => kind,
            _ => Kind::Optional(Box::new(kind))
        }
    }

    /// The kind under any `Optional` layers, and whether there was one.
    pub(crate) fn required(&self) -> (&Kind, bool) {
        match self {
            Kind::Optional(inner) => (inner.required().0, true),
            _ => (self, false)
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Scalar => write!(f, "scalar"),
            Kind::List(element) => write!(f, "list of {}", element),
            Kind::Object(_) => write!(f, "object"),
            Kind::Optional(inner) => write!(f, "optional {}", inner),
        }
    }
}


#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    fields: Fields,
}

impl Schema {
    pub fn new() -> Self {
        Schema { fields: Fields::new() }
    }

    pub fn field(mut self, name: &str, kind: Kind) -> Self {
        self.fields.insert(name.to_owned(), kind);
        self
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Kind> {
        self.fields.get(name)
    }

    /// Schema of a native type whose [Shape] is an object.
    pub fn of<T: Shape>() -> Result<Self, SchemaError> {
        match T::kind() {
            Kind::Object(fields) => Ok(Schema { fields }),
            other => Err(SchemaError::InvalidShape {
                path: String::new(),
                reason: format!("root must be an object, found {}", other),
            })
        }
    }

    pub fn from_json(text: &str) -> Result<Self, SchemaError> {
        let shape = serde_json::from_str::<JsonValue>(text)?;
        Schema::from_shape(&shape)
    }

    pub fn from_yaml(text: &str) -> Result<Self, SchemaError> {
        let shape = serde_yaml::from_str::<JsonValue>(text)?;
        Schema::from_shape(&shape)
    }

    pub fn from_shape(shape: &JsonValue) -> Result<Self, SchemaError> {
        match shape {
            JsonValue::Object(entries) => Ok(Schema { fields: fields_from_shape(entries, "")? }),
            _ => Err(invalid_shape("", "root must be a mapping"))
        }
    }
}

fn fields_from_shape(
    entries: &serde_json::Map<String, JsonValue>, path: &str
) -> Result<Fields, SchemaError> {
    let mut fields = Fields::new();
    for (key, value) in entries {
        let (name, optional) = match key.strip_suffix('?') {
            Some(name) => (name, true),
            None => (key.as_str(), false)
        };
        let field_path = format!("{}.{}", path, name);
        let kind = kind_from_shape(value, &field_path)?;
        let kind = if optional { Kind::optional(kind) } else { kind };
        if fields.insert(name.to_owned(), kind).is_some() {
            return Err(invalid_shape(&field_path, "declared twice"));
        }
    }
    Ok(fields)
}

fn kind_from_shape(shape: &JsonValue, path: &str) -> Result<Kind, SchemaError> {
    match shape {
        JsonValue::String(s) if s == "scalar" => Ok(Kind::Scalar),
        JsonValue::String(s) if s == "scalar?" => Ok(Kind::optional(Kind::Scalar)),
        JsonValue::Array(items) if items.len() == 1 => {
            let element = kind_from_shape(&items[0], &format!("{}[]", path))?;
            Ok(Kind::list(element))
        },
        JsonValue::Object(entries) => Ok(Kind::Object(fields_from_shape(entries, path)?)),
        JsonValue::Array(_) => Err(invalid_shape(path, "a list shape has exactly one element")),
        other => Err(invalid_shape(path, &format!("unexpected shape `{}`", other)))
    }
}

fn invalid_shape(path: &str, reason: &str) -> SchemaError {
    SchemaError::InvalidShape {
        path: path.to_owned(),
        reason: reason.to_owned(),
    }
}


/// Native types that can describe themselves to a [Schema].
///
/// Structs implement it by listing their fields:
///
/// ```
/// use stache::{Kind, Schema, Shape};
///
/// struct Todo { title: String, done: bool }
///
/// impl Shape for Todo {
///     fn kind() -> Kind {
///         Kind::object([("title", String::kind()), ("done", bool::kind())])
///     }
/// }
///
/// let schema = Schema::new().field("todos", Vec::<Todo>::kind());
/// assert_eq!(schema.get("todos").unwrap().to_string(), "list of object");
/// ```
pub trait Shape {
    fn kind() -> Kind;
}

macro_rules! scalar_shape {
    ($($t:ty),*) => {
        $(
            impl Shape for $t {
                fn kind() -> Kind {
                    Kind::Scalar
                }
            }
        )*
    };
}

scalar_shape!(
    String, &str, char, bool,
    i8, i16, i32, i64, i128, isize,
    u8, u16, u32, u64, u128, usize,
    f32, f64
);

impl<T: Shape> Shape for Vec<T> {
    fn kind() -> Kind {
        Kind::list(T::kind())
    }
}

impl<T: Shape> Shape for [T] {
    fn kind() -> Kind {
        Kind::list(T::kind())
    }
}

impl<T: Shape> Shape for Option<T> {
    fn kind() -> Kind {
        Kind::optional(T::kind())
    }
}
