use std::{borrow::Cow, collections::HashMap};
use crate::context::{Context, ContextRef};


enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Mapping(HashMap<String, MapsAndLists>),
    Sequence(Vec<MapsAndLists>),
}

/// A render context assembled by hand from maps, lists and scalars.
pub struct MapsAndLists(Value);

impl MapsAndLists {
    pub fn null() -> MapsAndLists {
        MapsAndLists(Value::Null)
    }

    pub fn bool(b: bool) -> MapsAndLists {
        MapsAndLists(Value::Bool(b))
    }

    pub fn integer(i: i64) -> MapsAndLists {
        MapsAndLists(Value::Integer(i))
    }

    pub fn float(f: f64) -> MapsAndLists {
        MapsAndLists(Value::Float(f))
    }

    pub fn text(t: &str) -> MapsAndLists {
        MapsAndLists(Value::Text(t.to_owned()))
    }

    pub fn mapping(mapping: HashMap<String, MapsAndLists>) -> MapsAndLists {
        MapsAndLists(Value::Mapping(mapping))
    }

    pub fn sequence(sequence: Vec<MapsAndLists>) -> MapsAndLists {
        MapsAndLists(Value::Sequence(sequence))
    }

    /// Mapping from `(name, value)` pairs.
    pub fn entries<'s, I>(entries: I) -> MapsAndLists
    where I: IntoIterator<Item = (&'s str, MapsAndLists)> {
        MapsAndLists::mapping(
            entries.into_iter()
                .map(|(name, value)| (name.to_owned(), value))
                .collect::<HashMap<_, _>>()
        )
    }
}

impl Context for MapsAndLists {
    fn child(&self, name: &str) -> Option<ContextRef<'_>> {
        match self {
            MapsAndLists(Value::Mapping(obj)) =>
                obj.get(name).map(
                    |it| it as ContextRef<'_>
                ),
            _ => None
        }
    }

    fn children(&self) -> Option<Vec<ContextRef<'_>>> {
        match self {
            MapsAndLists(Value::Sequence(seq)) =>
                Some(
                    seq.iter().map(
                        |it| it as ContextRef<'_>
                    ).collect::<Vec<_>>()
                ),
            _ => None
        }
    }

    fn value(&self) -> Option<Cow<'_, str>> {
        match self {
            MapsAndLists(Value::Bool(b)) => Some(Cow::Owned(b.to_string())),
            MapsAndLists(Value::Integer(i)) => Some(Cow::Owned(i.to_string())),
            MapsAndLists(Value::Float(f)) => Some(Cow::Owned(f.to_string())),
            MapsAndLists(Value::Text(text)) => Some(Cow::Borrowed(text.as_str())),
            _ => None
        }
    }

    fn is_truthy(&self) -> bool {
        match self {
            MapsAndLists(Value::Null) => false,
            MapsAndLists(Value::Bool(b)) => *b,
            MapsAndLists(Value::Integer(i)) => *i != 0,
            MapsAndLists(Value::Float(f)) => *f != 0.0,
            MapsAndLists(Value::Text(text)) => !text.is_empty(),
            MapsAndLists(Value::Sequence(seq)) => !seq.is_empty(),
            MapsAndLists(Value::Mapping(_)) => true
        }
    }

    fn is_null(&self) -> bool {
        matches!(self, MapsAndLists(Value::Null))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_lookup() {
        let data = MapsAndLists::entries([
            ("user", MapsAndLists::entries([("name", MapsAndLists::text("ann"))])),
            ("scores", MapsAndLists::sequence(vec![
                MapsAndLists::integer(3),
                MapsAndLists::float(0.5),
            ])),
        ]);
        let name = data.child("user").and_then(|it| it.child("name")).unwrap();
        assert_eq!(name.value().as_deref(), Some("ann"));
        let scores = data.child("scores").and_then(|it| it.children()).unwrap();
        let scores = scores.iter().map(|it| it.value().unwrap().into_owned()).collect::<Vec<_>>();
        assert_eq!(scores, vec!["3", "0.5"]);
    }

    #[test]
    fn zero_is_falsy_but_zero_text_is_not() {
        assert!(!MapsAndLists::integer(0).is_truthy());
        assert!(!MapsAndLists::float(0.0).is_truthy());
        assert!(MapsAndLists::text("0").is_truthy());
        assert!(!MapsAndLists::text("").is_truthy());
        assert!(!MapsAndLists::sequence(vec![]).is_truthy());
        assert!(MapsAndLists::entries([]).is_truthy());
        assert!(MapsAndLists::null().is_null());
    }
}
