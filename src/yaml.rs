use std::borrow::Cow;
use crate::context::{Context, ContextRef};
pub use serde_yaml::Value as YamlValue;


impl Context for YamlValue {
    fn child(&self, name: &str) -> Option<ContextRef<'_>> {
        match self {
            YamlValue::Mapping(map) => map.get(name).map(
                |value| value as ContextRef<'_>
            ),
            YamlValue::Tagged(tagged) => tagged.value.child(name),
            _ => None
        }
    }

    fn children(&self) -> Option<Vec<ContextRef<'_>>> {
        match self {
            YamlValue::Sequence(seq) =>
                Some(
                    seq.iter()
                        .map(|value| value as ContextRef<'_>)
                        .collect::<_>()
                ),
            YamlValue::Tagged(tagged) => tagged.value.children(),
            _ => None
        }
    }

    fn value(&self) -> Option<Cow<'_, str>> {
        match self {
            YamlValue::String(s) => Some(Cow::Borrowed(s.as_str())),
            YamlValue::Number(n) => Some(Cow::Owned(n.to_string())),
            YamlValue::Bool(b) => Some(Cow::Owned(b.to_string())),
            YamlValue::Tagged(tagged) => tagged.value.value(),
            _ => None
        }
    }

    fn is_truthy(&self) -> bool {
        match self {
            YamlValue::Null => false,
            YamlValue::Bool(b) => *b,
            YamlValue::Number(n) => n.as_f64().map_or(true, |n| n != 0.0),
            YamlValue::String(s) => !s.is_empty(),
            YamlValue::Sequence(seq) => !seq.is_empty(),
            YamlValue::Mapping(_) => true,
            YamlValue::Tagged(tagged) => tagged.value.is_truthy()
        }
    }

    fn is_null(&self) -> bool {
        match self {
            YamlValue::Null => true,
            YamlValue::Tagged(tagged) => Context::is_null(&tagged.value),
            _ => false
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> YamlValue {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn team() {
        let value = yaml("team:\n  - name: john\n  - name: 42\n");
        let team = value.child("team").and_then(|it| it.children()).unwrap();
        let names = team.iter()
            .map(|member| member.child("name").and_then(|it| it.value()).unwrap().into_owned())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["john", "42"]);
    }

    #[test]
    fn truthiness() {
        for falsy in ["~", "false", "0", "''", "[]"] {
            assert!(!yaml(falsy).is_truthy(), "{} should be falsy", falsy);
        }
        for truthy in ["true", "3", "'0'", "x", "[1]", "{}"] {
            assert!(yaml(truthy).is_truthy(), "{} should be truthy", truthy);
        }
    }

    #[test]
    fn null_is_null() {
        assert!(Context::is_null(&yaml("~")));
        assert!(!Context::is_null(&yaml("''")));
    }
}
