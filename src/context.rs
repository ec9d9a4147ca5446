use std::borrow::Cow;
use crate::error::RenderError;
use crate::parser::Path;

pub type ContextRef<'a> = &'a dyn Context;


/// Data a template can be rendered against.
///
/// Implementations exist for json and yaml values and for [MapsAndLists].
///
/// [MapsAndLists]: crate::MapsAndLists
pub trait Context {
    /// Named field of an object. `None` for missing fields and non objects.
    fn child(&self, name: &str) -> Option<ContextRef<'_>>;

    /// Elements of a list. `None` when the value is not list-like.
    fn children(&self) -> Option<Vec<ContextRef<'_>>>;

    /// Text of a scalar. `None` for lists, objects and null.
    fn value(&self) -> Option<Cow<'_, str>>;

    fn is_truthy(&self) -> bool;

    /// Null values are treated as absent.
    fn is_null(&self) -> bool {
        false
    }
}


#[derive(Clone, Copy)]
pub(crate) enum Frame<'a> {
    Root(ContextRef<'a>),
    Loop {
        binding: &'a str,
        element: ContextRef<'a>,
        index: usize,
        len: usize,
    },
}


/// What a path points at once resolved against the stack.
#[derive(Clone, Copy)]
pub(crate) enum Resolved<'a> {
    Data(ContextRef<'a>),
    Index(usize),
    Flag(bool),
    Absent,
}

impl<'a> Resolved<'a> {
    pub(crate) fn is_truthy(&self) -> bool {
        match *self {
            Resolved::Data(context) => context.is_truthy(),
            Resolved::Index(index) => index != 0,
            Resolved::Flag(flag) => flag,
            Resolved::Absent => false
        }
    }

    pub(crate) fn text(&self) -> Option<Cow<'a, str>> {
        match *self {
            Resolved::Data(context) => context.value(),
            Resolved::Index(index) => Some(Cow::Owned(index.to_string())),
            Resolved::Flag(true) => Some(Cow::Borrowed("true")),
            Resolved::Flag(false) => Some(Cow::Borrowed("false")),
            Resolved::Absent => Some(Cow::Borrowed(""))
        }
    }

    fn child(self, name: &str) -> Option<Resolved<'a>> {
        match self {
            Resolved::Data(context) => Some(
                context.child(name).map_or(Resolved::Absent, Resolved::Data)
            ),
            Resolved::Absent => Some(Resolved::Absent),
            _ => None
        }
    }
}


/// Scope stack of a single render call. The root frame is never popped.
pub(crate) struct Stack<'a> {
    frames: Vec<Frame<'a>>,
}

impl<'a> Stack<'a> {
    pub(crate) fn new(root: ContextRef<'a>) -> Self {
        Stack {
            frames: vec![Frame::Root(root)]
        }
    }

    pub(crate) fn push(&mut self, binding: &'a str, element: ContextRef<'a>, index: usize, len: usize) {
        self.frames.push(Frame::Loop { binding, element, index, len });
    }

    pub(crate) fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Resolves `path` from the frame `path.hops()` levels up.
    ///
    /// The first segment is matched against loop bindings and metadata
    /// from that frame outwards, then against the root context. A segment
    /// may only be missing when the checker marked it optional; everything
    /// below a missing optional segment is missing too.
    pub(crate) fn resolve(&self, path: &Path) -> Result<Resolved<'a>, RenderError> {
        let depth = self.frames.len() - 1;
        if path.hops() > depth {
            return Err(violation(path, format!("{} hop(s) from depth {}", path.hops(), depth)));
        }
        let segments = path.segments();
        let first = segments.first()
            .ok_or_else(|| violation(path, "empty path".to_owned()))?;
        let mut resolved = settle(path, 0, self.resolve_first(depth - path.hops(), first))?;
        for (i, segment) in segments.iter().enumerate().skip(1) {
            resolved = match resolved {
                Resolved::Absent => return Ok(Resolved::Absent),
                other => other.child(segment)
                    .ok_or_else(|| violation(path, format!("loop metadata has no field `{}`", segment)))?
            };
            resolved = settle(path, i, resolved)?;
        }
        Ok(resolved)
    }

    fn resolve_first(&self, start: usize, name: &str) -> Resolved<'a> {
        for frame in self.frames[..=start].iter().rev() {
            match *frame {
                Frame::Loop { binding, element, index, len } => {
                    match name {
                        _ if name == binding => return Resolved::Data(element),
                        "index" => return Resolved::Index(index),
                        "first" => return Resolved::Flag(index == 0),
                        "last" => return Resolved::Flag(index + 1 == len),
                        _ => {}
                    }
                },
                Frame::Root(context) => {
                    return context.child(name).map_or(Resolved::Absent, Resolved::Data);
                }
            }
        }
        Resolved::Absent
    }
}

// null counts as missing
fn settle<'a>(path: &Path, index: usize, resolved: Resolved<'a>) -> Result<Resolved<'a>, RenderError> {
    match resolved {
        Resolved::Data(context) if context.is_null() => settle(path, index, Resolved::Absent),
        Resolved::Absent if !path.is_optional(index) => Err(violation(
            path,
            format!("`{}` is missing", path.prefix(index + 1))
        )),
        other => Ok(other)
    }
}

pub(crate) fn violation(path: &Path, reason: String) -> RenderError {
    RenderError::SchemaContractViolation {
        path: path.to_string(),
        reason,
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(hops: usize, segments: &[&str]) -> Path {
        Path::new(hops, segments.iter().map(|it| it.to_string()).collect())
    }

    fn text(resolved: Result<Resolved, RenderError>) -> String {
        resolved.unwrap().text().unwrap().into_owned()
    }

    #[test]
    fn loop_frame_shadows_root() {
        let root = json!({"name": "root", "items": ["a", "b"]});
        let element = json!("inner");
        let mut stack = Stack::new(&root);
        stack.push("name", &element, 1, 2);
        assert_eq!(text(stack.resolve(&path(0, &["name"]))), "inner");
        assert_eq!(text(stack.resolve(&path(1, &["name"]))), "root");
        assert_eq!(text(stack.resolve(&path(0, &["index"]))), "1");
        assert_eq!(text(stack.resolve(&path(0, &["first"]))), "false");
        assert_eq!(text(stack.resolve(&path(0, &["last"]))), "true");
        stack.pop();
        assert_eq!(text(stack.resolve(&path(0, &["name"]))), "root");
    }

    #[test]
    fn parent_hop_keeps_outer_loop_metadata() {
        let root = json!({});
        let outer = json!("o");
        let inner = json!("i");
        let mut stack = Stack::new(&root);
        stack.push("x", &outer, 3, 4);
        stack.push("y", &inner, 0, 1);
        assert_eq!(text(stack.resolve(&path(0, &["index"]))), "0");
        assert_eq!(text(stack.resolve(&path(1, &["index"]))), "3");
        assert_eq!(text(stack.resolve(&path(0, &["x"]))), "o");
    }

    #[test]
    fn missing_value_violates_contract() {
        let root = json!({"a": null});
        let stack = Stack::new(&root);
        assert!(matches!(
            stack.resolve(&path(0, &["b"])),
            Err(RenderError::SchemaContractViolation { .. })
        ));
        assert!(stack.resolve(&path(0, &["a"])).is_err());
    }

    #[test]
    fn missing_optional_segment_is_absent() {
        let root = json!({"a": null});
        let stack = Stack::new(&root);
        let mut below_missing = path(0, &["a", "b"]);
        below_missing.optional = vec![true, false];
        assert!(matches!(stack.resolve(&below_missing), Ok(Resolved::Absent)));
    }

    #[test]
    fn required_field_under_present_optional_is_enforced() {
        let root = json!({"a": {}});
        let stack = Stack::new(&root);
        let mut required = path(0, &["a", "b"]);
        required.optional = vec![true, false];
        assert!(matches!(
            stack.resolve(&required),
            Err(RenderError::SchemaContractViolation { path, reason })
                if path == ".a.b" && reason.contains("`.a.b`")
        ));
        required.optional = vec![true, true];
        assert!(matches!(stack.resolve(&required), Ok(Resolved::Absent)));
    }

    #[test]
    fn hops_beyond_root_are_rejected() {
        let root = json!({"a": 1});
        let stack = Stack::new(&root);
        assert!(stack.resolve(&path(1, &["a"])).is_err());
    }

    #[test]
    fn root_frame_is_never_popped() {
        let root = json!({"a": 1});
        let mut stack = Stack::new(&root);
        stack.pop();
        assert_eq!(text(stack.resolve(&path(0, &["a"]))), "1");
    }
}
