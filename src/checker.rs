use std::sync::Arc;
use crate::error::{TypeError, TypeErrors};
use crate::parser::{Node, Path};
use crate::reader::RESERVED_NAMES;
use crate::schema::{Fields, Kind, Schema};
use crate::template::Template;

static SCALAR: Kind = Kind::Scalar;


/// Validates every path of `nodes` against `schema`.
///
/// All errors are collected before returning. On success the nodes are
/// frozen into a [Template] ready to render.
pub fn check(mut nodes: Vec<Node>, schema: impl Into<Arc<Schema>>) -> Result<Template, TypeErrors> {
    let schema = schema.into();
    let errors = {
        let mut checker = Checker {
            root: schema.fields(),
            frames: Vec::new(),
            errors: Vec::new(),
        };
        checker.walk(&mut nodes);
        checker.errors
    };
    if errors.is_empty() {
        Ok(Template::new(nodes, schema))
    } else {
        Err(TypeErrors(errors))
    }
}


struct Frame<'s> {
    binding: String,
    // None when the loop itself failed to check
    element: Option<&'s Kind>,
}

struct Checker<'s> {
    root: &'s Fields,
    frames: Vec<Frame<'s>>,
    errors: Vec<TypeError>,
}

impl<'s> Checker<'s> {
    fn walk(&mut self, nodes: &mut [Node]) {
        for node in nodes {
            match node {
                Node::Text(_) => {},
                Node::Variable { path, .. } => {
                    if let Some(kind) = self.resolve(path) {
                        if *kind != Kind::Scalar {
                            self.errors.push(TypeError::NotInterpolable {
                                path: path.to_string(),
                                found: kind.to_string(),
                            });
                        }
                    }
                },
                Node::Conditional { path, then_branch, else_branch } => {
                    self.resolve(path);
                    self.walk(then_branch);
                    if let Some(else_branch) = else_branch {
                        self.walk(else_branch);
                    }
                },
                Node::Loop { path, binding, body } => {
                    let element = match self.resolve(path) {
                        Some(Kind::List(element)) => Some(&**element),
                        Some(other) => {
                            self.errors.push(TypeError::NotIterable {
                                path: path.to_string(),
                                expected: "list".to_owned(),
                                found: other.to_string(),
                            });
                            None
                        },
                        None => None
                    };
                    self.frames.push(Frame { binding: binding.clone(), element });
                    self.walk(body);
                    self.frames.pop();
                }
            }
        }
    }

    /// Resolved kind of `path` with optional layers stripped, recording on
    /// the path which segments are optional. Errors are recorded; `None`
    /// means the path could not be resolved.
    fn resolve(&mut self, path: &mut Path) -> Option<&'s Kind> {
        match self.lookup(path) {
            Ok(Some((kind, optional))) => {
                path.optional = optional;
                Some(kind)
            },
            Ok(None) => None,
            Err(error) => {
                self.errors.push(error);
                None
            }
        }
    }

    fn lookup(&self, path: &Path) -> Result<Option<(&'s Kind, Vec<bool>)>, TypeError> {
        let depth = self.frames.len();
        if path.hops() > depth {
            return Err(TypeError::ParentNavigationOutOfRange {
                path: path.to_string(),
                hops: path.hops(),
                depth,
            });
        }
        let visible = &self.frames[..depth - path.hops()];
        let segments = path.segments();
        let first = match segments.first() {
            Some(first) => first,
            None => return Ok(None)
        };
        let kind = match self.lookup_first(visible, first) {
            Some(Some(kind)) => kind,
            // inside a loop that already failed
            Some(None) => return Ok(None),
            None => return Err(TypeError::FieldNotFound {
                segment: first.clone(),
                path: path.prefix(1),
                available: self.visible_names(visible),
            })
        };
        let (mut inner, optional) = kind.required();
        let mut optionals = vec![optional];
        for (i, segment) in segments.iter().enumerate().skip(1) {
            let fields = match inner {
                Kind::Object(fields) => fields,
                _ => return Err(TypeError::FieldNotFound {
                    segment: segment.clone(),
                    path: path.prefix(i + 1),
                    available: Vec::new(),
                })
            };
            let kind = fields.get(segment).ok_or_else(|| TypeError::FieldNotFound {
                segment: segment.clone(),
                path: path.prefix(i + 1),
                available: fields.keys().cloned().collect(),
            })?;
            let (next, optional) = kind.required();
            optionals.push(optional);
            inner = next;
        }
        Ok(Some((inner, optionals)))
    }

    fn lookup_first(&self, visible: &[Frame<'s>], name: &str) -> Option<Option<&'s Kind>> {
        for frame in visible.iter().rev() {
            if frame.binding == name {
                return Some(frame.element);
            }
            if RESERVED_NAMES.contains(&name) {
                return Some(Some(&SCALAR));
            }
        }
        self.root.get(name).map(Some)
    }

    fn visible_names(&self, visible: &[Frame<'s>]) -> Vec<String> {
        let mut names = self.root.keys().cloned().collect::<Vec<_>>();
        names.extend(visible.iter().map(|frame| frame.binding.clone()));
        if !visible.is_empty() {
            names.extend(RESERVED_NAMES.iter().map(|name| name.to_string()));
        }
        names.sort();
        names.dedup();
        names
    }
}
