use std::fmt;
use crate::error::ParseError;
use crate::reader::{BlockKind, Position, Token};


/// A dotted field path, optionally prefixed by `../` hops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    hops: usize,
    segments: Vec<String>,
    // per segment, set by the checker: whether the schema declares it optional
    pub(crate) optional: Vec<bool>,
}

impl Path {
    pub fn new(hops: usize, segments: Vec<String>) -> Self {
        Path {
            hops,
            segments,
            optional: Vec::new(),
        }
    }

    pub fn hops(&self) -> usize {
        self.hops
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Whether the value at segment `index` may be missing.
    pub(crate) fn is_optional(&self, index: usize) -> bool {
        self.optional.get(index).copied().unwrap_or(false)
    }

    /// Dotted rendering of the first `len` segments.
    pub(crate) fn prefix(&self, len: usize) -> String {
        let mut text = "../".repeat(self.hops);
        for (i, segment) in self.segments[..len].iter().enumerate() {
            if i > 0 || self.hops == 0 {
                text.push('.');
            }
            text.push_str(segment);
        }
        text
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix(self.segments.len()))
    }
}


#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Variable {
        path: Path,
        raw: bool,
    },
    Loop {
        path: Path,
        binding: String,
        body: Vec<Node>,
    },
    Conditional {
        path: Path,
        then_branch: Vec<Node>,
        else_branch: Option<Vec<Node>>,
    },
}


struct OpenBlock {
    kind: BlockKind,
    path: Path,
    binding: Option<String>,
    position: Position,
    nodes: Vec<Node>,
    then_branch: Option<Vec<Node>>,
}

impl OpenBlock {
    fn close(self) -> Node {
        match self.kind {
            BlockKind::For => Node::Loop {
                path: self.path,
                binding: self.binding.unwrap_or_default(),
                body: self.nodes,
            },
            BlockKind::If => match self.then_branch {
                Some(then_branch) => Node::Conditional {
                    path: self.path,
                    then_branch,
                    else_branch: Some(self.nodes),
                },
                None => Node::Conditional {
                    path: self.path,
                    then_branch: self.nodes,
                    else_branch: None,
                }
            }
        }
    }
}


/// Builds the document node sequence from a token stream.
pub fn parse<'a, I>(tokens: I) -> Result<Vec<Node>, ParseError>
where I: IntoIterator<Item = Token<'a>> {
    let mut root = Vec::new();
    let mut open: Vec<OpenBlock> = Vec::new();
    for token in tokens {
        let node = match token {
            Token::Text(text) => Node::Text(text.to_owned()),
            Token::Var { path, raw, .. } => Node::Variable { path, raw },
            Token::BlockOpen { kind, path, binding, position } => {
                open.push(OpenBlock {
                    kind,
                    path,
                    binding,
                    position,
                    nodes: Vec::new(),
                    then_branch: None,
                });
                continue;
            },
            Token::Else { position } => {
                match open.last_mut() {
                    Some(block) if block.kind == BlockKind::If && block.then_branch.is_none() => {
                        block.then_branch = Some(std::mem::take(&mut block.nodes));
                    },
                    Some(block) if block.kind == BlockKind::If => {
                        return Err(unbalanced(
                            format!("second `else` in `if {}` opened at {}", block.path, block.position),
                            position
                        ));
                    },
                    Some(block) => {
                        return Err(unbalanced(
                            format!("`else` inside `for {}` opened at {}", block.path, block.position),
                            position
                        ));
                    },
                    None => {
                        return Err(unbalanced("`else` outside of `if`".to_owned(), position));
                    }
                }
                continue;
            },
            Token::BlockClose { kind, position } => {
                match open.pop() {
                    Some(block) if block.kind == kind => block.close(),
                    Some(block) => {
                        return Err(unbalanced(
                            format!(
                                "`end{}` does not close `{} {}` opened at {}",
                                kind, block.kind, block.path, block.position
                            ),
                            position
                        ));
                    },
                    None => {
                        return Err(unbalanced(format!("`end{}` without `{}`", kind, kind), position));
                    }
                }
            }
        };
        match open.last_mut() {
            Some(block) => block.nodes.push(node),
            None => root.push(node)
        }
    }
    match open.pop() {
        Some(block) => Err(unbalanced(
            format!("`{} {}` is never closed", block.kind, block.path),
            block.position
        )),
        None => Ok(root)
    }
}

fn unbalanced(construct: String, position: Position) -> ParseError {
    ParseError::UnbalancedBlock { construct, position }
}
