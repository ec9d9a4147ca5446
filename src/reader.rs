use std::fmt;
use crate::error::LexError;
use crate::parser::Path;

static VAR_OPEN: &str = "{{";
static VAR_CLOSE: &str = "}}";
static BLOCK_OPEN: &str = "{%";
static BLOCK_CLOSE: &str = "%}";

/// Names a loop exposes besides its binding.
pub(crate) static RESERVED_NAMES: [&str; 3] = ["index", "first", "last"];


/// Location of a directive in template source. Lines and columns start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    For,
    If,
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockKind::For => write!(f, "for"),
            BlockKind::If => write!(f, "if"),
        }
    }
}


#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    Text(&'a str),
    Var {
        path: Path,
        raw: bool,
        position: Position,
    },
    BlockOpen {
        kind: BlockKind,
        path: Path,
        binding: Option<String>,
        position: Position,
    },
    Else {
        position: Position,
    },
    BlockClose {
        kind: BlockKind,
        position: Position,
    },
}


/// Splits a template into tokens.
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, LexError> {
    Reader::new(source).collect()
}


pub(crate) struct Reader<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    line_start: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Reader {
            input,
            pos: 0,
            line: 1,
            line_start: 0,
        }
    }

    pub(crate) fn pop_front(&mut self) -> Option<Result<Token<'a>, LexError>> {
        if self.pos == self.input.len() {
            None
        } else {
            let tail = &self.input[self.pos..];
            let token = if tail.starts_with(VAR_OPEN) || tail.starts_with(BLOCK_OPEN) {
                self.read_directive(tail)
            } else {
                Ok(self.read_text(tail))
            };
            if token.is_err() {
                self.pos = self.input.len();
            }
            Some(token)
        }
    }

    fn read_text(&mut self, tail: &'a str) -> Token<'a> {
        let after_text = match (tail.find(VAR_OPEN), tail.find(BLOCK_OPEN)) {
            (Some(v), Some(b)) => v.min(b),
            (Some(p), None) | (None, Some(p)) => p,
            (None, None) => tail.len()
        };
        self.advance(after_text);
        Token::Text(&tail[..after_text])
    }

    fn read_directive(&mut self, tail: &'a str) -> Result<Token<'a>, LexError> {
        let position = self.here();
        let is_block = tail.starts_with(BLOCK_OPEN);
        let close = if is_block { BLOCK_CLOSE } else { VAR_CLOSE };
        let inner_len = tail[2..].find(close)
            .ok_or(LexError::UnterminatedDirective { position })?;
        let inner = &tail[2..2 + inner_len];
        self.advance(2 + inner_len + close.len());
        let invalid = |reason: String| LexError::InvalidDirective { reason, position };
        if is_block {
            block_token(inner, position).map_err(invalid)
        } else {
            let (inner, raw) = match inner.trim_start().strip_prefix('!') {
                Some(rest) => (rest, true),
                None => (inner, false)
            };
            let path = parse_path(inner).map_err(invalid)?;
            Ok(Token::Var { path, raw, position })
        }
    }

    fn here(&self) -> Position {
        Position {
            offset: self.pos,
            line: self.line,
            column: self.input[self.line_start..self.pos].chars().count() + 1,
        }
    }

    fn advance(&mut self, len: usize) {
        let consumed = &self.input[self.pos..self.pos + len];
        for (i, c) in consumed.char_indices() {
            if c == '\n' {
                self.line += 1;
                self.line_start = self.pos + i + 1;
            }
        }
        self.pos += len;
    }
}

impl<'a> Iterator for Reader<'a> {
    type Item = Result<Token<'a>, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.pop_front()
    }
}


fn block_token(inner: &str, position: Position) -> Result<Token<'static>, String> {
    let inner = inner.trim();
    let keyword_len = inner.find(|c: char| c.is_whitespace() || c == '.' || c == '|')
        .unwrap_or(inner.len());
    let (keyword, rest) = inner.split_at(keyword_len);
    let rest = rest.trim();
    let expect_bare = |token: Token<'static>| {
        if rest.is_empty() {
            Ok(token)
        } else {
            Err(format!("unexpected `{}` after {}", rest, keyword))
        }
    };
    match keyword {
        "for" => {
            let bar = rest.find('|')
                .ok_or_else(|| "missing loop binding `|name|`".to_owned())?;
            let path = parse_path(&rest[..bar])?;
            let binding = parse_binding(&rest[bar..])?;
            Ok(Token::BlockOpen { kind: BlockKind::For, path, binding: Some(binding), position })
        },
        "if" => {
            let path = parse_path(rest)?;
            Ok(Token::BlockOpen { kind: BlockKind::If, path, binding: None, position })
        },
        "else" => expect_bare(Token::Else { position }),
        "endfor" => expect_bare(Token::BlockClose { kind: BlockKind::For, position }),
        "endif" => expect_bare(Token::BlockClose { kind: BlockKind::If, position }),
        "" => Err("missing block keyword".to_owned()),
        other => Err(format!("unknown block `{}`", other))
    }
}

fn parse_binding(text: &str) -> Result<String, String> {
    let name = text.trim()
        .strip_prefix('|')
        .and_then(|it| it.strip_suffix('|'))
        .ok_or_else(|| format!("malformed loop binding `{}`", text.trim()))?
        .trim();
    if !is_identifier(name) {
        Err(format!("invalid loop binding `{}`", name))
    } else if RESERVED_NAMES.contains(&name) {
        Err(format!("`{}` is reserved inside loops", name))
    } else {
        Ok(name.to_owned())
    }
}

/// Reads `../../a.b` or `.a.b` into a [Path]. The leading dot is optional.
pub(crate) fn parse_path(text: &str) -> Result<Path, String> {
    let mut rest = text.trim();
    let mut hops = 0;
    while let Some(after) = rest.strip_prefix("../") {
        hops += 1;
        rest = after.trim_start();
    }
    let rest = rest.strip_prefix('.').unwrap_or(rest);
    if rest.trim().is_empty() {
        return Err("missing path".to_owned());
    }
    let segments = rest.split('.')
        .map(str::trim)
        .map(|segment| if is_identifier(segment) {
            Ok(segment.to_owned())
        } else {
            Err(format!("invalid path `{}`", text.trim()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Path::new(hops, segments))
}

fn is_identifier(text: &str) -> bool {
    !text.is_empty() && text.chars().all(
        |c| c.is_alphanumeric() || c == '_' || c == '-'
    )
}
