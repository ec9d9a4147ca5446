//! Errors for every phase of a template's life.
//!
//! Lexing and parsing stop at the first error. Type checking collects every
//! error it finds into [TypeErrors]. Rendering fails with a [RenderError].

use std::fmt;
use thiserror::Error;
use crate::reader::Position;


#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexError {
    #[error("unterminated directive opened at {position}")]
    UnterminatedDirective { position: Position },

    #[error("invalid directive at {position}: {reason}")]
    InvalidDirective { reason: String, position: Position },
}


#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("unbalanced block at {position}: {construct}")]
    UnbalancedBlock { construct: String, position: Position },
}


#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeError {
    #[error(
        "field `{segment}` not found in `{path}` (available: {})",
        available.join(", ")
    )]
    FieldNotFound {
        segment: String,
        path: String,
        available: Vec<String>,
    },

    #[error("`{path}` is not iterable: expected {expected}, found {found}")]
    NotIterable {
        path: String,
        expected: String,
        found: String,
    },

    #[error("`{path}` cannot be interpolated: expected scalar, found {found}")]
    NotInterpolable { path: String, found: String },

    #[error("`{path}` goes up {hops} scope(s) but only {depth} enclosing loop(s) exist")]
    ParentNavigationOutOfRange {
        path: String,
        hops: usize,
        depth: usize,
    },
}

impl TypeError {
    /// Closest available name to the missing segment, if any is close enough.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            TypeError::FieldNotFound { segment, available, .. } =>
                available.iter()
                    .map(|name| (strsim::levenshtein(segment, name), name))
                    .filter(|(distance, _)| *distance <= 2)
                    .min_by_key(|(distance, _)| *distance)
                    .map(|(_, name)| name.as_str()),
            _ => None
        }
    }
}


/// Every type error found in one checking pass. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeErrors(pub(crate) Vec<TypeError>);

impl TypeErrors {
    pub fn errors(&self) -> &[TypeError] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<TypeError> {
        self.0
    }
}

impl fmt::Display for TypeErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} type error(s)", self.0.len())?;
        for error in &self.0 {
            write!(f, "\n  {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for TypeErrors {}


#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("{0}")]
    Check(#[from] TypeErrors),
}


#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("failed to write rendered output")]
    OutputFailure,

    #[error("context does not match schema at `{path}`: {reason}")]
    SchemaContractViolation { path: String, reason: String },

    #[error("no template named `{0}`")]
    UnknownTemplate(String),
}

impl From<fmt::Error> for RenderError {
    fn from(_: fmt::Error) -> Self {
        RenderError::OutputFailure
    }
}


#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("invalid shape at `{path}`: {reason}")]
    InvalidShape { path: String, reason: String },

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
}


#[derive(Error, Debug)]
pub enum LoadError {
    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("template {name}: {source}")]
    Compile {
        name: String,
        #[source]
        source: CompileError,
    },

    #[error("schema {path}: {source}")]
    Schema {
        path: String,
        #[source]
        source: SchemaError,
    },

    #[error("cannot watch {path}: {source}")]
    Watch {
        path: String,
        #[source]
        source: notify::Error,
    },

    #[error("config: {0}")]
    Config(#[from] serde_yaml::Error),
}
