//! A small template engine whose templates are checked against a schema
//! before they are ever rendered.
//!
//! A [Template] is compiled from source and a [Schema]: the source is
//! lexed, parsed, then every path it references is resolved against the
//! schema. Any unknown field, loop over a non list or `../` reaching past
//! the outermost loop fails the compile with every error found. A compiled
//! template renders by navigating in a [Context]: json and yaml values are
//! supported out of the box, [MapsAndLists] can be assembled by hand.
//!
//! Directives:
//!
//! - `{{ .field }}` escaped interpolation, `{{! .field }}` raw interpolation,
//! - `{{ .a.b }}` nested access,
//! - `{% for .items |item| %} ... {% endfor %}`, with `.item`, `.index`,
//!   `.first` and `.last` visible in the body,
//! - `{% if .cond %} ... {% else %} ... {% endif %}`,
//! - `{{ ../field }}` one enclosing loop up per `../`.
//!
//! Named templates live in a [TemplateMap]; file backed ones can follow
//! changes to their file with a [ReloadingTemplate].
//!
//!
//! # Samples
//!
//! ## Hello world
//!
//! ```
//! use stache::{Template, Schema, Kind, JsonValue};
//!
//! let text = "hello, {{ .you }}!";
//! let data = r#"{
//!     "you": "world"
//! }"#;
//!
//! let schema = Schema::new().field("you", Kind::Scalar);
//! let template = Template::compile(text, schema).unwrap();
//! let context = serde_json::from_str::<JsonValue>(data).unwrap();
//!
//! let result = template.render(&context).unwrap();
//!
//! assert_eq!(result, "hello, world!")
//! ```
//!
//! ## Hello team
//!
//! ```
//! use stache::{Template, Schema, YamlValue};
//! let text = "{% for .team |member| %}hello, {{ .member.address }} {{ .member.name }}!\n{% endfor %}";
//! let schema = r#"
//!   team:
//!     - name: scalar
//!       address: scalar
//! "#;
//! let data = r#"
//!   team:
//!     - name: john
//!       address: little
//!     - name: 42
//!       address: citizen
//! "#;
//!
//! let template = Template::compile(text, Schema::from_yaml(schema).unwrap()).unwrap();
//! let context = serde_yaml::from_str::<YamlValue>(data).unwrap();
//!
//! let result = template.render(&context).unwrap();
//! assert_eq!(result, "hello, little john!\nhello, citizen 42!\n");
//! ```
//!
//! ## Rejected at compile time
//!
//! ```
//! use stache::{CompileError, Kind, Schema, Template, TypeError};
//!
//! let schema = Schema::new().field("title", Kind::Scalar);
//! let error = Template::compile("{{ .titel }}", schema).unwrap_err();
//! let CompileError::Check(errors) = error else { panic!() };
//! assert_eq!(errors.errors()[0].suggestion(), Some("title"));
//! ```
mod checker;
mod config;
mod context;
mod error;
mod json;
mod maps_and_lists;
mod parser;
mod reader;
mod reload;
mod schema;
mod store;
mod template;
mod yaml;

pub use self::checker::check;
pub use self::config::{Config, Environment, ReloadConfig, TemplateConfig};
pub use self::context::{Context, ContextRef};
pub use self::error::{
    CompileError, LexError, LoadError, ParseError, RenderError, SchemaError, TypeError, TypeErrors,
};
pub use self::json::JsonValue;
pub use self::maps_and_lists::MapsAndLists;
pub use self::parser::{parse, Node, Path};
pub use self::reader::{tokenize, BlockKind, Position, Token};
pub use self::reload::{watch, Modifications, ReloadingTemplate, WatchState};
pub use self::schema::{Fields, Kind, Schema, Shape};
pub use self::store::{TemplateMap, TemplateStore};
pub use self::template::Template;
pub use self::yaml::YamlValue;
