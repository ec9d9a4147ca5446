use std::fmt;
use std::sync::Arc;
use crate::checker::check;
use crate::context::{violation, ContextRef, Resolved, Stack};
use crate::error::{CompileError, RenderError};
use crate::parser::{parse, Node};
use crate::reader::tokenize;
use crate::schema::Schema;


/// A template checked against its schema.
///
/// Immutable once built, so one template can serve concurrent render
/// calls. Each call owns its scope stack and output buffer.
#[derive(Debug)]
pub struct Template {
    nodes: Vec<Node>,
    schema: Arc<Schema>,
}

impl Template {
    pub(crate) fn new(nodes: Vec<Node>, schema: Arc<Schema>) -> Self {
        Template { nodes, schema }
    }

    /// Lexes, parses and checks `source` against `schema`.
    pub fn compile(source: &str, schema: impl Into<Arc<Schema>>) -> Result<Self, CompileError> {
        let tokens = tokenize(source)?;
        let token_count = tokens.len();
        let nodes = parse(tokens)?;
        let template = check(nodes, schema)?;
        tracing::debug!(
            tokens = token_count,
            nodes = template.nodes.len(),
            "compiled template"
        );
        Ok(template)
    }

    pub fn render(&self, context: ContextRef) -> Result<String, RenderError> {
        let mut output = String::new();
        self.render_to(context, &mut output)?;
        Ok(output)
    }

    /// Renders into `out`. Output already written stays there on error.
    pub fn render_to<W>(&self, context: ContextRef, out: &mut W) -> Result<(), RenderError>
    where W: fmt::Write {
        let mut stack = Stack::new(context);
        self.nodes.render(&mut stack, out)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }
}


trait Segment {
    fn render<'a>(
        &'a self, stack: &mut Stack<'a>, out: &mut dyn fmt::Write
    ) -> Result<(), RenderError>;
}

impl Segment for [Node] {
    fn render<'a>(
        &'a self, stack: &mut Stack<'a>, out: &mut dyn fmt::Write
    ) -> Result<(), RenderError> {
        self.iter()
            .try_for_each(|node| node.render(stack, out))
    }
}

impl Segment for Vec<Node> {
    fn render<'a>(
        &'a self, stack: &mut Stack<'a>, out: &mut dyn fmt::Write
    ) -> Result<(), RenderError> {
        self.as_slice().render(stack, out)
    }
}

impl Segment for Node {
    fn render<'a>(
        &'a self, stack: &mut Stack<'a>, out: &mut dyn fmt::Write
    ) -> Result<(), RenderError> {
        match self {
            Node::Text(text) => out.write_str(text)?,
            Node::Variable { path, raw } => {
                let resolved = stack.resolve(path)?;
                let text = resolved.text()
                    .ok_or_else(|| violation(path, "expected a scalar".to_owned()))?;
                if *raw {
                    out.write_str(&text)?;
                } else {
                    html_escape(&text, out)?;
                }
            },
            Node::Loop { path, binding, body } => {
                let list = match stack.resolve(path)? {
                    Resolved::Data(list) => list,
                    Resolved::Absent => return Ok(()),
                    _ => return Err(violation(path, "loop metadata is not a list".to_owned()))
                };
                let elements = list.children()
                    .ok_or_else(|| violation(path, "expected a list".to_owned()))?;
                let len = elements.len();
                for (index, element) in elements.into_iter().enumerate() {
                    stack.push(binding, element, index, len);
                    let result = body.render(stack, out);
                    stack.pop();
                    result?;
                }
            },
            Node::Conditional { path, then_branch, else_branch } => {
                if stack.resolve(path)?.is_truthy() {
                    then_branch.render(stack, out)?;
                } else if let Some(else_branch) = else_branch {
                    else_branch.render(stack, out)?;
                }
            }
        }
        Ok(())
    }
}


fn html_escape(input: &str, out: &mut dyn fmt::Write) -> fmt::Result {
    let mut last = 0;
    for (i, c) in input.char_indices() {
        let entity = match c {
            '&' => "&amp;",
            '<' => "&lt;",
            '>' => "&gt;",
            '"' => "&quot;",
            '\'' => "&#39;",
            _ => continue
        };
        out.write_str(&input[last..i])?;
        out.write_str(entity)?;
        last = i + 1;
    }
    out.write_str(&input[last..])
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use crate::error::TypeError;
    use crate::schema::Kind;

    fn todo_schema() -> Schema {
        Schema::new()
            .field("title", Kind::Scalar)
            .field("ok", Kind::Scalar)
            .field("todos", Kind::list(Kind::object([("title", Kind::Scalar)])))
    }

    fn escape(input: &str) -> String {
        let mut out = String::new();
        html_escape(input, &mut out).unwrap();
        out
    }

    #[test]
    fn escapes_the_five_characters() {
        assert_eq!(escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;");
        assert_eq!(escape("plain / = `"), "plain / = `");
        assert_eq!(escape("é&ü"), "é&amp;ü");
    }

    #[test]
    fn todo_list() {
        let template = Template::compile(
            "{% for .todos |t| %}{{ .t.title }}:{{ .index }};{% endfor %}",
            todo_schema()
        ).unwrap();
        let data = json!({"title": "", "ok": 1, "todos": [{"title": "A"}, {"title": "B"}]});
        assert_eq!(template.render(&data).unwrap(), "A:0;B:1;");
    }

    #[test]
    fn conditional_branches() {
        let template = Template::compile(
            "{% if .ok %}yes{% else %}no{% endif %}",
            todo_schema()
        ).unwrap();
        assert_eq!(template.render(&json!({"ok": "x"})).unwrap(), "yes");
        assert_eq!(template.render(&json!({"ok": 0})).unwrap(), "no");
    }

    #[test]
    fn compile_reports_type_errors() {
        let error = Template::compile("{{ .missing }}", todo_schema()).unwrap_err();
        match error {
            CompileError::Check(errors) => assert!(matches!(
                errors.errors()[0],
                TypeError::FieldNotFound { .. }
            )),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn mismatched_context_is_an_error() {
        let template = Template::compile("{{ .title }}", todo_schema()).unwrap();
        assert!(matches!(
            template.render(&json!({"title": ["not", "scalar"]})),
            Err(RenderError::SchemaContractViolation { .. })
        ));
        assert!(matches!(
            template.render(&json!({})),
            Err(RenderError::SchemaContractViolation { .. })
        ));
    }

    #[test]
    fn loop_over_non_list_is_an_error() {
        let template = Template::compile("{% for .todos |t| %}{% endfor %}", todo_schema()).unwrap();
        assert!(template.render(&json!({"todos": "nope"})).is_err());
    }

    struct Failing;

    impl fmt::Write for Failing {
        fn write_str(&mut self, _: &str) -> fmt::Result {
            Err(fmt::Error)
        }
    }

    #[test]
    fn write_failure_is_reported() {
        let template = Template::compile("text", todo_schema()).unwrap();
        assert_eq!(
            template.render_to(&json!({}), &mut Failing),
            Err(RenderError::OutputFailure)
        );
    }

    #[test]
    fn templates_are_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Template>();
    }
}
