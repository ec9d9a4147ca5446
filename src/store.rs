use std::{collections::HashMap, fmt, fs, path::Path, sync::Arc};
use crate::config::{Config, ReloadConfig};
use crate::context::ContextRef;
use crate::error::{CompileError, LoadError, RenderError};
use crate::reload::ReloadingTemplate;
use crate::schema::Schema;
use crate::template::Template;


pub trait TemplateStore {
    fn get(&self, name: &str) -> Option<Arc<Template>>;
}


enum Entry {
    Fixed(Arc<Template>),
    Reloading(ReloadingTemplate),
}

impl Entry {
    fn current(&self) -> Arc<Template> {
        match self {
            Entry::Fixed(template) => Arc::clone(template),
            Entry::Reloading(template) => template.current()
        }
    }
}


/// Named templates, each checked against its own schema at registration.
#[derive(Default)]
pub struct TemplateMap {
    templates: HashMap<String, Entry>,
}

impl TemplateMap {
    pub fn new() -> Self {
        TemplateMap { templates: HashMap::new() }
    }

    /// Registers every template of `config`, resolving relative paths from `base`.
    ///
    /// Templates are watched for changes when the configuration enables hot reload.
    pub fn from_config(config: &Config, base: &Path) -> Result<Self, LoadError> {
        let reload = config.hot_reload().then_some(&config.reload);
        let mut map = TemplateMap::new();
        for entry in &config.templates {
            let schema_path = base.join(&entry.schema);
            let shape = fs::read_to_string(&schema_path).map_err(|source| LoadError::Io {
                path: schema_path.display().to_string(),
                source,
            })?;
            let schema = Schema::from_yaml(&shape).map_err(|source| LoadError::Schema {
                path: schema_path.display().to_string(),
                source,
            })?;
            map.register_file(&entry.name, &base.join(&entry.path), schema, reload)?;
        }
        tracing::debug!(templates = map.templates.len(), reload = reload.is_some(), "loaded templates");
        Ok(map)
    }

    pub fn register(
        &mut self, name: &str, source: &str, schema: impl Into<Arc<Schema>>
    ) -> Result<(), CompileError> {
        let template = Template::compile(source, schema)?;
        self.templates.insert(name.to_owned(), Entry::Fixed(Arc::new(template)));
        Ok(())
    }

    /// Registers the template stored at `path`, watching it when `reload` is given.
    pub fn register_file(
        &mut self,
        name: &str,
        path: &Path,
        schema: impl Into<Arc<Schema>>,
        reload: Option<&ReloadConfig>,
    ) -> Result<(), LoadError> {
        let mut template = ReloadingTemplate::open(path, schema).map_err(|error| match error {
            LoadError::Compile { source, .. } => LoadError::Compile { name: name.to_owned(), source },
            other => other
        })?;
        let entry = match reload {
            Some(reload) => {
                template.watch(reload.interval())?;
                Entry::Reloading(template)
            },
            None => Entry::Fixed(template.current())
        };
        self.templates.insert(name.to_owned(), entry);
        Ok(())
    }

    pub fn render(&self, name: &str, context: ContextRef) -> Result<String, RenderError> {
        self.get(name)
            .ok_or_else(|| RenderError::UnknownTemplate(name.to_owned()))?
            .render(context)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// Polls every watched template once. Returns how many were republished.
    pub fn poll(&self) -> usize {
        self.templates.values()
            .filter(|entry| matches!(entry, Entry::Reloading(template) if template.poll()))
            .count()
    }
}

impl fmt::Debug for TemplateMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = self.names().collect::<Vec<_>>();
        names.sort_unstable();
        f.debug_struct("TemplateMap")
            .field("templates", &names)
            .finish()
    }
}

impl TemplateStore for TemplateMap {
    fn get(&self, name: &str) -> Option<Arc<Template>> {
        self.templates.get(name).map(Entry::current)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use crate::schema::Kind;

    #[test]
    fn register_and_render() {
        let mut map = TemplateMap::new();
        map.register("hello", "hello {{ .name }}", Schema::new().field("name", Kind::Scalar)).unwrap();
        assert_eq!(map.render("hello", &json!({"name": "<you>"})).unwrap(), "hello &lt;you&gt;");
        assert_eq!(map.names().collect::<Vec<_>>(), vec!["hello"]);
    }

    #[test]
    fn debug_lists_names() {
        let mut map = TemplateMap::new();
        map.register("b", "", Schema::new()).unwrap();
        map.register("a", "", Schema::new()).unwrap();
        assert_eq!(format!("{:?}", map), r#"TemplateMap { templates: ["a", "b"] }"#);
    }

    #[test]
    fn unknown_template() {
        let map = TemplateMap::new();
        assert_eq!(
            map.render("nope", &json!({})),
            Err(RenderError::UnknownTemplate("nope".to_owned()))
        );
    }

    #[test]
    fn failed_registration_leaves_map_untouched() {
        let mut map = TemplateMap::new();
        assert!(map.register("bad", "{{ .x }}", Schema::new()).is_err());
        assert!(map.get("bad").is_none());
    }

    #[test]
    fn fixed_file_is_not_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        fs::write(&path, "one").unwrap();
        let mut map = TemplateMap::new();
        map.register_file("page", &path, Schema::new(), None).unwrap();
        fs::write(&path, "two").unwrap();
        assert_eq!(map.poll(), 0);
        assert_eq!(map.render("page", &json!({})).unwrap(), "one");
    }

    #[test]
    fn compile_error_names_the_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        fs::write(&path, "{{ .x }}").unwrap();
        let mut map = TemplateMap::new();
        let error = map.register_file("page", &path, Schema::new(), None).unwrap_err();
        assert!(matches!(error, LoadError::Compile { name, .. } if name == "page"));
    }
}
