extern crate stache;
use stache::{
    Config, JsonValue, Kind, LoadError, MapsAndLists, RenderError, Schema, Template, TemplateMap,
    TemplateStore,
};

use std::fs;
use std::path::Path;
use serde_json::json;


fn write(dir: &Path, name: &str, text: &str) {
    fs::write(dir.join(name), text).unwrap();
}

fn todo_config(environment: &str) -> Config {
    Config::from_yaml(&format!(concat!(
        "environment: {}\n",
        "reload:\n",
        "  interval_ms: 10\n",
        "templates:\n",
        "  - name: todos\n",
        "    path: todos.html\n",
        "    schema: todos.yml\n",
    ), environment)).unwrap()
}

fn todo_files(dir: &Path) {
    write(dir, "todos.html", "{% for .todos |t| %}{{ .t.title }}:{{ .index }};{% endfor %}");
    write(dir, "todos.yml", "todos:\n  - title: scalar\n    'done?': scalar\n");
}

#[test]
fn map_from_config() {
    let dir = tempfile::tempdir().unwrap();
    todo_files(dir.path());
    let map = TemplateMap::from_config(&todo_config("production"), dir.path()).unwrap();

    let data = json!({"todos": [{"title": "A"}, {"title": "B", "done": true}]});
    assert_eq!(map.render("todos", &data).unwrap(), "A:0;B:1;");
    assert_eq!(map.names().collect::<Vec<_>>(), vec!["todos"]);
    assert!(map.get("other").is_none());
}

#[test]
fn missing_schema_file() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "todos.html", "");
    let result = TemplateMap::from_config(&todo_config("production"), dir.path());
    assert!(matches!(result, Err(LoadError::Io { path, .. }) if path.ends_with("todos.yml")));
}

#[test]
fn bad_schema_file() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "todos.html", "");
    write(dir.path(), "todos.yml", "todos: 3\n");
    let result = TemplateMap::from_config(&todo_config("production"), dir.path());
    assert!(matches!(result, Err(LoadError::Schema { .. })));
}

#[test]
fn template_checked_against_its_schema() {
    let dir = tempfile::tempdir().unwrap();
    todo_files(dir.path());
    write(dir.path(), "todos.html", "{% for .todos |t| %}{{ .t.titel }}{% endfor %}");
    let error = TemplateMap::from_config(&todo_config("production"), dir.path()).unwrap_err();
    assert!(matches!(&error, LoadError::Compile { name, .. } if name == "todos"));
    assert!(error.to_string().contains("title"));
}

#[test]
fn development_templates_reload() {
    let dir = tempfile::tempdir().unwrap();
    todo_files(dir.path());
    let map = TemplateMap::from_config(&todo_config("development"), dir.path()).unwrap();
    let data = json!({"todos": [{"title": "A"}]});
    assert_eq!(map.render("todos", &data).unwrap(), "A:0;");

    let path = dir.path().join("todos.html");
    fs::write(&path, "{% for .todos |t| %}[{{ .t.title }}]{% endfor %}").unwrap();
    let later = std::time::SystemTime::now() + std::time::Duration::from_secs(10);
    fs::File::options().write(true).open(&path).unwrap().set_modified(later).unwrap();

    let mut rendered = String::new();
    for _ in 0..500 {
        rendered = map.render("todos", &data).unwrap();
        if rendered == "[A]" {
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(10));
    }
    assert_eq!(rendered, "[A]");
}

#[test]
fn unknown_name() {
    let map = TemplateMap::new();
    assert_eq!(
        map.render("missing", &json!({})),
        Err(RenderError::UnknownTemplate("missing".to_owned()))
    );
}

#[test]
fn plain_text_renders_unchanged() {
    for text in ["", "plain", "a } b { c %} d", "line\nbreaks\n\n", "ünïcödé <&>"] {
        let template = Template::compile(text, Schema::new()).unwrap();
        assert_eq!(template.render(&json!({})).unwrap(), text);
    }
}

#[test]
fn rendering_is_repeatable_and_shareable() {
    let schema = Schema::new()
        .field("xs", Kind::list(Kind::Scalar))
        .field("sep", Kind::Scalar);
    let template = std::sync::Arc::new(Template::compile(
        "{% for .xs |x| %}{{ .x }}{% if .last %}{% else %}{{ .sep }}{% endif %}{% endfor %}",
        schema
    ).unwrap());
    let data = json!({"xs": [1, 2, 3], "sep": ", "});
    let first = template.render(&data).unwrap();
    assert_eq!(first, "1, 2, 3");

    let handles = (0..4).map(|_| {
        let template = std::sync::Arc::clone(&template);
        std::thread::spawn(move || {
            let data = json!({"xs": [1, 2, 3], "sep": ", "});
            template.render(&data).unwrap()
        })
    }).collect::<Vec<_>>();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), first);
    }
}

#[test]
fn same_output_for_every_context_kind() {
    let schema = Schema::new()
        .field("name", Kind::Scalar)
        .field("tags", Kind::list(Kind::Scalar));
    let template = Template::compile(
        "{{ .name }}:{% for .tags |tag| %} {{ .tag }}{% endfor %}",
        schema
    ).unwrap();

    let json = serde_json::from_str::<JsonValue>(r#"{"name": "a&b", "tags": ["x", 1]}"#).unwrap();
    let yaml = serde_yaml::from_str::<stache::YamlValue>("name: a&b\ntags: [x, 1]\n").unwrap();
    let maps = MapsAndLists::entries([
        ("name", MapsAndLists::text("a&b")),
        ("tags", MapsAndLists::sequence(vec![MapsAndLists::text("x"), MapsAndLists::integer(1)])),
    ]);

    for rendered in [template.render(&json), template.render(&yaml), template.render(&maps)] {
        assert_eq!(rendered.unwrap(), "a&amp;b: x 1");
    }
}
