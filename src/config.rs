//! Engine configuration.
//!
//! ```yaml
//! environment: development
//! reload:
//!   interval_ms: 250
//! templates:
//!   - name: todos
//!     path: templates/todos.html
//!     schema: schemas/todos.yml
//! ```
//!
//! JSON documents are accepted as well.
use std::{fs, path::{Path, PathBuf}, time::Duration};
use serde::{de, Deserialize, Deserializer};
use crate::error::LoadError;


#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    #[default]
    Production,
}


#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReloadConfig {
    #[serde(deserialize_with = "positive_millis")]
    pub interval_ms: u64,
}

fn positive_millis<'de, D>(deserializer: D) -> Result<u64, D::Error>
where D: Deserializer<'de> {
    match u64::deserialize(deserializer)? {
        0 => Err(de::Error::custom("interval_ms must be at least 1")),
        millis => Ok(millis),
    }
}

impl ReloadConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for ReloadConfig {
    fn default() -> Self {
        ReloadConfig { interval_ms: 500 }
    }
}


#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TemplateConfig {
    pub name: String,
    pub path: PathBuf,
    /// Shape document describing the template's data.
    pub schema: PathBuf,
}


#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub environment: Environment,
    pub reload: ReloadConfig,
    pub templates: Vec<TemplateConfig>,
}

impl Config {
    pub fn from_yaml(text: &str) -> Result<Self, LoadError> {
        Ok(serde_yaml::from_str::<Config>(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Config::from_yaml(&text)
    }

    /// Templates are only watched while developing.
    pub fn hot_reload(&self) -> bool {
        self.environment == Environment::Development
    }
}
