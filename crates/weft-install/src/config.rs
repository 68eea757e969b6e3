use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use weft_source::{write_atomic, ClassLocator};

use crate::error::{InstallError, Result};

const CLASSES_PREFIX: &str = "classes.";

/// Settings from `.weft/config.json`. Every field has a default, so a
/// missing or empty file yields the stock layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeftConfig {
    pub modules_dir: String,
    pub class_root: String,
    pub host_class: String,
    pub services_class: String,
    /// Class id -> path relative to the application root.
    pub classes: BTreeMap<String, String>,
    pub replace_files: bool,
}

impl Default for WeftConfig {
    fn default() -> Self {
        Self {
            modules_dir: "class-modules".into(),
            class_root: "class".into(),
            host_class: "Core\\Services\\Hooks".into(),
            services_class: "Core\\Services\\X".into(),
            classes: BTreeMap::new(),
            replace_files: true,
        }
    }
}

impl WeftConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let map = read_map(path)?;
        from_map(map)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| InstallError::Json {
            path: path.to_path_buf(),
            source: e,
        })?;
        write_atomic(path, json.as_bytes()).map_err(|e| InstallError::io(path, e))
    }

    /// Class locator rooted at `root` with the configured overrides.
    pub fn locator(&self, root: &Path) -> ClassLocator {
        self.classes.iter().fold(
            ClassLocator::new(root, &self.modules_dir, &self.class_root),
            |loc, (class, rel)| loc.with_override(class, rel),
        )
    }

    /// Directory of a module's sources.
    pub fn module_dir(&self, root: &Path, module: &str) -> std::path::PathBuf {
        root.join(&self.modules_dir).join(module)
    }
}

/// Set one key in the config file. `classes.<id>` sets a class path
/// override. The result must still deserialize into [`WeftConfig`].
pub fn set(path: &Path, key: &str, value: &str) -> Result<()> {
    let mut map = read_map(path)?;
    match key.strip_prefix(CLASSES_PREFIX) {
        Some(class) if !class.is_empty() => {
            let classes = map
                .entry("classes")
                .or_insert_with(|| Value::Object(Map::new()));
            match classes {
                Value::Object(c) => {
                    c.insert(class.to_string(), Value::String(value.to_string()));
                }
                _ => return Err(InstallError::Config("`classes` is not an object".into())),
            }
        }
        _ => {
            map.insert(key.to_string(), typed_value(key, value)?);
        }
    }
    // validate before writing
    from_map(map.clone())?;
    let json = serde_json::to_string_pretty(&map).map_err(|e| InstallError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    write_atomic(path, json.as_bytes()).map_err(|e| InstallError::io(path, e))
}

/// Effective value of `key`, falling back to the default.
pub fn get(path: &Path, key: &str) -> Result<Option<Value>> {
    let config = WeftConfig::load(path)?;
    Ok(list_effective(&config).remove(key))
}

/// All effective settings, flattened (`classes.<id>` per override).
pub fn list_effective(config: &WeftConfig) -> BTreeMap<String, Value> {
    let mut out = BTreeMap::new();
    out.insert("modules_dir".into(), Value::from(config.modules_dir.as_str()));
    out.insert("class_root".into(), Value::from(config.class_root.as_str()));
    out.insert("host_class".into(), Value::from(config.host_class.as_str()));
    out.insert(
        "services_class".into(),
        Value::from(config.services_class.as_str()),
    );
    out.insert("replace_files".into(), Value::Bool(config.replace_files));
    for (class, rel) in &config.classes {
        out.insert(format!("{CLASSES_PREFIX}{class}"), Value::from(rel.as_str()));
    }
    out
}

fn read_map(path: &Path) -> Result<Map<String, Value>> {
    if !path.exists() {
        return Ok(Map::new());
    }
    let content = std::fs::read_to_string(path).map_err(|e| InstallError::io(path, e))?;
    let val: Value = serde_json::from_str(&content).map_err(|e| InstallError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    match val {
        Value::Object(map) => Ok(map),
        _ => Err(InstallError::Config(format!(
            "{} must contain a JSON object",
            path.display()
        ))),
    }
}

fn from_map(map: Map<String, Value>) -> Result<WeftConfig> {
    serde_json::from_value(Value::Object(map)).map_err(|e| InstallError::Config(e.to_string()))
}

/// JSON value for `key`. `replace_files` is the only non-string setting.
fn typed_value(key: &str, value: &str) -> Result<Value> {
    match key {
        "replace_files" => match value {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(InstallError::Config(format!(
                "replace_files must be true or false, got `{value}`"
            ))),
        },
        _ => Ok(Value::String(value.to_string())),
    }
}
