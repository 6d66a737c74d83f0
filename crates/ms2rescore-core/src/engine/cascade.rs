//! Layered configuration: built-in defaults, then files, maps and command-line arguments,
//! each layer taking priority over the ones before it.

use super::config::{ConfigError, Configuration};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_CONFIG: &str = include_str!("config_default.json");

/// Name of the section that command-line arguments are placed under.
pub const SECTION: &str = "ms2rescore";

/// Objects are merged this many levels below the root; deeper objects are replaced.
const MAX_RECURSION_DEPTH: usize = 1;

/// One source of configuration values.
#[derive(Debug, Clone)]
pub enum ConfigLayer {
    /// A file whose format is chosen from its extension.
    File(PathBuf),
    Json(PathBuf),
    Toml(PathBuf),
    /// An in-memory configuration object.
    Map(Value),
    /// Values for the `ms2rescore` section, typically from the command line.
    Arguments(Map<String, Value>),
}

/// A dotted-key override applied after all layers have been merged.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    path: Vec<String>,
    value: Value,
}

impl Assignment {
    /// Parses `KEY=VALUE`. Keys are relative to the `ms2rescore` section, a leading
    /// `ms2rescore.` is accepted. Values are read as JSON where possible, otherwise as text.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let (key, value) = raw
            .split_once('=')
            .ok_or_else(|| ConfigError::invalid(raw, "expected KEY=VALUE"))?;

        let key = key.trim();
        let key = key
            .strip_prefix(SECTION)
            .and_then(|k| k.strip_prefix('.'))
            .unwrap_or(key);
        let path: Vec<String> = key.split('.').map(|s| s.trim().to_string()).collect();
        if path.iter().any(String::is_empty) {
            return Err(ConfigError::invalid(raw, "empty key segment"));
        }

        let value = value.trim();
        let value = match serde_json::from_str::<Value>(value) {
            Ok(parsed) => parsed,
            Err(_) => Value::String(value.to_string()),
        };

        let mut full_path = vec![SECTION.to_string()];
        full_path.extend(path);
        Ok(Self {
            path: full_path,
            value,
        })
    }

    pub fn key(&self) -> String {
        self.path.join(".")
    }

    fn apply(&self, root: &mut Map<String, Value>) -> Result<(), ConfigError> {
        let Some((last, parents)) = self.path.split_last() else {
            return Ok(());
        };

        let mut current = root;
        for segment in parents {
            let entry = current
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if entry.is_null() {
                *entry = Value::Object(Map::new());
            }
            current = entry.as_object_mut().ok_or_else(|| {
                ConfigError::invalid(self.key(), format!("`{segment}` is not a table"))
            })?;
        }
        current.insert(last.clone(), self.value.clone());
        Ok(())
    }
}

/// Collects configuration layers and merges them in insertion order.
#[derive(Debug, Clone, Default)]
pub struct ConfigCascade {
    layers: Vec<Map<String, Value>>,
    assignments: Vec<Assignment>,
}

impl ConfigCascade {
    /// A cascade seeded with the built-in defaults.
    pub fn new() -> Result<Self, ConfigError> {
        let defaults: Value =
            serde_json::from_str(DEFAULT_CONFIG).map_err(|e| ConfigError::Json {
                path: PathBuf::from("config_default.json"),
                source: e,
            })?;
        let mut cascade = Self::empty();
        cascade.add_map(defaults)?;
        Ok(cascade)
    }

    /// A cascade without defaults.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn add_layer(&mut self, layer: ConfigLayer) -> Result<&mut Self, ConfigError> {
        match layer {
            ConfigLayer::File(path) => self.add_file(&path),
            ConfigLayer::Json(path) => self.add_json(&path),
            ConfigLayer::Toml(path) => self.add_toml(&path),
            ConfigLayer::Map(value) => self.add_map(value),
            ConfigLayer::Arguments(map) => Ok(self.add_arguments(map)),
        }
    }

    /// Adds a `.json` or `.toml` file, chosen by extension.
    pub fn add_file(&mut self, path: &Path) -> Result<&mut Self, ConfigError> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "json" => self.add_json(path),
            "toml" => self.add_toml(path),
            _ => Err(ConfigError::UnknownFileExtension(path.to_path_buf())),
        }
    }

    pub fn add_json(&mut self, path: &Path) -> Result<&mut Self, ConfigError> {
        debug!("Loading JSON configuration from {:?}", path);
        let content = read_file(path)?;
        let value: Value = serde_json::from_str(&content).map_err(|e| ConfigError::Json {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.add_map(value)
    }

    pub fn add_toml(&mut self, path: &Path) -> Result<&mut Self, ConfigError> {
        debug!("Loading TOML configuration from {:?}", path);
        let content = read_file(path)?;
        let value: Value = toml::from_str(&content).map_err(|e| ConfigError::Toml {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.add_map(value)
    }

    pub fn add_map(&mut self, value: Value) -> Result<&mut Self, ConfigError> {
        match value {
            Value::Object(map) => {
                self.layers.push(map);
                Ok(self)
            }
            other => Err(ConfigError::InvalidLayer(format!(
                "expected a table at the top level, got {}",
                value_kind(&other)
            ))),
        }
    }

    pub fn add_arguments(&mut self, arguments: Map<String, Value>) -> &mut Self {
        let mut layer = Map::new();
        layer.insert(SECTION.to_string(), Value::Object(arguments));
        self.layers.push(layer);
        self
    }

    /// Registers an override that is applied on top of every layer.
    pub fn set(&mut self, assignment: Assignment) -> &mut Self {
        self.assignments.push(assignment);
        self
    }

    /// The merged configuration as an untyped value.
    pub fn merged(&self) -> Result<Value, ConfigError> {
        let mut root = Map::new();
        for layer in &self.layers {
            merge_into(&mut root, layer, 0);
        }
        for assignment in &self.assignments {
            assignment.apply(&mut root)?;
        }
        Ok(Value::Object(root))
    }

    /// Merges all layers and checks the result against the configuration schema.
    pub fn parse(&self) -> Result<Configuration, ConfigError> {
        serde_json::from_value(self.merged()?).map_err(ConfigError::Schema)
    }
}

fn merge_into(target: &mut Map<String, Value>, layer: &Map<String, Value>, depth: usize) {
    for (key, value) in layer {
        if value.is_null() {
            continue;
        }
        if depth < MAX_RECURSION_DEPTH {
            if let (Some(Value::Object(existing)), Value::Object(incoming)) =
                (target.get_mut(key), value)
            {
                merge_into(existing, incoming, depth + 1);
                continue;
            }
        }
        target.insert(key.clone(), value.clone());
    }
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: e,
    })
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a table",
    }
}
