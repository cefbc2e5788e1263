use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

/// Name of the ordered suggestions attribute.
pub const SUGGESTIONS: &str = "suggestions";
/// Name of the structured attribute nesting its own suggestions.
pub const MOSAIQUE: &str = "mosaique";

/// A rule set keyed by rule name.
///
/// Keys are always strings and keep their insertion order, so serializing the
/// same set twice yields the same bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Mapping,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a rule set from a parsed YAML document.
    ///
    /// A `null` document is an empty set. Scalar keys, at every depth, are
    /// stringified the way a YAML loader for an untyped object model would, so
    /// a translated `1:` attribute replaces the base `1:` one.
    pub fn from_value(value: Value) -> Result<Self, String> {
        let mapping = match value {
            Value::Null => return Ok(Self::new()),
            Value::Mapping(mapping) => mapping,
            other => {
                return Err(format!(
                    "expected a mapping of rule names, found {}",
                    describe(&other)
                ));
            }
        };

        let mut rules = Mapping::with_capacity(mapping.len());
        for (key, rule) in mapping {
            let name = scalar_key(&key)
                .ok_or_else(|| format!("rule names must be scalars, found {}", describe(&key)))?;
            rules.insert(Value::String(name), stringify_keys(rule));
        }
        Ok(Self { rules })
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, String> {
        let value: Value = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
        Self::from_value(value)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.rules.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.rules.get_mut(name)
    }

    /// Insert or replace a whole rule entry, returning the previous one.
    pub fn insert(&mut self, name: impl Into<String>, rule: Value) -> Option<Value> {
        self.rules.insert(Value::String(name.into()), rule)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().filter_map(Value::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.rules
            .iter()
            .filter_map(|(key, rule)| key.as_str().map(|name| (name, rule)))
    }

    /// Compact JSON, the artifact format.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl IntoIterator for RuleSet {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules
            .into_iter()
            .filter_map(|(key, rule)| match key {
                Value::String(name) => Some((name, rule)),
                _ => None,
            })
            .collect::<Vec<_>>()
            .into_iter()
    }
}

/// Rules read from one source file.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub source: PathBuf,
    pub rules: RuleSet,
}

impl Fragment {
    pub fn new(source: impl AsRef<Path>, rules: RuleSet) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            rules,
        }
    }
}

/// String form of a scalar YAML key, `None` for null and composite keys.
pub fn scalar_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_key(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// Turn every scalar mapping key below `value` into a string key.
fn stringify_keys(value: Value) -> Value {
    match value {
        Value::Mapping(mapping) => Value::Mapping(
            mapping
                .into_iter()
                .map(|(key, item)| {
                    let key = scalar_key(&key).map(Value::String).unwrap_or(key);
                    (key, stringify_keys(item))
                })
                .collect(),
        ),
        Value::Sequence(items) => Value::Sequence(items.into_iter().map(stringify_keys).collect()),
        other => other,
    }
}

/// Short name of a YAML value's kind for diagnostics.
pub fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
