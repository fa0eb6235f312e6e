use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Deserialize;

use crate::error::{PrepError, Result};
use crate::models::postman::PostmanVariable;

/// Value substituted for `{{name}}` when no variable is defined.
pub const UNDEFINED: &str = "UNDEFINED";

static VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([^{}]+?)\s*\}\}").expect("variable pattern is valid"));

/// Substitutes collection variables into a URL template.
pub trait VariableResolver {
    fn resolve(&self, template: &str) -> String;
}

/// Postman environment export.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostmanEnvironment {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub values: Vec<EnvironmentValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentValue {
    pub key: String,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl PostmanEnvironment {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PrepError::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| PrepError::json(path, e))
    }
}

/// Variable table built from collection variables and an optional environment.
#[derive(Debug, Clone, Default)]
pub struct PostmanVariables {
    values: HashMap<String, String>,
}

impl PostmanVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection_variables(mut self, variables: &[PostmanVariable]) -> Self {
        for variable in variables {
            if variable.disabled == Some(true) {
                continue;
            }
            if let Some(key) = &variable.key {
                self.values
                    .insert(key.clone(), value_to_string(variable.value.as_ref()));
            }
        }
        self
    }

    pub fn with_environment(mut self, environment: &PostmanEnvironment) -> Self {
        for entry in environment.values.iter().filter(|v| v.enabled) {
            self.values
                .insert(entry.key.clone(), value_to_string(entry.value.as_ref()));
        }
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl VariableResolver for PostmanVariables {
    fn resolve(&self, template: &str) -> String {
        VARIABLE
            .replace_all(template, |caps: &Captures<'_>| {
                self.values
                    .get(&caps[1])
                    .cloned()
                    .unwrap_or_else(|| UNDEFINED.to_string())
            })
            .into_owned()
    }
}

fn value_to_string(value: Option<&serde_json::Value>) -> String {
    match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
