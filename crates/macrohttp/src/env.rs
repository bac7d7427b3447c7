//! Environment map used as the lowest-precedence source for URL templates

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Environment value: a string or a number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Number(Number),
    Text(String),
}

impl From<&str> for EnvValue {
    fn from(value: &str) -> Self {
        EnvValue::Text(value.to_string())
    }
}

impl From<String> for EnvValue {
    fn from(value: String) -> Self {
        EnvValue::Text(value)
    }
}

impl From<i64> for EnvValue {
    fn from(value: i64) -> Self {
        EnvValue::Number(value.into())
    }
}

impl From<i32> for EnvValue {
    fn from(value: i32) -> Self {
        EnvValue::Number(value.into())
    }
}

impl From<u64> for EnvValue {
    fn from(value: u64) -> Self {
        EnvValue::Number(value.into())
    }
}

impl From<f64> for EnvValue {
    fn from(value: f64) -> Self {
        // NaN and infinities have no JSON number form
        Number::from_f64(value)
            .map(EnvValue::Number)
            .unwrap_or_else(|| EnvValue::Text(value.to_string()))
    }
}

impl From<EnvValue> for Value {
    fn from(value: EnvValue) -> Self {
        match value {
            EnvValue::Number(n) => Value::Number(n),
            EnvValue::Text(s) => Value::String(s),
        }
    }
}

/// Key/value environment
///
/// Later writes to the same key replace earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Environment {
    vars: BTreeMap<String, EnvValue>,
}

impl Environment {
    /// Create an empty environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one variable, returning the value it replaced
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<EnvValue>) -> Option<EnvValue> {
        self.vars.insert(key.into(), value.into())
    }

    /// Merge many variables, overriding existing keys
    pub fn extend<I, K, V>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<EnvValue>,
    {
        for (key, value) in vars {
            self.set(key, value);
        }
    }

    /// Get a variable
    pub fn get(&self, key: &str) -> Option<&EnvValue> {
        self.vars.get(key)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &EnvValue)> {
        self.vars.iter()
    }

    /// Copy every variable into a JSON object, overwriting existing keys
    pub fn merge_into(&self, target: &mut Map<String, Value>) {
        for (key, value) in &self.vars {
            target.insert(key.clone(), value.clone().into());
        }
    }
}

impl<K, V> FromIterator<(K, V)> for Environment
where
    K: Into<String>,
    V: Into<EnvValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut env = Environment::new();
        env.extend(iter);
        env
    }
}
