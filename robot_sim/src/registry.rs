use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Named scalar variables of one robot or engine, kept in insertion order.
///
/// Plain owned data refreshed between ticks, so loggers and viewers read a
/// consistent snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableRegistry {
    pub name: String,
    names: Vec<String>,
    values: Vec<f64>,
    #[serde(skip)]
    lookup: HashMap<String, usize>,
}

impl VariableRegistry {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Creates the variable on first use.
    pub fn set(&mut self, name: &str, value: f64) {
        if let Some(i) = self.index_of(name) {
            self.values[i] = value;
            return;
        }
        self.lookup.insert(name.to_string(), self.names.len());
        self.names.push(name.to_string());
        self.values.push(value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.index_of(name).map(|i| self.values[i])
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    /// Sets `prefix_i` for every entry, or just `prefix` for a single value.
    pub fn set_vector<'a>(&mut self, prefix: &str, values: impl IntoIterator<Item = &'a f64>) {
        let values: Vec<f64> = values.into_iter().copied().collect();
        if values.len() == 1 {
            self.set(prefix, values[0]);
        } else {
            for (i, value) in values.iter().enumerate() {
                self.set(&format!("{prefix}_{i}"), *value);
            }
        }
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        // the lookup is not serialized, fall back to a scan after loading
        match self.lookup.get(name) {
            Some(i) => Some(*i),
            None if self.lookup.len() != self.names.len() => {
                self.names.iter().position(|n| n == name)
            }
            None => None,
        }
    }
}
