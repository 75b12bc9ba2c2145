use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Named outputs returned to the workflow host, wrapped as `{"__outputs": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeOutput {
    #[serde(rename = "__outputs")]
    pub outputs: Map<String, Value>,
}

impl NodeOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.outputs.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.outputs.get(name)
    }
}
