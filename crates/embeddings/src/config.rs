use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const DEFAULT_EMBEDDING_MODEL: &str = "amazon.titan-embed-text-v2:0";
pub const DEFAULT_DIMENSIONS: u32 = 1024;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub model: Option<String>,
    /// Accepts a number or a numeric string, as sent by dropdown-driven configs.
    #[serde(default, deserialize_with = "number_or_string")]
    pub dimensions: Option<u32>,
    #[serde(default)]
    pub normalize: Option<bool>,
}

impl EmbeddingConfig {
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(DEFAULT_EMBEDDING_MODEL)
    }

    pub fn dimensions(&self) -> u32 {
        self.dimensions
            .filter(|d| *d > 0)
            .unwrap_or(DEFAULT_DIMENSIONS)
    }
}

/// Zero counts as unset, so the model default applies.
fn number_or_string<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let dimensions = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64))
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid dimensions: {}", n))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid dimensions: '{}'", s))),
        Some(other) => Err(D::Error::custom(format!("invalid dimensions: {}", other))),
    }?;
    Ok(dimensions.filter(|d| *d != 0))
}
