//! Model value object naming the generation model used by an agent

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Generation model identifier (Value Object)
///
/// The GP and the specialists may run on different models; the gateway
/// adapter passes [`Model::as_str`] through to the provider untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Model {
    Gpt41,
    Gpt41Mini,
    Gpt4o,
    Gpt4oMini,
    Custom(String),
}

impl Model {
    /// Get the string identifier for this model
    pub fn as_str(&self) -> &str {
        match self {
            Model::Gpt41 => "gpt-4.1",
            Model::Gpt41Mini => "gpt-4.1-mini",
            Model::Gpt4o => "gpt-4o",
            Model::Gpt4oMini => "gpt-4o-mini",
            Model::Custom(s) => s,
        }
    }
}

impl Default for Model {
    fn default() -> Self {
        Model::Gpt4oMini
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Model {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "gpt-4.1" => Model::Gpt41,
            "gpt-4.1-mini" => Model::Gpt41Mini,
            "gpt-4o" => Model::Gpt4o,
            "gpt-4o-mini" => Model::Gpt4oMini,
            other => Model::Custom(other.to_string()),
        })
    }
}

impl From<&str> for Model {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(model) => model,
            Err(never) => match never {},
        }
    }
}

impl Serialize for Model {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Model::from(s.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_roundtrip() {
        for model in [Model::Gpt41, Model::Gpt41Mini, Model::Gpt4o, Model::Gpt4oMini] {
            let parsed: Model = model.to_string().parse().unwrap();
            assert_eq!(model, parsed);
        }
    }

    #[test]
    fn test_custom_model() {
        let model: Model = "llama3.1:70b".parse().unwrap();
        assert_eq!(model, Model::Custom("llama3.1:70b".to_string()));
        assert_eq!(model.to_string(), "llama3.1:70b");
    }

    #[test]
    fn test_model_serde_is_plain_string() {
        let json = serde_json::to_string(&Model::Gpt4o).unwrap();
        assert_eq!(json, "\"gpt-4o\"");
        let back: Model = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Model::Gpt4o);
    }
}
