//! Tool domain entities

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which agent a tool belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    /// Research capability invoked through the ToolRouter (RAG, literature, calculators)
    Research,
    /// Control action interpreted by the engine itself (GP actions, terminal submission)
    Control,
}

impl ToolKind {
    pub fn as_str(&self) -> &str {
        match self {
            ToolKind::Research => "research",
            ToolKind::Control => "control",
        }
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Definition of a tool offered to the generation capability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique name of the tool (e.g., "calculate_bmi")
    pub name: String,
    /// Human-readable description
    pub description: String,
    pub kind: ToolKind,
    /// Parameter specifications
    pub parameters: Vec<ToolParameter>,
}

/// Parameter specification for a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    /// Parameter name
    pub name: String,
    /// Parameter description
    pub description: String,
    /// Whether this parameter is required
    pub required: bool,
    /// JSON schema type hint ("string", "number", "integer", "boolean", "array", "object")
    pub param_type: String,
    /// Allowed values for string parameters
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, kind: ToolKind) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, param: ToolParameter) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn is_control(&self) -> bool {
        self.kind == ToolKind::Control
    }
}

impl ToolParameter {
    pub fn new(name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required,
            param_type: "string".to_string(),
            allowed_values: Vec::new(),
        }
    }

    pub fn with_type(mut self, param_type: impl Into<String>) -> Self {
        self.param_type = param_type.into();
        self
    }

    pub fn with_allowed_values(mut self, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.allowed_values = values.into_iter().map(Into::into).collect();
        self
    }
}

/// Specification of the tools available to one agent
#[derive(Debug, Clone, Default)]
pub struct ToolSpec {
    tools: HashMap<String, ToolDefinition>,
    /// Alias → canonical name mapping (e.g. "pubmed_search" → "literature_search")
    aliases: HashMap<String, String>,
}

impl ToolSpec {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            aliases: HashMap::new(),
        }
    }

    pub fn register(mut self, tool: ToolDefinition) -> Self {
        self.tools.insert(tool.name.clone(), tool);
        self
    }

    /// Register a single alias mapping (builder pattern)
    pub fn register_alias(mut self, alias: impl Into<String>, canonical: impl Into<String>) -> Self {
        self.aliases.insert(alias.into(), canonical.into());
        self
    }

    /// Resolve a name: returns canonical name if it's a registered tool,
    /// or resolves alias, or None if unknown
    pub fn resolve<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        if self.tools.contains_key(name) {
            Some(name)
        } else {
            self.aliases
                .get(name)
                .map(|s| s.as_str())
                .filter(|canonical| self.tools.contains_key(*canonical))
        }
    }

    /// Get tool definition by canonical name or alias
    pub fn get_resolved(&self, name: &str) -> Option<&ToolDefinition> {
        self.resolve(name).and_then(|canonical| self.tools.get(canonical))
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn all(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.values()
    }

    /// Tool definitions sorted by name, for stable schemas across runs
    pub fn sorted(&self) -> Vec<&ToolDefinition> {
        let mut tools: Vec<_> = self.tools.values().collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// A call to a tool with arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the tool to call
    pub tool_name: String,
    /// Arguments passed to the tool
    pub arguments: HashMap<String, serde_json::Value>,
    /// Provider-assigned call ID used to correlate results with the call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native_id: Option<String>,
}

impl ToolCall {
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments: HashMap::new(),
            native_id: None,
        }
    }

    /// Create a call from a provider's native tool-use block
    pub fn from_native(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            tool_name: name.into(),
            arguments,
            native_id: Some(id.into()),
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    pub fn with_native_id(mut self, id: impl Into<String>) -> Self {
        self.native_id = Some(id.into());
        self
    }

    /// Get a string argument
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }

    /// Get a required string argument or return an error message
    pub fn require_string(&self, key: &str) -> Result<&str, String> {
        self.get_string(key)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| format!("Missing required argument: {}", key))
    }

    /// Get an optional i64 argument; integral floats and numeric strings are accepted
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        let value = self.arguments.get(key)?;
        value
            .as_i64()
            .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
    }

    /// Get an optional f64 argument; numeric strings are accepted
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        let value = self.arguments.get(key)?;
        value
            .as_f64()
            .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
    }

    /// Get an optional bool argument; "true"/"false" strings are accepted
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        let value = self.arguments.get(key)?;
        value.as_bool().or_else(|| match value.as_str() {
            Some(s) if s.eq_ignore_ascii_case("true") => Some(true),
            Some(s) if s.eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        })
    }

    /// Get a list of strings; a single string is treated as a one-element list
    pub fn get_string_list(&self, key: &str) -> Vec<String> {
        match self.arguments.get(key) {
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|v| match v {
                    serde_json::Value::String(s) => Some(s.trim().to_string()),
                    serde_json::Value::Null => None,
                    other => Some(other.to_string()),
                })
                .filter(|s| !s.is_empty())
                .collect(),
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_definition() {
        let tool = ToolDefinition::new("calculate_bmi", "Body Mass Index", ToolKind::Research)
            .with_parameter(
                ToolParameter::new("weight_kg", "Weight in kilograms", true).with_type("number"),
            );

        assert_eq!(tool.name, "calculate_bmi");
        assert!(!tool.is_control());
        assert_eq!(tool.parameters.len(), 1);
        assert_eq!(tool.parameters[0].param_type, "number");
    }

    #[test]
    fn test_tool_spec_aliases() {
        let spec = ToolSpec::new()
            .register(ToolDefinition::new("literature_search", "PubMed", ToolKind::Research))
            .register_alias("pubmed_search", "literature_search")
            .register_alias("dangling", "not_registered");

        assert_eq!(spec.resolve("literature_search"), Some("literature_search"));
        assert_eq!(spec.resolve("pubmed_search"), Some("literature_search"));
        assert_eq!(spec.resolve("dangling"), None);
        assert_eq!(spec.resolve("unknown"), None);
        assert_eq!(
            spec.get_resolved("pubmed_search").unwrap().name,
            "literature_search"
        );
        // get() is exact match only
        assert!(spec.get("pubmed_search").is_none());
    }

    #[test]
    fn test_sorted_is_stable() {
        let spec = ToolSpec::new()
            .register(ToolDefinition::new("rag_query", "", ToolKind::Research))
            .register(ToolDefinition::new("calculate_bmi", "", ToolKind::Research))
            .register(ToolDefinition::new("literature_search", "", ToolKind::Research));

        let names: Vec<_> = spec.sorted().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["calculate_bmi", "literature_search", "rag_query"]);
    }

    #[test]
    fn test_tool_call_accessors() {
        let call = ToolCall::new("calculate_chads2vasc")
            .with_arg("age", 78)
            .with_arg("sex", "female")
            .with_arg("hypertension", "true")
            .with_arg("weight", "72.5");

        assert_eq!(call.get_i64("age"), Some(78));
        assert_eq!(call.get_string("sex"), Some("female"));
        assert_eq!(call.get_bool("hypertension"), Some(true));
        assert_eq!(call.get_f64("weight"), Some(72.5));
        assert!(call.require_string("missing").is_err());
    }

    #[test]
    fn test_get_i64_accepts_integral_float() {
        let call = ToolCall::new("t").with_arg("age", json!(65.0)).with_arg("bad", json!(65.5));
        assert_eq!(call.get_i64("age"), Some(65));
        assert_eq!(call.get_i64("bad"), None);
    }

    #[test]
    fn test_string_list_accepts_scalar() {
        let call = ToolCall::new("submit")
            .with_arg("evidence_used", json!(["ESC 2020 AF guidelines", "  "]))
            .with_arg("single", "CHEST 2018");

        assert_eq!(call.get_string_list("evidence_used"), vec!["ESC 2020 AF guidelines"]);
        assert_eq!(call.get_string_list("single"), vec!["CHEST 2018"]);
        assert!(call.get_string_list("absent").is_empty());
    }

    #[test]
    fn test_from_native_keeps_id() {
        let call = ToolCall::from_native("call_1", "rag_query", HashMap::new());
        assert_eq!(call.native_id.as_deref(), Some("call_1"));
        assert_eq!(call.tool_name, "rag_query");
    }
}
