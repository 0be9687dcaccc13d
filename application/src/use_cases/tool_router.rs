//! Tool router: name → capability dispatch for specialist research tools.

use crate::ports::tool_capability::ToolCapability;
use interconsult_domain::clinical::catalog;
use interconsult_domain::{
    DefaultToolValidator, Specialty, ToolCall, ToolError, ToolResult, ToolSpec, ToolValidator,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Stateless dispatcher from tool names to capabilities.
///
/// The mapping is fixed at construction, so one router is shared by every
/// specialist of a run without locking. Every failure comes back as a
/// [`ToolResult`] so the research loop can observe it and adapt.
pub struct ToolRouter {
    capabilities: HashMap<String, Arc<dyn ToolCapability>>,
    tool_timeout: Duration,
    validator: DefaultToolValidator,
}

impl ToolRouter {
    pub fn new(tool_timeout: Duration) -> Self {
        Self {
            capabilities: HashMap::new(),
            tool_timeout,
            validator: DefaultToolValidator,
        }
    }

    /// Bind a capability under its definition's name
    pub fn with_capability(mut self, capability: Arc<dyn ToolCapability>) -> Self {
        let name = capability.definition().name;
        self.capabilities.insert(name, capability);
        self
    }

    pub fn has_capability(&self, name: &str) -> bool {
        self.capabilities.contains_key(name)
    }

    /// Names of all bound capabilities, sorted
    pub fn tool_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.capabilities.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Tools offered to a specialty: its declared subset that has a bound capability
    pub fn spec_for(&self, specialty: Specialty) -> ToolSpec {
        let mut spec = specialty
            .tool_names()
            .into_iter()
            .filter_map(|name| self.capabilities.get(name))
            .fold(ToolSpec::new(), |spec, capability| {
                spec.register(capability.definition())
            });
        for (alias, canonical) in catalog::ALIASES {
            spec = spec.register_alias(alias, canonical);
        }
        spec
    }

    /// Route one call within the specialist's allowed tool set.
    pub async fn route(&self, call: &ToolCall, specialty: Specialty, spec: &ToolSpec) -> ToolResult {
        let started = Instant::now();
        let result = self.dispatch(call, specialty, spec).await;
        let result = result.with_duration(started.elapsed().as_millis() as u64);
        if let Some(error) = result.error() {
            warn!(tool = %call.tool_name, specialty = %specialty, "Tool failed: {}", error);
        } else {
            debug!(tool = %call.tool_name, specialty = %specialty, "Tool succeeded");
        }
        result
    }

    async fn dispatch(&self, call: &ToolCall, specialty: Specialty, spec: &ToolSpec) -> ToolResult {
        let Some(canonical) = spec.resolve(&call.tool_name) else {
            let mut available = spec.names().collect::<Vec<_>>();
            available.sort_unstable();
            return ToolResult::failure(
                &call.tool_name,
                ToolError::not_found(format!("tool '{}'", call.tool_name)).with_details(format!(
                    "available to {}: {}",
                    specialty.as_str(),
                    available.join(", ")
                )),
            );
        };
        let (Some(definition), Some(capability)) =
            (spec.get(canonical), self.capabilities.get(canonical))
        else {
            return ToolResult::failure(
                canonical,
                ToolError::not_found(format!("capability for tool '{}'", canonical)),
            );
        };

        if let Err(message) = self.validator.validate(call, definition) {
            return ToolResult::failure(canonical, ToolError::invalid_argument(message));
        }

        let mut routed = call.clone();
        routed.tool_name = canonical.to_string();

        match tokio::time::timeout(self.tool_timeout, capability.invoke(&routed, specialty)).await {
            Ok(Ok(output)) => ToolResult::success(canonical, output),
            Ok(Err(error)) => ToolResult::failure(canonical, error),
            Err(_) => ToolResult::failure(
                canonical,
                ToolError::timeout(format!(
                    "{} after {}s",
                    canonical,
                    self.tool_timeout.as_secs_f32()
                )),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use interconsult_domain::{ToolDefinition, ToolKind, ToolParameter};

    struct EchoCapability {
        name: &'static str,
        delay: Duration,
    }

    #[async_trait]
    impl ToolCapability for EchoCapability {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new(self.name, "echo", ToolKind::Research)
                .with_parameter(ToolParameter::new("query", "Query", true))
        }

        async fn invoke(&self, call: &ToolCall, specialty: Specialty) -> Result<String, ToolError> {
            tokio::time::sleep(self.delay).await;
            Ok(format!(
                "{}:{}:{}",
                call.tool_name,
                specialty.as_str(),
                call.get_string("query").unwrap_or_default()
            ))
        }
    }

    struct FailingCapability;

    #[async_trait]
    impl ToolCapability for FailingCapability {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new(catalog::RAG_QUERY, "rag", ToolKind::Research)
                .with_parameter(ToolParameter::new("query", "Query", true))
        }

        async fn invoke(&self, _call: &ToolCall, _specialty: Specialty) -> Result<String, ToolError> {
            Err(ToolError::execution_failed("index offline"))
        }
    }

    fn router(delay: Duration) -> ToolRouter {
        ToolRouter::new(Duration::from_millis(50))
            .with_capability(Arc::new(EchoCapability {
                name: catalog::LITERATURE_SEARCH,
                delay,
            }))
            .with_capability(Arc::new(EchoCapability {
                name: catalog::CALCULATE_WELLS_DVT,
                delay,
            }))
    }

    #[test]
    fn test_spec_for_intersects_specialty_and_capabilities() {
        let r = router(Duration::ZERO);
        let cardiology = r.spec_for(Specialty::Cardiology);
        assert!(cardiology.contains(catalog::LITERATURE_SEARCH));
        assert!(!cardiology.contains(catalog::CALCULATE_WELLS_DVT));
        let emergency = r.spec_for(Specialty::Emergency);
        assert!(emergency.contains(catalog::CALCULATE_WELLS_DVT));
        assert_eq!(r.tool_names(), vec![catalog::CALCULATE_WELLS_DVT, catalog::LITERATURE_SEARCH]);
    }

    #[tokio::test]
    async fn test_routes_to_capability() {
        let r = router(Duration::ZERO);
        let spec = r.spec_for(Specialty::Cardiology);
        let call = ToolCall::new(catalog::LITERATURE_SEARCH).with_arg("query", "apixaban");
        let result = r.route(&call, Specialty::Cardiology, &spec).await;
        assert!(result.is_success());
        assert_eq!(result.output(), Some("literature_search:cardiology:apixaban"));
    }

    #[tokio::test]
    async fn test_resolves_alias_to_canonical_name() {
        let r = router(Duration::ZERO);
        let spec = r.spec_for(Specialty::Cardiology);
        let call = ToolCall::new("pubmed_search").with_arg("query", "af");
        let result = r.route(&call, Specialty::Cardiology, &spec).await;
        assert_eq!(result.output(), Some("literature_search:cardiology:af"));
    }

    #[tokio::test]
    async fn test_tool_outside_specialty_is_not_found() {
        let r = router(Duration::ZERO);
        let spec = r.spec_for(Specialty::Cardiology);
        let call = ToolCall::new(catalog::CALCULATE_WELLS_DVT).with_arg("query", "x");
        let result = r.route(&call, Specialty::Cardiology, &spec).await;
        let error = result.error().unwrap();
        assert_eq!(error.code, "NOT_FOUND");
        assert!(error.details.as_deref().unwrap().contains("literature_search"));
    }

    #[tokio::test]
    async fn test_invalid_arguments_are_rejected_before_invocation() {
        let r = router(Duration::ZERO);
        let spec = r.spec_for(Specialty::Cardiology);
        let call = ToolCall::new(catalog::LITERATURE_SEARCH);
        let result = r.route(&call, Specialty::Cardiology, &spec).await;
        assert_eq!(result.error().unwrap().code, "INVALID_ARGUMENT");
    }

    #[tokio::test]
    async fn test_slow_capability_times_out() {
        let r = router(Duration::from_millis(500));
        let spec = r.spec_for(Specialty::Cardiology);
        let call = ToolCall::new(catalog::LITERATURE_SEARCH).with_arg("query", "x");
        let result = r.route(&call, Specialty::Cardiology, &spec).await;
        assert_eq!(result.error().unwrap().code, "TIMEOUT");
    }

    #[tokio::test]
    async fn test_capability_error_becomes_failure_result() {
        let r = ToolRouter::new(Duration::from_secs(1)).with_capability(Arc::new(FailingCapability));
        let spec = r.spec_for(Specialty::Surgery);
        let call = ToolCall::new(catalog::RAG_QUERY).with_arg("query", "hernia");
        let result = r.route(&call, Specialty::Surgery, &spec).await;
        assert!(!result.is_success());
        assert!(result.to_observation().contains("index offline"));
    }
}
