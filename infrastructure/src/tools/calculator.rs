//! Clinical calculator capabilities, one per calculator tool name

use async_trait::async_trait;
use interconsult_application::ToolCapability;
use interconsult_domain::clinical::{CalculatorError, calculators, catalog};
use interconsult_domain::{Specialty, ToolCall, ToolDefinition, ToolError};

pub struct CalculatorCapability {
    definition: ToolDefinition,
}

impl CalculatorCapability {
    /// Capability for a calculator in the catalog, `None` for any other name
    pub fn new(name: &str) -> Option<Self> {
        catalog::CALCULATORS
            .contains(&name)
            .then(|| catalog::definition(name))
            .flatten()
            .map(|definition| Self { definition })
    }

    /// One capability per catalog calculator
    pub fn all() -> Vec<Self> {
        catalog::CALCULATORS
            .iter()
            .filter_map(|name| Self::new(name))
            .collect()
    }
}

#[async_trait]
impl ToolCapability for CalculatorCapability {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn invoke(&self, call: &ToolCall, _specialty: Specialty) -> Result<String, ToolError> {
        let value = calculators::calculate(&self.definition.name, call).map_err(|e| match e {
            CalculatorError::InvalidInput(message) => ToolError::invalid_argument(message),
            CalculatorError::UnknownCalculator(name) => ToolError::not_found(format!("calculator '{}'", name)),
        })?;
        serde_json::to_string_pretty(&value).map_err(|e| ToolError::execution_failed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_calculators_bound() {
        let names: Vec<_> = CalculatorCapability::all()
            .into_iter()
            .map(|c| c.definition().name)
            .collect();
        assert_eq!(names, catalog::CALCULATORS.to_vec());
        assert!(CalculatorCapability::new(catalog::RAG_QUERY).is_none());
    }

    #[tokio::test]
    async fn test_bmi() {
        let capability = CalculatorCapability::new(catalog::CALCULATE_BMI).unwrap();
        let call = ToolCall::new(catalog::CALCULATE_BMI)
            .with_arg("weight_kg", 95.0)
            .with_arg("height_cm", 175.0);
        let output = capability.invoke(&call, Specialty::Nutrition).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["bmi"], 31.0);
        assert_eq!(value["classification"], "Obesity Class I");
    }

    #[tokio::test]
    async fn test_out_of_range_is_invalid_argument() {
        let capability = CalculatorCapability::new(catalog::CALCULATE_BMI).unwrap();
        let call = ToolCall::new(catalog::CALCULATE_BMI)
            .with_arg("weight_kg", 95.0)
            .with_arg("height_cm", 0.5);
        let err = capability.invoke(&call, Specialty::Nutrition).await.unwrap_err();
        assert_eq!(err.code, "INVALID_ARGUMENT");
    }
}
