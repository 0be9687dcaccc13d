//! GP action tools offered to the generation capability

use crate::consultation::specialty::{Specialty, Urgency};
use crate::tool::entities::{ToolDefinition, ToolKind, ToolParameter, ToolSpec};

pub const CONSULT_SPECIALIST: &str = "ConsultSpecialist";
pub const CONSULTATION_COMPLETE: &str = "ConsultationComplete";
pub const DIRECT_ANSWER: &str = "DirectAnswer";
pub const REFLECT: &str = "reflect";

pub fn consult_specialist(available: &[Specialty]) -> ToolDefinition {
    ToolDefinition::new(
        CONSULT_SPECIALIST,
        "Send a consultation note to one specialist. Call once per specialist; calls in the same turn run in parallel.",
        ToolKind::Control,
    )
    .with_parameter(
        ToolParameter::new("specialty", "Specialty to consult", true)
            .with_allowed_values(available.iter().map(|s| s.as_str())),
    )
    .with_parameter(ToolParameter::new(
        "patient_context",
        "Relevant patient context: age, sex, comorbidities, symptoms, labs",
        true,
    ))
    .with_parameter(ToolParameter::new(
        "clinical_question",
        "Focused question for the specialist",
        true,
    ))
    .with_parameter(ToolParameter::new(
        "expected_response",
        "What the specialist should address",
        false,
    ))
    .with_parameter(
        ToolParameter::new("urgency", "routine, urgent or emergent", false)
            .with_allowed_values(Urgency::VALUES),
    )
}

pub fn consultation_complete() -> ToolDefinition {
    ToolDefinition::new(
        CONSULTATION_COMPLETE,
        "Finish the case: summarize the consultations and give the integrated, evidence-based answer",
        ToolKind::Control,
    )
    .with_parameter(ToolParameter::new(
        "summary",
        "GP summary of the case and of each specialist's input",
        true,
    ))
    .with_parameter(ToolParameter::new(
        "integrated_response",
        "Final answer for the requesting physician, with citations",
        true,
    ))
}

pub fn direct_answer() -> ToolDefinition {
    ToolDefinition::new(
        DIRECT_ANSWER,
        "Answer directly without consulting any specialist",
        ToolKind::Control,
    )
    .with_parameter(ToolParameter::new("answer", "Evidence-based answer", true))
}

pub fn reflect() -> ToolDefinition {
    ToolDefinition::new(
        REFLECT,
        "Think through the case before deciding; the thought is recorded but changes nothing",
        ToolKind::Control,
    )
    .with_parameter(ToolParameter::new("thought", "Clinical reasoning", true))
}

/// Tool schema for the GP, restricted to the specialties available in this run
pub fn gp_tool_spec(available: &[Specialty]) -> ToolSpec {
    ToolSpec::new()
        .register(consult_specialist(available))
        .register(consultation_complete())
        .register(direct_answer())
        .register(reflect())
        .register_alias("think", REFLECT)
        .register_alias("consult_specialist", CONSULT_SPECIALIST)
        .register_alias("consultation_complete", CONSULTATION_COMPLETE)
        .register_alias("direct_answer", DIRECT_ANSWER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gp_spec_lists_available_specialties() {
        let spec = gp_tool_spec(&[Specialty::Cardiology, Specialty::Neurology]);
        let consult = spec.get(CONSULT_SPECIALIST).unwrap();
        let specialty = consult
            .parameters
            .iter()
            .find(|p| p.name == "specialty")
            .unwrap();
        assert_eq!(specialty.allowed_values, vec!["cardiology", "neurology"]);
        assert!(spec.all().all(|t| t.is_control()));
    }

    #[test]
    fn test_snake_case_aliases_resolve() {
        let spec = gp_tool_spec(&Specialty::ALL);
        assert_eq!(spec.resolve("consult_specialist"), Some(CONSULT_SPECIALIST));
        assert_eq!(spec.resolve("think"), Some(REFLECT));
    }
}
