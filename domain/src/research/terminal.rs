//! Terminal output of a specialist research loop
//!
//! A specialist finishes by calling `submit_counter_referral` with the
//! counter-referral fields as arguments. Free text is not a valid ending.

use crate::consultation::evidence::EvidenceLevel;
use crate::consultation::notes::CounterReferralContent;
use crate::generation::response::GenerationResponse;
use crate::tool::entities::{ToolCall, ToolDefinition, ToolKind, ToolParameter};
use std::collections::BTreeMap;

pub const SUBMIT_COUNTER_REFERRAL: &str = "submit_counter_referral";

pub fn submit_counter_referral() -> ToolDefinition {
    ToolDefinition::new(
        SUBMIT_COUNTER_REFERRAL,
        "Submit your counter-referral note to the GP. This ends your consultation.",
        ToolKind::Control,
    )
    .with_parameter(ToolParameter::new(
        "clinical_assessment",
        "Clinical evaluation and reasoning",
        true,
    ))
    .with_parameter(ToolParameter::new(
        "recommendations",
        "Specific, actionable, evidence-based recommendations",
        true,
    ))
    .with_parameter(
        ToolParameter::new(
            "evidence_used",
            "Guidelines, studies or criteria cited (PMIDs, guideline names)",
            false,
        )
        .with_type("array"),
    )
    .with_parameter(
        ToolParameter::new(
            "diagnostic_criteria_met",
            "Map of diagnostic criterion name to true (met) or false (not met)",
            false,
        )
        .with_type("object"),
    )
    .with_parameter(
        ToolParameter::new(
            "additional_info_needed",
            "Additional tests or information that would improve the assessment",
            false,
        )
        .with_type("array"),
    )
    .with_parameter(
        ToolParameter::new("evidence_level", "Evidence level of the main recommendation", false)
            .with_allowed_values(["A", "B", "C", "D"]),
    )
}

fn criterion_value(value: &serde_json::Value) -> Option<bool> {
    match value {
        serde_json::Value::Bool(b) => Some(*b),
        serde_json::Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "met" | "yes" => Some(true),
            "false" | "not met" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Read the counter-referral fields out of a `submit_counter_referral` call
pub fn parse_submission(call: &ToolCall) -> Result<CounterReferralContent, String> {
    let clinical_assessment = call.require_string("clinical_assessment")?.trim().to_string();
    let recommendations = call.require_string("recommendations")?.trim().to_string();

    let mut diagnostic_criteria_met = BTreeMap::new();
    match call.arguments.get("diagnostic_criteria_met") {
        None | Some(serde_json::Value::Null) => {}
        Some(serde_json::Value::Object(map)) => {
            for (name, value) in map {
                let met = criterion_value(value).ok_or_else(|| {
                    format!("diagnostic_criteria_met['{}'] must be true or false", name)
                })?;
                diagnostic_criteria_met.insert(name.clone(), met);
            }
        }
        Some(_) => return Err("diagnostic_criteria_met must be an object".to_string()),
    }

    let evidence_level = match call.get_string("evidence_level") {
        Some(level) if !level.trim().is_empty() => {
            Some(level.parse::<EvidenceLevel>().map_err(|e| e.to_string())?)
        }
        _ => None,
    };

    Ok(CounterReferralContent {
        clinical_assessment,
        recommendations,
        evidence_used: call.get_string_list("evidence_used"),
        diagnostic_criteria_met,
        additional_info_needed: call.get_string_list("additional_info_needed"),
        evidence_level,
    })
}

/// How a specialist response advances the research loop
#[derive(Debug, Clone, PartialEq)]
pub enum SpecialistTurn {
    /// A terminal submission; takes priority over any research calls in the same response
    Submission {
        call: ToolCall,
        content: Result<CounterReferralContent, String>,
    },
    /// Research tool calls to route
    Research(Vec<ToolCall>),
    /// Free text without a tool call
    FreeText(String),
    /// Neither text nor tool calls
    Empty,
}

pub fn classify(response: &GenerationResponse) -> SpecialistTurn {
    let calls = response.tool_calls();
    if let Some(call) = calls
        .iter()
        .find(|c| c.tool_name.eq_ignore_ascii_case(SUBMIT_COUNTER_REFERRAL))
    {
        return SpecialistTurn::Submission {
            content: parse_submission(call),
            call: call.clone(),
        };
    }
    if !calls.is_empty() {
        return SpecialistTurn::Research(calls);
    }
    let text = response.text_content();
    if text.trim().is_empty() {
        SpecialistTurn::Empty
    } else {
        SpecialistTurn::FreeText(text)
    }
}
