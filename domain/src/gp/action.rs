//! Interpretation of GP responses into actions

use super::phase::GpPhase;
use super::tools::{CONSULT_SPECIALIST, CONSULTATION_COMPLETE, DIRECT_ANSWER, REFLECT};
use crate::consultation::notes::ConsultationRequest;
use crate::consultation::specialty::{Specialty, Urgency};
use crate::generation::response::GenerationResponse;
use crate::tool::entities::{ToolCall, ToolSpec};

const DEFAULT_EXPECTED_RESPONSE: &str =
    "Clinical assessment and evidence-based recommendations with citations";

/// A `ConsultSpecialist` call the engine could not turn into a note
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedCall {
    pub call: ToolCall,
    pub reason: String,
}

/// What the GP decided in one generation turn
#[derive(Debug, Clone, PartialEq)]
pub enum GpAction {
    /// Answer without consultations (Intake only)
    DirectAnswer { answer: String },
    /// Dispatch a batch; `calls[i]` is the call that produced `requests[i]`
    Consult {
        requests: Vec<ConsultationRequest>,
        calls: Vec<ToolCall>,
        rejected: Vec<RejectedCall>,
    },
    /// Finish integration
    Complete {
        summary: String,
        integrated_response: String,
    },
    /// Think aloud; no phase change
    Reflect { calls: Vec<ToolCall> },
    /// Nothing usable: no recognised tool call and no text
    Unusable { rejected: Vec<RejectedCall> },
}

/// Build a consultation request from a `ConsultSpecialist` call
pub fn parse_consult_request(
    call: &ToolCall,
    available: &[Specialty],
) -> Result<ConsultationRequest, String> {
    let specialty: Specialty = call
        .require_string("specialty")?
        .parse()
        .map_err(|e: crate::core::error::DomainError| e.to_string())?;
    if !available.contains(&specialty) {
        return Err(format!(
            "Specialty '{}' is not available in this run (available: {})",
            specialty,
            available
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    let clinical_question = call.require_string("clinical_question")?.trim().to_string();
    let urgency = match call.get_string("urgency") {
        Some(u) if !u.trim().is_empty() => u.parse::<Urgency>().map_err(|e| e.to_string())?,
        _ => Urgency::default(),
    };
    Ok(ConsultationRequest {
        specialty,
        patient_context: call
            .get_string("patient_context")
            .unwrap_or_default()
            .trim()
            .to_string(),
        clinical_question,
        expected_response: call
            .get_string("expected_response")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_EXPECTED_RESPONSE)
            .to_string(),
        urgency,
    })
}

fn first_text(call: &ToolCall, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| call.get_string(k))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Interpret a GP response for the given phase
///
/// Priority when several actions appear in one response:
/// `ConsultationComplete` > `DirectAnswer` > `ConsultSpecialist` > rejected
/// calls > `reflect` > free text.
/// Free text without any recognised call is a `DirectAnswer` in Intake and a
/// `Complete` in Integrating. In Intake a `ConsultationComplete` has nothing
/// to integrate and is read as a direct answer; in Integrating a
/// `DirectAnswer` is read as completion.
pub fn interpret(
    response: &GenerationResponse,
    phase: GpPhase,
    spec: &ToolSpec,
    available: &[Specialty],
) -> GpAction {
    let mut complete: Option<(String, String)> = None;
    let mut direct: Option<String> = None;
    let mut requests = Vec::new();
    let mut consult_calls = Vec::new();
    let mut reflections = Vec::new();
    let mut rejected = Vec::new();

    for call in response.tool_calls() {
        match spec.resolve(&call.tool_name) {
            Some(CONSULTATION_COMPLETE) if complete.is_none() => {
                let integrated = first_text(&call, &["integrated_response", "summary"]);
                let summary = first_text(&call, &["summary", "integrated_response"]);
                if let (Some(summary), Some(integrated)) = (summary, integrated) {
                    complete = Some((summary, integrated));
                } else {
                    rejected.push(RejectedCall {
                        call,
                        reason: "ConsultationComplete requires 'summary' and 'integrated_response'".to_string(),
                    });
                }
            }
            Some(DIRECT_ANSWER) if direct.is_none() => match first_text(&call, &["answer"]) {
                Some(answer) => direct = Some(answer),
                None => rejected.push(RejectedCall {
                    call,
                    reason: "DirectAnswer requires 'answer'".to_string(),
                }),
            },
            Some(CONSULT_SPECIALIST) => match parse_consult_request(&call, available) {
                Ok(request) => {
                    requests.push(request);
                    consult_calls.push(call);
                }
                Err(reason) => rejected.push(RejectedCall { call, reason }),
            },
            Some(REFLECT) => reflections.push(call),
            Some(_) => {}
            None => {
                let reason = format!("Unknown action '{}'", call.tool_name);
                rejected.push(RejectedCall { call, reason });
            }
        }
    }

    let text = response.text_content().trim().to_string();
    let integrating = phase == GpPhase::Integrating;

    if let Some((summary, integrated_response)) = complete {
        return if integrating {
            GpAction::Complete {
                summary,
                integrated_response,
            }
        } else {
            GpAction::DirectAnswer {
                answer: integrated_response,
            }
        };
    }
    if let Some(answer) = direct {
        return if integrating {
            GpAction::Complete {
                summary: answer.clone(),
                integrated_response: answer,
            }
        } else {
            GpAction::DirectAnswer { answer }
        };
    }
    if !requests.is_empty() {
        return GpAction::Consult {
            requests,
            calls: consult_calls,
            rejected,
        };
    }
    if !rejected.is_empty() {
        return GpAction::Unusable { rejected };
    }
    if !reflections.is_empty() {
        return GpAction::Reflect { calls: reflections };
    }
    if !text.is_empty() {
        return if integrating {
            GpAction::Complete {
                summary: text.clone(),
                integrated_response: text,
            }
        } else {
            GpAction::DirectAnswer { answer: text }
        };
    }
    GpAction::Unusable { rejected }
}
