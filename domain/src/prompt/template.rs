//! Prompt templates for the GP and specialist agents

use crate::consultation::ledger::ConsultationPair;
use crate::consultation::notes::ConsultationNote;
use crate::consultation::specialty::Specialty;

/// Templates for generating prompts at each stage of a consultation run
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt for the GP
    pub fn gp_system(available: &[Specialty], max_specialists: usize) -> String {
        let roster = available
            .iter()
            .map(|s| format!("- {} ({}): {}", s.display_name(), s.as_str(), s.scope()))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            r#"You are an experienced general practitioner coordinating a clinical interconsultation.
The requesting user is a practicing physician.

Decide for each question whether you can answer it directly with evidence-based guidance,
or whether one or more specialists must be consulted.

Available specialists:
{roster}

Rules:
- Use DirectAnswer when no specialist input is needed.
- Use ConsultSpecialist once per specialist, with the patient context, a focused clinical
  question, what you expect back, and the urgency. At most {max_specialists} consultations per turn.
- Use reflect to think through the case before deciding.
- After the specialists answer, either request the missing specialty with ConsultSpecialist
  or finish with ConsultationComplete (summary + integrated response with citations).
- Acknowledge uncertainty and say which information is missing."#
        )
    }

    /// Opening user message for the GP
    pub fn gp_intake(question: &str) -> String {
        format!(
            "Clinical question from the requesting physician:\n\n{}\n\nDecide how to proceed.",
            question
        )
    }

    /// Render one counter-referral for the GP's integration turn
    pub fn counter_referral_summary(pair: &ConsultationPair) -> String {
        let note = pair.consultation();
        let reply = pair.counter_referral();
        let mut out = format!(
            "Counter-referral {} from {}:\n",
            note.consultation_id(),
            note.specialty().display_name()
        );
        if let Some(failure) = reply.failure() {
            out.push_str(&format!(
                "No answer: consultation failed ({}). Proceed without it or re-consult.\n",
                failure
            ));
            return out;
        }
        out.push_str(&format!("Assessment: {}\n", reply.clinical_assessment()));
        out.push_str(&format!("Recommendations: {}\n", reply.recommendations()));
        if let Some(level) = reply.evidence_level() {
            out.push_str(&format!("Evidence level: {}\n", level));
        }
        if !reply.diagnostic_criteria_met().is_empty() {
            out.push_str("Diagnostic criteria:\n");
            for (criterion, met) in reply.diagnostic_criteria_met() {
                out.push_str(&format!("- [{}] {}\n", if *met { "met" } else { "not met" }, criterion));
            }
        }
        if !reply.additional_info_needed().is_empty() {
            out.push_str(&format!(
                "Additional information needed: {}\n",
                reply.additional_info_needed().join("; ")
            ));
        }
        if reply.evidence_used().is_empty() {
            out.push_str("Evidence used: none cited\n");
        } else {
            out.push_str(&format!("Evidence used: {}\n", reply.evidence_used().join("; ")));
        }
        if !reply.flags().is_empty() {
            let flags: Vec<_> = reply.flags().iter().map(|f| f.as_str()).collect();
            out.push_str(&format!("Quality flags: {}\n", flags.join(", ")));
        }
        out
    }

    /// Instruction appended after a batch of counter-referrals has been delivered
    pub fn gp_integrate(remaining_iterations: usize) -> String {
        format!(
            "All consultations of this round have resolved. Integrate the counter-referrals. \
Call ConsultationComplete with your summary and the integrated response, or ConsultSpecialist \
if a missing specialty is essential ({} decision round(s) left).",
            remaining_iterations
        )
    }

    /// Instruction for the closing integration turn once the GP's decision budget is spent
    pub fn gp_conclude_now() -> &'static str {
        "No decision rounds are left and no further specialists can be consulted. \
Call ConsultationComplete now, integrating the counter-referrals you have received."
    }

    /// Feedback when the GP asked for more consultations than allowed in one turn
    pub fn capacity_exceeded(requested: usize, allowed: usize) -> String {
        format!(
            "Capacity exceeded: {} consultations requested but at most {} are allowed per turn. \
Only the first {} were dispatched; this request was not.",
            requested, allowed, allowed
        )
    }

    /// System prompt for a specialist
    pub fn specialist_system(specialty: Specialty, require_citations: bool) -> String {
        let citations = if require_citations {
            "Citations are mandatory: evidence_used must list at least one guideline, study (PMID) or criteria set."
        } else {
            "Cite guidelines, studies or criteria in evidence_used whenever possible."
        };
        format!(
            r#"You are a board-certified {name} specialist answering a consultation note from a general practitioner.
Your scope: {scope}.

Work in steps: search the knowledge base, search the literature, apply calculators and
diagnostic criteria where they help. Tool results are observations; a failed tool is not fatal,
adapt and continue.

Finish by calling submit_counter_referral with:
- clinical_assessment: systematic evaluation of the case
- recommendations: specific, actionable recommendations
- evidence_used: the sources you relied on
- diagnostic_criteria_met: criteria evaluated, true if met
- additional_info_needed: tests or data that would change your assessment
- evidence_level: A (RCTs, meta-analyses), B (cohort, case-control), C (case series, expert opinion), D (very limited)

{citations}
Stay within your specialty and say so when a question falls outside it.

{focus}"#,
            name = specialty.display_name().to_lowercase(),
            scope = specialty.scope(),
            citations = citations,
            focus = Self::specialty_focus(specialty),
        )
    }

    /// Specialty-specific guidance appended to the specialist system prompt
    pub fn specialty_focus(specialty: Specialty) -> &'static str {
        match specialty {
            Specialty::Cardiology => {
                "Focus: ACC/AHA and ESC guidelines. Use calculate_chads2vasc for atrial fibrillation stroke risk \
and calculate_framingham_risk for primary prevention."
            }
            Specialty::Pharmacology => {
                "Focus: interactions (mechanism, severity), dose adjustment for renal/hepatic function and age, \
monitoring requirements, alternatives."
            }
            Specialty::Neurology => {
                "Focus: AHA/ASA stroke guidelines, seizure classification, time-critical windows."
            }
            Specialty::Emergency => {
                "Focus: triage, red flags, time-critical interventions. Use calculate_wells_dvt for suspected DVT."
            }
            Specialty::Gynecology => {
                "Focus: ACOG guidance, pregnancy safety of drugs and procedures."
            }
            Specialty::InternalMedicine => {
                "Focus: multimorbidity. Use calculate_gfr for renal function and calculate_bmi, calculate_framingham_risk as needed."
            }
            Specialty::Surgery => {
                "Focus: surgical indication, perioperative risk, timing."
            }
            Specialty::Nutrition => {
                "Focus: nutritional assessment, dietary intervention. Use calculate_bmi."
            }
            Specialty::Prevention => {
                "Focus: USPSTF screening, vaccination, risk reduction. Use calculate_framingham_risk and calculate_bmi."
            }
            Specialty::Epidemiology => {
                "Focus: incidence, prevalence, absolute versus relative risk, quality of evidence."
            }
        }
    }

    /// Opening user message for a specialist: the consultation note itself
    pub fn consultation_note(note: &ConsultationNote) -> String {
        format!(
            r#"Consultation note {id} ({urgency})

Patient context:
{context}

Clinical question:
{question}

Expected response:
{expected}"#,
            id = note.consultation_id(),
            urgency = note.urgency(),
            context = if note.patient_context().is_empty() {
                "(not provided)"
            } else {
                note.patient_context()
            },
            question = note.clinical_question(),
            expected = note.expected_response(),
        )
    }

    /// Instruction issued once the research budget is spent
    pub fn conclude_now() -> &'static str {
        "Your research budget is exhausted. Do not call any more research tools. \
Call submit_counter_referral now with your best assessment based on what you have gathered."
    }

    /// Observation for research calls dropped because a submission came in the same turn
    pub fn ignored_with_submission() -> &'static str {
        "Not executed: submit_counter_referral in the same response ends the consultation."
    }
}
