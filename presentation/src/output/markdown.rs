//! Markdown rendering of a clinical record

use crate::output::formatter::OutputFormatter;
use interconsult_domain::{ClinicalRecord, ConsultationPair, CounterReferralNote};
use std::fmt::Write;

/// Renders the clinical record as a markdown document
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    fn section(out: &mut String, title: &str, body: &str) {
        let _ = write!(out, "\n## {}\n\n{}\n", title, body.trim());
    }

    fn list(out: &mut String, title: &str, items: &[String]) {
        if items.is_empty() {
            return;
        }
        let _ = writeln!(out, "\n**{}**\n", title);
        for item in items {
            let _ = writeln!(out, "- {}", item);
        }
    }

    fn counter_referral(out: &mut String, reply: &CounterReferralNote) {
        if let Some(failure) = reply.failure() {
            let _ = writeln!(
                out,
                "\n> **No answer** ({}): {}",
                failure.kind, failure.message
            );
            return;
        }

        let _ = write!(
            out,
            "\n**Clinical assessment**\n\n{}\n\n**Recommendations**\n\n{}\n",
            reply.clinical_assessment().trim(),
            reply.recommendations().trim()
        );

        let criteria = reply.diagnostic_criteria_met();
        if !criteria.is_empty() {
            let _ = writeln!(out, "\n**Diagnostic criteria**\n");
            for (name, met) in criteria {
                let _ = writeln!(out, "- [{}] {}", if *met { "x" } else { " " }, name);
            }
        }

        Self::list(out, "Additional information needed", reply.additional_info_needed());

        let references_title = match reply.evidence_level() {
            Some(level) => format!("References (evidence level {}: {})", level, level.description()),
            None => "References".to_string(),
        };
        if reply.evidence_used().is_empty() {
            let _ = writeln!(out, "\n**{}**\n\n_None cited._", references_title);
        } else {
            Self::list(out, &references_title, reply.evidence_used());
        }

        if !reply.flags().is_empty() {
            let flags: Vec<_> = reply.flags().iter().map(|f| f.as_str()).collect();
            let _ = writeln!(out, "\n_Flags: {}_", flags.join(", "));
        }
    }

    fn pair(out: &mut String, pair: &ConsultationPair) {
        let note = pair.consultation();
        let _ = write!(
            out,
            "\n### {} · {} ({})\n\n**Patient context:** {}\n\n**Question:** {}\n",
            note.consultation_id(),
            note.specialty().display_name(),
            note.urgency(),
            note.patient_context().trim(),
            note.clinical_question().trim()
        );
        if !note.expected_response().trim().is_empty() {
            let _ = writeln!(out, "\n**Expected response:** {}", note.expected_response().trim());
        }
        let _ = writeln!(out, "\n#### Counter-referral");
        Self::counter_referral(out, pair.counter_referral());
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format(&self, record: &ClinicalRecord) -> String {
        let mut out = format!("# Clinical Record {}\n\n", record.case_id());
        let _ = write!(out, "_Created {}_", record.created_at().format("%Y-%m-%d %H:%M UTC"));
        if record.is_incomplete() {
            out.push_str(" · **Incomplete**");
        }
        out.push('\n');

        Self::section(&mut out, "Clinical Question", record.original_question());
        Self::section(&mut out, "GP Summary", record.gp_summary());

        out.push_str("\n## Interconsultations\n");
        if record.is_direct_answer() {
            out.push_str("\n_Answered directly by the GP; no specialists were consulted._\n");
        }
        for pair in record.consultations() {
            Self::pair(&mut out, pair);
        }

        Self::section(&mut out, "Integrated Response", record.integrated_response());

        if !record.gp_trace().is_empty() {
            out.push_str("\n## GP Reasoning\n\n");
            for (i, step) in record.gp_trace().iter().enumerate() {
                let _ = writeln!(out, "{}. {}", i + 1, step);
            }
        }

        if !record.warnings().is_empty() {
            out.push_str("\n## Warnings\n\n");
            for warning in record.warnings() {
                let _ = writeln!(out, "- {}", warning);
            }
        }

        if !record.is_direct_answer() {
            let _ = writeln!(
                out,
                "\n_Citations {}._",
                if record.citations_satisfied() { "satisfied" } else { "incomplete" }
            );
        }
        out
    }
}
