//! Progress reporting for consultation runs
//!
//! Both reporters write to stderr so the clinical record on stdout can be
//! piped.

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use interconsult_application::ConsultationProgressNotifier;
use interconsult_domain::{
    ClinicalRecord, ConsultationId, ConsultationNote, CounterReferralNote, GpPhase,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

fn outcome_label(reply: &CounterReferralNote) -> String {
    match reply.failure() {
        Some(failure) => format!("{} {}", "x".red(), failure.kind),
        None if reply.is_degraded() => format!("{} answered (degraded)", "!".yellow()),
        None => format!("{} answered", "v".green()),
    }
}

/// Reports progress with a batch bar and one spinner per specialist
pub struct ProgressReporter {
    multi: MultiProgress,
    batch_bar: Mutex<Option<ProgressBar>>,
    specialists: Mutex<HashMap<ConsultationId, ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::stderr()),
            batch_bar: Mutex::new(None),
            specialists: Mutex::new(HashMap::new()),
        }
    }

    fn batch_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("  {spinner:.green} {prefix:.bold} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn println(&self, line: String) {
        let _ = self.multi.println(line);
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsultationProgressNotifier for ProgressReporter {
    fn on_gp_decision(&self, phase: GpPhase, decision: &str) {
        self.println(format!("{} GP ({}): {}", "->".cyan(), phase, decision.bold()));
    }

    fn on_batch_start(&self, notes: &[ConsultationNote]) {
        let bar = self.multi.add(ProgressBar::new(notes.len() as u64));
        bar.set_style(Self::batch_style());
        bar.set_prefix("Interconsultations");
        bar.set_message("dispatching...");
        bar.enable_steady_tick(Duration::from_millis(120));
        if let Ok(mut slot) = self.batch_bar.lock() {
            *slot = Some(bar);
        }
    }

    fn on_specialist_start(&self, note: &ConsultationNote) {
        let spinner = self.multi.add(ProgressBar::new_spinner());
        spinner.set_style(Self::spinner_style());
        spinner.set_prefix(format!("{} {}", note.consultation_id(), note.specialty().display_name()));
        spinner.set_message("researching");
        spinner.enable_steady_tick(Duration::from_millis(120));
        if let Ok(mut specialists) = self.specialists.lock() {
            specialists.insert(note.consultation_id().clone(), spinner);
        }
    }

    fn on_tool_call(&self, consultation_id: &ConsultationId, tool_name: &str, success: bool) {
        if let Ok(specialists) = self.specialists.lock()
            && let Some(spinner) = specialists.get(consultation_id)
        {
            let status = if success { tool_name.normal() } else { tool_name.red() };
            spinner.set_message(format!("researching ({})", status));
        }
    }

    fn on_specialist_complete(&self, note: &ConsultationNote, reply: &CounterReferralNote) {
        let spinner = self
            .specialists
            .lock()
            .ok()
            .and_then(|mut specialists| specialists.remove(note.consultation_id()));
        if let Some(spinner) = spinner {
            spinner.finish_with_message(outcome_label(reply));
        }
        if let Ok(slot) = self.batch_bar.lock()
            && let Some(bar) = slot.as_ref()
        {
            bar.inc(1);
        }
    }

    fn on_batch_complete(&self, resolved: usize) {
        if let Ok(mut slot) = self.batch_bar.lock()
            && let Some(bar) = slot.take()
        {
            bar.finish_with_message(format!("{} resolved", resolved).green().to_string());
        }
    }

    fn on_retry(&self, label: &str, attempt: u32, error: &str) {
        self.println(format!("  {} {} retry {}: {}", "!".yellow(), label, attempt, error));
    }

    fn on_record_assembled(&self, record: &ClinicalRecord) {
        let _ = self.multi.clear();
        let status = if record.is_incomplete() {
            "incomplete".yellow()
        } else {
            "complete".green()
        };
        eprintln!(
            "{} Clinical record {} ({}, {} warning(s))",
            "v".green(),
            record.case_id(),
            status,
            record.warnings().len()
        );
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl ConsultationProgressNotifier for SimpleProgress {
    fn on_gp_decision(&self, phase: GpPhase, decision: &str) {
        eprintln!("{} GP ({}): {}", "->".cyan(), phase, decision.bold());
    }

    fn on_batch_start(&self, notes: &[ConsultationNote]) {
        let specialties: Vec<_> = notes
            .iter()
            .map(|n| format!("{} {}", n.consultation_id(), n.specialty().display_name()))
            .collect();
        eprintln!(
            "{} {} ({})",
            "->".cyan(),
            "Interconsultations".bold(),
            specialties.join(", ")
        );
    }

    fn on_specialist_complete(&self, note: &ConsultationNote, reply: &CounterReferralNote) {
        eprintln!(
            "  {} {}: {}",
            note.consultation_id(),
            note.specialty().display_name(),
            outcome_label(reply)
        );
    }

    fn on_retry(&self, label: &str, attempt: u32, error: &str) {
        eprintln!("  {} {} retry {}: {}", "!".yellow(), label, attempt, error);
    }

    fn on_record_assembled(&self, _record: &ClinicalRecord) {
        eprintln!();
    }
}
