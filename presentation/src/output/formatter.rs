//! Output formatter trait

use interconsult_domain::{ClinicalRecord, OutputFormat};

/// Trait for formatting clinical records
pub trait OutputFormatter {
    /// Format the complete clinical record
    fn format(&self, record: &ClinicalRecord) -> String;

    /// Format as JSON
    fn format_json(&self, record: &ClinicalRecord) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(record)
    }

    /// Format the integrated response only (concise output)
    fn format_answer(&self, record: &ClinicalRecord) -> String {
        record.integrated_response().trim().to_string()
    }

    fn render(&self, record: &ClinicalRecord, format: OutputFormat) -> Result<String, serde_json::Error> {
        match format {
            OutputFormat::Markdown => Ok(self.format(record)),
            OutputFormat::Json => self.format_json(record),
            OutputFormat::Answer => Ok(self.format_answer(record)),
        }
    }
}
