//! Diagnostic criteria lookup
//!
//! A small static table of commonly requested criteria sets. Lookup is
//! case-insensitive and tolerant to a few spelling variants; unknown
//! conditions return the list of what is available so the model can re-ask.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticCriteria {
    pub condition: &'static str,
    pub source: &'static str,
    pub criteria: &'static str,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Diagnostic criteria for '{condition}' not found. Available conditions: {}", .available.join(", "))]
pub struct CriteriaNotFound {
    pub condition: String,
    pub available: Vec<&'static str>,
}

const DIABETES: DiagnosticCriteria = DiagnosticCriteria {
    condition: "diabetes",
    source: "American Diabetes Association, Standards of Care 2023",
    criteria: "\
Diabetes mellitus: any one of the following, confirmed by repeat testing unless
unequivocal hyperglycemia with metabolic decompensation:
1. Fasting plasma glucose >= 126 mg/dL (7.0 mmol/L) after at least 8 hours without caloric intake
2. 2-hour plasma glucose >= 200 mg/dL (11.1 mmol/L) during a 75 g OGTT
3. HbA1c >= 6.5% (48 mmol/mol) with a standardized assay
4. Random plasma glucose >= 200 mg/dL (11.1 mmol/L) with classic symptoms
   (polyuria, polydipsia, unexplained weight loss)

Prediabetes: fasting glucose 100-125 mg/dL, 2-hour glucose 140-199 mg/dL, or HbA1c 5.7-6.4%.",
};

const HEART_FAILURE: DiagnosticCriteria = DiagnosticCriteria {
    condition: "heart failure",
    source: "Framingham criteria; ESC Heart Failure Guidelines",
    criteria: "\
Framingham: 2 major, or 1 major + 2 minor criteria.
Major: paroxysmal nocturnal dyspnea, neck vein distention, rales, radiographic
cardiomegaly, acute pulmonary edema, S3 gallop, central venous pressure > 16 cm H2O,
hepatojugular reflux, weight loss > 4.5 kg in 5 days in response to treatment.
Minor: bilateral ankle edema, nocturnal cough, dyspnea on exertion, hepatomegaly,
pleural effusion, tachycardia > 120 bpm.

ESC: symptoms + signs + objective evidence of cardiac dysfunction.
Natriuretic peptides: BNP > 35 pg/mL or NT-proBNP > 125 pg/mL supports the diagnosis.",
};

const SEPSIS: DiagnosticCriteria = DiagnosticCriteria {
    condition: "sepsis",
    source: "Third International Consensus Definitions (Sepsis-3), 2016",
    criteria: "\
Sepsis: suspected or documented infection AND acute increase in SOFA score >= 2 points.
qSOFA bedside screen (>= 2 suggests sepsis): respiratory rate >= 22/min,
altered mentation (GCS < 15), systolic BP <= 100 mmHg.
Septic shock: sepsis requiring vasopressors to keep MAP >= 65 mmHg AND lactate > 2 mmol/L
despite adequate fluid resuscitation.",
};

static TABLE: [&DiagnosticCriteria; 3] = [&DIABETES, &HEART_FAILURE, &SEPSIS];

fn canonical(condition: &str) -> String {
    let normalized = condition.trim().to_lowercase().replace(['_', '-'], " ");
    match normalized.as_str() {
        "diabetes mellitus" | "type 2 diabetes" | "dm" => "diabetes".to_string(),
        "hf" | "chf" | "congestive heart failure" => "heart failure".to_string(),
        "sepsis 3" | "septic shock" => "sepsis".to_string(),
        _ => normalized,
    }
}

/// All conditions with criteria on file
pub fn available_conditions() -> Vec<&'static str> {
    TABLE.iter().map(|c| c.condition).collect()
}

pub fn lookup(condition: &str) -> Result<&'static DiagnosticCriteria, CriteriaNotFound> {
    let key = canonical(condition);
    TABLE
        .iter()
        .copied()
        .find(|c| c.condition == key)
        .ok_or_else(|| CriteriaNotFound {
            condition: condition.to_string(),
            available: available_conditions(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(lookup("Diabetes").unwrap().condition, "diabetes");
        assert_eq!(lookup("  HEART FAILURE ").unwrap().condition, "heart failure");
        assert_eq!(lookup("heart_failure").unwrap().condition, "heart failure");
    }

    #[test]
    fn test_lookup_aliases() {
        assert_eq!(lookup("Sepsis-3").unwrap().condition, "sepsis");
        assert_eq!(lookup("CHF").unwrap().condition, "heart failure");
    }

    #[test]
    fn test_not_found_lists_available() {
        let err = lookup("lupus").unwrap_err();
        assert_eq!(err.available, vec!["diabetes", "heart failure", "sepsis"]);
        assert!(err.to_string().contains("Available conditions: diabetes, heart failure, sepsis"));
    }
}
