//! Specialties and urgency levels

use crate::clinical::catalog;
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Medical specialty a consultation can be addressed to
///
/// The set is fixed: each specialty maps to a knowledge-base directory and
/// declares its own research tool subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specialty {
    Cardiology,
    Pharmacology,
    Neurology,
    Emergency,
    Gynecology,
    InternalMedicine,
    Surgery,
    Nutrition,
    Prevention,
    Epidemiology,
}

impl Specialty {
    pub const ALL: [Specialty; 10] = [
        Specialty::Cardiology,
        Specialty::Pharmacology,
        Specialty::Neurology,
        Specialty::Emergency,
        Specialty::Gynecology,
        Specialty::InternalMedicine,
        Specialty::Surgery,
        Specialty::Nutrition,
        Specialty::Prevention,
        Specialty::Epidemiology,
    ];

    /// Stable identifier (also the knowledge-base directory name)
    pub fn as_str(&self) -> &'static str {
        match self {
            Specialty::Cardiology => "cardiology",
            Specialty::Pharmacology => "pharmacology",
            Specialty::Neurology => "neurology",
            Specialty::Emergency => "emergency",
            Specialty::Gynecology => "gynecology",
            Specialty::InternalMedicine => "internal_medicine",
            Specialty::Surgery => "surgery",
            Specialty::Nutrition => "nutrition",
            Specialty::Prevention => "prevention",
            Specialty::Epidemiology => "epidemiology",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Specialty::Cardiology => "Cardiology",
            Specialty::Pharmacology => "Pharmacology",
            Specialty::Neurology => "Neurology",
            Specialty::Emergency => "Emergency Medicine",
            Specialty::Gynecology => "Gynecology",
            Specialty::InternalMedicine => "Internal Medicine",
            Specialty::Surgery => "Surgery",
            Specialty::Nutrition => "Nutrition",
            Specialty::Prevention => "Prevention",
            Specialty::Epidemiology => "Epidemiology",
        }
    }

    /// One-line scope shown to the GP when it chooses whom to consult
    pub fn scope(&self) -> &'static str {
        match self {
            Specialty::Cardiology => "cardiovascular conditions, risk assessment, anticoagulation",
            Specialty::Pharmacology => "drug therapy, interactions, dosing, adverse reactions",
            Specialty::Neurology => "stroke, seizures, headache, cognitive disorders",
            Specialty::Emergency => "acute presentations, triage, emergency protocols",
            Specialty::Gynecology => "women's health, obstetrics, prenatal care",
            Specialty::InternalMedicine => "complex chronic and multisystem disease, renal function",
            Specialty::Surgery => "surgical indications, perioperative care, complications",
            Specialty::Nutrition => "dietary management, nutritional assessment",
            Specialty::Prevention => "screening, vaccination, risk reduction",
            Specialty::Epidemiology => "population health, incidence, risk in context",
        }
    }

    /// Research tools this specialty may call, base tools first
    pub fn tool_names(&self) -> Vec<&'static str> {
        let mut tools = catalog::BASE_TOOLS.to_vec();
        let extra: &[&'static str] = match self {
            Specialty::Cardiology => &[catalog::CALCULATE_CHADS2VASC, catalog::CALCULATE_FRAMINGHAM_RISK],
            Specialty::Emergency => &[catalog::CALCULATE_WELLS_DVT],
            Specialty::InternalMedicine => &[
                catalog::CALCULATE_GFR,
                catalog::CALCULATE_BMI,
                catalog::CALCULATE_FRAMINGHAM_RISK,
            ],
            Specialty::Nutrition | Specialty::Surgery | Specialty::Gynecology => &[catalog::CALCULATE_BMI],
            Specialty::Prevention => &[catalog::CALCULATE_FRAMINGHAM_RISK, catalog::CALCULATE_BMI],
            Specialty::Pharmacology | Specialty::Neurology | Specialty::Epidemiology => &[],
        };
        tools.extend_from_slice(extra);
        tools
    }

    pub fn allows_tool(&self, name: &str) -> bool {
        self.tool_names().contains(&name)
    }
}

impl std::fmt::Display for Specialty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Specialty {
    type Err = DomainError;

    /// Case-insensitive; spaces and dashes are accepted in place of underscores
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "emergency_medicine" => Ok(Specialty::Emergency),
            other => Specialty::ALL
                .into_iter()
                .find(|sp| sp.as_str() == other)
                .ok_or_else(|| DomainError::UnknownSpecialty(s.to_string())),
        }
    }
}

/// Priority of a consultation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    #[default]
    Routine,
    Urgent,
    #[serde(alias = "emergency")]
    Emergent,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Routine => "routine",
            Urgency::Urgent => "urgent",
            Urgency::Emergent => "emergent",
        }
    }

    pub const VALUES: [&'static str; 4] = ["routine", "urgent", "emergent", "emergency"];
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Urgency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "routine" => Ok(Urgency::Routine),
            "urgent" => Ok(Urgency::Urgent),
            "emergent" | "emergency" => Ok(Urgency::Emergent),
            _ => Err(DomainError::InvalidUrgency(s.to_string())),
        }
    }
}
