//! Evidence grading for specialist recommendations

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Evidence level of a recommendation, `A` strongest and `D` weakest
///
/// Ordering follows strength: `A < B < C < D`, so a level "meets" a minimum
/// when it is less than or equal to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EvidenceLevel {
    A,
    B,
    C,
    D,
}

impl EvidenceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceLevel::A => "A",
            EvidenceLevel::B => "B",
            EvidenceLevel::C => "C",
            EvidenceLevel::D => "D",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            EvidenceLevel::A => "high quality (RCTs, meta-analyses, strong guidelines)",
            EvidenceLevel::B => "moderate quality (cohort, case-control, weaker RCTs)",
            EvidenceLevel::C => "low quality (case series, expert opinion)",
            EvidenceLevel::D => "very low quality or conflicting evidence",
        }
    }

    /// Whether this level is at least as strong as `minimum`
    pub fn meets(&self, minimum: EvidenceLevel) -> bool {
        *self <= minimum
    }
}

impl std::fmt::Display for EvidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EvidenceLevel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let letter = trimmed
            .strip_prefix("Level ")
            .or_else(|| trimmed.strip_prefix("level "))
            .unwrap_or(trimmed);
        match letter.to_ascii_uppercase().as_str() {
            "A" => Ok(EvidenceLevel::A),
            "B" => Ok(EvidenceLevel::B),
            "C" => Ok(EvidenceLevel::C),
            "D" => Ok(EvidenceLevel::D),
            _ => Err(DomainError::InvalidEvidenceLevel(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meets_minimum() {
        assert!(EvidenceLevel::A.meets(EvidenceLevel::C));
        assert!(EvidenceLevel::C.meets(EvidenceLevel::C));
        assert!(!EvidenceLevel::D.meets(EvidenceLevel::C));
        assert!(!EvidenceLevel::B.meets(EvidenceLevel::A));
    }

    #[test]
    fn test_parse() {
        assert_eq!("a".parse::<EvidenceLevel>().unwrap(), EvidenceLevel::A);
        assert_eq!("Level B".parse::<EvidenceLevel>().unwrap(), EvidenceLevel::B);
        assert!("E".parse::<EvidenceLevel>().is_err());
    }
}
