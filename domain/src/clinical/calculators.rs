//! Clinical calculators
//!
//! Pure, synchronous scoring functions. Each returns a serializable result or
//! a [`CalculatorError`] for out-of-range input; no I/O, no retries.

use super::catalog;
use crate::tool::entities::ToolCall;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalculatorError {
    #[error("Unknown calculator: {0}")]
    UnknownCalculator(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl std::str::FromStr for Sex {
    type Err = CalculatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Sex::Male),
            "female" | "f" => Ok(Sex::Female),
            other => Err(CalculatorError::InvalidInput(format!(
                "sex must be 'male' or 'female', got '{}'",
                other
            ))),
        }
    }
}

fn check_range(name: &str, value: f64, min: f64, max: f64) -> Result<f64, CalculatorError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(CalculatorError::InvalidInput(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, value
        )))
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GfrResult {
    pub egfr: f64,
    pub stage: &'static str,
    pub stage_number: u8,
    pub units: &'static str,
}

/// Race-free CKD-EPI 2021 eGFR
pub fn egfr_ckd_epi_2021(creatinine_mg_dl: f64, age: u32, sex: Sex) -> Result<GfrResult, CalculatorError> {
    let creatinine = check_range("creatinine_mg_dl", creatinine_mg_dl, 0.1, 25.0)?;
    check_range("age", f64::from(age), 18.0, 120.0)?;

    let (kappa, alpha, sex_factor) = match sex {
        Sex::Female => (0.7, -0.241, 1.012),
        Sex::Male => (0.9, -0.302, 1.0),
    };
    let ratio = creatinine / kappa;
    let egfr = 142.0
        * ratio.min(1.0).powf(alpha)
        * ratio.max(1.0).powf(-1.200)
        * 0.9938_f64.powi(age as i32)
        * sex_factor;

    let (stage, stage_number) = match egfr {
        e if e >= 90.0 => ("G1 - Normal or high", 1),
        e if e >= 60.0 => ("G2 - Mildly decreased", 2),
        e if e >= 45.0 => ("G3a - Mild to moderate decrease", 3),
        e if e >= 30.0 => ("G3b - Moderate to severe decrease", 3),
        e if e >= 15.0 => ("G4 - Severely decreased", 4),
        _ => ("G5 - Kidney failure", 5),
    };

    Ok(GfrResult {
        egfr: round1(egfr),
        stage,
        stage_number,
        units: "mL/min/1.73m²",
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BmiResult {
    pub bmi: f64,
    pub classification: &'static str,
}

pub fn bmi(weight_kg: f64, height_cm: f64) -> Result<BmiResult, CalculatorError> {
    let weight = check_range("weight_kg", weight_kg, 1.0, 500.0)?;
    let height_m = check_range("height_cm", height_cm, 30.0, 272.0)? / 100.0;
    let bmi = weight / (height_m * height_m);

    let classification = match bmi {
        b if b < 18.5 => "Underweight",
        b if b < 25.0 => "Normal weight",
        b if b < 30.0 => "Overweight",
        b if b < 35.0 => "Obesity Class I",
        b if b < 40.0 => "Obesity Class II",
        _ => "Obesity Class III",
    };

    Ok(BmiResult {
        bmi: round1(bmi),
        classification,
    })
}

/// Risk factors scored by CHA₂DS₂-VASc besides age and sex
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrokeRiskFactors {
    pub chf: bool,
    pub hypertension: bool,
    pub stroke_tia: bool,
    pub vascular_disease: bool,
    pub diabetes: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chads2VascResult {
    pub score: u8,
    pub risk: &'static str,
    pub recommendation: &'static str,
}

pub fn chads2vasc(age: u32, sex: Sex, factors: StrokeRiskFactors) -> Result<Chads2VascResult, CalculatorError> {
    check_range("age", f64::from(age), 0.0, 120.0)?;

    let mut score = 0u8;
    score += u8::from(factors.chf);
    score += u8::from(factors.hypertension);
    score += match age {
        a if a >= 75 => 2,
        a if a >= 65 => 1,
        _ => 0,
    };
    score += u8::from(factors.diabetes);
    score += 2 * u8::from(factors.stroke_tia);
    score += u8::from(factors.vascular_disease);
    score += u8::from(sex == Sex::Female);

    let (risk, recommendation) = match (score, sex) {
        (0, _) => ("Very low", "No antithrombotic therapy or consider aspirin"),
        (1, Sex::Male) => ("Low", "Consider oral anticoagulation or no therapy"),
        (1, Sex::Female) => ("Low", "Consider oral anticoagulation or aspirin"),
        _ => (
            "Moderate to High",
            "Oral anticoagulation recommended (DOACs preferred over warfarin)",
        ),
    };

    Ok(Chads2VascResult {
        score,
        risk,
        recommendation,
    })
}

/// Inputs of the simplified Framingham score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FraminghamInput {
    pub age: u32,
    pub sex: Sex,
    pub total_cholesterol: f64,
    pub hdl_cholesterol: f64,
    pub systolic_bp: u32,
    pub on_bp_meds: bool,
    pub smoker: bool,
    pub diabetes: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FraminghamResult {
    pub points: i32,
    pub risk_percent: u8,
    pub category: &'static str,
    pub recommendation: &'static str,
}

/// Simplified ATP III points table converted to a coarse 10-year risk band
pub fn framingham_risk(input: FraminghamInput) -> Result<FraminghamResult, CalculatorError> {
    check_range("age", f64::from(input.age), 20.0, 100.0)?;
    let total = check_range("total_cholesterol", input.total_cholesterol, 50.0, 600.0)?;
    let hdl = check_range("hdl_cholesterol", input.hdl_cholesterol, 5.0, 200.0)?;
    check_range("systolic_bp", f64::from(input.systolic_bp), 60.0, 300.0)?;

    let age = input.age;
    let mut points: i32 = match input.sex {
        Sex::Male => match age {
            a if a < 35 => -1,
            a if a < 40 => 0,
            a if a < 45 => 1,
            a if a < 50 => 2,
            a if a < 55 => 3,
            a if a < 60 => 4,
            a if a < 65 => 5,
            a if a < 70 => 6,
            _ => 7,
        },
        Sex::Female => match age {
            a if a < 35 => -9,
            a if a < 40 => -4,
            a if a < 45 => 0,
            a if a < 50 => 3,
            a if a < 55 => 6,
            a if a < 60 => 7,
            _ => 8,
        },
    };

    points += match total {
        t if t < 160.0 => 0,
        t if t < 200.0 => 1,
        t if t < 240.0 => 2,
        t if t < 280.0 => 3,
        _ => 4,
    };

    if hdl >= 60.0 {
        points -= 1;
    } else if hdl < 40.0 {
        points += 1;
    }

    let treated = i32::from(input.on_bp_meds);
    points += match input.systolic_bp {
        s if s < 120 => 0,
        s if s < 130 => treated,
        s if s < 140 => 1 + treated,
        s if s < 160 => 2 + treated,
        _ => 3 + treated,
    };

    if input.smoker {
        points += 2;
    }
    if input.diabetes {
        points += match input.sex {
            Sex::Male => 2,
            Sex::Female => 4,
        };
    }

    let risk_percent = match points {
        p if p < 0 => 1,
        p if p < 5 => 2,
        p if p < 10 => 6,
        p if p < 15 => 12,
        p if p < 20 => 20,
        _ => 30,
    };

    let (category, recommendation) = match risk_percent {
        r if r < 10 => (
            "Low risk",
            "Lifestyle modifications, consider statin if LDL >190 mg/dL",
        ),
        r if r < 20 => (
            "Moderate risk",
            "Lifestyle modifications + statin therapy recommended",
        ),
        _ => (
            "High risk",
            "Intensive lifestyle modifications + statin therapy + aspirin",
        ),
    };

    Ok(FraminghamResult {
        points,
        risk_percent,
        category,
        recommendation,
    })
}

/// Clinical findings scored by the Wells DVT rule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WellsDvtFindings {
    pub active_cancer: bool,
    pub paralysis_paresis: bool,
    pub recently_bedridden: bool,
    pub localized_tenderness: bool,
    pub entire_leg_swollen: bool,
    pub calf_swelling: bool,
    pub pitting_edema: bool,
    pub collateral_veins: bool,
    pub alternative_diagnosis: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WellsDvtResult {
    pub score: i32,
    pub probability: &'static str,
    pub dvt_risk: &'static str,
    pub recommendation: &'static str,
}

pub fn wells_dvt(findings: WellsDvtFindings) -> WellsDvtResult {
    let positives = [
        findings.active_cancer,
        findings.paralysis_paresis,
        findings.recently_bedridden,
        findings.localized_tenderness,
        findings.entire_leg_swollen,
        findings.calf_swelling,
        findings.pitting_edema,
        findings.collateral_veins,
    ];
    let mut score = positives.iter().filter(|f| **f).count() as i32;
    if findings.alternative_diagnosis {
        score -= 2;
    }

    let (probability, dvt_risk, recommendation) = match score {
        s if s <= 0 => (
            "Low",
            "~5%",
            "D-dimer; if negative, DVT excluded. If positive, ultrasound.",
        ),
        s if s <= 2 => (
            "Moderate",
            "~17%",
            "D-dimer + ultrasound. Consider ultrasound first.",
        ),
        _ => ("High", "~53%", "Ultrasound imaging recommended (skip D-dimer)."),
    };

    WellsDvtResult {
        score,
        probability,
        dvt_risk,
        recommendation,
    }
}

fn require_f64(call: &ToolCall, key: &str) -> Result<f64, CalculatorError> {
    call.get_f64(key)
        .ok_or_else(|| CalculatorError::InvalidInput(format!("'{}' must be a number", key)))
}

fn require_age(call: &ToolCall) -> Result<u32, CalculatorError> {
    call.get_i64("age")
        .and_then(|a| u32::try_from(a).ok())
        .ok_or_else(|| CalculatorError::InvalidInput("'age' must be a non-negative integer".to_string()))
}

fn require_sex(call: &ToolCall) -> Result<Sex, CalculatorError> {
    call.get_string("sex")
        .ok_or_else(|| CalculatorError::InvalidInput("'sex' is required".to_string()))?
        .parse()
}

fn flag(call: &ToolCall, key: &str) -> bool {
    call.get_bool(key).unwrap_or(false)
}

/// Run the calculator `name` with arguments taken from `call`, returning its
/// result as JSON
pub fn calculate(name: &str, call: &ToolCall) -> Result<serde_json::Value, CalculatorError> {
    let value = match name {
        catalog::CALCULATE_GFR => serde_json::to_value(egfr_ckd_epi_2021(
            require_f64(call, "creatinine_mg_dl")?,
            require_age(call)?,
            require_sex(call)?,
        )?),
        catalog::CALCULATE_BMI => serde_json::to_value(bmi(
            require_f64(call, "weight_kg")?,
            require_f64(call, "height_cm")?,
        )?),
        catalog::CALCULATE_CHADS2VASC => serde_json::to_value(chads2vasc(
            require_age(call)?,
            require_sex(call)?,
            StrokeRiskFactors {
                chf: flag(call, "chf"),
                hypertension: flag(call, "hypertension"),
                stroke_tia: flag(call, "stroke_tia"),
                vascular_disease: flag(call, "vascular_disease"),
                diabetes: flag(call, "diabetes"),
            },
        )?),
        catalog::CALCULATE_FRAMINGHAM_RISK => {
            let systolic = require_f64(call, "systolic_bp")?;
            serde_json::to_value(framingham_risk(FraminghamInput {
                age: require_age(call)?,
                sex: require_sex(call)?,
                total_cholesterol: require_f64(call, "total_cholesterol")?,
                hdl_cholesterol: require_f64(call, "hdl_cholesterol")?,
                systolic_bp: check_range("systolic_bp", systolic, 60.0, 300.0)?.round() as u32,
                on_bp_meds: flag(call, "on_bp_meds"),
                smoker: flag(call, "smoker"),
                diabetes: flag(call, "diabetes"),
            })?)
        }
        catalog::CALCULATE_WELLS_DVT => serde_json::to_value(wells_dvt(WellsDvtFindings {
            active_cancer: flag(call, "active_cancer"),
            paralysis_paresis: flag(call, "paralysis_paresis"),
            recently_bedridden: flag(call, "recently_bedridden"),
            localized_tenderness: flag(call, "localized_tenderness"),
            entire_leg_swollen: flag(call, "entire_leg_swollen"),
            calf_swelling: flag(call, "calf_swelling"),
            pitting_edema: flag(call, "pitting_edema"),
            collateral_veins: flag(call, "collateral_veins"),
            alternative_diagnosis: flag(call, "alternative_diagnosis"),
        })),
        other => return Err(CalculatorError::UnknownCalculator(other.to_string())),
    };
    value.map_err(|e| CalculatorError::InvalidInput(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_egfr_reference_value() {
        let result = egfr_ckd_epi_2021(1.2, 65, Sex::Male).unwrap();
        assert!((66.0..68.5).contains(&result.egfr), "egfr = {}", result.egfr);
        assert_eq!(result.stage_number, 2);
        assert!(result.stage.starts_with("G2"));
    }

    #[test]
    fn test_egfr_kidney_failure() {
        let result = egfr_ckd_epi_2021(8.0, 70, Sex::Female).unwrap();
        assert_eq!(result.stage_number, 5);
    }

    #[test]
    fn test_egfr_rejects_impossible_creatinine() {
        assert!(matches!(
            egfr_ckd_epi_2021(0.0, 50, Sex::Male),
            Err(CalculatorError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_bmi_classes() {
        let normal = bmi(70.0, 170.0).unwrap();
        assert_eq!(normal.bmi, 24.2);
        assert_eq!(normal.classification, "Normal weight");
        assert_eq!(bmi(110.0, 170.0).unwrap().classification, "Obesity Class II");
        assert!(bmi(70.0, 0.0).is_err());
    }

    #[test]
    fn test_chads2vasc_elderly_hypertensive_woman() {
        let result = chads2vasc(
            78,
            Sex::Female,
            StrokeRiskFactors {
                hypertension: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(result.score, 4);
        assert_eq!(result.risk, "Moderate to High");
    }

    #[test]
    fn test_chads2vasc_low_risk_by_sex() {
        let male = chads2vasc(66, Sex::Male, StrokeRiskFactors::default()).unwrap();
        assert_eq!(male.score, 1);
        assert_eq!(male.recommendation, "Consider oral anticoagulation or no therapy");
        let female = chads2vasc(40, Sex::Female, StrokeRiskFactors::default()).unwrap();
        assert_eq!(female.score, 1);
        assert_eq!(female.recommendation, "Consider oral anticoagulation or aspirin");
    }

    #[test]
    fn test_framingham_smoking_man() {
        let result = framingham_risk(FraminghamInput {
            age: 55,
            sex: Sex::Male,
            total_cholesterol: 200.0,
            hdl_cholesterol: 45.0,
            systolic_bp: 130,
            on_bp_meds: false,
            smoker: true,
            diabetes: false,
        })
        .unwrap();
        assert_eq!(result.points, 9);
        assert_eq!(result.risk_percent, 6);
        assert_eq!(result.category, "Low risk");
    }

    #[test]
    fn test_wells_moderate() {
        let result = wells_dvt(WellsDvtFindings {
            localized_tenderness: true,
            calf_swelling: true,
            ..Default::default()
        });
        assert_eq!(result.score, 2);
        assert_eq!(result.probability, "Moderate");
    }

    #[test]
    fn test_wells_alternative_diagnosis_lowers_score() {
        let result = wells_dvt(WellsDvtFindings {
            calf_swelling: true,
            alternative_diagnosis: true,
            ..Default::default()
        });
        assert_eq!(result.score, -1);
        assert_eq!(result.probability, "Low");
    }

    #[test]
    fn test_calculate_dispatch_from_tool_call() {
        let call = ToolCall::new("calculate_chads2vasc")
            .with_arg("age", 78)
            .with_arg("sex", "female")
            .with_arg("hypertension", true);
        let value = calculate(catalog::CALCULATE_CHADS2VASC, &call).unwrap();
        assert_eq!(value["score"], 4);
    }

    #[test]
    fn test_calculate_reports_missing_number() {
        let call = ToolCall::new("calculate_bmi").with_arg("weight_kg", "heavy");
        let err = calculate(catalog::CALCULATE_BMI, &call).unwrap_err();
        assert_eq!(err, CalculatorError::InvalidInput("'weight_kg' must be a number".to_string()));
    }

    #[test]
    fn test_calculate_unknown() {
        let err = calculate("calculate_apgar", &ToolCall::new("calculate_apgar")).unwrap_err();
        assert!(matches!(err, CalculatorError::UnknownCalculator(_)));
    }
}
