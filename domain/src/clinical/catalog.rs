//! Research tool catalog: names and schemas of every specialist tool

use crate::tool::entities::{ToolDefinition, ToolKind, ToolParameter, ToolSpec};

pub const RAG_QUERY: &str = "rag_query";
pub const LITERATURE_SEARCH: &str = "literature_search";
pub const LOOKUP_DIAGNOSTIC_CRITERIA: &str = "lookup_diagnostic_criteria";
pub const CALCULATE_GFR: &str = "calculate_gfr";
pub const CALCULATE_BMI: &str = "calculate_bmi";
pub const CALCULATE_CHADS2VASC: &str = "calculate_chads2vasc";
pub const CALCULATE_FRAMINGHAM_RISK: &str = "calculate_framingham_risk";
pub const CALCULATE_WELLS_DVT: &str = "calculate_wells_dvt";

/// Tools every specialty gets
pub const BASE_TOOLS: [&str; 3] = [RAG_QUERY, LITERATURE_SEARCH, LOOKUP_DIAGNOSTIC_CRITERIA];

pub const CALCULATORS: [&str; 5] = [
    CALCULATE_GFR,
    CALCULATE_BMI,
    CALCULATE_CHADS2VASC,
    CALCULATE_FRAMINGHAM_RISK,
    CALCULATE_WELLS_DVT,
];

const SEX: [&str; 2] = ["male", "female"];

fn flag(name: &str, description: &str) -> ToolParameter {
    ToolParameter::new(name, description, false).with_type("boolean")
}

fn sex_param() -> ToolParameter {
    ToolParameter::new("sex", "Patient sex", true).with_allowed_values(SEX)
}

pub fn rag_query() -> ToolDefinition {
    ToolDefinition::new(
        RAG_QUERY,
        "Search the specialty knowledge base (clinical guidelines, protocols) for passages relevant to a query",
        ToolKind::Research,
    )
    .with_parameter(ToolParameter::new("query", "Clinical question or search terms", true))
    .with_parameter(ToolParameter::new(
        "specialty",
        "Knowledge base to search; defaults to your own specialty",
        false,
    ))
    .with_parameter(
        ToolParameter::new("top_k", "Number of passages to return (default 3)", false)
            .with_type("integer"),
    )
}

pub fn literature_search() -> ToolDefinition {
    ToolDefinition::new(
        LITERATURE_SEARCH,
        "Search PubMed for recent trials, meta-analyses, systematic reviews and reviews",
        ToolKind::Research,
    )
    .with_parameter(ToolParameter::new("query", "Medical search terms", true))
    .with_parameter(
        ToolParameter::new("max_results", "Maximum number of articles (default 5)", false)
            .with_type("integer"),
    )
    .with_parameter(
        ToolParameter::new("years_back", "Only articles published within this many years", false)
            .with_type("integer"),
    )
}

pub fn lookup_diagnostic_criteria() -> ToolDefinition {
    ToolDefinition::new(
        LOOKUP_DIAGNOSTIC_CRITERIA,
        "Retrieve standard diagnostic criteria for a condition (e.g. diabetes, heart failure, sepsis)",
        ToolKind::Research,
    )
    .with_parameter(ToolParameter::new("condition", "Condition name", true))
}

pub fn calculate_gfr() -> ToolDefinition {
    ToolDefinition::new(
        CALCULATE_GFR,
        "Estimate GFR with the race-free CKD-EPI 2021 equation and report the CKD stage",
        ToolKind::Research,
    )
    .with_parameter(
        ToolParameter::new("creatinine_mg_dl", "Serum creatinine in mg/dL", true).with_type("number"),
    )
    .with_parameter(ToolParameter::new("age", "Age in years", true).with_type("integer"))
    .with_parameter(sex_param())
    .with_parameter(ToolParameter::new(
        "race",
        "Accepted for compatibility; the 2021 equation ignores it",
        false,
    ))
}

pub fn calculate_bmi() -> ToolDefinition {
    ToolDefinition::new(
        CALCULATE_BMI,
        "Calculate Body Mass Index and its WHO class",
        ToolKind::Research,
    )
    .with_parameter(ToolParameter::new("weight_kg", "Weight in kilograms", true).with_type("number"))
    .with_parameter(ToolParameter::new("height_cm", "Height in centimeters", true).with_type("number"))
}

pub fn calculate_chads2vasc() -> ToolDefinition {
    ToolDefinition::new(
        CALCULATE_CHADS2VASC,
        "CHA2DS2-VASc stroke risk score for atrial fibrillation with anticoagulation recommendation",
        ToolKind::Research,
    )
    .with_parameter(ToolParameter::new("age", "Age in years", true).with_type("integer"))
    .with_parameter(sex_param())
    .with_parameter(flag("chf", "Congestive heart failure"))
    .with_parameter(flag("hypertension", "History of hypertension"))
    .with_parameter(flag("stroke_tia", "Prior stroke, TIA or thromboembolism"))
    .with_parameter(flag("vascular_disease", "Prior MI, peripheral artery disease or aortic plaque"))
    .with_parameter(flag("diabetes", "Diabetes mellitus"))
}

pub fn calculate_framingham_risk() -> ToolDefinition {
    ToolDefinition::new(
        CALCULATE_FRAMINGHAM_RISK,
        "Simplified Framingham (ATP III points) 10-year cardiovascular risk",
        ToolKind::Research,
    )
    .with_parameter(ToolParameter::new("age", "Age in years", true).with_type("integer"))
    .with_parameter(sex_param())
    .with_parameter(
        ToolParameter::new("total_cholesterol", "Total cholesterol in mg/dL", true).with_type("number"),
    )
    .with_parameter(
        ToolParameter::new("hdl_cholesterol", "HDL cholesterol in mg/dL", true).with_type("number"),
    )
    .with_parameter(
        ToolParameter::new("systolic_bp", "Systolic blood pressure in mmHg", true).with_type("integer"),
    )
    .with_parameter(flag("on_bp_meds", "Currently treated for hypertension"))
    .with_parameter(flag("smoker", "Current smoker"))
    .with_parameter(flag("diabetes", "Diabetes mellitus"))
}

pub fn calculate_wells_dvt() -> ToolDefinition {
    ToolDefinition::new(
        CALCULATE_WELLS_DVT,
        "Wells score for pre-test probability of deep vein thrombosis",
        ToolKind::Research,
    )
    .with_parameter(flag("active_cancer", "Active cancer (treatment within 6 months or palliative)"))
    .with_parameter(flag("paralysis_paresis", "Paralysis, paresis or recent plaster immobilization"))
    .with_parameter(flag("recently_bedridden", "Bedridden >3 days or major surgery within 12 weeks"))
    .with_parameter(flag("localized_tenderness", "Tenderness along the deep venous system"))
    .with_parameter(flag("entire_leg_swollen", "Entire leg swollen"))
    .with_parameter(flag("calf_swelling", "Calf swelling >3 cm versus the other leg"))
    .with_parameter(flag("pitting_edema", "Pitting edema confined to the symptomatic leg"))
    .with_parameter(flag("collateral_veins", "Collateral superficial veins (non-varicose)"))
    .with_parameter(flag("alternative_diagnosis", "Alternative diagnosis at least as likely"))
}

/// Definition for a research tool by canonical name
pub fn definition(name: &str) -> Option<ToolDefinition> {
    match name {
        RAG_QUERY => Some(rag_query()),
        LITERATURE_SEARCH => Some(literature_search()),
        LOOKUP_DIAGNOSTIC_CRITERIA => Some(lookup_diagnostic_criteria()),
        CALCULATE_GFR => Some(calculate_gfr()),
        CALCULATE_BMI => Some(calculate_bmi()),
        CALCULATE_CHADS2VASC => Some(calculate_chads2vasc()),
        CALCULATE_FRAMINGHAM_RISK => Some(calculate_framingham_risk()),
        CALCULATE_WELLS_DVT => Some(calculate_wells_dvt()),
        _ => None,
    }
}

/// Common misnamings models produce for research tools
pub const ALIASES: [(&str, &str); 4] = [
    ("pubmed_search", LITERATURE_SEARCH),
    ("rag_query_specialty_knowledge", RAG_QUERY),
    ("calculate_wells_score_dvt", CALCULATE_WELLS_DVT),
    ("calculate_cha2ds2_vasc", CALCULATE_CHADS2VASC),
];

/// Spec containing the named tools (unknown names are skipped) plus aliases
pub fn spec_for<'a>(names: impl IntoIterator<Item = &'a str>) -> ToolSpec {
    let mut spec = names
        .into_iter()
        .filter_map(definition)
        .fold(ToolSpec::new(), ToolSpec::register);
    for (alias, canonical) in ALIASES {
        spec = spec.register_alias(alias, canonical);
    }
    spec
}
