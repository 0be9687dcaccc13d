//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the clinical record
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Full clinical record as markdown
    Markdown,
    /// Clinical record as JSON
    Json,
    /// Only the integrated response
    Answer,
}

impl From<OutputFormat> for interconsult_domain::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Markdown => Self::Markdown,
            OutputFormat::Json => Self::Json,
            OutputFormat::Answer => Self::Answer,
        }
    }
}

/// CLI arguments for interconsult
#[derive(Parser, Debug)]
#[command(name = "interconsult")]
#[command(author, version, about = "Clinical interconsultation: a GP consults specialists and integrates their answers")]
#[command(long_about = r#"
interconsult runs a coordinating general practitioner (GP) agent over a
clinical question. The GP either answers directly or writes consultation
notes to specialists, who research in parallel (knowledge base, PubMed,
clinical calculators, diagnostic criteria) and answer with
counter-referral notes. The GP integrates the answers into a clinical record.

Configuration files are loaded from (in priority order):
1. INTERCONSULT_* environment variables
2. --config <path>     Explicit config file
3. ./interconsult.toml Project-level config
4. ~/.config/interconsult/config.toml   Global config

Example:
  interconsult "78-year-old woman with AF, hypertension and diabetes. Anticoagulate?"
  interconsult --specialty cardiology --specialty pharmacology "Apixaban dose with eGFR 28?"
  interconsult --output json "Wells score 3 with unilateral calf swelling: next step?"
"#)]
pub struct Cli {
    /// The clinical question (required unless --show-config)
    pub question: Option<String>,

    /// Restrict the specialties available to the GP (can be specified multiple times)
    #[arg(short, long, value_name = "SPECIALTY")]
    pub specialty: Vec<String>,

    /// Maximum specialists consulted per GP turn
    #[arg(long, value_name = "N")]
    pub max_specialists: Option<usize>,

    /// Do not require citations in counter-referral notes
    #[arg(long)]
    pub no_citations: bool,

    /// Output format (defaults to the configured format, else markdown)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}
