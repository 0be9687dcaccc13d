//! Knowledge base and literature settings from TOML (`[knowledge]`, `[literature]`)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Specialty knowledge base.
///
/// Passages are read from `<dir>/<specialty>/*.md` and `*.txt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileKnowledgeConfig {
    pub dir: Option<PathBuf>,
    /// Passages returned per query unless the specialist asks otherwise
    pub top_k: usize,
}

impl Default for FileKnowledgeConfig {
    fn default() -> Self {
        Self { dir: None, top_k: 3 }
    }
}

/// PubMed E-utilities literature search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLiteratureConfig {
    pub enabled: bool,
    pub base_url: String,
    /// Contact email sent with every request, as NCBI asks
    pub email: Option<String>,
    /// Environment variable holding an NCBI API key (raises the rate limit)
    pub api_key_env: String,
    pub years_back: u32,
    pub max_results: usize,
    /// Attempts per search when NCBI answers 429
    pub rate_limit_retries: u32,
}

impl Default for FileLiteratureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".to_string(),
            email: None,
            api_key_env: "NCBI_API_KEY".to_string(),
            years_back: 5,
            max_results: 5,
            rate_limit_retries: 3,
        }
    }
}

/// Diagnostic logs and the JSONL run transcript (`[logging]`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Directory for rolling diagnostic log files
    pub dir: Option<PathBuf>,
    /// Directory for per-run JSONL transcripts
    pub transcript_dir: Option<PathBuf>,
}
