//! Output format value object

use serde::{Deserialize, Serialize};

/// How a clinical record is rendered for the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Full markdown clinical record (default)
    #[default]
    Markdown,
    /// Only the integrated response
    Answer,
    /// Machine-readable JSON record
    Json,
}
