//! Presentation layer for interconsult
//!
//! This crate contains the CLI definition, clinical record formatters and
//! progress reporters.

pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use cli::commands::{Cli, OutputFormat};
pub use output::formatter::OutputFormatter;
pub use output::markdown::MarkdownFormatter;
pub use progress::reporter::{ProgressReporter, SimpleProgress};
