//! Core domain concepts shared across all subdomains.
//!
//! - [`model::Model`]: generation model used by the GP or a specialist
//! - [`question::Question`]: a validated clinical question
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod model;
pub mod question;
pub mod string;
