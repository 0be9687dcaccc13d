//! Clinical knowledge that needs no external capability: the research tool
//! catalog, pure calculators, and a static diagnostic criteria table.

pub mod calculators;
pub mod catalog;
pub mod criteria;

pub use calculators::{CalculatorError, Sex};
pub use criteria::{CriteriaNotFound, DiagnosticCriteria};
