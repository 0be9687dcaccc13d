//! Research domain: the bounded think/act/observe loop each specialist runs.

pub mod state;
pub mod terminal;

pub use state::{Correction, ResearchLoopState};
pub use terminal::{SUBMIT_COUNTER_REFERRAL, SpecialistTurn, classify, parse_submission};
