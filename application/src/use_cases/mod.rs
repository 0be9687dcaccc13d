//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod assemble_record;
pub mod dispatcher;
pub mod gp_controller;
pub mod research_loop;
pub mod run_consultation;
pub mod run_state;
pub(crate) mod shared;
pub mod specialist_runner;
pub mod tool_router;
