//! Specialty knowledge bases

mod in_memory;

pub use in_memory::{InMemoryKnowledgeBase, KnowledgeLoadError};
