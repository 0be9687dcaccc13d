//! Literature search adapters

pub mod eutils;
#[cfg(feature = "pubmed")]
mod pubmed;

#[cfg(feature = "pubmed")]
pub use pubmed::PubMedClient;
