//! Append-only ledger of consultation pairs

use super::notes::{ConsultationNote, CounterReferralNote, SpecialistFailure, SpecialistOutcome};
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// A consultation note together with the counter-referral that answered it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsultationPair {
    consultation: ConsultationNote,
    counter_referral: CounterReferralNote,
}

impl ConsultationPair {
    /// Pair a note with its answer; the answer must carry the note's identifier
    pub fn new(
        consultation: ConsultationNote,
        counter_referral: CounterReferralNote,
    ) -> Result<Self, DomainError> {
        if consultation.consultation_id() != counter_referral.consultation_id() {
            return Err(DomainError::ConsultationMismatch {
                expected: consultation.consultation_id().to_string(),
                actual: counter_referral.consultation_id().to_string(),
            });
        }
        Ok(Self {
            consultation,
            counter_referral,
        })
    }

    /// Pair a note with a runner outcome; failures become placeholder answers
    pub fn from_outcome(
        consultation: ConsultationNote,
        outcome: SpecialistOutcome,
    ) -> Result<Self, DomainError> {
        let counter_referral = match outcome {
            SpecialistOutcome::Completed(note) => note,
            SpecialistOutcome::Failed(failure) => {
                CounterReferralNote::failure_placeholder(&consultation, failure)
            }
        };
        Self::new(consultation, counter_referral)
    }

    /// Pair a note with a failure placeholder; always consistent
    pub fn failed(consultation: ConsultationNote, failure: SpecialistFailure) -> Self {
        let counter_referral = CounterReferralNote::failure_placeholder(&consultation, failure);
        Self {
            consultation,
            counter_referral,
        }
    }

    pub fn consultation(&self) -> &ConsultationNote {
        &self.consultation
    }

    pub fn counter_referral(&self) -> &CounterReferralNote {
        &self.counter_referral
    }
}

/// Ordered record of every consultation of a run
///
/// Insertion order is GP dispatch order. Batches are appended whole, after
/// the dispatcher has put each batch back into request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsultationLedger {
    pairs: Vec<ConsultationPair>,
}

impl ConsultationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, pair: ConsultationPair) {
        self.pairs.push(pair);
    }

    pub fn pairs(&self) -> &[ConsultationPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ConsultationPair> {
        self.pairs.iter().filter(|p| p.counter_referral.is_failure())
    }

    pub fn into_pairs(self) -> Vec<ConsultationPair> {
        self.pairs
    }
}
