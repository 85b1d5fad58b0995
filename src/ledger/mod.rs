//! Storage seam for submissions and their derived counts.
//!
//! Implementations must make `record` atomic: the submission row and every
//! counter it touches are written together or not at all, and a second
//! submission for the same device is rejected by the store itself.

mod memory;

pub use memory::MemoryLedger;

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

use crate::catalog::PollCatalog;
use crate::models::{PairCount, Poll, Submission};

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("device already has a submission")]
    DuplicateDevice,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt ledger data: {0}")]
    Corrupt(String),
}

/// Raw counts as held by a ledger. Pair order is unspecified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    pub business_name: Vec<u64>,
    pub taglines: Vec<u64>,
    pub pairs: Vec<PairCount>,
    pub total_submissions: u64,
}

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Advisory check; `record` remains the authority on duplicates.
    async fn has_submitted(&self, device_id: &str) -> Result<bool, LedgerError>;

    async fn record(&self, submission: &Submission, pair_label: &str) -> Result<(), LedgerError>;

    async fn tallies(&self, catalog: &PollCatalog) -> Result<Tally, LedgerError>;
}

/// Lays sparse per-option counts out densely in option order. Counts for
/// indexes the poll no longer has are dropped.
pub(crate) fn align_counts(poll: &Poll, counts: &HashMap<usize, u64>) -> Vec<u64> {
    (0..poll.options.len())
        .map(|index| counts.get(&index).copied().unwrap_or(0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_counts_fills_gaps_with_zero() {
        let poll = Poll::new("p", "t", "d", &["a", "b", "c"]);
        let counts = HashMap::from([(2, 4), (7, 1)]);
        assert_eq!(align_counts(&poll, &counts), vec![0, 0, 4]);
    }
}
