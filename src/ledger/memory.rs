use async_trait::async_trait;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tokio::sync::Mutex;

use super::{Ledger, LedgerError, Tally, align_counts};
use crate::catalog::{BUSINESS_NAME_POLL, PollCatalog, TAGLINES_POLL};
use crate::models::{PairCount, Submission, TaglineChoice};

#[derive(Default)]
struct LedgerState {
    submissions: HashMap<String, Submission>,
    option_counts: HashMap<(&'static str, usize), u64>,
    pair_counts: HashMap<String, u64>,
}

/// In-process ledger. Everything lives behind one lock, so the duplicate
/// check and the insert can never interleave with another request.
#[derive(Default)]
pub struct MemoryLedger {
    state: Mutex<LedgerState>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn has_submitted(&self, device_id: &str) -> Result<bool, LedgerError> {
        Ok(self.state.lock().await.submissions.contains_key(device_id))
    }

    async fn record(&self, submission: &Submission, pair_label: &str) -> Result<(), LedgerError> {
        let mut state = self.state.lock().await;

        match state.submissions.entry(submission.device_id.clone()) {
            Entry::Occupied(_) => return Err(LedgerError::DuplicateDevice),
            Entry::Vacant(slot) => {
                slot.insert(submission.clone());
            }
        }

        *state
            .option_counts
            .entry((BUSINESS_NAME_POLL, submission.business_name_index))
            .or_insert(0) += 1;
        if let TaglineChoice::Predefined(index) = submission.tagline {
            *state.option_counts.entry((TAGLINES_POLL, index)).or_insert(0) += 1;
        }
        *state.pair_counts.entry(pair_label.to_string()).or_insert(0) += 1;

        Ok(())
    }

    async fn tallies(&self, catalog: &PollCatalog) -> Result<Tally, LedgerError> {
        let state = self.state.lock().await;

        let counts_for = |poll_id: &str| -> HashMap<usize, u64> {
            state
                .option_counts
                .iter()
                .filter(|((id, _), _)| *id == poll_id)
                .map(|((_, index), count)| (*index, *count))
                .collect()
        };

        Ok(Tally {
            business_name: align_counts(&catalog.business_name, &counts_for(BUSINESS_NAME_POLL)),
            taglines: align_counts(&catalog.taglines, &counts_for(TAGLINES_POLL)),
            pairs: state
                .pair_counts
                .iter()
                .map(|(label, count)| PairCount {
                    label: label.clone(),
                    count: *count,
                })
                .collect(),
            total_submissions: state.submissions.len() as u64,
        })
    }
}
