use crate::catalog::PollCatalog;
use crate::error::AppError;
use crate::ledger::{Ledger, Tally};
use crate::models::{AdminResults, PairCount, PollTally};

/// Returns aggregated results if `key` matches the configured admin secret.
pub async fn admin_results(
    catalog: &PollCatalog,
    ledger: &dyn Ledger,
    admin_key: &str,
    key: Option<&str>,
) -> Result<AdminResults, AppError> {
    let authorized = key.is_some_and(|key| keys_match(key.as_bytes(), admin_key.as_bytes()));
    if !authorized {
        return Err(AppError::Unauthorized);
    }

    let tally = ledger.tallies(catalog).await?;
    Ok(summarize(catalog, tally))
}

/// Compares without short-circuiting on the first differing byte.
fn keys_match(given: &[u8], expected: &[u8]) -> bool {
    if given.len() != expected.len() {
        return false;
    }

    let mut diff: u8 = 0;
    for (a, b) in given.iter().zip(expected.iter()) {
        diff |= a ^ b;
    }
    diff == 0
}

pub fn summarize(catalog: &PollCatalog, tally: Tally) -> AdminResults {
    AdminResults {
        business_name: PollTally {
            poll: catalog.business_name.clone(),
            counts: tally.business_name,
        },
        taglines: PollTally {
            poll: catalog.taglines.clone(),
            counts: tally.taglines,
        },
        pair_summary: rank_pairs(tally.pairs),
        total_submissions: tally.total_submissions,
    }
}

/// Most popular first; equal counts fall back to label order.
pub fn rank_pairs(mut pairs: Vec<PairCount>) -> Vec<PairCount> {
    pairs.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    pairs
}
