pub mod tally;

use chrono::Utc;
use log::info;
use serde_json::Value;

use crate::catalog::PollCatalog;
use crate::error::AppError;
use crate::ledger::Ledger;
use crate::models::{CUSTOM_TAGLINE_INDEX, Submission, SubmitRequest, TaglineChoice};

pub const MIN_DEVICE_ID_CHARS: usize = 6;
pub const MAX_DEVICE_ID_CHARS: usize = 128;
pub const MAX_CUSTOM_TAGLINE_CHARS: usize = 120;

/// Validates a vote and records it. Checks run in a fixed order: device,
/// existing vote, selections, custom text.
pub async fn submit_vote(
    catalog: &PollCatalog,
    ledger: &dyn Ledger,
    request: SubmitRequest,
) -> Result<Submission, AppError> {
    let device_id = validate_device(request.device_id.as_ref())?;

    if ledger.has_submitted(&device_id).await? {
        return Err(AppError::DuplicateVote);
    }

    let submission = build_submission(catalog, device_id, &request)?;
    let label = pair_label(catalog, &submission)?;

    // A racing request for the same device may have landed since the check
    // above; the ledger reports that as a duplicate.
    ledger.record(&submission, &label).await?;
    info!(
        "Recorded vote for device {} ({})",
        submission.device_id, label
    );

    Ok(submission)
}

pub fn validate_device(device_id: Option<&Value>) -> Result<String, AppError> {
    let device_id = device_id.and_then(Value::as_str).ok_or(AppError::InvalidDevice)?;
    let chars = device_id.chars().count();
    if !(MIN_DEVICE_ID_CHARS..=MAX_DEVICE_ID_CHARS).contains(&chars) {
        return Err(AppError::InvalidDevice);
    }
    Ok(device_id.to_string())
}

fn build_submission(
    catalog: &PollCatalog,
    device_id: String,
    request: &SubmitRequest,
) -> Result<Submission, AppError> {
    let business_name_index = request
        .business_name_index
        .as_ref()
        .and_then(whole_number)
        .and_then(|index| usize::try_from(index).ok())
        .filter(|index| *index < catalog.business_name.options.len())
        .ok_or(AppError::InvalidSelection("business name"))?;

    let tagline_index = request
        .tagline_index
        .as_ref()
        .and_then(whole_number)
        .filter(|index| {
            *index >= CUSTOM_TAGLINE_INDEX && *index < catalog.taglines.options.len() as i64
        })
        .ok_or(AppError::InvalidSelection("tagline"))?;

    let tagline = if tagline_index == CUSTOM_TAGLINE_INDEX {
        let text = request
            .custom_tagline
            .as_ref()
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default();
        if text.is_empty() {
            return Err(AppError::MissingCustomText);
        }
        if text.chars().count() > MAX_CUSTOM_TAGLINE_CHARS {
            return Err(AppError::CustomTextTooLong);
        }
        TaglineChoice::Custom(text.to_string())
    } else {
        TaglineChoice::Predefined(tagline_index as usize)
    };

    Ok(Submission {
        device_id,
        business_name_index,
        tagline,
        created_at: Utc::now(),
    })
}

/// Integral JSON numbers, including floats such as `1.0`.
fn whole_number(value: &Value) -> Option<i64> {
    if let Some(number) = value.as_i64() {
        return Some(number);
    }
    value
        .as_f64()
        .filter(|number| number.fract() == 0.0 && number.abs() <= i32::MAX as f64)
        .map(|number| number as i64)
}

/// Label used for pair counts, e.g. `Local CHAAT + Feels like Desi` or
/// `CHAAT MASTI + Custom: spicy and sweet`.
pub fn pair_label(catalog: &PollCatalog, submission: &Submission) -> Result<String, AppError> {
    let name = catalog
        .business_name
        .option(submission.business_name_index)
        .ok_or(AppError::InvalidSelection("business name"))?;

    let tagline = match &submission.tagline {
        TaglineChoice::Predefined(index) => catalog
            .taglines
            .option(*index)
            .ok_or(AppError::InvalidSelection("tagline"))?
            .to_string(),
        TaglineChoice::Custom(text) => format!("Custom: {}", text),
    };

    Ok(format!("{} + {}", name, tagline))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;
    use serde_json::json;

    fn request(device: &str, business: i64, tagline: i64, custom: Option<&str>) -> SubmitRequest {
        SubmitRequest {
            device_id: Some(json!(device)),
            business_name_index: Some(json!(business)),
            tagline_index: Some(json!(tagline)),
            custom_tagline: custom.map(|text| json!(text)),
        }
    }

    fn build(request: &SubmitRequest) -> Result<Submission, AppError> {
        build_submission(&PollCatalog::standard(), "abc123".into(), request)
    }

    #[test]
    fn device_id_bounds() {
        let too_long = json!("x".repeat(MAX_DEVICE_ID_CHARS + 1));
        assert!(matches!(validate_device(None), Err(AppError::InvalidDevice)));
        assert!(matches!(validate_device(Some(&json!("abc12"))), Err(AppError::InvalidDevice)));
        assert!(matches!(validate_device(Some(&json!(123456))), Err(AppError::InvalidDevice)));
        assert!(matches!(validate_device(Some(&too_long)), Err(AppError::InvalidDevice)));
        assert_eq!(validate_device(Some(&json!("abc123"))).unwrap(), "abc123");
    }

    #[test]
    fn selection_ranges() {
        let out_of_range = build(&request("abc123", 5, 0, None));
        assert!(matches!(out_of_range, Err(AppError::InvalidSelection("business name"))));

        let negative = build(&request("abc123", -1, 0, None));
        assert!(matches!(negative, Err(AppError::InvalidSelection("business name"))));

        let bad_tagline = build(&request("abc123", 0, 6, None));
        assert!(matches!(bad_tagline, Err(AppError::InvalidSelection("tagline"))));

        let below_custom = build(&request("abc123", 0, -2, None));
        assert!(matches!(below_custom, Err(AppError::InvalidSelection("tagline"))));

        let mut fractional = request("abc123", 0, 0, None);
        fractional.business_name_index = Some(json!(1.5));
        assert!(matches!(build(&fractional), Err(AppError::InvalidSelection("business name"))));
    }

    #[test]
    fn whole_number_floats_are_indexes() {
        let mut floats = request("abc123", 0, 0, None);
        floats.business_name_index = Some(json!(1.0));
        floats.tagline_index = Some(json!(-1.0));
        floats.custom_tagline = Some(json!("Chatpata"));

        let submission = build(&floats).unwrap();
        assert_eq!(submission.business_name_index, 1);
        assert_eq!(submission.tagline, TaglineChoice::Custom("Chatpata".to_string()));

        assert_eq!(whole_number(&json!(2.0)), Some(2));
        assert_eq!(whole_number(&json!(2.5)), None);
        assert_eq!(whole_number(&json!(1e300)), None);
        assert_eq!(whole_number(&json!("2")), None);
    }

    #[test]
    fn custom_tagline_rules() {
        let missing = build(&request("abc123", 0, -1, None));
        assert!(matches!(missing, Err(AppError::MissingCustomText)));

        let blank = build(&request("abc123", 0, -1, Some("   ")));
        assert!(matches!(blank, Err(AppError::MissingCustomText)));

        let long = "a".repeat(MAX_CUSTOM_TAGLINE_CHARS + 1);
        let too_long = build(&request("abc123", 0, -1, Some(&long)));
        assert!(matches!(too_long, Err(AppError::CustomTextTooLong)));

        let ok = build(&request("abc123", 1, -1, Some("  Tangy  "))).unwrap();
        assert_eq!(ok.tagline, TaglineChoice::Custom("Tangy".to_string()));

        let ignored = build(&request("abc123", 1, 3, Some("unused"))).unwrap();
        assert_eq!(ignored.tagline, TaglineChoice::Predefined(3));
    }

    #[test]
    fn non_string_custom_tagline_counts_as_missing() {
        let mut numeric = request("abc123", 0, -1, None);
        numeric.custom_tagline = Some(json!(42));
        assert!(matches!(build(&numeric), Err(AppError::MissingCustomText)));
    }

    #[test]
    fn pair_labels() {
        let catalog = PollCatalog::standard();

        let predefined = build(&request("abc123", 0, 2, None)).unwrap();
        assert_eq!(pair_label(&catalog, &predefined).unwrap(), "Local CHAAT + Feels like Desi");

        let custom = build(&request("abc123", 2, -1, Some("Chatpata"))).unwrap();
        assert_eq!(pair_label(&catalog, &custom).unwrap(), "CHAAT MASTI + Custom: Chatpata");
    }

    #[tokio::test]
    async fn duplicate_is_reported_before_selection_errors() {
        let catalog = PollCatalog::standard();
        let ledger = MemoryLedger::new();

        submit_vote(&catalog, &ledger, request("abc123", 0, 2, None)).await.unwrap();

        let again = submit_vote(&catalog, &ledger, request("abc123", 9, 9, None)).await;
        assert!(matches!(again, Err(AppError::DuplicateVote)));
    }

    #[tokio::test]
    async fn failed_validation_records_nothing() {
        let catalog = PollCatalog::standard();
        let ledger = MemoryLedger::new();

        let err = submit_vote(&catalog, &ledger, request("abc123", 0, -1, None)).await;
        assert!(matches!(err, Err(AppError::MissingCustomText)));

        let tally = ledger.tallies(&catalog).await.unwrap();
        assert_eq!(tally.total_submissions, 0);
        assert!(tally.pairs.is_empty());
        assert!(!ledger.has_submitted("abc123").await.unwrap());
    }
}
