use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire value of `taglineIndex` meaning "the voter typed their own tagline".
pub const CUSTOM_TAGLINE_INDEX: i64 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    pub id: String,
    pub title: String,
    pub description: String,
    pub options: Vec<String>,
}

impl Poll {
    pub fn new(id: &str, title: &str, description: &str, options: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            options: options.iter().map(|option| option.to_string()).collect(),
        }
    }

    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaglineChoice {
    Predefined(usize),
    Custom(String),
}

impl TaglineChoice {
    /// Index as stored and sent over the wire, -1 for custom taglines.
    pub fn index(&self) -> i64 {
        match self {
            TaglineChoice::Predefined(index) => *index as i64,
            TaglineChoice::Custom(_) => CUSTOM_TAGLINE_INDEX,
        }
    }

    pub fn custom_text(&self) -> Option<&str> {
        match self {
            TaglineChoice::Predefined(_) => None,
            TaglineChoice::Custom(text) => Some(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub device_id: String,
    pub business_name_index: usize,
    pub tagline: TaglineChoice,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/submit`. Fields are kept loosely typed so that a
/// missing or mistyped value surfaces as a validation error, not a decode one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub device_id: Option<Value>,
    pub business_name_index: Option<Value>,
    pub tagline_index: Option<Value>,
    pub custom_tagline: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairCount {
    pub label: String,
    pub count: u64,
}

/// A poll definition together with its counts, aligned by option index.
#[derive(Debug, Clone, Serialize)]
pub struct PollTally {
    #[serde(flatten)]
    pub poll: Poll,
    pub counts: Vec<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminResults {
    pub business_name: PollTally,
    pub taglines: PollTally,
    pub pair_summary: Vec<PairCount>,
    pub total_submissions: u64,
}
