use crate::models::Poll;
use lazy_static::lazy_static;

pub const BUSINESS_NAME_POLL: &str = "businessName";
pub const TAGLINES_POLL: &str = "taglines";

lazy_static! {
    pub static ref CATALOG: PollCatalog = PollCatalog::standard();
}

/// The two polls offered at the event. Fixed for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct PollCatalog {
    pub business_name: Poll,
    pub taglines: Poll,
}

impl PollCatalog {
    pub fn standard() -> Self {
        Self {
            business_name: Poll::new(
                BUSINESS_NAME_POLL,
                "Select a name for our business",
                "Vote for the best business name",
                &["Local CHAAT", "The Local CHAAT HOUSE", "CHAAT MASTI"],
            ),
            taglines: Poll::new(
                TAGLINES_POLL,
                "Select a tagline",
                "Vote for the best tagline",
                &[
                    "PANIPURI and More",
                    "Paniprui and Beyond",
                    "Feels like Desi",
                    "with local flavors",
                    "pakka original",
                    "crave for more",
                ],
            ),
        }
    }

    pub fn get(&self, poll_id: &str) -> Option<&Poll> {
        match poll_id {
            BUSINESS_NAME_POLL => Some(&self.business_name),
            TAGLINES_POLL => Some(&self.taglines),
            _ => None,
        }
    }

    pub fn polls(&self) -> [&Poll; 2] {
        [&self.business_name, &self.taglines]
    }
}
