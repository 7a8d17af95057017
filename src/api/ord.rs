use crate::api::{ApiClient, RuneEntry, RunesResponse, NO_QUERY};
use crate::error::Result;
use crate::fetch::{CursorPage, CursorSource};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// ord server rune index, `GET /runes/{page}` starting at page 0.
#[derive(Debug, Clone)]
pub struct Runes {
    api: ApiClient,
}

impl Runes {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            api: ApiClient::new(base_url)?,
        })
    }
}

impl CursorSource for Runes {
    type Record = RuneEntry;
    type Cursor = u64;

    async fn fetch_page(&self, cursor: Option<u64>) -> Result<CursorPage<RuneEntry, u64>> {
        let page = cursor.unwrap_or(0);
        let response: RunesResponse = self
            .api
            .get_json(&format!("/runes/{page}"), NO_QUERY)
            .await?;
        Ok(CursorPage {
            records: response
                .entries
                .into_iter()
                .map(|(id, details)| RuneEntry { id, details })
                .collect(),
            next: response.more.then_some(page + 1),
        })
    }
}
