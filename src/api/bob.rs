use crate::api::{page_params_query, ApiClient, BobToken, BobTokensResponse};
use crate::error::Result;
use crate::fetch::{CursorPage, CursorSource};

pub const DEFAULT_BASE_URL: &str = "https://explorer.gobob.xyz";

/// Blockscout token list, paged by `next_page_params`.
#[derive(Debug, Clone)]
pub struct BobTokens {
    api: ApiClient,
}

impl BobTokens {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            api: ApiClient::new(base_url)?,
        })
    }
}

impl CursorSource for BobTokens {
    type Record = BobToken;
    type Cursor = Vec<(String, String)>;

    async fn fetch_page(
        &self,
        cursor: Option<Vec<(String, String)>>,
    ) -> Result<CursorPage<BobToken, Vec<(String, String)>>> {
        let query = cursor.unwrap_or_default();
        let response: BobTokensResponse = self.api.get_json("/api/v2/tokens", &query).await?;
        let next = response
            .next_page_params
            .as_ref()
            .map(page_params_query)
            .filter(|params| !params.is_empty());
        Ok(CursorPage {
            records: response.items,
            next,
        })
    }
}
