use std::collections::BTreeMap;

use crate::api::{
    AccountBalances, ApiClient, ContractDetails, ContractSourceResponse, Holder, NameDetails,
    NameRecord, OffsetResponse, ReadOnlyCall, ReadOnlyResponse, TokenResult, Transaction,
    NO_QUERY,
};
use crate::error::{Error, Result};
use crate::fetch::{OffsetSource, Page};

pub const DEFAULT_BASE_URL: &str = "https://api.hiro.so";

/// Any valid principal works as the caller of a read-only function.
const READ_ONLY_SENDER: &str = "SP3D49HARD6Y36MKPT3PKP2YHG0ZNQMK0YP70RZHS";

/// Split `{address}.{name}`, rejecting asset suffixes (`::token`).
pub fn split_contract_id(id: &str) -> Result<(&str, &str)> {
    let parts: Vec<&str> = id.split('.').collect();
    let [address, name] = parts[..] else {
        return Err(Error::validation(format!("invalid contract ID format: {id}")));
    };
    if address.is_empty() || name.is_empty() {
        return Err(Error::validation(format!("invalid contract ID format: {id}")));
    }
    if name.contains("::") {
        return Err(Error::validation(
            "invalid contract ID format: remove '::' and anything after it",
        ));
    }
    Ok((address, name))
}

/// Stacks API client (Hiro or a compatible mirror).
#[derive(Debug, Clone)]
pub struct HiroClient {
    api: ApiClient,
}

impl HiroClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            api: ApiClient::new(base_url)?,
        })
    }

    async fn offset_page<T>(&self, path: &str, offset: usize, limit: usize) -> Result<Page<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let response: OffsetResponse<T> = self
            .api
            .get_json(path, &[("offset", offset), ("limit", limit)])
            .await?;
        Ok(Page {
            records: response.results,
            offset,
            limit,
            total: response.total,
        })
    }

    pub async fn tokens_page(&self, offset: usize, limit: usize) -> Result<Page<TokenResult>> {
        self.offset_page("/metadata/v1/ft", offset, limit).await
    }

    pub async fn transactions_page(
        &self,
        principal: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Page<Transaction>> {
        let path = format!("/extended/v2/addresses/{principal}/transactions");
        self.offset_page(&path, offset, limit).await
    }

    pub async fn names_page(&self, offset: usize, limit: usize) -> Result<Page<NameRecord>> {
        self.offset_page("/v2/names", offset, limit).await
    }

    /// Balances of every holder of `contract_id`, optionally as of `until_block`.
    /// Returned in address order.
    pub async fn holders(&self, contract_id: &str, until_block: Option<u64>) -> Result<Vec<Holder>> {
        let path = format!("/extended/v1/address/{contract_id}/holders");
        let response: BTreeMap<String, String> = match until_block {
            Some(block) if block > 0 => {
                self.api
                    .get_json(&path, &[("until_block", block)])
                    .await?
            }
            _ => self.api.get_json(&path, NO_QUERY).await?,
        };
        Ok(response
            .into_iter()
            .map(|(address, balance)| Holder { address, balance })
            .collect())
    }

    pub async fn contract_source(&self, contract_id: &str) -> Result<String> {
        let (address, name) = split_contract_id(contract_id)?;
        let path = format!("/v2/contracts/source/{address}/{name}");
        let response: ContractSourceResponse = self.api.get_json(&path, NO_QUERY).await?;
        Ok(response.source)
    }

    pub async fn contract_details(&self, contract_id: &str) -> Result<ContractDetails> {
        split_contract_id(contract_id)?;
        let path = format!("/extended/v1/contract/{contract_id}");
        self.api.get_json(&path, NO_QUERY).await
    }

    pub async fn balances(&self, principal: &str) -> Result<AccountBalances> {
        let path = format!("/extended/v1/address/{principal}/balances");
        self.api.get_json(&path, NO_QUERY).await
    }

    pub async fn name_details(&self, name: &str) -> Result<NameDetails> {
        if name.is_empty() {
            return Err(Error::validation("name must not be empty"));
        }
        let path = format!("/v1/names/{name}");
        self.api.get_json(&path, NO_QUERY).await
    }

    /// The string a token contract returns from `get-name`.
    pub async fn token_display_name(&self, contract_id: &str) -> Result<String> {
        let (address, name) = split_contract_id(contract_id)?;
        let path = format!("/v2/contracts/call-read/{address}/{name}/get-name");
        let call = ReadOnlyCall {
            sender: READ_ONLY_SENDER.to_string(),
            arguments: Vec::new(),
        };
        let response: ReadOnlyResponse = self.api.post_json(&path, &call).await?;
        if !response.okay {
            return Err(Error::validation(format!(
                "{contract_id} get-name failed: {}",
                response.cause.unwrap_or_default()
            )));
        }
        decode_clarity_string(&response.result)
    }
}

/// Decode a hex Clarity `string-ascii` / `string-utf8`, optionally wrapped
/// in `(ok ..)`.
pub fn decode_clarity_string(hex: &str) -> Result<String> {
    let invalid = || Error::validation(format!("not a Clarity string: {hex}"));
    let bytes = decode_hex(hex.trim_start_matches("0x")).ok_or_else(invalid)?;

    let value = match bytes.split_first() {
        Some((&0x07, rest)) => rest,
        _ => &bytes[..],
    };
    let (&kind, rest) = value.split_first().ok_or_else(invalid)?;
    if kind != 0x0d && kind != 0x0e {
        return Err(invalid());
    }
    let len: [u8; 4] = rest
        .get(..4)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(invalid)?;
    let len = u32::from_be_bytes(len) as usize;
    let text = rest.get(4..4 + len).ok_or_else(invalid)?;
    String::from_utf8(text.to_vec()).map_err(|_| invalid())
}

fn decode_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok())
        .collect()
}

/// `GET /metadata/v1/ft`
#[derive(Debug, Clone)]
pub struct FungibleTokens {
    client: HiroClient,
}

impl FungibleTokens {
    pub fn new(client: HiroClient) -> Self {
        Self { client }
    }
}

impl OffsetSource for FungibleTokens {
    type Record = TokenResult;

    async fn fetch_page(&self, offset: usize, limit: usize) -> Result<Page<TokenResult>> {
        self.client.tokens_page(offset, limit).await
    }
}

/// `GET /extended/v2/addresses/{principal}/transactions`
#[derive(Debug, Clone)]
pub struct AddressTransactions {
    client: HiroClient,
    principal: String,
}

impl AddressTransactions {
    pub fn new(client: HiroClient, principal: impl Into<String>) -> Self {
        Self {
            client,
            principal: principal.into(),
        }
    }
}

impl OffsetSource for AddressTransactions {
    type Record = Transaction;

    async fn fetch_page(&self, offset: usize, limit: usize) -> Result<Page<Transaction>> {
        self.client
            .transactions_page(&self.principal, offset, limit)
            .await
    }
}

/// `GET /v2/names`
#[derive(Debug, Clone)]
pub struct Names {
    client: HiroClient,
}

impl Names {
    pub fn new(client: HiroClient) -> Self {
        Self { client }
    }
}

impl OffsetSource for Names {
    type Record = NameRecord;

    async fn fetch_page(&self, offset: usize, limit: usize) -> Result<Page<NameRecord>> {
        self.client.names_page(offset, limit).await
    }
}
