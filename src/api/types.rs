use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::fetch::Keyed;

/// `{ limit, offset, total, results }` envelope shared by the Hiro list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct OffsetResponse<T> {
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
    pub total: Option<usize>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

// ---------------------------------------------------------------------------
// Hiro
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenResult {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub decimals: u32,
    pub total_supply: Option<String>,
    pub contract_principal: String,
    pub tx_id: Option<String>,
    pub sender_address: Option<String>,
}

impl Keyed for TokenResult {
    fn key(&self) -> String {
        self.contract_principal.clone()
    }
}

/// One entry of the address transactions feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transaction {
    pub tx: Tx,
    pub stx_sent: String,
    pub stx_received: String,
    pub events: EventSummary,
}

impl Keyed for Transaction {
    fn key(&self) -> String {
        self.tx.tx_id.clone()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tx {
    pub tx_id: String,
    pub fee_rate: String,
    pub sender_address: String,
    pub tx_status: String,
    pub tx_type: String,
    pub block_height: Option<u64>,
    pub token_transfer: Option<TokenTransfer>,
    /// Remaining fields are kept so snapshots round-trip the full record.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenTransfer {
    pub recipient_address: String,
    pub amount: String,
    pub memo: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventSummary {
    pub stx: EventCounts,
    pub ft: EventCounts,
    pub nft: EventCounts,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventCounts {
    pub transfer: u64,
    pub mint: u64,
    pub burn: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NameRecord {
    pub name: String,
    pub address: String,
    pub expire_block: Option<u64>,
    pub registered_at: Option<u64>,
}

impl Keyed for NameRecord {
    fn key(&self) -> String {
        self.name.clone()
    }
}

/// A token balance at a given height, raw integer units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holder {
    pub address: String,
    pub balance: String,
}

impl Keyed for Holder {
    fn key(&self) -> String {
        self.address.clone()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContractSourceResponse {
    pub source: String,
    #[serde(default)]
    pub publish_height: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractDetails {
    pub tx_id: String,
    pub contract_id: String,
    pub block_height: u64,
    pub clarity_version: Option<u32>,
    pub source_code: String,
    pub abi: Option<String>,
}

/// `GET /v1/names/{name}`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NameDetails {
    pub address: String,
    pub blockchain: String,
    pub expire_block: Option<u64>,
    pub last_txid: Option<String>,
    pub status: Option<String>,
    pub zonefile_hash: Option<String>,
}

/// `GET /extended/v1/address/{principal}/balances`
///
/// Token maps are keyed by asset identifier, `{contract_id}::{asset}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AccountBalances {
    pub stx: StxBalance,
    pub fungible_tokens: BTreeMap<String, FtBalance>,
    pub non_fungible_tokens: BTreeMap<String, NftCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StxBalance {
    pub balance: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FtBalance {
    pub balance: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NftCount {
    pub count: String,
}

/// Body of `POST /v2/contracts/call-read/{address}/{name}/{function}`.
#[derive(Debug, Clone, Serialize)]
pub struct ReadOnlyCall {
    pub sender: String,
    pub arguments: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReadOnlyResponse {
    pub okay: bool,
    /// Hex-encoded Clarity value.
    pub result: String,
    pub cause: Option<String>,
}

// ---------------------------------------------------------------------------
// ord
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RunesResponse {
    #[serde(default)]
    pub entries: Vec<(String, RuneDetails)>,
    #[serde(default)]
    pub more: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuneDetails {
    pub spaced_rune: String,
    pub divisibility: u32,
    #[serde(deserialize_with = "amount")]
    pub mints: u128,
    #[serde(deserialize_with = "amount")]
    pub premine: u128,
    pub terms: Option<RuneTerms>,
    pub number: Option<u64>,
    pub block: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuneTerms {
    #[serde(deserialize_with = "amount")]
    pub amount: u128,
    pub cap: Option<u128>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuneEntry {
    pub id: String,
    pub details: RuneDetails,
}

impl Keyed for RuneEntry {
    fn key(&self) -> String {
        self.id.clone()
    }
}

/// ord reports large amounts as JSON numbers that may exceed `u64` or come
/// back in float notation.
fn amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .map(u128::from)
            .or_else(|| n.as_f64().map(|f| f.max(0.0) as u128))
            .unwrap_or_default(),
        Some(Value::String(s)) => s.parse().unwrap_or_default(),
        _ => 0,
    })
}

// ---------------------------------------------------------------------------
// Blockscout (BOB)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct BobTokensResponse {
    #[serde(default)]
    pub items: Vec<BobToken>,
    #[serde(default)]
    pub next_page_params: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BobToken {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub decimals: Option<String>,
    pub total_supply: Option<String>,
    pub address: String,
    pub holders: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Keyed for BobToken {
    fn key(&self) -> String {
        self.address.clone()
    }
}

/// Flatten `next_page_params` into query pairs. Nulls are dropped.
pub fn page_params_query(params: &Map<String, Value>) -> Vec<(String, String)> {
    params
        .iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((key.clone(), value))
        })
        .collect()
}
