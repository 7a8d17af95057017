//! Record → display row projections, one per browsable feature.

use std::collections::BTreeMap;

use crate::api::{
    AccountBalances, BobToken, Holder, NameRecord, RuneEntry, TokenResult, Transaction,
};

/// Ordered display cells plus the keys needed to drill into the record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    pub cells: Vec<String>,
    pub keys: DetailKeys,
}

impl Row {
    pub fn new(cells: Vec<String>) -> Self {
        Self {
            cells,
            keys: DetailKeys::default(),
        }
    }

    pub fn with_keys(mut self, keys: DetailKeys) -> Self {
        self.keys = keys;
        self
    }

    pub fn cell(&self, column: usize) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }

    /// The value `c` puts on the clipboard.
    pub fn copy_text(&self) -> Option<String> {
        self.keys
            .contract_id
            .clone()
            .or_else(|| self.keys.tx_id.clone())
            .or_else(|| self.keys.address.clone())
            .or_else(|| self.cells.first().cloned())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailKeys {
    pub contract_id: Option<String>,
    pub address: Option<String>,
    pub tx_id: Option<String>,
    /// Transfer recipient; `address` holds the sender on transaction rows.
    pub recipient: Option<String>,
    pub decimals: Option<u32>,
    pub name: Option<String>,
    pub symbol: Option<String>,
}

pub const HOLDER_HEADERS: &[&str] = &["Address", "Balance"];
pub const COMPARE_HEADERS: &[&str] = &["Address", "First", "Second", "Difference"];

/// Drill-down a feature offers from its main table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Holders,
    Source,
    Compare,
    /// Reload the main table with another principal's transactions.
    Pivot,
}

pub trait Projector {
    type Record;

    fn headers(&self) -> &'static [&'static str];

    fn project(&self, record: &Self::Record) -> Row;

    fn actions(&self) -> &'static [RowAction] {
        &[]
    }

    fn project_all(&self, records: &[Self::Record]) -> Vec<Row> {
        records.iter().map(|record| self.project(record)).collect()
    }
}

/// Insert a `.` `decimals` digits from the right, left-padding with zeros.
///
/// `insert_decimal("5", 3) == "0.005"`; `decimals == 0` returns the input.
pub fn insert_decimal(raw: &str, decimals: u32) -> String {
    let decimals = decimals as usize;
    if decimals == 0 {
        return raw.to_string();
    }
    let mut digits: Vec<char> = raw.chars().collect();
    if digits.len() <= decimals {
        let pad = decimals + 1 - digits.len();
        digits.splice(0..0, std::iter::repeat('0').take(pad));
    }
    let split = digits.len() - decimals;
    let whole: String = digits[..split].iter().collect();
    let fraction: String = digits[split..].iter().collect();
    format!("{whole}.{fraction}")
}

/// `part / whole * 100` rounded to an integer string; `"0"` for a zero
/// denominator or any non-finite result.
pub fn percentage(part: f64, whole: f64) -> String {
    if whole == 0.0 {
        return "0".to_string();
    }
    let pct = part / whole * 100.0;
    if pct.is_finite() {
        format!("{pct:.0}")
    } else {
        "0".to_string()
    }
}

/// Integer `raw / 10^divisibility`.
pub fn quotient(raw: u128, divisibility: u32) -> u128 {
    10u128
        .checked_pow(divisibility)
        .map(|scale| raw / scale)
        .unwrap_or(0)
}

fn or_empty(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Fungible tokens
// ---------------------------------------------------------------------------

pub struct TokenProjector;

impl Projector for TokenProjector {
    type Record = TokenResult;

    fn headers(&self) -> &'static [&'static str] {
        &["Name", "Symbol", "Decimals", "Total Supply", "Contract ID"]
    }

    fn project(&self, token: &TokenResult) -> Row {
        let total_supply = token
            .total_supply
            .as_deref()
            .map(|raw| insert_decimal(raw, token.decimals))
            .unwrap_or_default();
        Row::new(vec![
            or_empty(&token.name),
            or_empty(&token.symbol),
            token.decimals.to_string(),
            total_supply,
            token.contract_principal.clone(),
        ])
        .with_keys(DetailKeys {
            contract_id: Some(token.contract_principal.clone()),
            address: token.sender_address.clone(),
            tx_id: token.tx_id.clone(),
            decimals: Some(token.decimals),
            name: token.name.clone(),
            symbol: token.symbol.clone(),
            ..DetailKeys::default()
        })
    }

    fn actions(&self) -> &'static [RowAction] {
        &[RowAction::Holders, RowAction::Source, RowAction::Compare]
    }
}

pub struct HolderProjector {
    pub decimals: u32,
}

impl Projector for HolderProjector {
    type Record = Holder;

    fn headers(&self) -> &'static [&'static str] {
        HOLDER_HEADERS
    }

    fn project(&self, holder: &Holder) -> Row {
        Row::new(vec![
            holder.address.clone(),
            insert_decimal(&holder.balance, self.decimals),
        ])
        .with_keys(DetailKeys {
            address: Some(holder.address.clone()),
            ..DetailKeys::default()
        })
    }
}

// ---------------------------------------------------------------------------
// Holder compare
// ---------------------------------------------------------------------------

/// One holder's balance at two heights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolderDelta {
    pub address: String,
    pub first: u128,
    pub second: u128,
}

impl HolderDelta {
    pub fn difference(&self) -> u128 {
        self.first.abs_diff(self.second)
    }
}

/// Join two holder snapshots by address. Missing balances count as zero;
/// unparseable balances are skipped.
pub fn compare_holders(first: &[Holder], second: &[Holder]) -> Vec<HolderDelta> {
    let mut joined: BTreeMap<&str, (u128, u128)> = BTreeMap::new();
    for holder in first {
        if let Ok(balance) = holder.balance.parse::<u128>() {
            joined.entry(holder.address.as_str()).or_default().0 = balance;
        }
    }
    for holder in second {
        if let Ok(balance) = holder.balance.parse::<u128>() {
            joined.entry(holder.address.as_str()).or_default().1 = balance;
        }
    }
    joined
        .into_iter()
        .map(|(address, (first, second))| HolderDelta {
            address: address.to_string(),
            first,
            second,
        })
        .collect()
}

pub struct CompareProjector {
    pub decimals: u32,
}

impl Projector for CompareProjector {
    type Record = HolderDelta;

    fn headers(&self) -> &'static [&'static str] {
        COMPARE_HEADERS
    }

    fn project(&self, delta: &HolderDelta) -> Row {
        let amount = |value: u128| insert_decimal(&value.to_string(), self.decimals);
        Row::new(vec![
            delta.address.clone(),
            amount(delta.first),
            amount(delta.second),
            amount(delta.difference()),
        ])
        .with_keys(DetailKeys {
            address: Some(delta.address.clone()),
            ..DetailKeys::default()
        })
    }
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// STX amounts are reported in micro-STX.
const STX_DECIMALS: u32 = 6;

pub struct TransactionProjector;

impl Projector for TransactionProjector {
    type Record = Transaction;

    fn headers(&self) -> &'static [&'static str] {
        &[
            "Tx ID",
            "Sender",
            "Recipient",
            "Status",
            "Fee",
            "Amount",
            "STX Received",
            "FT",
            "NFT",
            "STX",
        ]
    }

    fn project(&self, record: &Transaction) -> Row {
        let tx = &record.tx;
        let (recipient, amount) = match &tx.token_transfer {
            Some(transfer) => (
                Some(transfer.recipient_address.clone()).filter(|r| !r.is_empty()),
                insert_decimal(&transfer.amount, STX_DECIMALS),
            ),
            None => (None, String::new()),
        };
        Row::new(vec![
            tx.tx_id.clone(),
            tx.sender_address.clone(),
            or_empty(&recipient),
            tx.tx_status.clone(),
            insert_decimal(&tx.fee_rate, STX_DECIMALS),
            amount,
            insert_decimal(&record.stx_received, STX_DECIMALS),
            record.events.ft.transfer.to_string(),
            record.events.nft.transfer.to_string(),
            record.events.stx.transfer.to_string(),
        ])
        .with_keys(DetailKeys {
            tx_id: Some(tx.tx_id.clone()),
            address: Some(tx.sender_address.clone()).filter(|s| !s.is_empty()),
            recipient,
            ..DetailKeys::default()
        })
    }

    fn actions(&self) -> &'static [RowAction] {
        &[RowAction::Pivot]
    }
}

// ---------------------------------------------------------------------------
// Wallet balances
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BalanceKind {
    Stx,
    Fungible,
    NonFungible,
}

impl BalanceKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Stx => "STX",
            Self::Fungible => "Fungible",
            Self::NonFungible => "Non-Fungible",
        }
    }
}

/// One asset summed over every wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletBalance {
    pub name: String,
    pub kind: BalanceKind,
    /// Raw units for STX and fungible tokens, a count for NFTs.
    pub amount: u128,
    pub contract_id: Option<String>,
    pub display_name: Option<String>,
}

/// Sum balances across wallets: one STX row, then fungible tokens and NFTs
/// in asset order. Unparseable amounts count as zero.
pub fn aggregate_balances(wallets: &[AccountBalances]) -> Vec<WalletBalance> {
    let parse = |raw: &str| raw.parse::<u128>().unwrap_or(0);

    let mut stx: u128 = 0;
    let mut assets: BTreeMap<(BalanceKind, &str), u128> = BTreeMap::new();
    for wallet in wallets {
        stx = stx.saturating_add(parse(&wallet.stx.balance));
        for (asset, ft) in &wallet.fungible_tokens {
            let sum = assets.entry((BalanceKind::Fungible, asset.as_str())).or_default();
            *sum = sum.saturating_add(parse(&ft.balance));
        }
        for (asset, nft) in &wallet.non_fungible_tokens {
            let sum = assets.entry((BalanceKind::NonFungible, asset.as_str())).or_default();
            *sum = sum.saturating_add(parse(&nft.count));
        }
    }

    let mut balances = vec![WalletBalance {
        name: "stx".to_string(),
        kind: BalanceKind::Stx,
        amount: stx,
        contract_id: None,
        display_name: None,
    }];
    balances.extend(assets.into_iter().map(|((kind, asset), amount)| {
        let (contract_id, name) = asset.split_once("::").unwrap_or((asset, asset));
        WalletBalance {
            name: name.to_string(),
            kind,
            amount,
            contract_id: Some(contract_id.to_string()),
            display_name: None,
        }
    }));
    balances
}

pub struct BalanceProjector;

impl Projector for BalanceProjector {
    type Record = WalletBalance;

    fn headers(&self) -> &'static [&'static str] {
        &["Name", "Type", "Balance", "Contract ID", "Display Name"]
    }

    fn project(&self, balance: &WalletBalance) -> Row {
        Row::new(vec![
            balance.name.clone(),
            balance.kind.label().to_string(),
            balance.amount.to_string(),
            or_empty(&balance.contract_id),
            or_empty(&balance.display_name),
        ])
        .with_keys(DetailKeys {
            contract_id: balance.contract_id.clone(),
            name: balance.display_name.clone(),
            ..DetailKeys::default()
        })
    }
}

// ---------------------------------------------------------------------------
// BNS names
// ---------------------------------------------------------------------------

pub struct NameProjector;

impl Projector for NameProjector {
    type Record = NameRecord;

    fn headers(&self) -> &'static [&'static str] {
        &["Name", "Address", "Expire Block", "Registered Block"]
    }

    fn project(&self, record: &NameRecord) -> Row {
        let block = |height: Option<u64>| height.map(|h| h.to_string()).unwrap_or_default();
        Row::new(vec![
            record.name.clone(),
            record.address.clone(),
            block(record.expire_block),
            block(record.registered_at),
        ])
        .with_keys(DetailKeys {
            address: Some(record.address.clone()),
            name: Some(record.name.clone()),
            ..DetailKeys::default()
        })
    }
}

// ---------------------------------------------------------------------------
// Runes
// ---------------------------------------------------------------------------

pub struct RuneProjector;

impl Projector for RuneProjector {
    type Record = RuneEntry;

    fn headers(&self) -> &'static [&'static str] {
        &[
            "Name",
            "Divisibility",
            "Amount",
            "Mints",
            "Premine",
            "Total Supply",
            "Premine %",
        ]
    }

    fn project(&self, entry: &RuneEntry) -> Row {
        let details = &entry.details;
        let raw_amount = details.terms.as_ref().map_or(0, |terms| terms.amount);
        let amount = quotient(raw_amount, details.divisibility);
        let premine = quotient(details.premine, details.divisibility);
        let total_supply = premine.saturating_add(details.mints.saturating_mul(amount));

        Row::new(vec![
            details.spaced_rune.clone(),
            details.divisibility.to_string(),
            amount.to_string(),
            details.mints.to_string(),
            premine.to_string(),
            total_supply.to_string(),
            percentage(premine as f64, total_supply as f64),
        ])
        .with_keys(DetailKeys {
            name: Some(details.spaced_rune.clone()),
            ..DetailKeys::default()
        })
    }
}

// ---------------------------------------------------------------------------
// BOB tokens
// ---------------------------------------------------------------------------

pub struct BobTokenProjector;

impl Projector for BobTokenProjector {
    type Record = BobToken;

    fn headers(&self) -> &'static [&'static str] {
        &[
            "Name",
            "Symbol",
            "Decimals",
            "Total Supply",
            "Contract ID",
            "Holders",
            "Type",
        ]
    }

    fn project(&self, token: &BobToken) -> Row {
        let decimals = token
            .decimals
            .as_deref()
            .and_then(|d| d.parse::<u32>().ok());
        let total_supply = match (&token.total_supply, decimals) {
            (Some(raw), Some(decimals)) => insert_decimal(raw, decimals),
            (Some(raw), None) => raw.clone(),
            (None, _) => String::new(),
        };
        Row::new(vec![
            or_empty(&token.name),
            or_empty(&token.symbol),
            or_empty(&token.decimals),
            total_supply,
            token.address.clone(),
            or_empty(&token.holders),
            token.kind.clone(),
        ])
        .with_keys(DetailKeys {
            address: Some(token.address.clone()),
            decimals,
            name: token.name.clone(),
            symbol: token.symbol.clone(),
            ..DetailKeys::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{RuneDetails, RuneTerms, TokenTransfer, Tx};

    #[test]
    fn test_insert_decimal() {
        assert_eq!(insert_decimal("123456", 2), "1234.56");
        assert_eq!(insert_decimal("5", 3), "0.005");
        assert_eq!(insert_decimal("100", 0), "100");
        assert_eq!(insert_decimal("500", 3), "0.500");
        assert_eq!(insert_decimal("1000000", 6), "1.000000");
    }

    #[test]
    fn test_percentage_guards_zero_and_nan() {
        assert_eq!(percentage(0.0, 0.0), "0");
        assert_eq!(percentage(5.0, 0.0), "0");
        assert_eq!(percentage(f64::NAN, 10.0), "0");
        assert_eq!(percentage(1.0, 4.0), "25");
    }

    #[test]
    fn test_quotient() {
        assert_eq!(quotient(123_456, 2), 1234);
        assert_eq!(quotient(7, 0), 7);
        assert_eq!(quotient(1, 60), 0);
    }

    fn rune(divisibility: u32, premine: u128, mints: u128, amount: Option<u128>) -> RuneEntry {
        RuneEntry {
            id: "840000:1".into(),
            details: RuneDetails {
                spaced_rune: "UNCOMMON•GOODS".into(),
                divisibility,
                mints,
                premine,
                terms: amount.map(|amount| RuneTerms { amount, cap: None }),
                ..RuneDetails::default()
            },
        }
    }

    #[test]
    fn test_rune_supply_and_premine_share() {
        let row = RuneProjector.project(&rune(2, 10_000, 300, Some(100)));
        // premine 100, amount 1, total 100 + 300 * 1
        assert_eq!(row.cells[2], "1");
        assert_eq!(row.cells[4], "100");
        assert_eq!(row.cells[5], "400");
        assert_eq!(row.cells[6], "25");
    }

    #[test]
    fn test_rune_without_supply_has_zero_premine_share() {
        let row = RuneProjector.project(&rune(0, 0, 0, None));
        assert_eq!(row.cells[5], "0");
        assert_eq!(row.cells[6], "0");
    }

    #[test]
    fn test_token_row_and_keys() {
        let token = TokenResult {
            name: Some("ALEX Token".into()),
            symbol: Some("ALEX".into()),
            decimals: 8,
            total_supply: Some("100000000000000000".into()),
            contract_principal: "SP102V8P0F7JX67ARQ77WEA3D3CFB5XW39REDT0AM.token-alex".into(),
            ..TokenResult::default()
        };

        let row = TokenProjector.project(&token);

        assert_eq!(row.cells.len(), TokenProjector.headers().len());
        assert_eq!(row.cells[3], "1000000000.00000000");
        assert_eq!(row.keys.decimals, Some(8));
        assert_eq!(row.copy_text().as_deref(), Some(token.contract_principal.as_str()));
    }

    #[test]
    fn test_transaction_amounts_are_micro_stx() {
        let record = Transaction {
            tx: Tx {
                tx_id: "0x01".into(),
                fee_rate: "180".into(),
                sender_address: "SP1".into(),
                tx_status: "success".into(),
                token_transfer: Some(TokenTransfer {
                    recipient_address: "SP2".into(),
                    amount: "2500000".into(),
                    memo: String::new(),
                }),
                ..Tx::default()
            },
            stx_received: "0".into(),
            ..Transaction::default()
        };

        let row = TransactionProjector.project(&record);

        assert_eq!(row.cells[2], "SP2");
        assert_eq!(row.cells[4], "0.000180");
        assert_eq!(row.cells[5], "2.500000");
        assert_eq!(row.cells[6], "0.000000");
        assert_eq!(row.keys.tx_id.as_deref(), Some("0x01"));
        assert_eq!(row.keys.address.as_deref(), Some("SP1"));
        assert_eq!(row.keys.recipient.as_deref(), Some("SP2"));
    }

    #[test]
    fn test_contract_call_has_no_recipient() {
        let record = Transaction {
            tx: Tx {
                tx_id: "0x02".into(),
                sender_address: "SP1".into(),
                tx_type: "contract_call".into(),
                ..Tx::default()
            },
            ..Transaction::default()
        };

        let row = TransactionProjector.project(&record);

        assert_eq!(row.cells[2], "");
        assert_eq!(row.keys.recipient, None);
        assert_eq!(TransactionProjector.actions(), &[RowAction::Pivot]);
    }

    #[test]
    fn test_balances_sum_across_wallets() {
        use crate::api::{FtBalance, NftCount, StxBalance};

        let wallet = |stx: &str, ft: &[(&str, &str)], nft: &[(&str, &str)]| AccountBalances {
            stx: StxBalance {
                balance: stx.into(),
            },
            fungible_tokens: ft
                .iter()
                .map(|(k, v)| (k.to_string(), FtBalance { balance: v.to_string() }))
                .collect(),
            non_fungible_tokens: nft
                .iter()
                .map(|(k, v)| (k.to_string(), NftCount { count: v.to_string() }))
                .collect(),
        };
        let wallets = vec![
            wallet("1000", &[("SP1.alex::alex", "5")], &[("SP3.punks::punk", "2")]),
            wallet("250", &[("SP1.alex::alex", "7"), ("SP2.welsh::welsh", "x")], &[]),
        ];

        let balances = aggregate_balances(&wallets);

        let summary: Vec<(&str, BalanceKind, u128, Option<&str>)> = balances
            .iter()
            .map(|b| (b.name.as_str(), b.kind, b.amount, b.contract_id.as_deref()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("stx", BalanceKind::Stx, 1250, None),
                ("alex", BalanceKind::Fungible, 12, Some("SP1.alex")),
                ("welsh", BalanceKind::Fungible, 0, Some("SP2.welsh")),
                ("punk", BalanceKind::NonFungible, 2, Some("SP3.punks")),
            ]
        );

        let row = BalanceProjector.project(&balances[3]);
        assert_eq!(row.cells, vec!["punk", "Non-Fungible", "2", "SP3.punks", ""]);
        assert_eq!(row.copy_text().as_deref(), Some("SP3.punks"));
    }

    #[test]
    fn test_balances_of_no_wallets_is_zero_stx() {
        let balances = aggregate_balances(&[]);
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].amount, 0);
    }

    #[test]
    fn test_compare_joins_by_address() {
        let holder = |address: &str, balance: &str| Holder {
            address: address.into(),
            balance: balance.into(),
        };
        let first = vec![holder("SPA", "100"), holder("SPB", "50")];
        let second = vec![holder("SPB", "80"), holder("SPC", "7"), holder("SPD", "junk")];

        let deltas = compare_holders(&first, &second);

        let rows: Vec<(&str, u128, u128, u128)> = deltas
            .iter()
            .map(|d| (d.address.as_str(), d.first, d.second, d.difference()))
            .collect();
        assert_eq!(
            rows,
            vec![("SPA", 100, 0, 100), ("SPB", 50, 80, 30), ("SPC", 0, 7, 7)]
        );
    }
}
