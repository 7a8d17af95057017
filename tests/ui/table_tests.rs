//! Main table UI tests - top bar, headers, sorting and focus

use super::*;
use teller::keymap::Action;

#[test]
fn test_top_bar_shows_title_and_total() {
    let browser = create_test_browser();
    let buffer = render_to_buffer(&browser, 160, 30);

    let top = buffer_line(&buffer, 0);
    assert!(top.contains("Fungible tokens"));
    assert!(top.contains("Total: 3"));
}

#[test]
fn test_table_shows_headers_and_rows() {
    let browser = create_test_browser();
    let buffer = render_to_buffer(&browser, 160, 30);

    for header in ["Name", "Symbol", "Decimals", "Total Supply", "Contract ID"] {
        assert!(buffer_contains(&buffer, header), "missing header {header}");
    }
    assert!(buffer_contains(&buffer, "Wrapped Bitcoin"));
    assert!(buffer_contains(&buffer, "21.00000000"));
}

#[test]
fn test_rows_render_in_input_order() {
    let browser = create_test_browser();
    let buffer = render_to_buffer(&browser, 160, 30);

    let alex = find_line(&buffer, "Alex").unwrap();
    let xbtc = find_line(&buffer, "Wrapped Bitcoin").unwrap();
    let sdao = find_line(&buffer, "Stacks Dao").unwrap();
    assert!(alex < xbtc && xbtc < sdao);
}

#[test]
fn test_sorted_column_shows_direction() {
    let mut browser = create_test_browser();

    apply(&mut browser, &[Action::Sort(2)]);
    let buffer = render_to_buffer(&browser, 160, 30);
    assert!(buffer_contains(&buffer, "Decimals ▲"));

    apply(&mut browser, &[Action::Sort(2)]);
    let buffer = render_to_buffer(&browser, 160, 30);
    assert!(buffer_contains(&buffer, "Decimals ▼"));
}

#[test]
fn test_sort_by_name_reorders_rows() {
    let mut browser = create_test_browser();

    apply(&mut browser, &[Action::Sort(0)]);
    let buffer = render_to_buffer(&browser, 160, 30);
    let alex = find_line(&buffer, "Alex").unwrap();
    let sdao = find_line(&buffer, "Stacks Dao").unwrap();
    let xbtc = find_line(&buffer, "Wrapped Bitcoin").unwrap();
    assert!(alex < sdao && sdao < xbtc);

    apply(&mut browser, &[Action::Sort(0)]);
    let buffer = render_to_buffer(&browser, 160, 30);
    let alex = find_line(&buffer, "Alex").unwrap();
    let xbtc = find_line(&buffer, "Wrapped Bitcoin").unwrap();
    assert!(xbtc < alex);
}

#[test]
fn test_numeric_sort_on_supply() {
    let mut browser = create_test_browser();

    apply(&mut browser, &[Action::Sort(3)]);
    let buffer = render_to_buffer(&browser, 160, 30);

    // 5 < 21 < 1000 numerically, not lexically
    let sdao = find_line(&buffer, "Stacks Dao").unwrap();
    let xbtc = find_line(&buffer, "Wrapped Bitcoin").unwrap();
    let alex = find_line(&buffer, "Alex").unwrap();
    assert!(sdao < xbtc && xbtc < alex);
}

#[test]
fn test_unfocused_marker() {
    let mut browser = create_test_browser();
    apply(&mut browser, &[Action::ToggleFocus]);

    let buffer = render_to_buffer(&browser, 160, 30);
    assert!(buffer_line(&buffer, 0).contains("(unfocused)"));

    apply(&mut browser, &[Action::ToggleFocus]);
    let buffer = render_to_buffer(&browser, 160, 30);
    assert!(!buffer_contains(&buffer, "(unfocused)"));
}

#[test]
fn test_empty_table_renders() {
    let browser = Browser::for_projector(&TokenProjector, "Fungible tokens", "tokens");
    let buffer = render_to_buffer(&browser, 160, 30);

    assert!(buffer_contains(&buffer, "Total: 0"));
    assert!(buffer_contains(&buffer, "Contract ID"));
}

#[test]
fn test_small_terminal_does_not_panic() {
    let browser = create_test_browser();
    let buffer = render_to_buffer(&browser, 40, 8);
    assert!(buffer_contains(&buffer, "Total"));
}

#[test]
fn test_wallet_balances_table() {
    use teller::api::{AccountBalances, FtBalance, StxBalance};
    use teller::project::{aggregate_balances, BalanceProjector, Projector};

    let wallet = |stx: &str, alex: &str| AccountBalances {
        stx: StxBalance {
            balance: stx.into(),
        },
        fungible_tokens: [(
            "SP1.token-alex::alex".to_string(),
            FtBalance {
                balance: alex.into(),
            },
        )]
        .into_iter()
        .collect(),
        ..AccountBalances::default()
    };
    let mut balances = aggregate_balances(&[wallet("1000000", "40"), wallet("500000", "2")]);
    balances[1].display_name = Some("ALEX Token".into());

    let browser = Browser::for_projector(&BalanceProjector, "Balances of 2 wallets", "balances")
        .with_rows(BalanceProjector.project_all(&balances));
    let buffer = render_to_buffer(&browser, 160, 30);

    assert!(buffer_line(&buffer, 0).contains("Total: 2"));
    for header in ["Name", "Type", "Balance", "Contract ID", "Display Name"] {
        assert!(buffer_contains(&buffer, header), "missing header {header}");
    }
    let stx = buffer_line(&buffer, find_line(&buffer, "STX").unwrap());
    assert!(stx.contains("1500000"));
    let alex = buffer_line(&buffer, find_line(&buffer, "SP1.token-alex").unwrap());
    assert!(alex.contains("Fungible"));
    assert!(alex.contains("42"));
    assert!(alex.contains("ALEX Token"));
}

#[test]
fn test_pivot_replaces_transactions_table() {
    use teller::project::{DetailKeys, TransactionProjector};

    let tx = |id: &str, sender: &str, recipient: &str| {
        Row::new(vec![id.into(), sender.into(), recipient.into()]).with_keys(DetailKeys {
            tx_id: Some(id.into()),
            address: Some(sender.into()),
            recipient: Some(recipient.into()),
            ..DetailKeys::default()
        })
    };
    let mut browser = Browser::for_projector(
        &TransactionProjector,
        "Transactions of SP1SENDER",
        "SP1SENDER_transactions",
    )
    .with_rows(vec![tx("0xaaa", "SP1SENDER", "SP2RECIPIENT")]);

    apply(&mut browser, &[Action::PivotRecipient]);
    let buffer = render_to_buffer(&browser, 160, 30);
    assert!(buffer_contains(&buffer, "Fetching transactions of SP2RECIPIENT"));

    browser.update(Event::TransactionsLoaded {
        principal: "SP2RECIPIENT".into(),
        result: Ok(vec![
            tx("0xbbb", "SP2RECIPIENT", "SP3"),
            tx("0xccc", "SP4", "SP2RECIPIENT"),
        ]),
    });
    let buffer = render_to_buffer(&browser, 160, 30);
    let top = buffer_line(&buffer, 0);
    assert!(top.contains("Transactions of SP2RECIPIENT"));
    assert!(top.contains("Total: 2"));
    assert!(!buffer_contains(&buffer, "0xaaa"));
    assert!(buffer_contains(&buffer, "0xccc"));
}
