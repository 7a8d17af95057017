//! Sub-view UI tests - detail, holders, contract source and compare

use super::*;
use teller::api::Holder;
use teller::keymap::Action;
use teller::project::{compare_holders, CompareProjector, HolderProjector, Projector};

const CONTRACT: &str = "SP3K8BC0PPEVCV7NZ6QSRWPQ2JE9E5B6N3PA0KBR9.age000-governance-token";

fn holders() -> Vec<Holder> {
    vec![
        Holder {
            address: "SP1HOLDER".into(),
            balance: "1234".into(),
        },
        Holder {
            address: "SP2HOLDER".into(),
            balance: "50".into(),
        },
    ]
}

fn browser_with_holders() -> Browser {
    let mut browser = create_test_browser();
    browser.update(Event::HoldersLoaded {
        contract_id: CONTRACT.into(),
        result: Ok(HolderProjector { decimals: 2 }.project_all(&holders())),
    });
    browser
}

#[test]
fn test_detail_shows_key_value_pairs() {
    let mut browser = create_test_browser();
    apply(&mut browser, &[Action::Down, Action::Detail]);

    let buffer = render_to_buffer(&browser, 160, 30);
    assert!(buffer_contains(&buffer, "Detail"));
    assert!(buffer_contains(&buffer, "Name: Wrapped Bitcoin"));
    assert!(buffer_contains(&buffer, "Symbol: xBTC"));
    assert!(buffer_contains(&buffer, "[c] Copy"));
}

#[test]
fn test_holders_view_shows_balances() {
    let browser = browser_with_holders();
    let buffer = render_to_buffer(&browser, 160, 30);

    assert!(buffer_contains(&buffer, "Holders of SP3K8B"));
    assert!(buffer_contains(&buffer, "Address"));
    assert!(buffer_contains(&buffer, "Balance"));
    assert!(buffer_contains(&buffer, "12.34"));
    assert!(buffer_contains(&buffer, "0.50"));
    assert!(buffer_line(&buffer, 0).contains("Total: 2"));
}

#[test]
fn test_holders_sort_independent_of_main() {
    let mut browser = browser_with_holders();
    apply(&mut browser, &[Action::Sort(1)]);

    let buffer = render_to_buffer(&browser, 160, 30);
    assert!(buffer_contains(&buffer, "Balance ▲"));
    let small = find_line(&buffer, "SP2HOLDER").unwrap();
    let large = find_line(&buffer, "SP1HOLDER").unwrap();
    assert!(small < large);

    apply(&mut browser, &[Action::Back]);
    let buffer = render_to_buffer(&browser, 160, 30);
    assert!(!buffer_contains(&buffer, "▲"));
    assert!(buffer_line(&buffer, 0).contains("Total: 3"));
}

#[test]
fn test_contract_source_scrolls() {
    let mut browser = create_test_browser();
    browser.update(Event::SourceLoaded {
        contract_id: "SP1.alex".into(),
        file_stem: "Alex-ALEX-SP1.alex".into(),
        result: Ok("(define-constant owner tx-sender)\n(define-public (mint))".into()),
    });

    let buffer = render_to_buffer(&browser, 160, 30);
    assert!(buffer_contains(&buffer, "SP1.alex"));
    assert!(buffer_contains(&buffer, "(define-constant owner"));
    assert!(buffer_contains(&buffer, "[s] Save"));

    apply(&mut browser, &[Action::Down]);
    let buffer = render_to_buffer(&browser, 160, 30);
    assert!(!buffer_contains(&buffer, "(define-constant owner"));
    assert!(buffer_contains(&buffer, "(define-public (mint))"));
}

#[test]
fn test_compare_view_shows_difference() {
    let before = holders();
    let after = vec![Holder {
        address: "SP1HOLDER".into(),
        balance: "1000".into(),
    }];
    let rows = CompareProjector { decimals: 0 }.project_all(&compare_holders(&before, &after));

    let mut browser = create_test_browser();
    browser.update(Event::CompareLoaded {
        contract_id: "SP1.alex".into(),
        first: 100,
        second: 200,
        result: Ok(rows),
    });

    let buffer = render_to_buffer(&browser, 160, 30);
    assert!(buffer_contains(&buffer, "SP1.alex holders at 100 vs 200"));
    assert!(buffer_contains(&buffer, "Difference"));
    let line = buffer_line(&buffer, find_line(&buffer, "SP1HOLDER").unwrap());
    assert!(line.contains("1234"));
    assert!(line.contains("1000"));
    assert!(line.contains("234"));
}

#[test]
fn test_failed_drill_down_stays_on_main() {
    let mut browser = create_test_browser();
    browser.update(Event::HoldersLoaded {
        contract_id: "SP1.alex".into(),
        result: Err("SP1.alex returned HTTP 404 Not Found".into()),
    });

    let buffer = render_to_buffer(&browser, 160, 30);
    assert!(buffer_line(&buffer, 0).contains("Total: 3"));
    assert!(buffer_contains(&buffer, "HTTP 404"));
}
