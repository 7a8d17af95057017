//! Status line, loading overlay and help line tests

use super::*;
use std::path::PathBuf;
use teller::keymap::Action;
use teller::project::NameProjector;

#[test]
fn test_loading_overlay_shows_message() {
    let mut browser = create_test_browser();
    browser.set_loading("Fetching holders for SP1.alex...");

    let buffer = render_to_buffer(&browser, 160, 30);
    assert!(buffer_contains(&buffer, "Loading"));
    assert!(buffer_contains(&buffer, "Fetching holders for SP1.alex..."));
}

#[test]
fn test_rows_loaded_clears_overlay() {
    let mut browser = Browser::for_projector(&TokenProjector, "Fungible tokens", "tokens");
    browser.set_loading("Loading Fungible tokens...");
    browser.update(Event::RowsLoaded(Ok(mock_token_rows())));

    let buffer = render_to_buffer(&browser, 160, 30);
    assert!(!buffer_contains(&buffer, "Loading"));
    assert!(buffer_contains(&buffer, "Total: 3"));
}

#[test]
fn test_fetch_error_on_status_line() {
    let mut browser = Browser::for_projector(&TokenProjector, "Fungible tokens", "tokens");
    browser.set_loading("Loading Fungible tokens...");
    browser.update(Event::RowsLoaded(Err("fetch failed: connection refused".into())));

    let buffer = render_to_buffer(&browser, 160, 30);
    assert!(buffer_contains(&buffer, "✗ fetch failed: connection refused"));
    assert!(buffer_contains(&buffer, "Total: 0"));
}

#[test]
fn test_unsupported_action_shows_info() {
    let mut browser = Browser::for_projector(&NameProjector, "BNS names", "names")
        .with_rows(vec![Row::new(vec![
            "satoshi.btc".into(),
            "SP1".into(),
            "100".into(),
            "10".into(),
        ])]);
    apply(&mut browser, &[Action::Holders]);

    let buffer = render_to_buffer(&browser, 160, 30);
    assert!(buffer_contains(&buffer, "Holders not available for BNS names"));
}

#[test]
fn test_compare_without_heights_is_an_error() {
    let mut browser = Browser::for_projector(&TokenProjector, "Fungible tokens", "tokens")
        .with_rows(mock_token_rows());
    apply(&mut browser, &[Action::Compare]);

    let buffer = render_to_buffer(&browser, 160, 30);
    assert!(buffer_contains(&buffer, "✗ Holder compare needs"));
}

#[test]
fn test_export_result_on_status_line() {
    let mut browser = create_test_browser();
    browser.update(Event::Exported(Ok(PathBuf::from("/tmp/out/tokens.csv"))));

    let buffer = render_to_buffer(&browser, 160, 30);
    assert!(buffer_contains(&buffer, "Exported to /tmp/out/tokens.csv"));
}

#[test]
fn test_help_line_follows_mode() {
    let mut browser = create_test_browser();
    let buffer = render_to_buffer(&browser, 160, 30);
    assert!(buffer_contains(&buffer, "[h] Holders"));
    assert!(buffer_contains(&buffer, "[1-9] Sort"));

    apply(&mut browser, &[Action::Detail]);
    let buffer = render_to_buffer(&browser, 160, 30);
    assert!(!buffer_contains(&buffer, "[h] Holders"));
    assert!(buffer_contains(&buffer, "[b] Back"));
}
