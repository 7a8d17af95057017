//! UI rendering tests for teller
//!
//! These tests render the browser into a `TestBackend` and search the buffer.
//! Run with: cargo test --test ui_tests

pub mod status_tests;
pub mod subview_tests;
pub mod table_tests;

use teller::app::{Browser, Event};
use teller::keymap::Action;
use teller::project::{Row, TokenProjector};
use teller::ui::draw;

use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};

// ==================== Test Data Builders ====================

pub fn mock_token_rows() -> Vec<Row> {
    vec![
        token_row("Alex", "ALEX", "8", "1000.00000000", "SP3K8BC0PPEVCV7NZ6QSRWPQ2JE9E5B6N3PA0KBR9.age000-governance-token"),
        token_row("Wrapped Bitcoin", "xBTC", "8", "21.00000000", "SP3DX3H4FEYZJZ586MFBS25ZW3HZDMEW92260R2PR.Wrapped-Bitcoin"),
        token_row("Stacks Dao", "sDAO", "6", "5.000000", "SP2C2YFP12AJZB4MABJBAJ55XECVS7E4PMMZ89YZR.arkadiko-token"),
    ]
}

fn token_row(name: &str, symbol: &str, decimals: &str, supply: &str, contract: &str) -> Row {
    use teller::project::DetailKeys;

    Row::new(vec![
        name.to_string(),
        symbol.to_string(),
        decimals.to_string(),
        supply.to_string(),
        contract.to_string(),
    ])
    .with_keys(DetailKeys {
        contract_id: Some(contract.to_string()),
        decimals: decimals.parse().ok(),
        name: Some(name.to_string()),
        symbol: Some(symbol.to_string()),
        ..DetailKeys::default()
    })
}

pub fn create_test_browser() -> Browser {
    Browser::for_projector(&TokenProjector, "Fungible tokens", "tokens")
        .with_rows(mock_token_rows())
        .with_compare_heights(Some((100, 200)))
}

/// Feed a sequence of actions through the reducer, ignoring commands.
pub fn apply(browser: &mut Browser, actions: &[Action]) {
    for action in actions {
        browser.update(Event::Action(*action));
    }
}

// ==================== Buffer Helpers ====================

pub fn render_to_buffer(browser: &Browser, width: u16, height: u16) -> Buffer {
    let backend = TestBackend::new(width, height);
    let mut terminal = Terminal::new(backend).unwrap();

    terminal
        .draw(|frame| {
            draw(frame, browser);
        })
        .unwrap();

    terminal.backend().buffer().clone()
}

/// Check if buffer contains a specific string anywhere
pub fn buffer_contains(buffer: &Buffer, needle: &str) -> bool {
    let content = buffer_to_string(buffer);
    content.contains(needle)
}

/// Convert buffer to a single string for searching
pub fn buffer_to_string(buffer: &Buffer) -> String {
    let mut content = String::new();
    for y in 0..buffer.area.height {
        for x in 0..buffer.area.width {
            content.push(
                buffer
                    .cell((x, y))
                    .map(|c| c.symbol().chars().next().unwrap_or(' '))
                    .unwrap_or(' '),
            );
        }
        content.push('\n');
    }
    content
}

/// Get a specific line from the buffer
pub fn buffer_line(buffer: &Buffer, y: u16) -> String {
    let mut line = String::new();
    for x in 0..buffer.area.width {
        if let Some(cell) = buffer.cell((x, y)) {
            line.push_str(cell.symbol());
        }
    }
    line.trim_end().to_string()
}

/// Row index of the first line containing `needle`
pub fn find_line(buffer: &Buffer, needle: &str) -> Option<u16> {
    (0..buffer.area.height).find(|&y| buffer_line(buffer, y).contains(needle))
}
