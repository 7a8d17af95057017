//! Key → action bindings, one table per view mode.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::ViewMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Back,
    ToggleFocus,
    Up,
    Down,
    PageUp,
    PageDown,
    Top,
    Bottom,
    Detail,
    Holders,
    Source,
    SaveSource,
    Compare,
    /// Reload with the selected transaction's recipient.
    PivotRecipient,
    /// Reload with the selected transaction's sender.
    PivotSender,
    ExportCsv,
    ExportJson,
    /// Zero-based column index.
    Sort(usize),
    Copy,
}

type Bindings = &'static [(KeyCode, Action)];

const NAVIGATION: Bindings = &[
    (KeyCode::Up, Action::Up),
    (KeyCode::Char('k'), Action::Up),
    (KeyCode::Down, Action::Down),
    (KeyCode::Char('j'), Action::Down),
    (KeyCode::PageUp, Action::PageUp),
    (KeyCode::PageDown, Action::PageDown),
    (KeyCode::Char('g'), Action::Top),
    (KeyCode::Home, Action::Top),
    (KeyCode::Char('G'), Action::Bottom),
    (KeyCode::End, Action::Bottom),
];

const MAIN: Bindings = &[
    (KeyCode::Char('q'), Action::Quit),
    (KeyCode::Esc, Action::ToggleFocus),
    (KeyCode::Enter, Action::Detail),
    (KeyCode::Char('h'), Action::Holders),
    (KeyCode::Char('s'), Action::Source),
    (KeyCode::Char('m'), Action::Compare),
    (KeyCode::Char('n'), Action::PivotRecipient),
    (KeyCode::Char('b'), Action::PivotSender),
    (KeyCode::Char('a'), Action::ExportCsv),
    (KeyCode::Char('e'), Action::ExportJson),
    (KeyCode::Char('c'), Action::Copy),
];

const DETAIL: Bindings = &[
    (KeyCode::Char('q'), Action::Back),
    (KeyCode::Char('b'), Action::Back),
    (KeyCode::Backspace, Action::Back),
    (KeyCode::Esc, Action::ToggleFocus),
    (KeyCode::Char('c'), Action::Copy),
];

/// Holders and Compare share one table layout.
const SUB_TABLE: Bindings = &[
    (KeyCode::Char('q'), Action::Back),
    (KeyCode::Char('b'), Action::Back),
    (KeyCode::Backspace, Action::Back),
    (KeyCode::Esc, Action::ToggleFocus),
    (KeyCode::Char('a'), Action::ExportCsv),
    (KeyCode::Char('e'), Action::ExportJson),
    (KeyCode::Char('c'), Action::Copy),
];

const CONTRACT_SOURCE: Bindings = &[
    (KeyCode::Char('q'), Action::Back),
    (KeyCode::Char('b'), Action::Back),
    (KeyCode::Backspace, Action::Back),
    (KeyCode::Esc, Action::ToggleFocus),
    (KeyCode::Char('s'), Action::SaveSource),
];

fn bindings(mode: ViewMode) -> Bindings {
    match mode {
        ViewMode::Main => MAIN,
        ViewMode::Detail => DETAIL,
        ViewMode::Holders | ViewMode::Compare => SUB_TABLE,
        ViewMode::ContractSource => CONTRACT_SOURCE,
    }
}

/// Resolve a key press in `mode`. Releases and repeats map to nothing.
pub fn action_for(mode: ViewMode, key: &KeyEvent) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Action::Quit);
    }
    if let KeyCode::Char(digit @ '1'..='9') = key.code {
        return mode
            .has_table()
            .then(|| Action::Sort(digit as usize - '1' as usize));
    }
    bindings(mode)
        .iter()
        .chain(NAVIGATION)
        .find(|(code, _)| *code == key.code)
        .map(|(_, action)| *action)
}

/// One-line key hints for the status bar.
pub fn help(mode: ViewMode) -> &'static str {
    match mode {
        ViewMode::Main => {
            "[↑↓] Navigate  [Enter] Detail  [h] Holders  [s] Source  [m] Compare  [n/b] Recipient/Sender  [1-9] Sort  [a] CSV  [e] JSON  [c] Copy  [esc] Focus  [q] Quit"
        }
        ViewMode::Detail => "[c] Copy  [esc] Focus  [b] Back  [q] Back",
        ViewMode::Holders | ViewMode::Compare => {
            "[↑↓] Navigate  [1-9] Sort  [a] CSV  [e] JSON  [c] Copy  [esc] Focus  [q] Back"
        }
        ViewMode::ContractSource => "[↑↓] Scroll  [s] Save  [esc] Focus  [q] Back",
    }
}
