//! Table browser state machine.
//!
//! [`Browser::update`] is a pure reducer: it mutates view state and returns
//! at most one [`Command`] for the runtime to execute. Results of those
//! commands come back as [`Event`]s.

use std::cmp::Ordering;
use std::path::PathBuf;

use crate::export::ExportFormat;
use crate::keymap::Action;
use crate::project::{Projector, Row, RowAction, COMPARE_HEADERS, HOLDER_HEADERS};
use crate::store::transactions_key;

/// Rows moved per PgUp / PgDn.
pub const PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Main,
    Detail,
    Holders,
    ContractSource,
    Compare,
}

impl ViewMode {
    pub fn has_table(self) -> bool {
        matches!(self, Self::Main | Self::Holders | Self::Compare)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortState {
    pub last_sorted_column: Option<usize>,
    pub ascending: bool,
}

impl SortState {
    /// Same column flips direction; a new column starts ascending.
    pub fn toggle(&mut self, column: usize) {
        if self.last_sorted_column == Some(column) {
            self.ascending = !self.ascending;
        } else {
            self.last_sorted_column = Some(column);
            self.ascending = true;
        }
    }
}

/// Numeric when both cells parse as `f64`, lexical otherwise.
pub fn compare_cells(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.cmp(b),
    }
}

/// Stable sort of `rows` on `column`.
pub fn sort_rows(rows: &mut Vec<Row>, column: usize, ascending: bool) {
    let cmp = |a: &Row, b: &Row| {
        let ord = compare_cells(a.cell(column).unwrap_or(""), b.cell(column).unwrap_or(""));
        if ascending {
            ord
        } else {
            ord.reverse()
        }
    };
    *rows = merge_sort(std::mem::take(rows), &cmp);
}

// Mixed numeric/lexical comparison is not a total order, which `slice::sort_by`
// may reject; a merge sort only needs each pairwise answer.
fn merge_sort<T>(mut items: Vec<T>, cmp: &impl Fn(&T, &T) -> Ordering) -> Vec<T> {
    if items.len() <= 1 {
        return items;
    }
    let right = items.split_off(items.len() / 2);
    let mut left = merge_sort(items, cmp).into_iter().peekable();
    let mut right = merge_sort(right, cmp).into_iter().peekable();

    let mut merged = Vec::with_capacity(left.len() + right.len());
    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => cmp(r, l) == Ordering::Less,
            _ => break,
        };
        merged.extend(if take_right { right.next() } else { left.next() });
    }
    merged.extend(left);
    merged.extend(right);
    merged
}

/// Rows with a header, a selection and their own sort state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableView {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
    pub sort: SortState,
    pub selected: usize,
}

impl TableView {
    pub fn new(headers: &[&str], rows: Vec<Row>) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows,
            sort: SortState::default(),
            selected: 0,
        }
    }

    pub fn set_rows(&mut self, rows: Vec<Row>) {
        self.rows = rows;
        self.selected = 0;
        if let Some(column) = self.sort.last_sorted_column {
            sort_rows(&mut self.rows, column, self.sort.ascending);
        }
    }

    /// Ignored for columns past the header.
    pub fn sort_by(&mut self, column: usize) -> bool {
        if column >= self.headers.len() {
            return false;
        }
        self.sort.toggle(column);
        sort_rows(&mut self.rows, column, self.sort.ascending);
        true
    }

    pub fn selected_row(&self) -> Option<&Row> {
        self.rows.get(self.selected)
    }

    pub fn cells(&self) -> Vec<Vec<String>> {
        self.rows.iter().map(|row| row.cells.clone()).collect()
    }

    fn navigate(&mut self, action: Action) {
        let last = self.rows.len().saturating_sub(1);
        self.selected = match action {
            Action::Up => self.selected.saturating_sub(1),
            Action::Down => (self.selected + 1).min(last),
            Action::PageUp => self.selected.saturating_sub(PAGE_SIZE),
            Action::PageDown => (self.selected + PAGE_SIZE).min(last),
            Action::Top => 0,
            Action::Bottom => last,
            _ => self.selected,
        };
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubView {
    Detail {
        headers: Vec<String>,
        row: Row,
    },
    Holders {
        contract_id: String,
        table: TableView,
    },
    ContractSource {
        contract_id: String,
        file_stem: String,
        source: String,
        scroll: u16,
    },
    Compare {
        contract_id: String,
        first: u64,
        second: u64,
        table: TableView,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Info(String),
    Error(String),
}

impl Status {
    pub fn message(&self) -> &str {
        match self {
            Self::Info(msg) | Self::Error(msg) => msg,
        }
    }
}

/// Inputs to the reducer. Async results carry preformatted error strings.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Action(Action),
    RowsLoaded(Result<Vec<Row>, String>),
    HoldersLoaded {
        contract_id: String,
        result: Result<Vec<Row>, String>,
    },
    SourceLoaded {
        contract_id: String,
        file_stem: String,
        result: Result<String, String>,
    },
    CompareLoaded {
        contract_id: String,
        first: u64,
        second: u64,
        result: Result<Vec<Row>, String>,
    },
    /// Replaces the main table; sent after a pivot.
    TransactionsLoaded {
        principal: String,
        result: Result<Vec<Row>, String>,
    },
    Exported(Result<PathBuf, String>),
    SourceSaved(Result<PathBuf, String>),
    Copied(Result<String, String>),
}

/// Side effects requested by the reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    FetchHolders {
        contract_id: String,
        decimals: u32,
    },
    FetchSource {
        contract_id: String,
        file_stem: String,
    },
    FetchCompare {
        contract_id: String,
        first: u64,
        second: u64,
        decimals: u32,
    },
    FetchTransactions {
        principal: String,
    },
    Export {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
        path: PathBuf,
        format: ExportFormat,
    },
    SaveSource {
        path: PathBuf,
        source: String,
    },
    Copy(String),
    Quit,
}

pub struct Browser {
    pub title: String,
    pub export_stem: String,
    pub export_dir: PathBuf,
    pub main: TableView,
    pub sub: Option<SubView>,
    pub actions: &'static [RowAction],
    pub focused: bool,
    /// Set while a fetch is in flight; only quit is accepted.
    pub loading: Option<String>,
    pub status: Option<Status>,
    pub compare_heights: Option<(u64, u64)>,
    pub should_quit: bool,
}

impl Browser {
    pub fn new(
        title: impl Into<String>,
        export_stem: impl Into<String>,
        headers: &[&str],
        actions: &'static [RowAction],
    ) -> Self {
        Self {
            title: title.into(),
            export_stem: export_stem.into(),
            export_dir: PathBuf::from("."),
            main: TableView::new(headers, Vec::new()),
            sub: None,
            actions,
            focused: true,
            loading: None,
            status: None,
            compare_heights: None,
            should_quit: false,
        }
    }

    pub fn for_projector<P: Projector>(
        projector: &P,
        title: impl Into<String>,
        export_stem: impl Into<String>,
    ) -> Self {
        Self::new(title, export_stem, projector.headers(), projector.actions())
    }

    pub fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.main.set_rows(rows);
        self
    }

    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    pub fn with_compare_heights(mut self, heights: Option<(u64, u64)>) -> Self {
        self.compare_heights = heights;
        self
    }

    pub fn set_loading(&mut self, message: impl Into<String>) {
        self.loading = Some(message.into());
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    pub fn mode(&self) -> ViewMode {
        match &self.sub {
            None => ViewMode::Main,
            Some(SubView::Detail { .. }) => ViewMode::Detail,
            Some(SubView::Holders { .. }) => ViewMode::Holders,
            Some(SubView::ContractSource { .. }) => ViewMode::ContractSource,
            Some(SubView::Compare { .. }) => ViewMode::Compare,
        }
    }

    /// The table that navigation, sort and export act on.
    pub fn active_table(&self) -> Option<&TableView> {
        match &self.sub {
            None => Some(&self.main),
            Some(SubView::Holders { table, .. } | SubView::Compare { table, .. }) => Some(table),
            Some(_) => None,
        }
    }

    fn active_table_mut(&mut self) -> Option<&mut TableView> {
        match &mut self.sub {
            None => Some(&mut self.main),
            Some(SubView::Holders { table, .. } | SubView::Compare { table, .. }) => Some(table),
            Some(_) => None,
        }
    }

    fn set_info(&mut self, message: impl Into<String>) {
        self.status = Some(Status::Info(message.into()));
    }

    fn set_error(&mut self, message: impl Into<String>) {
        self.status = Some(Status::Error(message.into()));
    }

    pub fn update(&mut self, event: Event) -> Option<Command> {
        match event {
            Event::Action(action) => self.handle_action(action),
            Event::RowsLoaded(result) => {
                self.loading = None;
                match result {
                    Ok(rows) => {
                        self.main.set_rows(rows);
                        self.status = None;
                    }
                    Err(e) => self.set_error(e),
                }
                None
            }
            Event::HoldersLoaded {
                contract_id,
                result,
            } => {
                self.loading = None;
                match result {
                    Ok(rows) => {
                        self.sub = Some(SubView::Holders {
                            contract_id,
                            table: TableView::new(HOLDER_HEADERS, rows),
                        });
                    }
                    Err(e) => self.fail_drill_down(format!("holders for {contract_id}: {e}")),
                }
                None
            }
            Event::SourceLoaded {
                contract_id,
                file_stem,
                result,
            } => {
                self.loading = None;
                match result {
                    Ok(source) => {
                        self.sub = Some(SubView::ContractSource {
                            contract_id,
                            file_stem,
                            source,
                            scroll: 0,
                        });
                    }
                    Err(e) => self.fail_drill_down(format!("source for {contract_id}: {e}")),
                }
                None
            }
            Event::CompareLoaded {
                contract_id,
                first,
                second,
                result,
            } => {
                self.loading = None;
                match result {
                    Ok(rows) => {
                        self.sub = Some(SubView::Compare {
                            contract_id,
                            first,
                            second,
                            table: TableView::new(COMPARE_HEADERS, rows),
                        });
                    }
                    Err(e) => self.fail_drill_down(format!("compare for {contract_id}: {e}")),
                }
                None
            }
            Event::TransactionsLoaded { principal, result } => {
                self.loading = None;
                match result {
                    Ok(rows) => {
                        self.title = format!("Transactions of {principal}");
                        self.export_stem = transactions_key(&principal);
                        self.main.set_rows(rows);
                        self.status = None;
                    }
                    Err(e) => self.set_error(format!("transactions of {principal}: {e}")),
                }
                None
            }
            Event::Exported(result) => {
                match result {
                    Ok(path) => self.set_info(format!("Exported to {}", path.display())),
                    Err(e) => self.set_error(format!("Export failed: {e}")),
                }
                None
            }
            Event::SourceSaved(result) => {
                match result {
                    Ok(path) => self.set_info(format!("Saved {}", path.display())),
                    Err(e) => self.set_error(format!("Save failed: {e}")),
                }
                None
            }
            Event::Copied(result) => {
                match result {
                    Ok(text) => self.set_info(format!("Copied {text}")),
                    Err(e) => self.set_error(format!("Copy failed: {e}")),
                }
                None
            }
        }
    }

    fn fail_drill_down(&mut self, message: String) {
        self.sub = None;
        self.set_error(message);
    }

    fn handle_action(&mut self, action: Action) -> Option<Command> {
        if action == Action::Quit {
            self.should_quit = true;
            return Some(Command::Quit);
        }
        if self.is_loading() {
            return None;
        }

        match action {
            Action::Back => {
                self.sub = None;
                None
            }
            Action::ToggleFocus => {
                self.focused = !self.focused;
                None
            }
            Action::ExportCsv => self.export(ExportFormat::Csv),
            Action::ExportJson => self.export(ExportFormat::Json),
            Action::SaveSource => self.save_source(),
            _ if !self.focused => None,
            Action::Up
            | Action::Down
            | Action::PageUp
            | Action::PageDown
            | Action::Top
            | Action::Bottom => {
                self.navigate(action);
                None
            }
            Action::Sort(column) => {
                if let Some(table) = self.active_table_mut() {
                    table.sort_by(column);
                }
                None
            }
            Action::Copy => self.copy(),
            Action::Detail => self.open_detail(),
            Action::Holders => self.request_holders(),
            Action::Source => self.request_source(),
            Action::Compare => self.request_compare(),
            Action::PivotRecipient => self.request_pivot(true),
            Action::PivotSender => self.request_pivot(false),
            Action::Quit => None,
        }
    }

    fn navigate(&mut self, action: Action) {
        if let Some(SubView::ContractSource { source, scroll, .. }) = &mut self.sub {
            let max = u16::try_from(source.lines().count().saturating_sub(1)).unwrap_or(u16::MAX);
            let page = PAGE_SIZE as u16;
            *scroll = match action {
                Action::Up => scroll.saturating_sub(1),
                Action::Down => scroll.saturating_add(1).min(max),
                Action::PageUp => scroll.saturating_sub(page),
                Action::PageDown => scroll.saturating_add(page).min(max),
                Action::Top => 0,
                Action::Bottom => max,
                _ => *scroll,
            };
            return;
        }
        if let Some(table) = self.active_table_mut() {
            table.navigate(action);
        }
    }

    fn selected_main_row(&self) -> Option<&Row> {
        match self.mode() {
            ViewMode::Main => self.main.selected_row(),
            _ => None,
        }
    }

    fn supports(&mut self, action: RowAction, label: &str) -> bool {
        if self.actions.contains(&action) {
            true
        } else {
            self.set_info(format!("{label} not available for {}", self.title));
            false
        }
    }

    fn open_detail(&mut self) -> Option<Command> {
        let row = self.selected_main_row()?.clone();
        self.sub = Some(SubView::Detail {
            headers: self.main.headers.clone(),
            row,
        });
        None
    }

    fn request_holders(&mut self) -> Option<Command> {
        if !self.supports(RowAction::Holders, "Holders") {
            return None;
        }
        let keys = &self.selected_main_row()?.keys;
        let contract_id = keys.contract_id.clone()?;
        let decimals = keys.decimals.unwrap_or(0);
        self.set_loading(format!("Fetching holders for {contract_id}..."));
        Some(Command::FetchHolders {
            contract_id,
            decimals,
        })
    }

    fn request_source(&mut self) -> Option<Command> {
        if !self.supports(RowAction::Source, "Contract source") {
            return None;
        }
        let keys = &self.selected_main_row()?.keys;
        let contract_id = keys.contract_id.clone()?;
        let file_stem = format!(
            "{}-{}-{}",
            keys.name.as_deref().unwrap_or_default(),
            keys.symbol.as_deref().unwrap_or_default(),
            contract_id
        );
        self.set_loading(format!("Fetching source for {contract_id}..."));
        Some(Command::FetchSource {
            contract_id,
            file_stem,
        })
    }

    fn request_compare(&mut self) -> Option<Command> {
        if !self.supports(RowAction::Compare, "Holder compare") {
            return None;
        }
        let Some((first, second)) = self.compare_heights else {
            self.set_error("Holder compare needs --first and --second block heights");
            return None;
        };
        let keys = &self.selected_main_row()?.keys;
        let contract_id = keys.contract_id.clone()?;
        let decimals = keys.decimals.unwrap_or(0);
        self.set_loading(format!(
            "Comparing holders of {contract_id} at {first} and {second}..."
        ));
        Some(Command::FetchCompare {
            contract_id,
            first,
            second,
            decimals,
        })
    }

    fn request_pivot(&mut self, to_recipient: bool) -> Option<Command> {
        if !self.supports(RowAction::Pivot, "Transaction pivot") {
            return None;
        }
        let keys = &self.selected_main_row()?.keys;
        let (principal, role) = if to_recipient {
            (keys.recipient.clone(), "recipient")
        } else {
            (keys.address.clone(), "sender")
        };
        let Some(principal) = principal else {
            self.set_info(format!("Selected transaction has no {role}"));
            return None;
        };
        self.set_loading(format!("Fetching transactions of {principal}..."));
        Some(Command::FetchTransactions { principal })
    }

    fn export(&mut self, format: ExportFormat) -> Option<Command> {
        let stem = match &self.sub {
            None => self.export_stem.clone(),
            Some(SubView::Holders { contract_id, .. }) => format!("{contract_id}-holders"),
            Some(SubView::Compare {
                contract_id,
                first,
                second,
                ..
            }) => format!("{contract_id}-compare-{first}-{second}"),
            Some(_) => return None,
        };
        let table = self.active_table()?;
        Some(Command::Export {
            headers: table.headers.clone(),
            rows: table.cells(),
            path: self.export_dir.join(format!("{stem}.{}", format.extension())),
            format,
        })
    }

    fn save_source(&mut self) -> Option<Command> {
        let Some(SubView::ContractSource {
            file_stem, source, ..
        }) = &self.sub
        else {
            return None;
        };
        Some(Command::SaveSource {
            path: self.export_dir.join(format!("{file_stem}.clar")),
            source: source.clone(),
        })
    }

    fn copy(&mut self) -> Option<Command> {
        let row = match &self.sub {
            Some(SubView::Detail { row, .. }) => Some(row),
            Some(SubView::ContractSource { .. }) => None,
            _ => self.active_table().and_then(TableView::selected_row),
        }?;
        row.copy_text().map(Command::Copy)
    }
}
