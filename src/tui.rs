//! Terminal runtime: owns the terminal, feeds key presses and task results
//! into the browser reducer and executes the commands it returns.

use std::future::Future;
use std::io::stdout;
use std::time::Duration;

use anyhow::Result;
use futures::stream::{self, StreamExt};
use ratatui::{
    crossterm::{
        event::{self, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    },
    prelude::*,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::api::hiro::{AddressTransactions, HiroClient};
use crate::app::{Browser, Command, Event};
use crate::error::Error;
use crate::export;
use crate::fetch::{self, CancelToken, CursorSource, FetchOptions, Fetcher, OffsetSource};
use crate::keymap;
use crate::project::{
    aggregate_balances, compare_holders, BalanceKind, BalanceProjector, CompareProjector,
    HolderProjector, Projector, Row, TransactionProjector,
};
use crate::ui;

/// Loaded rows, or the message to show on the status line.
pub type RowsResult = std::result::Result<Vec<Row>, String>;

/// What spawned commands need to reach the backends.
#[derive(Debug, Clone)]
pub struct Services {
    pub hiro: HiroClient,
    pub cancel: CancelToken,
    pub options: FetchOptions,
}

impl Services {
    pub fn new(hiro: HiroClient, options: FetchOptions) -> Self {
        Self {
            hiro,
            cancel: CancelToken::new(),
            options,
        }
    }

    /// A fresh fetcher tied to the session's cancel token.
    pub fn fetcher(&self) -> Fetcher {
        Fetcher::new(self.options.clone()).with_cancel(self.cancel.clone())
    }

    /// Bound a one-shot request by the session's cancel token and the
    /// configured round timeout.
    pub fn guarded<F, T>(
        &self,
        request: F,
    ) -> impl Future<Output = crate::error::Result<T>> + Send + 'static
    where
        F: Future<Output = crate::error::Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let cancel = self.cancel.clone();
        let timeout = self.options.round_timeout;
        async move { fetch::guarded(&cancel, timeout, request).await }
    }
}

/// Fetch every record of an offset source and project it.
pub async fn load_offset<S, P>(mut fetcher: Fetcher, source: S, projector: P) -> RowsResult
where
    S: OffsetSource,
    P: Projector<Record = S::Record>,
{
    fetcher
        .fetch_offset(&source)
        .await
        .map(|result| projector.project_all(&result.records))
        .map_err(|e| e.to_string())
}

pub async fn load_cursor<S, P>(mut fetcher: Fetcher, source: S, projector: P) -> RowsResult
where
    S: CursorSource,
    P: Projector<Record = S::Record>,
{
    fetcher
        .fetch_cursor(&source)
        .await
        .map(|result| projector.project_all(&result.records))
        .map_err(|e| e.to_string())
}

/// Run the browser until the user quits. `initial` produces the main rows.
pub async fn run<F>(mut browser: Browser, services: Services, initial: F) -> Result<()>
where
    F: Future<Output = RowsResult> + Send + 'static,
{
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let (tx, mut rx) = mpsc::channel::<Event>(10);

    if !browser.is_loading() {
        browser.set_loading(format!("Loading {}...", browser.title));
    }
    let loader = tx.clone();
    tokio::spawn(async move {
        let rows = initial.await;
        let _ = loader.send(Event::RowsLoaded(rows)).await;
    });

    let result = run_event_loop(&mut terminal, &mut browser, &services, tx, &mut rx).await;

    services.cancel.cancel();
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    browser: &mut Browser,
    services: &Services,
    tx: mpsc::Sender<Event>,
    rx: &mut mpsc::Receiver<Event>,
) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::draw(frame, browser))?;

        // Check for async results
        while let Ok(event) = rx.try_recv() {
            let command = browser.update(event);
            dispatch(browser, services, &tx, command);
        }

        // Poll for input events
        if event::poll(Duration::from_millis(50))? {
            if let event::Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if let Some(action) = keymap::action_for(browser.mode(), &key) {
                    let command = browser.update(Event::Action(action));
                    dispatch(browser, services, &tx, command);
                }
            }
        }

        if browser.should_quit {
            break;
        }
    }

    Ok(())
}

/// Execute `command` and any follow-ups. Synchronous commands report back
/// immediately; fetches report through `tx`.
pub fn dispatch(
    browser: &mut Browser,
    services: &Services,
    tx: &mpsc::Sender<Event>,
    command: Option<Command>,
) {
    let mut pending = command;
    while let Some(command) = pending.take() {
        if let Some(event) = execute(command, services, tx) {
            pending = browser.update(event);
        }
    }
}

fn execute(command: Command, services: &Services, tx: &mpsc::Sender<Event>) -> Option<Event> {
    match command {
        Command::FetchHolders {
            contract_id,
            decimals,
        } => {
            let client = services.hiro.clone();
            let id = contract_id.clone();
            let request = services.guarded(async move { client.holders(&id, None).await });
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = request
                    .await
                    .map(|holders| HolderProjector { decimals }.project_all(&holders))
                    .map_err(|e| e.to_string());
                let _ = tx
                    .send(Event::HoldersLoaded {
                        contract_id,
                        result,
                    })
                    .await;
            });
            None
        }
        Command::FetchSource {
            contract_id,
            file_stem,
        } => {
            let client = services.hiro.clone();
            let id = contract_id.clone();
            let request = services.guarded(async move { client.contract_source(&id).await });
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = request.await.map_err(|e| e.to_string());
                let _ = tx
                    .send(Event::SourceLoaded {
                        contract_id,
                        file_stem,
                        result,
                    })
                    .await;
            });
            None
        }
        Command::FetchCompare {
            contract_id,
            first,
            second,
            decimals,
        } => {
            let client = services.hiro.clone();
            let id = contract_id.clone();
            let request = services.guarded(async move {
                compare_rows(&client, &id, first, second, decimals).await
            });
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = request.await.map_err(|e| e.to_string());
                let _ = tx
                    .send(Event::CompareLoaded {
                        contract_id,
                        first,
                        second,
                        result,
                    })
                    .await;
            });
            None
        }
        Command::FetchTransactions { principal } => {
            let source = AddressTransactions::new(services.hiro.clone(), principal.clone());
            let fetcher = services.fetcher();
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = load_offset(fetcher, source, TransactionProjector).await;
                let _ = tx
                    .send(Event::TransactionsLoaded { principal, result })
                    .await;
            });
            None
        }
        Command::Export {
            headers,
            rows,
            path,
            format,
        } => {
            let result = export::export(&headers, &rows, &path, format)
                .map(|()| path)
                .map_err(|e| e.to_string());
            Some(Event::Exported(result))
        }
        Command::SaveSource { path, source } => {
            let result = write_source(&path, &source)
                .map(|()| path)
                .map_err(|e| e.to_string());
            Some(Event::SourceSaved(result))
        }
        Command::Copy(text) => {
            let result = copy_to_clipboard(&text)
                .map(|()| text)
                .map_err(|e| e.to_string());
            Some(Event::Copied(result))
        }
        Command::Quit => {
            info!("quit requested, cancelling in-flight fetches");
            services.cancel.cancel();
            None
        }
    }
}

/// Holder balances at two heights, joined by address.
pub async fn compare_rows(
    client: &HiroClient,
    contract_id: &str,
    first: u64,
    second: u64,
    decimals: u32,
) -> crate::error::Result<Vec<Row>> {
    let (at_first, at_second) = tokio::try_join!(
        client.holders(contract_id, Some(first)),
        client.holders(contract_id, Some(second)),
    )?;
    let deltas = compare_holders(&at_first, &at_second);
    debug!(contract_id, holders = deltas.len(), "holder compare joined");
    Ok(CompareProjector { decimals }.project_all(&deltas))
}

/// Balances summed over `principals`. Fungible tokens are labelled with
/// their contract's `get-name`, looked up `width` at a time; failed lookups
/// leave the label empty.
pub async fn balance_rows(
    client: &HiroClient,
    principals: &[String],
    width: usize,
) -> crate::error::Result<Vec<Row>> {
    let wallets =
        futures::future::try_join_all(principals.iter().map(|p| client.balances(p))).await?;
    let mut balances = aggregate_balances(&wallets);

    let lookups: Vec<_> = balances
        .iter()
        .map(|balance| async move {
            let contract_id = match (balance.kind, &balance.contract_id) {
                (BalanceKind::Fungible, Some(id)) => id,
                _ => return None,
            };
            match client.token_display_name(contract_id).await {
                Ok(name) => Some(name.trim().to_string()),
                Err(e) => {
                    debug!(%contract_id, error = %e, "no display name");
                    None
                }
            }
        })
        .collect();
    let names: Vec<Option<String>> = stream::iter(lookups)
        .buffered(width.max(1))
        .collect()
        .await;
    for (balance, name) in balances.iter_mut().zip(names) {
        balance.display_name = name;
    }

    info!(
        wallets = principals.len(),
        assets = balances.len(),
        "wallet balances aggregated"
    );
    Ok(BalanceProjector.project_all(&balances))
}

fn write_source(path: &std::path::Path, source: &str) -> crate::error::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    std::fs::write(path, source).map_err(|e| Error::io(path, e))?;
    info!(path = %path.display(), "contract source saved");
    Ok(())
}

fn copy_to_clipboard(text: &str) -> crate::error::Result<()> {
    let mut clipboard = arboard::Clipboard::new().map_err(|e| Error::Clipboard(e.to_string()))?;
    clipboard
        .set_text(text.to_string())
        .map_err(|e| Error::Clipboard(e.to_string()))
}
