//! Concurrent paginated fetcher.
//!
//! Offset sources are pulled in rounds of `width` concurrent page requests;
//! a round is fully awaited (or fails) before the next one starts. Cursor
//! sources are followed one page at a time. Every round races a
//! [`CancelToken`] and an optional deadline.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// A record with a source-defined stable identity.
pub trait Keyed {
    fn key(&self) -> String;
}

/// One offset-addressed page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<R> {
    pub records: Vec<R>,
    pub offset: usize,
    pub limit: usize,
    /// Authoritative upper bound, for backends that report one.
    pub total: Option<usize>,
}

/// One cursor-addressed page. `next` is `None` once the backend reports no more data.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorPage<R, C> {
    pub records: Vec<R>,
    pub next: Option<C>,
}

/// A remote collection addressed by `offset` / `limit`.
pub trait OffsetSource: Sync {
    type Record: Keyed + Send;

    fn fetch_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> impl Future<Output = Result<Page<Self::Record>>> + Send;
}

/// A remote collection addressed by an opaque continuation cursor.
pub trait CursorSource: Sync {
    type Record: Keyed + Send;
    type Cursor: Send;

    /// `None` requests the first page.
    fn fetch_page(
        &self,
        cursor: Option<Self::Cursor>,
    ) -> impl Future<Output = Result<CursorPage<Self::Record, Self::Cursor>>> + Send;
}

/// Cloneable cancellation flag shared between the UI loop and fetch tasks.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called on any clone.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Page size sent as `limit`.
    pub limit: usize,
    /// Concurrent requests per round.
    pub width: usize,
    /// Re-order each round by page offset instead of completion order.
    pub order_by_offset: bool,
    pub round_timeout: Option<Duration>,
}

impl FetchOptions {
    pub fn new(limit: usize, width: usize) -> Self {
        Self {
            limit,
            width,
            ..Self::default()
        }
    }

    pub fn ordered(mut self) -> Self {
        self.order_by_offset = true;
        self
    }

    pub fn with_round_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.round_timeout = timeout;
        self
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            limit: 50,
            width: 5,
            order_by_offset: false,
            round_timeout: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Idle,
    Fetching { round: usize, fetched: usize },
    Completed { rounds: usize, records: usize },
    Failed,
}

/// Records collected across all pages of one fetch, keys unique.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult<R> {
    pub records: Vec<R>,
    pub rounds: usize,
    /// The first total reported by the backend, if any.
    pub total: Option<usize>,
}

impl<R> FetchResult<R> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<R> {
        self.records
    }
}

/// Drives one fetch to completion. Single use: once `Completed` or `Failed`
/// a fetcher refuses to start again.
#[derive(Debug)]
pub struct Fetcher {
    options: FetchOptions,
    cancel: CancelToken,
    state: FetchState,
}

impl Fetcher {
    pub fn new(options: FetchOptions) -> Self {
        Self {
            options,
            cancel: CancelToken::new(),
            state: FetchState::Idle,
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn state(&self) -> FetchState {
        self.state
    }

    pub async fn fetch_offset<S: OffsetSource>(
        &mut self,
        source: &S,
    ) -> Result<FetchResult<S::Record>> {
        self.begin()?;
        let outcome = self.run_offset(source).await;
        self.finish(outcome)
    }

    pub async fn fetch_cursor<S: CursorSource>(
        &mut self,
        source: &S,
    ) -> Result<FetchResult<S::Record>> {
        self.begin()?;
        let outcome = self.run_cursor(source).await;
        self.finish(outcome)
    }

    fn begin(&mut self) -> Result<()> {
        match self.state {
            FetchState::Idle => {
                self.state = FetchState::Fetching {
                    round: 0,
                    fetched: 0,
                };
                Ok(())
            }
            other => Err(Error::validation(format!(
                "fetcher cannot be restarted from state {other:?}"
            ))),
        }
    }

    fn finish<R>(&mut self, outcome: Result<FetchResult<R>>) -> Result<FetchResult<R>> {
        match outcome {
            Ok(result) => {
                self.state = FetchState::Completed {
                    rounds: result.rounds,
                    records: result.records.len(),
                };
                info!(
                    rounds = result.rounds,
                    records = result.records.len(),
                    total = ?result.total,
                    "fetch completed"
                );
                Ok(result)
            }
            Err(e) => {
                self.state = FetchState::Failed;
                warn!(error = %e, "fetch failed");
                Err(Error::fetch_failed(e))
            }
        }
    }

    async fn run_offset<S: OffsetSource>(&mut self, source: &S) -> Result<FetchResult<S::Record>> {
        let limit = self.options.limit.max(1);
        let width = self.options.width.max(1);
        let mut offset = 0;
        let mut collector = Collector::default();
        let mut total: Option<usize> = None;
        let mut fetched = 0;
        let mut rounds = 0;

        loop {
            rounds += 1;
            self.state = FetchState::Fetching {
                round: rounds,
                fetched,
            };

            let offsets: Vec<usize> = (0..width).map(|i| offset + i * limit).collect();
            debug!(round = rounds, ?offsets, "starting fetch round");

            let mut pages = self.guard(offset_round(source, &offsets, limit)).await?;
            if self.options.order_by_offset {
                pages.sort_by_key(|page| page.offset);
            }

            let mut round_records = 0;
            let mut short_page = false;
            for page in pages {
                // First reported total wins for the rest of the fetch.
                if total.is_none() {
                    total = page.total;
                }
                short_page |= page.records.len() < limit;
                round_records += page.records.len();
                collector.extend(page.records);
            }
            fetched += round_records;
            offset += width * limit;

            let reached_end = match total {
                Some(total) => fetched >= total,
                None => short_page,
            };
            if reached_end || round_records == 0 {
                break;
            }
        }

        Ok(FetchResult {
            records: collector.records,
            rounds,
            total,
        })
    }

    async fn run_cursor<S: CursorSource>(&mut self, source: &S) -> Result<FetchResult<S::Record>> {
        let mut collector = Collector::default();
        let mut cursor = None;
        let mut fetched = 0;
        let mut rounds = 0;

        loop {
            rounds += 1;
            self.state = FetchState::Fetching {
                round: rounds,
                fetched,
            };
            debug!(round = rounds, "requesting cursor page");

            let page = self.guard(source.fetch_page(cursor.take())).await?;
            let empty = page.records.is_empty();
            fetched += page.records.len();
            collector.extend(page.records);

            match page.next {
                Some(next) if !empty => cursor = Some(next),
                _ => break,
            }
        }

        Ok(FetchResult {
            records: collector.records,
            rounds,
            total: None,
        })
    }

    async fn guard<T>(&self, round: impl Future<Output = Result<T>>) -> Result<T> {
        guarded(&self.cancel, self.options.round_timeout, round).await
    }
}

/// Race a request against cancellation and an optional deadline.
///
/// Cancellation wins ties. A missed deadline yields [`Error::Timeout`].
pub async fn guarded<T>(
    cancel: &CancelToken,
    timeout: Option<Duration>,
    request: impl Future<Output = Result<T>>,
) -> Result<T> {
    let bounded = async {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .map_err(|_| Error::Timeout(limit))?,
            None => request.await,
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = bounded => result,
    }
}

/// Issue one request per offset concurrently; the first error aborts the
/// round and drops the requests still in flight.
async fn offset_round<S: OffsetSource>(
    source: &S,
    offsets: &[usize],
    limit: usize,
) -> Result<Vec<Page<S::Record>>> {
    let mut in_flight: FuturesUnordered<_> = offsets
        .iter()
        .map(|&offset| async move {
            let page = source.fetch_page(offset, limit).await?;
            Ok::<_, Error>(Page { offset, ..page })
        })
        .collect();

    let mut pages = Vec::with_capacity(offsets.len());
    while let Some(page) = in_flight.next().await {
        pages.push(page?);
    }
    Ok(pages)
}

struct Collector<R> {
    seen: HashSet<String>,
    records: Vec<R>,
}

impl<R> Default for Collector<R> {
    fn default() -> Self {
        Self {
            seen: HashSet::new(),
            records: Vec::new(),
        }
    }
}

impl<R: Keyed> Collector<R> {
    fn extend(&mut self, records: Vec<R>) {
        for record in records {
            if self.seen.insert(record.key()) {
                self.records.push(record);
            }
        }
    }
}
