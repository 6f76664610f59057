use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{
    QueryData, QueryError, QueryFetcher, QueryKey, QueryOptions, QueryResult, QueryStatus,
};

/// What a spawned fetch reports back. `generation` identifies which fetch of
/// the entry this was, so a superseded request can be told apart from the
/// current one.
struct FetchOutcome {
    key: QueryKey,
    generation: u64,
    result: QueryResult,
}

struct QueryEntry {
    fetcher: QueryFetcher,
    options: QueryOptions,
    data: Option<QueryData>,
    error: Option<QueryError>,
    status: QueryStatus,
    fetched_at: Option<Instant>,
    /// Bumped each time a fetch is spawned; outcomes carrying an older
    /// generation are discarded (last request wins).
    generation: u64,
    in_flight: bool,
    subscribers: usize,
    last_used: Instant,
    task: Option<JoinHandle<()>>,
}

impl QueryEntry {
    fn new(fetcher: QueryFetcher, options: QueryOptions, now: Instant) -> Self {
        Self {
            fetcher,
            options,
            data: None,
            error: None,
            status: QueryStatus::Idle,
            fetched_at: None,
            generation: 0,
            in_flight: false,
            subscribers: 1,
            last_used: now,
            task: None,
        }
    }

    fn is_stale(&self, now: Instant) -> bool {
        match self.fetched_at {
            Some(at) => now.duration_since(at) >= self.options.stale_time,
            None => true,
        }
    }
}

/// Snapshot of one query as a view renders it.
pub struct QueryView<'a> {
    pub data: Option<&'a QueryData>,
    pub error: Option<&'a QueryError>,
    /// True only for the first load of a key; background revalidation keeps
    /// showing the previous data instead of a spinner.
    pub is_loading: bool,
}

/// Keyed cache of query results, shared by every page in the process.
///
/// Fetches run as spawned tasks and report back over a channel; [`poll`]
/// applies settled outcomes on the event-loop thread, so all entry mutation
/// is single-threaded. Guarantees, per entry:
///
/// - one in-flight fetch at a time (concurrent subscribers share it)
/// - stale-while-revalidate: a stale hit starts a background refetch but the
///   old value keeps rendering until the new one lands
/// - failed fetches keep the previous data and surface the error beside it
/// - a newer fetch always supersedes an older in-flight one
///
/// [`poll`]: QueryCache::poll
pub struct QueryCache {
    entries: HashMap<QueryKey, QueryEntry>,
    outcome_tx: mpsc::Sender<FetchOutcome>,
    outcome_rx: mpsc::Receiver<FetchOutcome>,
}

impl QueryCache {
    pub fn new() -> Self {
        let (outcome_tx, outcome_rx) = mpsc::channel(64);
        Self {
            entries: HashMap::new(),
            outcome_tx,
            outcome_rx,
        }
    }

    /// Register a subscriber for `key`, fetching if the entry is absent,
    /// stale, or configured to refetch on mount. Disabled queries never
    /// fetch; an already in-flight fetch is shared, not repeated.
    pub fn subscribe<F, Fut>(&mut self, key: QueryKey, options: QueryOptions, fetch: F, now: Instant)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = QueryResult> + Send + 'static,
    {
        let fetcher: QueryFetcher = Arc::new(move || Box::pin(fetch()));

        match self.entries.entry(key.clone()) {
            std::collections::hash_map::Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                entry.fetcher = fetcher;
                entry.options = options;
                entry.subscribers += 1;
                entry.last_used = now;
            }
            std::collections::hash_map::Entry::Vacant(vacant) => {
                vacant.insert(QueryEntry::new(fetcher, options, now));
            }
        }

        let entry = &self.entries[&key];
        let should_fetch = entry.options.enabled
            && !entry.in_flight
            && (entry.data.is_none() || entry.options.refetch_on_mount || entry.is_stale(now));

        if should_fetch {
            self.spawn_fetch(&key);
        }
    }

    /// Drop one subscriber. The entry itself stays cached until its TTL
    /// expires (see [`evict_expired`](QueryCache::evict_expired)).
    pub fn unsubscribe(&mut self, key: &QueryKey, now: Instant) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.subscribers = entry.subscribers.saturating_sub(1);
            entry.last_used = now;
        }
    }

    pub fn view(&self, key: &QueryKey) -> QueryView<'_> {
        match self.entries.get(key) {
            Some(entry) => QueryView {
                data: entry.data.as_ref(),
                error: entry.error.as_ref(),
                is_loading: entry.status == QueryStatus::Loading && entry.data.is_none(),
            },
            None => QueryView {
                data: None,
                error: None,
                is_loading: false,
            },
        }
    }

    pub fn status(&self, key: &QueryKey) -> QueryStatus {
        self.entries
            .get(key)
            .map(|e| e.status)
            .unwrap_or(QueryStatus::Idle)
    }

    /// True while any fetch for `key` is outstanding, including background
    /// revalidation.
    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.entries.get(key).map(|e| e.in_flight).unwrap_or(false)
    }

    pub fn last_fetched_at(&self, key: &QueryKey) -> Option<Instant> {
        self.entries.get(key).and_then(|e| e.fetched_at)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Force a refetch of `key` regardless of freshness. An in-flight fetch
    /// is superseded, not awaited.
    pub fn invalidate(&mut self, key: &QueryKey) {
        match self.entries.get(key) {
            Some(entry) if entry.options.enabled => self.spawn_fetch(key),
            _ => {}
        }
    }

    /// The terminal regained focus: revalidate every live entry that opted in.
    pub fn notify_focus(&mut self) {
        let keys: Vec<QueryKey> = self
            .entries
            .iter()
            .filter(|(_, e)| {
                e.options.refetch_on_focus && e.options.enabled && e.subscribers > 0 && !e.in_flight
            })
            .map(|(key, _)| key.clone())
            .collect();
        for key in keys {
            self.spawn_fetch(&key);
        }
    }

    /// Apply every settled fetch outcome. Returns how many were processed
    /// (applied or discarded as superseded).
    pub fn poll(&mut self, now: Instant) -> usize {
        let mut processed = 0;
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            processed += 1;
            let Some(entry) = self.entries.get_mut(&outcome.key) else {
                continue;
            };
            if outcome.generation != entry.generation {
                tracing::debug!(query = %outcome.key, "discarding superseded fetch result");
                continue;
            }

            entry.in_flight = false;
            entry.task = None;
            match outcome.result {
                Ok(data) => {
                    entry.data = Some(data);
                    entry.error = None;
                    entry.status = QueryStatus::Success;
                    entry.fetched_at = Some(now);
                }
                Err(err) => {
                    // Keep the previous data so the view can show stale
                    // content next to the error.
                    entry.error = Some(err);
                    entry.status = QueryStatus::Error;
                }
            }
        }
        processed
    }

    /// Drop entries with no subscribers that have sat unused past their TTL.
    /// Returns how many were evicted.
    pub fn evict_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, entry| {
            let keep = entry.subscribers > 0
                || entry.in_flight
                || now.duration_since(entry.last_used) < entry.options.cache_time;
            if !keep {
                tracing::debug!(query = %key, "evicting expired cache entry");
            }
            keep
        });
        before - self.entries.len()
    }

    /// Wait for every tracked in-flight fetch to settle. Outcomes still need
    /// a [`poll`](QueryCache::poll) to be applied.
    pub async fn join_in_flight(&mut self) {
        let tasks: Vec<JoinHandle<()>> = self
            .entries
            .values_mut()
            .filter_map(|e| e.task.take())
            .collect();
        for task in tasks {
            let _ = task.await;
        }
    }

    fn spawn_fetch(&mut self, key: &QueryKey) {
        let tx = self.outcome_tx.clone();
        let Some(entry) = self.entries.get_mut(key) else {
            return;
        };

        entry.generation += 1;
        entry.status = QueryStatus::Loading;
        entry.in_flight = true;

        let generation = entry.generation;
        let retries = entry.options.retry;
        let fetcher = entry.fetcher.clone();
        let key = key.clone();
        tracing::debug!(query = %key, generation, "spawning fetch");

        // A superseded task keeps running detached; its outcome fails the
        // generation check in poll() and is dropped there.
        let handle = tokio::spawn(async move {
            let mut attempts = 0u32;
            let result = loop {
                match fetcher().await {
                    Ok(data) => break Ok(data),
                    Err(err) if attempts < retries => {
                        attempts += 1;
                        tracing::debug!(query = %key, attempt = attempts, "fetch failed, retrying: {err}");
                    }
                    Err(err) => break Err(err),
                }
            };
            // Send fails only when the cache itself is gone.
            let _ = tx
                .send(FetchOutcome {
                    key,
                    generation,
                    result,
                })
                .await;
        });
        entry.task = Some(handle);
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}
