//! The incremental list synchronizer.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::Result;
use crate::record::{Identified, PushEvent};
use crate::traits::{Gateway, PushChannel};
use crate::types::{Cursor, EntityName};

use super::collection::{Collection, Upsert};
use super::config::{ApplyOrder, PushPolicy, SyncConfig};
use super::notice::{LogNotifier, Notice, Notifier};

/// Observable state of a list instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Paged view shown, nothing in flight.
    Idle,
    /// A page request is in flight.
    Loading,
    /// Search results shown.
    SearchActive,
    /// A search request is in flight.
    SearchLoading,
}

/// What a page or search request ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The response was merged. For pages `added` is the number of new
    /// records; for searches it is the size of the result set.
    Applied { added: usize },
    /// No request was issued.
    Skipped,
    /// The request failed; state is unchanged and a notice was sent.
    Failed,
    /// The response arrived but was no longer relevant (unmounted list,
    /// superseded search, or an out-of-order page under `Sequenced`).
    Discarded,
}

/// What a push event did to the paged collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Inserted,
    Replaced,
    /// The event belongs to a different entity stream.
    Ignored,
    /// The list has been unmounted.
    Discarded,
}

impl From<Upsert> for PushOutcome {
    fn from(upsert: Upsert) -> Self {
        match upsert {
            Upsert::Inserted => PushOutcome::Inserted,
            Upsert::Replaced => PushOutcome::Replaced,
        }
    }
}

/// Snapshot handed to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ListView<T> {
    /// The authoritative collection: search results while a search is
    /// active, the paged collection otherwise.
    pub items: Vec<T>,
    /// The active search query, if any.
    pub query: Option<String>,
    pub phase: Phase,
    pub loading: bool,
    pub total: u64,
    pub cursor: Cursor,
    /// Whether the trailing load-more sentinel should be rendered.
    pub has_more: bool,
}

/// Per-instance context: configuration and where notices go.
#[derive(Clone)]
pub struct ListContext {
    pub config: SyncConfig,
    pub notifier: Arc<dyn Notifier>,
}

impl ListContext {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            notifier: Arc::new(LogNotifier),
        }
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }
}

impl Default for ListContext {
    fn default() -> Self {
        Self::new(SyncConfig::default())
    }
}

impl std::fmt::Debug for ListContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

struct SearchSession<T: Identified> {
    query: String,
    items: Collection<T>,
}

struct ListState<T: Identified> {
    mounted: bool,
    items: Collection<T>,
    cursor: Cursor,
    total: u64,
    search: Option<SearchSession<T>>,
    pages_in_flight: usize,
    search_loading: bool,
    /// Last issued page request.
    page_seq: u64,
    /// Newest page request that has been applied.
    applied_page_seq: u64,
    /// Last issued search request; bumping it invalidates older ones.
    search_seq: u64,
}

impl<T: Identified> ListState<T> {
    fn new(cursor: Cursor) -> Self {
        Self {
            mounted: true,
            items: Collection::new(),
            cursor,
            total: 0,
            search: None,
            pages_in_flight: 0,
            search_loading: false,
            page_seq: 0,
            applied_page_seq: 0,
            search_seq: 0,
        }
    }

    fn loading(&self) -> bool {
        self.pages_in_flight > 0 || self.search_loading
    }

    fn phase(&self) -> Phase {
        if self.search_loading {
            Phase::SearchLoading
        } else if self.search.is_some() {
            Phase::SearchActive
        } else if self.pages_in_flight > 0 {
            Phase::Loading
        } else {
            Phase::Idle
        }
    }

    fn has_more(&self) -> bool {
        self.search.is_none() && (self.items.len() as u64) < self.total
    }

    /// The double check on `total` keeps a stale length from requesting a
    /// page past the known end.
    fn can_load_more(&self) -> bool {
        self.mounted
            && !self.loading()
            && self.has_more()
            && self.total > self.cursor.end()
    }

    /// Count a page request as in flight and return its sequence number.
    fn begin_page(&mut self) -> u64 {
        self.pages_in_flight += 1;
        self.page_seq += 1;
        self.page_seq
    }

    fn clear_search(&mut self) {
        self.search = None;
        self.search_loading = false;
        self.search_seq += 1;
    }
}

struct Shared<T: Identified, G> {
    entity: EntityName,
    gateway: G,
    context: ListContext,
    state: Mutex<ListState<T>>,
    /// Flips to `true` on unmount; push tasks stop on it.
    unmounted: watch::Sender<bool>,
}

/// Keeps one list view's collection consistent across paged fetches,
/// searches and push updates.
///
/// Cloning yields another handle to the same list. Every state change is a
/// single critical section; no lock is held across an `await`.
pub struct ListSynchronizer<T: Identified, G> {
    inner: Arc<Shared<T, G>>,
}

impl<T: Identified, G> Clone for ListSynchronizer<T, G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Identified, G> std::fmt::Debug for ListSynchronizer<T, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListSynchronizer")
            .field("entity", &self.inner.entity)
            .finish_non_exhaustive()
    }
}

impl<T, G> ListSynchronizer<T, G>
where
    T: Identified + Clone + Send + 'static,
    G: Gateway<T>,
{
    /// Create the list state for a newly mounted view. Nothing is fetched
    /// until [`load_first`](Self::load_first) is called.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured page size is zero.
    pub fn mount(gateway: G, entity: EntityName, context: ListContext) -> Result<Self> {
        let cursor = Cursor::first(context.config.page_size)?;
        debug!(%entity, page_size = cursor.limit(), "Mounting list");

        Ok(Self {
            inner: Arc::new(Shared {
                entity,
                gateway,
                context,
                state: Mutex::new(ListState::new(cursor)),
                unmounted: watch::channel(false).0,
            }),
        })
    }

    pub fn entity(&self) -> &EntityName {
        &self.inner.entity
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner.context.config
    }

    pub fn gateway(&self) -> &G {
        &self.inner.gateway
    }

    fn state(&self) -> MutexGuard<'_, ListState<T>> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn notify_failure(&self, action: &str, error: &crate::Error) {
        warn!(entity = %self.inner.entity, %error, "{} failed", action);
        self.inner
            .context
            .notifier
            .notify(Notice::error(self.inner.entity.clone(), error.summary()));
    }

    /// Load the first page.
    pub async fn load_first(&self) -> LoadOutcome {
        let cursor = {
            let state = self.state();
            match Cursor::first(state.cursor.limit()) {
                Ok(cursor) => cursor,
                Err(_) => return LoadOutcome::Skipped,
            }
        };
        self.load_page(cursor).await
    }

    /// Fetch `[skip, skip + limit)` and merge it.
    ///
    /// The first page into an empty collection replaces it; any other page
    /// appends only records whose id is not present yet. On success the
    /// total count and cursor are updated. On failure nothing changes and a
    /// notice is sent.
    pub async fn load_page(&self, cursor: Cursor) -> LoadOutcome {
        let seq = {
            let mut state = self.state();
            if !state.mounted {
                return LoadOutcome::Discarded;
            }
            state.begin_page()
        };
        let in_flight = PageInFlight(&self.inner.state);
        self.run_page(cursor, seq, in_flight).await
    }

    /// Request the page after the cursor, if one is known to exist.
    ///
    /// This is what the trailing sentinel's visibility drives. It does
    /// nothing while searching, while a request is in flight, or when the
    /// collection already holds the total count.
    pub async fn trigger_load_more(&self) -> LoadOutcome {
        let (next, seq) = {
            let mut state = self.state();
            if !state.can_load_more() {
                return LoadOutcome::Skipped;
            }
            (state.cursor.advance(), state.begin_page())
        };
        let in_flight = PageInFlight(&self.inner.state);
        self.run_page(next, seq, in_flight).await
    }

    /// Fetch and merge a page already counted as in flight. The guard
    /// releases that count however this returns.
    #[instrument(skip(self, _in_flight), fields(entity = %self.inner.entity, skip = cursor.skip(), limit = cursor.limit()))]
    async fn run_page(
        &self,
        cursor: Cursor,
        seq: u64,
        _in_flight: PageInFlight<'_, T>,
    ) -> LoadOutcome {
        debug!("Requesting page");
        let result = self.inner.gateway.fetch_page(&self.inner.entity, cursor).await;

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                if !self.state().mounted {
                    return LoadOutcome::Discarded;
                }
                self.notify_failure("Page load", &e);
                return LoadOutcome::Failed;
            }
        };

        let mut state = self.state();
        if !state.mounted {
            return LoadOutcome::Discarded;
        }

        if self.inner.context.config.apply_order == ApplyOrder::Sequenced
            && seq < state.applied_page_seq
        {
            debug!(seq, applied = state.applied_page_seq, "Dropping out-of-order page");
            return LoadOutcome::Discarded;
        }
        state.applied_page_seq = state.applied_page_seq.max(seq);

        let added = if cursor.is_first() && state.items.is_empty() {
            state.items.replace_all(page.items)
        } else {
            state.items.append_new(page.items)
        };
        state.total = page.total;
        if cursor.skip() >= state.cursor.skip() {
            state.cursor = cursor;
        }

        debug!(added, len = state.items.len(), total = state.total, "Page applied");
        LoadOutcome::Applied { added }
    }

    /// Run a search, or leave search mode when `query` is empty.
    ///
    /// Results replace the search collection wholesale; the paged
    /// collection and cursor are never touched. Leaving search mode shows
    /// the paged collection again without refetching it.
    #[instrument(skip(self), fields(entity = %self.inner.entity))]
    pub async fn search(&self, query: &str) -> LoadOutcome {
        if query.is_empty() {
            let mut state = self.state();
            if state.search.is_some() {
                debug!("Leaving search");
                state.clear_search();
            }
            return LoadOutcome::Skipped;
        }

        let seq = {
            let mut state = self.state();
            if !state.mounted {
                return LoadOutcome::Discarded;
            }
            state.search_seq += 1;
            // An active session keeps showing its committed query until
            // the new results arrive.
            if state.search.is_none() {
                state.search = Some(SearchSession {
                    query: query.to_string(),
                    items: Collection::new(),
                });
            }
            state.search_loading = true;
            state.search_seq
        };
        let _in_flight = SearchInFlight {
            state: &self.inner.state,
            seq,
        };

        debug!("Requesting search");
        let result = self.inner.gateway.search(&self.inner.entity, query).await;

        let mut state = self.state();
        if !state.mounted || state.search_seq != seq {
            return LoadOutcome::Discarded;
        }

        match result {
            Ok(items) => match state.search.as_mut() {
                Some(session) => {
                    session.query = query.to_string();
                    let added = session.items.replace_all(items);
                    debug!(results = added, "Search applied");
                    LoadOutcome::Applied { added }
                }
                None => LoadOutcome::Discarded,
            },
            Err(e) => {
                drop(state);
                self.notify_failure("Search", &e);
                LoadOutcome::Failed
            }
        }
    }

    /// Upsert a pushed record. Idempotent; never waits on loading.
    pub fn apply_push(&self, event: PushEvent<T>) -> PushOutcome {
        let mut state = self.state();
        if !state.mounted {
            return PushOutcome::Discarded;
        }

        if event.entity != self.inner.entity {
            debug!(expected = %self.inner.entity, got = %event.entity, "Ignoring push for other entity");
            return PushOutcome::Ignored;
        }

        let config = &self.inner.context.config;
        match config.push_policy {
            PushPolicy::ResetSearch => {
                if state.search.is_some() {
                    debug!(entity = %self.inner.entity, "Push resets active search");
                    state.clear_search();
                }
            }
            PushPolicy::Isolated => {
                if let Some(session) = state.search.as_mut() {
                    session.items.replace_existing(event.record.clone());
                }
            }
        }

        let outcome = state.items.upsert(event.record, config.insert_position);
        debug!(entity = %self.inner.entity, ?outcome, "Push applied");
        outcome.into()
    }

    /// Subscribe to this entity's push stream and apply events as they
    /// arrive. Undecodable events are logged and dropped.
    ///
    /// The returned guard owns the subscription; dropping it closes the
    /// connection. Unmounting the list closes it as well.
    pub fn attach_push<C>(&self, channel: &C) -> Result<PushSubscription>
    where
        C: PushChannel<T>,
        G: 'static,
    {
        let mut stream = Box::pin(channel.subscribe(&self.inner.entity)?);
        let mut unmounted = self.inner.unmounted.subscribe();
        let sync = self.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = async { drop(unmounted.wait_for(|gone| *gone).await) } => {
                        debug!(entity = %sync.inner.entity, "List unmounted, closing push stream");
                        break;
                    }
                    event = stream.next() => match event {
                        Some(Ok(event)) => {
                            if sync.apply_push(event) == PushOutcome::Discarded {
                                break;
                            }
                        }
                        Some(Err(e)) => {
                            warn!(entity = %sync.inner.entity, error = %e, "Dropping unusable push event");
                        }
                        None => {
                            debug!(entity = %sync.inner.entity, "Push stream ended");
                            break;
                        }
                    },
                }
            }
        });

        Ok(PushSubscription { handle })
    }

    /// Tear the list down. Responses still in flight are discarded when
    /// they arrive, and attached push streams are closed.
    pub fn unmount(&self) {
        {
            let mut state = self.state();
            state.mounted = false;
            state.items.clear();
            state.search = None;
            state.search_loading = false;
        }
        self.inner.unmounted.send_replace(true);
        debug!(entity = %self.inner.entity, "Unmounted list");
    }

    pub fn is_mounted(&self) -> bool {
        self.state().mounted
    }

    pub fn phase(&self) -> Phase {
        self.state().phase()
    }

    pub fn is_loading(&self) -> bool {
        self.state().loading()
    }

    pub fn cursor(&self) -> Cursor {
        self.state().cursor
    }

    pub fn total(&self) -> u64 {
        self.state().total
    }

    /// Number of records in the paged collection.
    pub fn len(&self) -> usize {
        self.state().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn search_query(&self) -> Option<String> {
        self.state().search.as_ref().map(|s| s.query.clone())
    }

    /// Snapshot of what the view should render.
    pub fn view(&self) -> ListView<T> {
        let state = self.state();
        let items = match &state.search {
            Some(session) => session.items.to_vec(),
            None => state.items.to_vec(),
        };
        ListView {
            items,
            query: state.search.as_ref().map(|s| s.query.clone()),
            phase: state.phase(),
            loading: state.loading(),
            total: state.total,
            cursor: state.cursor,
            has_more: state.has_more(),
        }
    }

    /// The paged collection, regardless of search mode.
    pub fn paged_items(&self) -> Vec<T> {
        self.state().items.to_vec()
    }
}

/// Owns a running push subscription.
#[derive(Debug)]
pub struct PushSubscription {
    handle: JoinHandle<()>,
}

impl PushSubscription {
    /// Whether events are still being applied.
    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Close the subscription now.
    pub fn close(self) {
        self.handle.abort();
    }
}

impl Drop for PushSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Clears one page's share of the loading flag, including when the request
/// future is dropped before completing.
struct PageInFlight<'a, T: Identified>(&'a Mutex<ListState<T>>);

impl<T: Identified> Drop for PageInFlight<'_, T> {
    fn drop(&mut self) {
        let mut state = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        state.pages_in_flight = state.pages_in_flight.saturating_sub(1);
    }
}

/// Clears the search loading flag unless a newer search took over.
struct SearchInFlight<'a, T: Identified> {
    state: &'a Mutex<ListState<T>>,
    seq: u64,
}

impl<T: Identified> Drop for SearchInFlight<'_, T> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.search_seq == self.seq {
            state.search_loading = false;
        }
    }
}
