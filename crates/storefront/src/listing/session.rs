//! The list view session task.
//!
//! A session owns a [`ListCoordinator`], the search [`Debouncer`] and the
//! catalog source, and runs them on a single Tokio task. Views talk to it
//! through a [`ListHandle`]: commands go in over an `mpsc` channel and
//! [`ListSnapshot`]s come out over a `watch` channel.
//!
//! Dropping the handle (or calling [`ListHandle::shutdown`]) ends the task,
//! which aborts any pending debounce timer. Requests still in flight finish
//! on their own, but their results have nowhere to go.

use std::sync::Arc;

use pocketshop_core::ViewMode;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::{ListCoordinator, ListSnapshot, NearEnd};
use crate::catalog::{ProductPage, ProductSource, SearchQuery};
use crate::config::ListingConfig;
use crate::debounce::Debouncer;
use crate::resource::{Completion, RequestTicket, spawn_fetch};

const COMMAND_BUFFER: usize = 64;

/// Input from the view layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListCommand {
    /// The search box changed.
    SearchInput(String),
    /// The user picked a view mode.
    SetViewMode(ViewMode),
    /// The user picked a grid page.
    GoToPage(u32),
    /// The reader crossed the end-of-list boundary.
    NearEnd,
    /// Re-issue the current query.
    Retry,
}

/// The session task has stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("list session has shut down")]
pub struct SessionClosed;

/// View-side handle to a running list session.
#[derive(Debug)]
pub struct ListHandle {
    commands: mpsc::Sender<ListCommand>,
    snapshots: watch::Receiver<ListSnapshot>,
    task: JoinHandle<()>,
}

impl ListHandle {
    /// Start a session and issue the initial (empty search) fetch.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<S: ProductSource>(source: Arc<S>, config: ListingConfig) -> Self {
        let mut coordinator = ListCoordinator::new(config.page_limit, config.notice_ttl);
        // Issue the initial request here so the first published snapshot is
        // already loading.
        let initial = coordinator.sync();
        let debouncer = Debouncer::new(String::new(), config.search_debounce);
        let settled = debouncer.subscribe();
        let (snapshot_tx, snapshots) = watch::channel(coordinator.snapshot());
        let (commands, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();

        let session = ListSession {
            source,
            coordinator,
            debouncer,
            settled,
            commands: command_rx,
            completion_tx,
            completion_rx,
            snapshots: snapshot_tx,
        };
        let task = tokio::spawn(session.run(initial));

        Self {
            commands,
            snapshots,
            task,
        }
    }

    /// Send a command to the session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionClosed`] if the session task has stopped.
    pub async fn send(&self, command: ListCommand) -> Result<(), SessionClosed> {
        self.commands.send(command).await.map_err(|_| SessionClosed)
    }

    /// Update the search box.
    ///
    /// # Errors
    ///
    /// Returns [`SessionClosed`] if the session task has stopped.
    pub async fn search(&self, text: impl Into<String>) -> Result<(), SessionClosed> {
        self.send(ListCommand::SearchInput(text.into())).await
    }

    /// Switch view mode.
    ///
    /// # Errors
    ///
    /// Returns [`SessionClosed`] if the session task has stopped.
    pub async fn set_view_mode(&self, mode: ViewMode) -> Result<(), SessionClosed> {
        self.send(ListCommand::SetViewMode(mode)).await
    }

    /// Jump to a grid page.
    ///
    /// # Errors
    ///
    /// Returns [`SessionClosed`] if the session task has stopped.
    pub async fn go_to_page(&self, page: u32) -> Result<(), SessionClosed> {
        self.send(ListCommand::GoToPage(page)).await
    }

    /// Report that the reader is near the end of the list.
    ///
    /// # Errors
    ///
    /// Returns [`SessionClosed`] if the session task has stopped.
    pub async fn near_end(&self) -> Result<(), SessionClosed> {
        self.send(ListCommand::NearEnd).await
    }

    /// Latest published state.
    #[must_use]
    pub fn snapshot(&self) -> ListSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that is notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot> {
        self.snapshots.clone()
    }

    /// Wait until the published state satisfies `predicate`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionClosed`] if the session stops first.
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&ListSnapshot) -> bool,
    ) -> Result<ListSnapshot, SessionClosed> {
        let mut rx = self.snapshots.clone();
        let snapshot = rx
            .wait_for(|snapshot| predicate(snapshot))
            .await
            .map_err(|_| SessionClosed)?;
        Ok(snapshot.clone())
    }

    /// Wait until no request is in flight.
    ///
    /// # Errors
    ///
    /// Returns [`SessionClosed`] if the session stops first.
    pub async fn settled(&self) -> Result<ListSnapshot, SessionClosed> {
        self.wait_for(|snapshot| !snapshot.loading).await
    }

    /// Stop the session and wait for its task to finish.
    pub async fn shutdown(self) {
        let Self {
            commands, task, ..
        } = self;
        drop(commands);
        if let Err(e) = task.await
            && e.is_panic()
        {
            warn!(error = %e, "List session task panicked");
        }
    }
}

struct ListSession<S> {
    source: Arc<S>,
    coordinator: ListCoordinator,
    debouncer: Debouncer<String>,
    settled: watch::Receiver<String>,
    commands: mpsc::Receiver<ListCommand>,
    completion_tx: mpsc::UnboundedSender<Completion<SearchQuery, ProductPage>>,
    completion_rx: mpsc::UnboundedReceiver<Completion<SearchQuery, ProductPage>>,
    snapshots: watch::Sender<ListSnapshot>,
}

impl<S: ProductSource> ListSession<S> {
    async fn run(mut self, initial: Option<RequestTicket<SearchQuery>>) {
        debug!("List session started");
        if let Some(ticket) = initial {
            self.dispatch(ticket);
        }

        loop {
            let notice_deadline = self.coordinator.notice_deadline();

            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                changed = self.settled.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let term = self.settled.borrow_and_update().clone();
                    if let Some(ticket) = self.coordinator.apply_search_term(term) {
                        self.dispatch(ticket);
                    }
                }
                Some(completion) = self.completion_rx.recv() => {
                    self.coordinator.apply(completion);
                }
                () = tokio::time::sleep_until(notice_deadline.unwrap_or_else(Instant::now)),
                    if notice_deadline.is_some() =>
                {
                    self.coordinator.expire_notice(Instant::now());
                }
            }

            self.publish();
        }

        self.debouncer.cancel();
        debug!("List session ended");
    }

    fn handle(&mut self, command: ListCommand) {
        match command {
            ListCommand::SearchInput(text) => {
                self.coordinator.set_search_input(text.clone());
                self.debouncer.push(text);
            }
            ListCommand::SetViewMode(mode) => {
                if let Some(ticket) = self.coordinator.set_view_mode(mode) {
                    self.dispatch(ticket);
                }
            }
            ListCommand::GoToPage(page) => match self.coordinator.go_to_page(page) {
                Ok(Some(ticket)) => self.dispatch(ticket),
                Ok(None) => {}
                Err(e) => warn!(page, error = %e, "Page navigation rejected"),
            },
            ListCommand::NearEnd => match self.coordinator.near_end(Instant::now()) {
                NearEnd::LoadMore(ticket) => self.dispatch(ticket),
                NearEnd::Exhausted => info!("No more items to load"),
                NearEnd::Ignored => {}
            },
            ListCommand::Retry => {
                let ticket = self.coordinator.retry();
                self.dispatch(ticket);
            }
        }
    }

    fn dispatch(&self, ticket: RequestTicket<SearchQuery>) {
        debug!(query = %ticket.key(), generation = ticket.generation(), "Dispatching search");
        let source = Arc::clone(&self.source);
        let query = ticket.key().clone();
        spawn_fetch(ticket, self.completion_tx.clone(), async move {
            source.search(&query).await
        });
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.coordinator.snapshot());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use pocketshop_core::ProductId;

    use super::*;
    use crate::catalog::{CatalogError, Product};
    use crate::listing::Notice;
    use crate::listing::tests::product;

    /// Answers searches from a fixed table, after a per-term delay.
    #[derive(Default)]
    struct ScriptedSource {
        /// term -> (delay, total matches, first product id)
        terms: HashMap<String, (Duration, u32, u32)>,
        /// Query keys that fail once with 429.
        failing: Mutex<Vec<String>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedSource {
        fn with(mut self, term: &str, delay_ms: u64, total: u32, first_id: u32) -> Self {
            self.terms.insert(
                term.to_string(),
                (Duration::from_millis(delay_ms), total, first_id),
            );
            self
        }

        fn fail_once(self, key: &str) -> Self {
            self.failing.lock().unwrap().push(key.to_string());
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ProductSource for ScriptedSource {
        async fn search(&self, query: &SearchQuery) -> Result<ProductPage, CatalogError> {
            self.calls.lock().unwrap().push(query.key());
            let (delay, total, first_id) = self
                .terms
                .get(query.term())
                .copied()
                .unwrap_or((Duration::from_millis(10), 0, 0));
            tokio::time::sleep(delay).await;

            let mut failing = self.failing.lock().unwrap();
            if let Some(index) = failing.iter().position(|key| *key == query.key()) {
                failing.remove(index);
                return Err(CatalogError::RateLimited(1));
            }
            drop(failing);

            let start = query.skip().min(total);
            let end = (query.skip() + query.limit()).min(total);
            Ok(ProductPage {
                products: (start..end).map(|i| product(first_id + i)).collect(),
                total,
                skip: query.skip(),
                limit: query.limit(),
            })
        }

        async fn product(&self, id: ProductId) -> Result<Product, CatalogError> {
            Err(CatalogError::NotFound(id))
        }
    }

    fn config() -> ListingConfig {
        ListingConfig {
            page_limit: 20,
            search_debounce: Duration::from_millis(500),
            notice_ttl: Duration::from_secs(3),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_fetch_uses_empty_term() {
        let source = Arc::new(ScriptedSource::default().with("", 10, 3, 1));
        let handle = ListHandle::spawn(Arc::clone(&source), config());

        let snapshot = handle.wait_for(|s| s.total.is_some()).await.unwrap();
        assert_eq!(snapshot.products.len(), 3);
        assert_eq!(source.calls(), vec!["products/search?q=&limit=20&skip=0"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_phone_search_scenario() {
        let source = Arc::new(
            ScriptedSource::default()
                .with("", 10, 100, 1)
                .with("phone", 50, 5, 500),
        );
        let handle = ListHandle::spawn(Arc::clone(&source), config());
        handle.wait_for(|s| s.total == Some(100)).await.unwrap();

        handle.search("phone").await.unwrap();
        tokio::time::sleep(Duration::from_millis(499)).await;
        assert_eq!(handle.snapshot().search_input, "phone");
        assert_eq!(handle.snapshot().search_term, "");
        assert_eq!(source.calls().len(), 1);

        let grid = handle
            .wait_for(|s| s.search_term == "phone" && s.total == Some(5))
            .await
            .unwrap();
        assert_eq!(grid.products.len(), 5);
        assert!(!grid.shows_pagination());
        assert_eq!(
            source.calls().last().unwrap(),
            "products/search?q=phone&limit=20&skip=0"
        );

        // List mode starts over on page 1 with an identical request.
        handle.set_view_mode(ViewMode::List).await.unwrap();
        let list = handle
            .wait_for(|s| s.view_mode == ViewMode::List && !s.loading && s.total.is_some())
            .await
            .unwrap();
        assert_eq!(list.page, 1);
        assert_eq!(list.products.len(), 5);
        let calls = source.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1], calls[2]);

        // Everything is loaded: the reader gets a notice, not another fetch.
        handle.near_end().await.unwrap();
        handle
            .wait_for(|s| s.notice == Some(Notice::NoMoreItems))
            .await
            .unwrap();
        assert_eq!(source.calls().len(), 3);

        // The notice dismisses itself.
        tokio::time::sleep(Duration::from_secs(3)).await;
        handle.wait_for(|s| s.notice.is_none()).await.unwrap();

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_typing_issues_one_search() {
        let source = Arc::new(ScriptedSource::default().with("", 10, 0, 0));
        let handle = ListHandle::spawn(Arc::clone(&source), config());
        handle.settled().await.unwrap();

        for text in ["p", "ph", "pho"] {
            handle.search(text).await.unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        handle.wait_for(|s| s.search_term == "pho").await.unwrap();
        handle.settled().await.unwrap();

        assert_eq!(
            source.calls(),
            vec![
                "products/search?q=&limit=20&skip=0",
                "products/search?q=pho&limit=20&skip=0",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_response_for_old_term_is_discarded() {
        let source = Arc::new(
            ScriptedSource::default()
                .with("", 10, 0, 0)
                .with("slow", 2_000, 2, 100)
                .with("fast", 10, 3, 200),
        );
        let handle = ListHandle::spawn(Arc::clone(&source), config());
        handle.settled().await.unwrap();

        handle.search("slow").await.unwrap();
        // Debounce fires at 500ms; "slow" is then in flight until 2500ms.
        tokio::time::sleep(Duration::from_millis(600)).await;
        handle.search("fast").await.unwrap();

        handle
            .wait_for(|s| s.search_term == "fast" && !s.loading)
            .await
            .unwrap();

        // Let the slow response arrive.
        tokio::time::sleep(Duration::from_secs(3)).await;
        let snapshot = handle.snapshot();
        let ids: Vec<u32> = snapshot.products.iter().map(|p| p.id.as_u32()).collect();
        assert_eq!(ids, vec![200, 201, 202]);
        assert_eq!(snapshot.total, Some(3));
        assert_eq!(source.calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_mode_accumulates_until_exhausted() {
        let source = Arc::new(ScriptedSource::default().with("", 10, 45, 1));
        let handle = ListHandle::spawn(Arc::clone(&source), config());
        handle.settled().await.unwrap();

        handle.set_view_mode(ViewMode::List).await.unwrap();
        handle
            .wait_for(|s| s.view_mode == ViewMode::List && !s.loading)
            .await
            .unwrap();

        handle.near_end().await.unwrap();
        handle
            .wait_for(|s| s.page == 2 && !s.loading)
            .await
            .unwrap();
        handle.near_end().await.unwrap();
        let snapshot = handle
            .wait_for(|s| s.page == 3 && !s.loading)
            .await
            .unwrap();
        assert_eq!(snapshot.products.len(), 45);

        handle.near_end().await.unwrap();
        let snapshot = handle.wait_for(|s| s.notice.is_some()).await.unwrap();
        assert_eq!(snapshot.page, 3);
        assert_eq!(snapshot.products.len(), 45);
    }

    #[tokio::test(start_paused = true)]
    async fn test_grid_page_navigation() {
        let source = Arc::new(ScriptedSource::default().with("", 10, 45, 1));
        let handle = ListHandle::spawn(Arc::clone(&source), config());
        let first = handle.settled().await.unwrap();
        assert!(first.shows_pagination());
        assert_eq!(first.page_count(), 3);

        handle.go_to_page(3).await.unwrap();
        let last = handle
            .wait_for(|s| s.page == 3 && !s.loading)
            .await
            .unwrap();
        assert_eq!(last.products.len(), 5);
        assert_eq!(last.products[0].id, ProductId::new(41));

        // Out of range: ignored.
        handle.go_to_page(9).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(handle.snapshot().page, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_retry_after_failed_page_starts_over() {
        let source = Arc::new(
            ScriptedSource::default()
                .with("", 10, 45, 1)
                .fail_once("products/search?q=&limit=20&skip=20"),
        );
        let handle = ListHandle::spawn(Arc::clone(&source), config());
        handle.settled().await.unwrap();
        handle.set_view_mode(ViewMode::List).await.unwrap();
        handle
            .wait_for(|s| s.view_mode == ViewMode::List && !s.loading)
            .await
            .unwrap();

        handle.near_end().await.unwrap();
        let failed = handle
            .wait_for(|s| s.page == 2 && !s.loading)
            .await
            .unwrap();
        assert!(failed.error.is_some());
        assert!(failed.products.is_empty());

        handle.send(ListCommand::Retry).await.unwrap();
        let restarted = handle
            .wait_for(|s| s.error.is_none() && !s.loading)
            .await
            .unwrap();
        assert_eq!(restarted.page, 1);
        assert_eq!(restarted.products[0].id, ProductId::new(1));

        for page in [2, 3] {
            handle.near_end().await.unwrap();
            handle
                .wait_for(|s| s.page == page && !s.loading)
                .await
                .unwrap();
        }
        handle.near_end().await.unwrap();
        let done = handle.wait_for(|s| s.notice.is_some()).await.unwrap();
        let ids: Vec<u32> = done.products.iter().map(|p| p.id.as_u32()).collect();
        assert_eq!(ids, (1..=45).collect::<Vec<_>>());
        assert_eq!(done.page, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_retry_of_loaded_page_does_not_duplicate() {
        let source = Arc::new(ScriptedSource::default().with("", 10, 45, 1));
        let handle = ListHandle::spawn(Arc::clone(&source), config());
        handle.settled().await.unwrap();
        handle.set_view_mode(ViewMode::List).await.unwrap();
        handle
            .wait_for(|s| s.view_mode == ViewMode::List && !s.loading)
            .await
            .unwrap();
        handle.near_end().await.unwrap();
        handle
            .wait_for(|s| s.page == 2 && !s.loading)
            .await
            .unwrap();

        handle.send(ListCommand::Retry).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        let snapshot = handle.settled().await.unwrap();
        assert_eq!(snapshot.page, 2);
        assert_eq!(snapshot.products.len(), 40);
        assert_eq!(
            source.calls().last().unwrap(),
            "products/search?q=&limit=20&skip=20"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_navigation_during_pending_search_is_rejected() {
        let source = Arc::new(
            ScriptedSource::default()
                .with("", 10, 45, 1)
                .with("phone", 1_000, 5, 500),
        );
        let handle = ListHandle::spawn(Arc::clone(&source), config());
        let browse = handle.settled().await.unwrap();
        assert_eq!(browse.page_count(), 3);

        handle.search("phone").await.unwrap();
        let pending = handle
            .wait_for(|s| s.search_term == "phone" && s.loading)
            .await
            .unwrap();
        assert_eq!(pending.total, None);

        handle.go_to_page(3).await.unwrap();
        let done = handle
            .wait_for(|s| s.search_term == "phone" && !s.loading)
            .await
            .unwrap();
        assert_eq!(done.page, 1);
        assert_eq!(done.total, Some(5));
        assert!(source.calls().iter().all(|call| !call.contains("skip=40")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending_search() {
        let source = Arc::new(ScriptedSource::default().with("", 10, 0, 0));
        let handle = ListHandle::spawn(Arc::clone(&source), config());
        handle.settled().await.unwrap();

        handle.search("lamp").await.unwrap();
        handle.shutdown().await;
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(source.calls().len(), 1);
    }
}
