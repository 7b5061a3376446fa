//! Keyed fetch state with stale-result suppression.
//!
//! A [`FetchResource`] tracks the tri-state `{data, loading, error}` for the
//! *current* request key. Every request is stamped with a generation number
//! when it is issued; a completion is applied only if its generation is still
//! the latest one. Older responses are dropped on arrival, whichever order the
//! transport delivers them in.

use std::fmt::Debug;
use std::future::Future;

use tokio::sync::mpsc;
use tracing::debug;

use crate::catalog::CatalogError;
use crate::error::FetchError;

/// `{data, loading, error}` for the current key.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState<T> {
    /// Successful response for the current key. Cleared when a new
    /// request is issued, so it never describes an earlier key.
    pub data: Option<T>,
    /// A request for the current key is in flight.
    pub loading: bool,
    /// The current key's request failed.
    pub error: Option<FetchError>,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

/// Identifies one issued request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket<K> {
    generation: u64,
    key: K,
}

impl<K> RequestTicket<K> {
    /// The key the request was issued for.
    pub const fn key(&self) -> &K {
        &self.key
    }

    /// Monotonic request number.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// A finished request, ready to be handed back to its resource.
#[derive(Debug)]
pub struct Completion<K, T> {
    pub ticket: RequestTicket<K>,
    pub result: Result<T, CatalogError>,
}

/// What happened to a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The result belonged to the current request and was stored.
    Applied,
    /// The result belonged to a superseded request and was dropped.
    Stale,
}

/// Fetch state for one changing request key.
#[derive(Debug)]
pub struct FetchResource<K, T> {
    key: Option<K>,
    generation: u64,
    state: FetchState<T>,
}

impl<K, T> Default for FetchResource<K, T> {
    fn default() -> Self {
        Self {
            key: None,
            generation: 0,
            state: FetchState::default(),
        }
    }
}

impl<K, T> FetchResource<K, T>
where
    K: Clone + PartialEq + Debug,
{
    /// A resource with no key yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current fetch state.
    pub const fn state(&self) -> &FetchState<T> {
        &self.state
    }

    /// Key of the most recent request.
    pub const fn current_key(&self) -> Option<&K> {
        self.key.as_ref()
    }

    /// Request `key` if it differs from the current key.
    ///
    /// Returns `None` when the key is unchanged, so callers can call this
    /// after every input change without issuing duplicate requests.
    pub fn request(&mut self, key: K) -> Option<RequestTicket<K>> {
        if self.key.as_ref() == Some(&key) {
            return None;
        }
        Some(self.issue(key))
    }

    /// Request `key` even if it is already current.
    ///
    /// Any in-flight request for the same key becomes stale.
    pub fn refetch(&mut self, key: K) -> RequestTicket<K> {
        self.issue(key)
    }

    fn issue(&mut self, key: K) -> RequestTicket<K> {
        self.generation += 1;
        self.key = Some(key.clone());
        self.state.data = None;
        self.state.loading = true;
        self.state.error = None;
        RequestTicket {
            generation: self.generation,
            key,
        }
    }

    /// Whether `ticket` is the latest issued request.
    pub fn is_current(&self, ticket: &RequestTicket<K>) -> bool {
        ticket.generation == self.generation && self.key.as_ref() == Some(&ticket.key)
    }

    /// Apply a completed request, unless it has been superseded.
    pub fn resolve(
        &mut self,
        ticket: &RequestTicket<K>,
        result: Result<T, CatalogError>,
    ) -> Resolution {
        if !self.is_current(ticket) {
            debug!(
                key = ?ticket.key,
                generation = ticket.generation,
                current = self.generation,
                "Discarding stale fetch result"
            );
            return Resolution::Stale;
        }

        match result {
            Ok(data) => {
                self.state.data = Some(data);
                self.state.error = None;
            }
            Err(err) => {
                tracing::warn!(key = ?ticket.key, error = %err, "Fetch failed");
                self.state.data = None;
                self.state.error = Some(FetchError::from(&err));
            }
        }
        self.state.loading = false;
        Resolution::Applied
    }
}

/// Run `fetch` on the Tokio runtime and deliver its result to `completions`.
///
/// The result is sent back tagged with `ticket`; whether it still matters is
/// decided by [`FetchResource::resolve`] when it arrives. If the receiver has
/// gone away the result is silently dropped.
pub fn spawn_fetch<K, T, Fut>(
    ticket: RequestTicket<K>,
    completions: mpsc::UnboundedSender<Completion<K, T>>,
    fetch: Fut,
) where
    K: Send + 'static,
    T: Send + 'static,
    Fut: Future<Output = Result<T, CatalogError>> + Send + 'static,
{
    tokio::spawn(async move {
        let result = fetch.await;
        let _ = completions.send(Completion { ticket, result });
    });
}
