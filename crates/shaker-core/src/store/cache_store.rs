//! Generic in-memory mirror of one backend collection.
//!
//! Every store follows the same sequencing for remote operations:
//! clear the previous error, raise `loading`, call the backend, apply the
//! authoritative response, and on failure record a message in `error`, log it
//! and hand the error back to the caller. `loading` is lowered by a guard so
//! it is cleared on every exit path, including when the caller drops the
//! future mid-flight.
//!
//! Concurrent calls on one store are not serialized: whichever completes last
//! decides `items`, `loading` and `error`.

use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::watch;

use crate::api::{ApiClient, ApiError, ListFilter};
use crate::models::{Entity, StatusEntity};

/// Snapshot of a store's observable state.
#[derive(Debug, Clone)]
pub struct StoreState<E> {
    pub items: Vec<E>,
    pub current: Option<E>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<E> Default for StoreState<E> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            current: None,
            loading: false,
            error: None,
        }
    }
}

impl<E: Entity> StoreState<E> {
    /// Wholesale replace; a duplicated id keeps its first occurrence.
    ///
    /// `current` is cleared when it falls inside the reloaded scope but the
    /// server no longer lists it.
    fn replace_items(&mut self, items: &[E], in_scope: impl Fn(&E) -> bool) {
        let mut unique: Vec<E> = Vec::with_capacity(items.len());
        for item in items {
            if !unique.iter().any(|kept| kept.id() == item.id()) {
                unique.push(item.clone());
            }
        }
        let stale = self.current.as_ref().is_some_and(|current| {
            in_scope(current) && !unique.iter().any(|item| item.id() == current.id())
        });
        if stale {
            self.current = None;
        }
        self.items = unique;
    }

    fn prepend(&mut self, item: &E) {
        self.items.retain(|existing| existing.id() != item.id());
        self.items.insert(0, item.clone());
    }

    fn replace(&mut self, id: &str, item: &E) {
        if let Some(slot) = self.items.iter_mut().find(|existing| existing.id() == id) {
            *slot = item.clone();
        }
        if self.current.as_ref().is_some_and(|current| current.id() == id) {
            self.current = Some(item.clone());
        }
    }

    fn remove(&mut self, id: &str) {
        self.items.retain(|existing| existing.id() != id);
        if self.current.as_ref().is_some_and(|current| current.id() == id) {
            self.current = None;
        }
    }
}

struct Shared<E> {
    state: RwLock<StoreState<E>>,
    revision: watch::Sender<u64>,
}

/// Cache store for one entity kind. Clones share the same state.
pub struct CacheStore<E: Entity> {
    api: ApiClient,
    shared: Arc<Shared<E>>,
}

impl<E: Entity> Clone for CacheStore<E> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            shared: self.shared.clone(),
        }
    }
}

/// Lowers `loading` when dropped.
struct LoadingGuard<'a, E: Entity> {
    store: &'a CacheStore<E>,
}

impl<E: Entity> Drop for LoadingGuard<'_, E> {
    fn drop(&mut self) {
        self.store.mutate(|state| state.loading = false);
    }
}

impl<E: Entity> CacheStore<E> {
    pub fn new(api: ApiClient) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            api,
            shared: Arc::new(Shared {
                state: RwLock::new(StoreState::default()),
                revision,
            }),
        }
    }

    pub(crate) fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn snapshot(&self) -> StoreState<E> {
        self.shared.state.read().clone()
    }

    pub fn items(&self) -> Vec<E> {
        self.shared.state.read().items.clone()
    }

    pub fn current(&self) -> Option<E> {
        self.shared.state.read().current.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.shared.state.read().loading
    }

    pub fn error(&self) -> Option<String> {
        self.shared.state.read().error.clone()
    }

    /// Cached item by id.
    pub fn get(&self, id: &str) -> Option<E> {
        self.shared
            .state
            .read()
            .items
            .iter()
            .find(|item| item.id() == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.shared.state.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Revision counter bumped on every state change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut StoreState<E>) -> R) -> R {
        let result = {
            let mut state = self.shared.state.write();
            f(&mut state)
        };
        self.shared.revision.send_modify(|revision| *revision += 1);
        result
    }

    fn begin_loading(&self) -> LoadingGuard<'_, E> {
        self.mutate(|state| {
            state.error = None;
            state.loading = true;
        });
        LoadingGuard { store: self }
    }

    fn record_failure(&self, err: &ApiError, fallback: String) {
        tracing::error!("{}: {}", fallback, err);
        let message = err.user_message().unwrap_or(fallback);
        self.mutate(|state| state.error = Some(message));
    }

    async fn tracked<T, Fut, A>(&self, fallback: String, call: Fut, apply: A) -> Result<T, ApiError>
    where
        Fut: Future<Output = Result<T, ApiError>>,
        A: FnOnce(&mut StoreState<E>, &T),
    {
        let _loading = self.begin_loading();
        match call.await {
            Ok(value) => {
                self.mutate(|state| apply(state, &value));
                Ok(value)
            }
            Err(err) => {
                self.record_failure(&err, fallback);
                Err(err)
            }
        }
    }

    /// Runs a collection read and replaces `items` with its result. `in_scope`
    /// says whether an entity belongs to the collection being read.
    pub(crate) async fn load_items<Fut, S>(
        &self,
        fallback: &str,
        call: Fut,
        in_scope: S,
    ) -> Result<Vec<E>, ApiError>
    where
        Fut: Future<Output = Result<Vec<E>, ApiError>>,
        S: Fn(&E) -> bool,
    {
        self.tracked(fallback.to_string(), call, |state, items| {
            state.replace_items(items, in_scope)
        })
        .await
    }

    /// Runs a whole-entity write and replaces the matching item and `current`.
    pub(crate) async fn replace_with<Fut>(&self, fallback: &str, id: &str, call: Fut) -> Result<E, ApiError>
    where
        Fut: Future<Output = Result<E, ApiError>>,
    {
        self.tracked(fallback.to_string(), call, |state, item| state.replace(id, item))
            .await
    }

    pub async fn fetch_all(&self, filter: &ListFilter) -> Result<Vec<E>, ApiError> {
        let fallback = format!("Failed to fetch {}", E::RESOURCE);
        // Only an unfiltered read covers every entity
        let whole = filter.is_empty();
        self.load_items(&fallback, self.api.list::<E>(filter), |_| whole)
            .await
    }

    pub async fn fetch_one(&self, id: &str) -> Result<E, ApiError> {
        self.tracked(
            format!("Failed to fetch {}", E::NOUN),
            self.api.get::<E>(id),
            |state, item| state.current = Some(item.clone()),
        )
        .await
    }

    /// Creates on the server and prepends the returned entity.
    pub async fn create<D>(&self, data: &D) -> Result<E, ApiError>
    where
        D: Serialize + ?Sized,
    {
        self.tracked(
            format!("Failed to create {}", E::NOUN),
            self.api.create::<E, D>(data),
            |state, item| state.prepend(item),
        )
        .await
    }

    pub async fn update<D>(&self, id: &str, data: &D) -> Result<E, ApiError>
    where
        D: Serialize + ?Sized,
    {
        let fallback = format!("Failed to update {}", E::NOUN);
        self.replace_with(&fallback, id, self.api.update::<E, D>(id, data))
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.tracked(
            format!("Failed to delete {}", E::NOUN),
            self.api.delete::<E>(id),
            |state, _| state.remove(id),
        )
        .await
    }

    pub fn clear_error(&self) {
        self.mutate(|state| state.error = None);
    }

    /// Points `current` at the cached item with this id. Leaves `current`
    /// untouched and returns `None` when the id is not cached.
    pub fn select(&self, id: &str) -> Option<E> {
        let item = self.get(id)?;
        self.mutate(|state| state.current = Some(item.clone()));
        Some(item)
    }
}

impl<E: StatusEntity> CacheStore<E> {
    /// Status-only update. Patches the cached entry in place instead of
    /// replacing it and leaves `loading` alone. Failures are recorded and
    /// returned like every other operation.
    pub async fn update_status(&self, id: &str, status: &str) -> Result<E, ApiError> {
        self.mutate(|state| state.error = None);

        match self.api.update_status::<E>(id, status).await {
            Ok(echo) => {
                self.mutate(|state| {
                    if let Some(item) = state.items.iter_mut().find(|item| item.id() == id) {
                        item.apply_status(status, &echo);
                    }
                    if let Some(current) = state.current.as_mut() {
                        if current.id() == id {
                            current.apply_status(status, &echo);
                        }
                    }
                });
                Ok(echo)
            }
            Err(err) => {
                self.record_failure(&err, format!("Failed to update {} status", E::NOUN));
                Err(err)
            }
        }
    }
}
