//! Generic collection state shared by the actualite and event stores.

use std::{future::Future, sync::Arc};
use tokio::sync::watch;
use uuid::Uuid;

use super::error::ClientResult;
use crate::models::{ActualiteView, EventView};

/// A resource identified by a stable id.
pub trait Keyed {
    fn key(&self) -> Uuid;
}

impl Keyed for ActualiteView {
    fn key(&self) -> Uuid {
        self.id
    }
}

impl Keyed for EventView {
    fn key(&self) -> Uuid {
        self.id
    }
}

/// CollectionSnapshot
///
/// One immutable view of a resource collection.
/// - `items`: the full (or category-filtered) list.
/// - `highlights`: the "latest" / "upcoming" selection.
/// - `selected`: the last single item fetched by id.
/// - `current`: the item being edited, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSnapshot<T> {
    pub items: Vec<T>,
    pub highlights: Vec<T>,
    pub selected: Option<T>,
    pub current: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
}

// Starts in the loading state: nothing has been fetched yet.
impl<T> Default for CollectionSnapshot<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            highlights: Vec::new(),
            selected: None,
            current: None,
            loading: true,
            error: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum CollectionAction<T> {
    Loading,
    Loaded(Vec<T>),
    HighlightsLoaded(Vec<T>),
    Fetched(T),
    Added(T),
    Updated(T),
    Removed(Uuid),
    Failed(String),
    SetCurrent(T),
    ClearCurrent,
    ClearError,
}

/// Computes the next snapshot. Pure: the previous snapshot is never modified.
pub fn reduce<T: Keyed + Clone>(
    state: &CollectionSnapshot<T>,
    action: CollectionAction<T>,
) -> CollectionSnapshot<T> {
    let mut next = state.clone();
    match action {
        CollectionAction::Loading => next.loading = true,
        CollectionAction::Loaded(items) => {
            next.items = items;
            next.loading = false;
        }
        CollectionAction::HighlightsLoaded(items) => {
            next.highlights = items;
            next.loading = false;
        }
        CollectionAction::Fetched(item) => {
            next.selected = Some(item);
            next.loading = false;
        }
        CollectionAction::Added(item) => {
            next.items.insert(0, item);
            next.loading = false;
        }
        CollectionAction::Updated(item) => {
            let id = item.key();
            for slot in next.items.iter_mut().filter(|existing| existing.key() == id) {
                *slot = item.clone();
            }
            next.loading = false;
        }
        CollectionAction::Removed(id) => {
            next.items.retain(|existing| existing.key() != id);
            next.loading = false;
        }
        CollectionAction::Failed(msg) => {
            next.error = Some(msg);
            next.loading = false;
        }
        CollectionAction::SetCurrent(item) => next.current = Some(item),
        CollectionAction::ClearCurrent => next.current = None,
        CollectionAction::ClearError => next.error = None,
    }
    next
}

/// Store
///
/// Holds the latest [`CollectionSnapshot`] behind an `Arc` and publishes each new one
/// on a `watch` channel. Clones share the same state.
pub struct Store<T> {
    sender: Arc<watch::Sender<Arc<CollectionSnapshot<T>>>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
        }
    }
}

impl<T: Keyed + Clone> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Keyed + Clone> Store<T> {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(Arc::new(CollectionSnapshot::default()));
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn snapshot(&self) -> Arc<CollectionSnapshot<T>> {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<CollectionSnapshot<T>>> {
        self.sender.subscribe()
    }

    pub fn dispatch(&self, action: CollectionAction<T>) {
        self.sender
            .send_modify(|state| *state = Arc::new(reduce(&**state, action)));
    }

    /// Awaits `request` and dispatches `on_success` with its value, or records the
    /// failure message once. With `show_loading`, the loading flag is raised first.
    pub(crate) async fn run<V, F>(
        &self,
        show_loading: bool,
        request: F,
        on_success: impl FnOnce(V) -> CollectionAction<T>,
    ) where
        F: Future<Output = ClientResult<V>>,
    {
        if show_loading {
            self.dispatch(CollectionAction::Loading);
        }

        match request.await {
            Ok(value) => self.dispatch(on_success(value)),
            Err(err) => {
                tracing::warn!(error = %err, "store request failed");
                self.dispatch(CollectionAction::Failed(err.to_string()));
            }
        }
    }
}
