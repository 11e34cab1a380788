use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

use super::{
    api::ApiClient,
    state::{CollectionAction, CollectionSnapshot, Store},
};
use crate::models::{Category, EventPayload, EventView};

/// EventStore
///
/// Event state for one client session. `highlights` holds the upcoming selection.
#[derive(Clone)]
pub struct EventStore {
    api: ApiClient,
    store: Store<EventView>,
}

impl EventStore {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            store: Store::new(),
        }
    }

    pub fn snapshot(&self) -> Arc<CollectionSnapshot<EventView>> {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<CollectionSnapshot<EventView>>> {
        self.store.subscribe()
    }

    pub async fn load_all(&self) {
        self.store
            .run(true, self.api.list_events(), CollectionAction::Loaded)
            .await;
    }

    pub async fn load_by_category(&self, category: Category) {
        self.store
            .run(
                true,
                self.api.events_by_category(category),
                CollectionAction::Loaded,
            )
            .await;
    }

    pub async fn load_upcoming(&self) {
        self.store
            .run(
                true,
                self.api.upcoming_events(),
                CollectionAction::HighlightsLoaded,
            )
            .await;
    }

    pub async fn load_one(&self, id: Uuid) {
        self.store
            .run(true, self.api.get_event(id), CollectionAction::Fetched)
            .await;
    }

    pub async fn add(&self, payload: &EventPayload) {
        self.store
            .run(
                false,
                self.api.create_event(payload),
                CollectionAction::Added,
            )
            .await;
    }

    pub async fn update(&self, id: Uuid, payload: &EventPayload) {
        self.store
            .run(
                false,
                self.api.update_event(id, payload),
                CollectionAction::Updated,
            )
            .await;
    }

    pub async fn delete(&self, id: Uuid) {
        self.store
            .run(false, self.api.delete_event(id), |_| {
                CollectionAction::Removed(id)
            })
            .await;
    }

    pub fn set_current(&self, event: EventView) {
        self.store.dispatch(CollectionAction::SetCurrent(event));
    }

    pub fn clear_current(&self) {
        self.store.dispatch(CollectionAction::ClearCurrent);
    }

    pub fn clear_error(&self) {
        self.store.dispatch(CollectionAction::ClearError);
    }
}
