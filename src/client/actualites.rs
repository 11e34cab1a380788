use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

use super::{
    api::ApiClient,
    state::{CollectionAction, CollectionSnapshot, Store},
};
use crate::models::{ActualitePayload, ActualiteView, Category};

/// ActualiteStore
///
/// News state for one client session. Reads raise the loading flag; writes do not.
#[derive(Clone)]
pub struct ActualiteStore {
    api: ApiClient,
    store: Store<ActualiteView>,
}

impl ActualiteStore {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            store: Store::new(),
        }
    }

    pub fn snapshot(&self) -> Arc<CollectionSnapshot<ActualiteView>> {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<CollectionSnapshot<ActualiteView>>> {
        self.store.subscribe()
    }

    pub async fn load_all(&self) {
        self.store
            .run(true, self.api.list_actualites(), CollectionAction::Loaded)
            .await;
    }

    pub async fn load_by_category(&self, category: Category) {
        self.store
            .run(
                true,
                self.api.actualites_by_category(category),
                CollectionAction::Loaded,
            )
            .await;
    }

    pub async fn load_latest(&self) {
        self.store
            .run(
                true,
                self.api.latest_actualites(),
                CollectionAction::HighlightsLoaded,
            )
            .await;
    }

    pub async fn load_one(&self, id: Uuid) {
        self.store
            .run(true, self.api.get_actualite(id), CollectionAction::Fetched)
            .await;
    }

    pub async fn add(&self, payload: &ActualitePayload) {
        self.store
            .run(
                false,
                self.api.create_actualite(payload),
                CollectionAction::Added,
            )
            .await;
    }

    pub async fn update(&self, id: Uuid, payload: &ActualitePayload) {
        self.store
            .run(
                false,
                self.api.update_actualite(id, payload),
                CollectionAction::Updated,
            )
            .await;
    }

    pub async fn delete(&self, id: Uuid) {
        self.store
            .run(false, self.api.delete_actualite(id), |_| {
                CollectionAction::Removed(id)
            })
            .await;
    }

    pub fn set_current(&self, actualite: ActualiteView) {
        self.store.dispatch(CollectionAction::SetCurrent(actualite));
    }

    pub fn clear_current(&self) {
        self.store.dispatch(CollectionAction::ClearCurrent);
    }

    pub fn clear_error(&self) {
        self.store.dispatch(CollectionAction::ClearError);
    }
}
