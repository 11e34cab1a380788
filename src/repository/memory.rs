use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{RepoResult, Repository};
use crate::{
    error::RepoError,
    models::{
        Actualite, ActualiteChanges, AuthorRef, Category, Event, EventChanges, NewActualite,
        NewEvent, NewUser, ProfileChanges, Role, RoleAssignment, User,
    },
};

#[derive(Default)]
struct Collections {
    users: Vec<User>,
    actualites: Vec<Actualite>,
    events: Vec<Event>,
}

/// InMemoryRepository
///
/// A process-local `Repository` used by the test suites and handy for demos without a
/// database. A single `RwLock` guards all collections, which gives registration the
/// same "decide the role and insert atomically" guarantee as the Postgres store.
#[derive(Default)]
pub struct InMemoryRepository {
    inner: RwLock<Collections>,
    /// When true, every operation fails with [`RepoError::Unavailable`].
    pub should_fail: bool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Inserts an event with an explicit creation time. Tests use it to seed past and
    /// future events without going through the HTTP layer.
    pub async fn insert_event(&self, event: Event) {
        self.inner.write().await.events.push(event);
    }

    /// Inserts an actualite as-is, keeping its `date`.
    pub async fn insert_actualite(&self, actualite: Actualite) {
        self.inner.write().await.actualites.push(actualite);
    }

    fn check(&self) -> RepoResult<()> {
        if self.should_fail {
            Err(RepoError::Unavailable)
        } else {
            Ok(())
        }
    }
}

fn sorted_by_date_desc(mut actualites: Vec<Actualite>) -> Vec<Actualite> {
    actualites.sort_by(|a, b| b.date.cmp(&a.date));
    actualites
}

fn sorted_by_event_date(mut events: Vec<Event>) -> Vec<Event> {
    events.sort_by(|a, b| a.event_date.cmp(&b.event_date));
    events
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        self.check()?;
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        self.check()?;
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> RepoResult<Vec<User>> {
        self.check()?;
        let mut users = self.inner.read().await.users.clone();
        users.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(users)
    }

    async fn count_users(&self) -> RepoResult<i64> {
        self.check()?;
        Ok(self.inner.read().await.users.len() as i64)
    }

    async fn create_user(&self, user: NewUser, assignment: RoleAssignment) -> RepoResult<User> {
        self.check()?;
        let mut inner = self.inner.write().await;

        if inner.users.iter().any(|u| u.email == user.email) {
            return Err(RepoError::DuplicateEmail);
        }

        let created = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: assignment.resolve(inner.users.is_empty()),
            profile_image: None,
            date: Utc::now(),
        };
        inner.users.push(created.clone());
        Ok(created)
    }

    async fn set_user_role(&self, id: Uuid, role: Role) -> RepoResult<Option<User>> {
        self.check()?;
        let mut inner = self.inner.write().await;
        Ok(inner.users.iter_mut().find(|u| u.id == id).map(|user| {
            user.role = role;
            user.clone()
        }))
    }

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> RepoResult<Option<User>> {
        self.check()?;
        let mut inner = self.inner.write().await;
        Ok(inner.users.iter_mut().find(|u| u.id == id).map(|user| {
            if let Some(name) = changes.name {
                user.name = name;
            }
            if let Some(image) = changes.profile_image {
                user.profile_image = Some(image);
            }
            user.clone()
        }))
    }

    async fn get_authors(&self, ids: &[Uuid]) -> RepoResult<Vec<AuthorRef>> {
        self.check()?;
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .map(|u| AuthorRef {
                id: u.id,
                name: u.name.clone(),
            })
            .collect())
    }

    async fn list_actualites(
        &self,
        category: Option<Category>,
        limit: Option<i64>,
    ) -> RepoResult<Vec<Actualite>> {
        self.check()?;
        let inner = self.inner.read().await;
        let matching = inner
            .actualites
            .iter()
            .filter(|a| category.is_none_or(|c| a.category == c))
            .cloned()
            .collect();
        let mut sorted = sorted_by_date_desc(matching);
        if let Some(limit) = limit {
            sorted.truncate(limit.max(0) as usize);
        }
        Ok(sorted)
    }

    async fn get_actualite(&self, id: Uuid) -> RepoResult<Option<Actualite>> {
        self.check()?;
        let inner = self.inner.read().await;
        Ok(inner.actualites.iter().find(|a| a.id == id).cloned())
    }

    async fn create_actualite(&self, actualite: NewActualite) -> RepoResult<Actualite> {
        self.check()?;
        let created = Actualite {
            id: Uuid::new_v4(),
            title: actualite.title,
            content: actualite.content,
            category: actualite.category,
            date: Utc::now(),
            image_url: actualite.image_url,
            author_id: Some(actualite.author_id),
        };
        self.inner.write().await.actualites.push(created.clone());
        Ok(created)
    }

    async fn update_actualite(
        &self,
        id: Uuid,
        changes: ActualiteChanges,
    ) -> RepoResult<Option<Actualite>> {
        self.check()?;
        let mut inner = self.inner.write().await;
        Ok(inner.actualites.iter_mut().find(|a| a.id == id).map(|a| {
            a.title = changes.title;
            a.content = changes.content;
            if let Some(category) = changes.category {
                a.category = category;
            }
            if let Some(image_url) = changes.image_url {
                a.image_url = image_url;
            }
            a.clone()
        }))
    }

    async fn delete_actualite(&self, id: Uuid) -> RepoResult<bool> {
        self.check()?;
        let mut inner = self.inner.write().await;
        let before = inner.actualites.len();
        inner.actualites.retain(|a| a.id != id);
        Ok(inner.actualites.len() < before)
    }

    async fn list_events(&self, category: Option<Category>) -> RepoResult<Vec<Event>> {
        self.check()?;
        let inner = self.inner.read().await;
        let matching = inner
            .events
            .iter()
            .filter(|e| category.is_none_or(|c| e.category == c))
            .cloned()
            .collect();
        Ok(sorted_by_event_date(matching))
    }

    async fn list_upcoming_events(&self, now: DateTime<Utc>, limit: i64) -> RepoResult<Vec<Event>> {
        self.check()?;
        let inner = self.inner.read().await;
        let upcoming = inner
            .events
            .iter()
            .filter(|e| e.event_date >= now)
            .cloned()
            .collect();
        let mut sorted = sorted_by_event_date(upcoming);
        sorted.truncate(limit.max(0) as usize);
        Ok(sorted)
    }

    async fn get_event(&self, id: Uuid) -> RepoResult<Option<Event>> {
        self.check()?;
        let inner = self.inner.read().await;
        Ok(inner.events.iter().find(|e| e.id == id).cloned())
    }

    async fn create_event(&self, event: NewEvent) -> RepoResult<Event> {
        self.check()?;
        let created = Event {
            id: Uuid::new_v4(),
            title: event.title,
            description: event.description,
            category: event.category,
            event_date: event.event_date,
            location: event.location,
            image_url: event.image_url,
            author_id: Some(event.author_id),
            created_at: Utc::now(),
        };
        self.inner.write().await.events.push(created.clone());
        Ok(created)
    }

    async fn update_event(&self, id: Uuid, changes: EventChanges) -> RepoResult<Option<Event>> {
        self.check()?;
        let mut inner = self.inner.write().await;
        Ok(inner.events.iter_mut().find(|e| e.id == id).map(|e| {
            e.title = changes.title;
            e.description = changes.description;
            e.event_date = changes.event_date;
            e.location = changes.location;
            if let Some(category) = changes.category {
                e.category = category;
            }
            if let Some(image_url) = changes.image_url {
                e.image_url = image_url;
            }
            e.clone()
        }))
    }

    async fn delete_event(&self, id: Uuid) -> RepoResult<bool> {
        self.check()?;
        let mut inner = self.inner.write().await;
        let before = inner.events.len();
        inner.events.retain(|e| e.id != id);
        Ok(inner.events.len() < before)
    }
}
