use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::RepoError,
    models::{
        Actualite, ActualiteChanges, AuthorRef, Category, Event, EventChanges, NewActualite,
        NewEvent, NewUser, ProfileChanges, Role, RoleAssignment, User,
    },
};

mod memory;
mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository Trait
///
/// The abstract contract for all persistence operations. Handlers only ever see
/// `Arc<dyn Repository>`, so the Postgres store and the in-memory store are
/// interchangeable.
///
/// Ordering is part of the contract: actualites come back newest `date` first, events
/// soonest `event_date` first, users newest account first.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    async fn list_users(&self) -> RepoResult<Vec<User>>;
    async fn count_users(&self) -> RepoResult<i64>;

    /// Inserts the account and decides its role in the same critical section, so the
    /// "first account" rule is evaluated against a store nobody else is writing to.
    /// Fails with [`RepoError::DuplicateEmail`] when the email is taken.
    async fn create_user(&self, user: NewUser, assignment: RoleAssignment) -> RepoResult<User>;

    async fn set_user_role(&self, id: Uuid, role: Role) -> RepoResult<Option<User>>;
    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> RepoResult<Option<User>>;

    /// Resolves author references for content views. Unknown ids are simply absent.
    async fn get_authors(&self, ids: &[Uuid]) -> RepoResult<Vec<AuthorRef>>;

    // --- Actualites ---
    async fn list_actualites(
        &self,
        category: Option<Category>,
        limit: Option<i64>,
    ) -> RepoResult<Vec<Actualite>>;
    async fn get_actualite(&self, id: Uuid) -> RepoResult<Option<Actualite>>;
    async fn create_actualite(&self, actualite: NewActualite) -> RepoResult<Actualite>;
    async fn update_actualite(
        &self,
        id: Uuid,
        changes: ActualiteChanges,
    ) -> RepoResult<Option<Actualite>>;
    // Returns true only if a row was removed.
    async fn delete_actualite(&self, id: Uuid) -> RepoResult<bool>;

    // --- Events ---
    async fn list_events(&self, category: Option<Category>) -> RepoResult<Vec<Event>>;
    /// Events with `event_date >= now`, soonest first.
    async fn list_upcoming_events(&self, now: DateTime<Utc>, limit: i64) -> RepoResult<Vec<Event>>;
    async fn get_event(&self, id: Uuid) -> RepoResult<Option<Event>>;
    async fn create_event(&self, event: NewEvent) -> RepoResult<Event>;
    async fn update_event(&self, id: Uuid, changes: EventChanges) -> RepoResult<Option<Event>>;
    async fn delete_event(&self, id: Uuid) -> RepoResult<bool>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;
