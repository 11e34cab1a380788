//! HTTP handlers, one module per resource.
//!
//! Access control is expressed in the handler signatures: `AuthUser` for routes that
//! need a valid token, `AdminUser` for routes behind the admin gate, neither for
//! public routes.

use axum::extract::FromRequest;
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::{Actualite, ActualiteView, AuthorRef, Category, Event, EventView},
    repository::RepositoryState,
};

pub mod actualites;
pub mod auth;
pub mod events;

/// JSON body extractor whose rejections render as `ApiError::BadRequest`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// How many items the "latest" and "upcoming" views return.
pub const HIGHLIGHT_LIMIT: i64 = 3;

/// Parses a path identifier. A malformed id can never match a document, so it is
/// reported with the resource's not-found error rather than as a bad request.
pub(crate) fn parse_id(raw: &str, not_found: fn() -> ApiError) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| not_found())
}

/// Validates a category taken from a path segment or a body field.
pub(crate) fn parse_category(raw: &str) -> Result<Category, ApiError> {
    raw.parse().map_err(|_| ApiError::invalid_category())
}

/// Validates an optional body category; an empty string counts as omitted.
pub(crate) fn parse_optional_category(raw: Option<&str>) -> Result<Option<Category>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => parse_category(value).map(Some),
        None => Ok(None),
    }
}

/// Treats an empty or whitespace-only string like an omitted field.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// load_authors
///
/// The explicit "populate" step: after the primary fetch, one lookup resolves every
/// distinct author id into an `{id, name}` reference.
async fn load_authors(
    repo: &RepositoryState,
    ids: impl Iterator<Item = Uuid>,
) -> Result<HashMap<Uuid, AuthorRef>, ApiError> {
    let mut ids: Vec<Uuid> = ids.collect();
    ids.sort_unstable();
    ids.dedup();

    let authors = repo.get_authors(&ids).await?;
    Ok(authors.into_iter().map(|a| (a.id, a)).collect())
}

pub(crate) async fn actualite_views(
    repo: &RepositoryState,
    actualites: Vec<Actualite>,
) -> Result<Vec<ActualiteView>, ApiError> {
    let authors = load_authors(repo, actualites.iter().filter_map(|a| a.author_id)).await?;
    Ok(actualites
        .into_iter()
        .map(|a| {
            let author = a.author_id.and_then(|id| authors.get(&id).cloned());
            ActualiteView::new(a, author)
        })
        .collect())
}

pub(crate) async fn event_views(
    repo: &RepositoryState,
    events: Vec<Event>,
) -> Result<Vec<EventView>, ApiError> {
    let authors = load_authors(repo, events.iter().filter_map(|e| e.author_id)).await?;
    Ok(events
        .into_iter()
        .map(|e| {
            let author = e.author_id.and_then(|id| authors.get(&id).cloned());
            EventView::new(e, author)
        })
        .collect())
}

pub(crate) async fn actualite_view(
    repo: &RepositoryState,
    actualite: Actualite,
) -> Result<ActualiteView, ApiError> {
    let mut views = actualite_views(repo, vec![actualite]).await?;
    views
        .pop()
        .ok_or_else(|| ApiError::ServerError("empty view batch".to_string()))
}

pub(crate) async fn event_view(repo: &RepositoryState, event: Event) -> Result<EventView, ApiError> {
    let mut views = event_views(repo, vec![event]).await?;
    views
        .pop()
        .ok_or_else(|| ApiError::ServerError("empty view batch".to_string()))
}
