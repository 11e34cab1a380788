use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;

use super::{
    AppJson, HIGHLIGHT_LIMIT, event_view, event_views, non_empty, parse_category, parse_id,
    parse_optional_category,
};
use crate::{
    AppState,
    auth::AdminUser,
    error::ApiError,
    models::{DEFAULT_EVENT_IMAGE, EventChanges, EventPayload, EventView, MessageResponse, NewEvent},
};

/// list_events
///
/// [Public Route] Every event, soonest `eventDate` first. Past events are included.
#[utoipa::path(
    get,
    path = "/api/events",
    responses((status = 200, description = "All events", body = [EventView]))
)]
pub async fn list_events(State(state): State<AppState>) -> Result<Json<Vec<EventView>>, ApiError> {
    let events = state.repo.list_events(None).await?;
    Ok(Json(event_views(&state.repo, events).await?))
}

/// upcoming_events
///
/// [Public Route] The next three events whose `eventDate` is not before the time of
/// the request. Past events are excluded, not sorted last.
#[utoipa::path(
    get,
    path = "/api/events/upcoming",
    responses((status = 200, description = "Upcoming events", body = [EventView]))
)]
pub async fn upcoming_events(
    State(state): State<AppState>,
) -> Result<Json<Vec<EventView>>, ApiError> {
    let events = state
        .repo
        .list_upcoming_events(Utc::now(), HIGHLIGHT_LIMIT)
        .await?;
    Ok(Json(event_views(&state.repo, events).await?))
}

/// events_by_category
///
/// [Public Route] Events of one category, soonest first.
#[utoipa::path(
    get,
    path = "/api/events/category/{category}",
    params(("category" = String, Path, description = "académique | culturel | sportif")),
    responses(
        (status = 200, description = "Events in category", body = [EventView]),
        (status = 400, description = "Invalid category")
    )
)]
pub async fn events_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<Vec<EventView>>, ApiError> {
    let category = parse_category(&category)?;
    let events = state.repo.list_events(Some(category)).await?;
    Ok(Json(event_views(&state.repo, events).await?))
}

#[utoipa::path(
    get,
    path = "/api/events/{id}",
    params(("id" = String, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Found", body = EventView),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EventView>, ApiError> {
    let id = parse_id(&id, ApiError::event_not_found)?;
    let event = state
        .repo
        .get_event(id)
        .await?
        .ok_or_else(ApiError::event_not_found)?;
    Ok(Json(event_view(&state.repo, event).await?))
}

/// create_event
///
/// [Admin Route] Schedules an event. `eventDate` may be in the past.
#[utoipa::path(
    post,
    path = "/api/events",
    request_body = EventPayload,
    responses(
        (status = 200, description = "Created", body = EventView),
        (status = 400, description = "Invalid category"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn create_event(
    AdminUser { id: author_id, .. }: AdminUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<EventPayload>,
) -> Result<Json<EventView>, ApiError> {
    let category = parse_optional_category(payload.category.as_deref())?.unwrap_or_default();

    let event = state
        .repo
        .create_event(NewEvent {
            title: payload.title,
            description: payload.description,
            category,
            event_date: payload.event_date,
            location: payload.location,
            image_url: non_empty(payload.image_url)
                .unwrap_or_else(|| DEFAULT_EVENT_IMAGE.to_string()),
            author_id,
        })
        .await?;

    tracing::info!(event_id = %event.id, %author_id, "event created");
    Ok(Json(event_view(&state.repo, event).await?))
}

/// update_event
///
/// [Admin Route] Overwrites title, description, date and location; category and image
/// are kept when omitted.
#[utoipa::path(
    put,
    path = "/api/events/{id}",
    params(("id" = String, Path, description = "Event ID")),
    request_body = EventPayload,
    responses(
        (status = 200, description = "Updated", body = EventView),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_event(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<EventPayload>,
) -> Result<Json<EventView>, ApiError> {
    let id = parse_id(&id, ApiError::event_not_found)?;
    let category = parse_optional_category(payload.category.as_deref())?;

    let event = state
        .repo
        .update_event(
            id,
            EventChanges {
                title: payload.title,
                description: payload.description,
                event_date: payload.event_date,
                location: payload.location,
                category,
                image_url: non_empty(payload.image_url),
            },
        )
        .await?
        .ok_or_else(ApiError::event_not_found)?;

    tracing::info!(event_id = %id, editor_id = %admin.id, "event updated");
    Ok(Json(event_view(&state.repo, event).await?))
}

#[utoipa::path(
    delete,
    path = "/api/events/{id}",
    params(("id" = String, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_event(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id, ApiError::event_not_found)?;

    if !state.repo.delete_event(id).await? {
        return Err(ApiError::event_not_found());
    }

    tracing::info!(event_id = %id, "event deleted");
    Ok(Json(MessageResponse::new("Événement supprimé")))
}
