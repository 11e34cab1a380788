use axum::{
    Json,
    extract::{Path, State},
};

use super::{
    AppJson, HIGHLIGHT_LIMIT, actualite_view, actualite_views, non_empty, parse_category,
    parse_id, parse_optional_category,
};
use crate::{
    AppState,
    auth::AdminUser,
    error::ApiError,
    models::{
        ActualiteChanges, ActualitePayload, ActualiteView, DEFAULT_ACTUALITE_IMAGE,
        MessageResponse, NewActualite,
    },
};

/// list_actualites
///
/// [Public Route] Every actualite, newest `date` first.
#[utoipa::path(
    get,
    path = "/api/actualites",
    responses((status = 200, description = "All actualites", body = [ActualiteView]))
)]
pub async fn list_actualites(
    State(state): State<AppState>,
) -> Result<Json<Vec<ActualiteView>>, ApiError> {
    let actualites = state.repo.list_actualites(None, None).await?;
    Ok(Json(actualite_views(&state.repo, actualites).await?))
}

/// latest_actualites
///
/// [Public Route] The three most recent actualites.
#[utoipa::path(
    get,
    path = "/api/actualites/latest",
    responses((status = 200, description = "Latest actualites", body = [ActualiteView]))
)]
pub async fn latest_actualites(
    State(state): State<AppState>,
) -> Result<Json<Vec<ActualiteView>>, ApiError> {
    let actualites = state
        .repo
        .list_actualites(None, Some(HIGHLIGHT_LIMIT))
        .await?;
    Ok(Json(actualite_views(&state.repo, actualites).await?))
}

/// actualites_by_category
///
/// [Public Route] Actualites of one category, newest first. An unknown category is a
/// 400, not an empty list.
#[utoipa::path(
    get,
    path = "/api/actualites/category/{category}",
    params(("category" = String, Path, description = "académique | culturel | sportif")),
    responses(
        (status = 200, description = "Actualites in category", body = [ActualiteView]),
        (status = 400, description = "Invalid category")
    )
)]
pub async fn actualites_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<Vec<ActualiteView>>, ApiError> {
    let category = parse_category(&category)?;
    let actualites = state.repo.list_actualites(Some(category), None).await?;
    Ok(Json(actualite_views(&state.repo, actualites).await?))
}

/// get_actualite
///
/// [Public Route] A single actualite. Malformed and unknown ids are both 404.
#[utoipa::path(
    get,
    path = "/api/actualites/{id}",
    params(("id" = String, Path, description = "Actualite ID")),
    responses(
        (status = 200, description = "Found", body = ActualiteView),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_actualite(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ActualiteView>, ApiError> {
    let id = parse_id(&id, ApiError::actualite_not_found)?;
    let actualite = state
        .repo
        .get_actualite(id)
        .await?
        .ok_or_else(ApiError::actualite_not_found)?;
    Ok(Json(actualite_view(&state.repo, actualite).await?))
}

/// create_actualite
///
/// [Admin Route] Publishes an actualite. The author is always the calling admin.
#[utoipa::path(
    post,
    path = "/api/actualites",
    request_body = ActualitePayload,
    responses(
        (status = 200, description = "Created", body = ActualiteView),
        (status = 400, description = "Invalid category"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn create_actualite(
    AdminUser { id: author_id, .. }: AdminUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<ActualitePayload>,
) -> Result<Json<ActualiteView>, ApiError> {
    let category = parse_optional_category(payload.category.as_deref())?.unwrap_or_default();

    let actualite = state
        .repo
        .create_actualite(NewActualite {
            title: payload.title,
            content: payload.content,
            category,
            image_url: non_empty(payload.image_url)
                .unwrap_or_else(|| DEFAULT_ACTUALITE_IMAGE.to_string()),
            author_id,
        })
        .await?;

    tracing::info!(actualite_id = %actualite.id, %author_id, "actualite created");
    Ok(Json(actualite_view(&state.repo, actualite).await?))
}

/// update_actualite
///
/// [Admin Route] Overwrites title and content; category and image are kept when the
/// body omits them. The author never changes.
#[utoipa::path(
    put,
    path = "/api/actualites/{id}",
    params(("id" = String, Path, description = "Actualite ID")),
    request_body = ActualitePayload,
    responses(
        (status = 200, description = "Updated", body = ActualiteView),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_actualite(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<ActualitePayload>,
) -> Result<Json<ActualiteView>, ApiError> {
    let id = parse_id(&id, ApiError::actualite_not_found)?;
    let category = parse_optional_category(payload.category.as_deref())?;

    let actualite = state
        .repo
        .update_actualite(
            id,
            ActualiteChanges {
                title: payload.title,
                content: payload.content,
                category,
                image_url: non_empty(payload.image_url),
            },
        )
        .await?
        .ok_or_else(ApiError::actualite_not_found)?;

    tracing::info!(actualite_id = %id, editor_id = %admin.id, "actualite updated");
    Ok(Json(actualite_view(&state.repo, actualite).await?))
}

/// delete_actualite
///
/// [Admin Route] Hard delete. The author's account is untouched.
#[utoipa::path(
    delete,
    path = "/api/actualites/{id}",
    params(("id" = String, Path, description = "Actualite ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_actualite(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id, ApiError::actualite_not_found)?;

    if !state.repo.delete_actualite(id).await? {
        return Err(ApiError::actualite_not_found());
    }

    tracing::info!(actualite_id = %id, "actualite deleted");
    Ok(Json(MessageResponse::new("Actualité supprimée")))
}
