use axum::{Json, extract::State};

use super::{AppJson, non_empty, parse_id};
use crate::{
    AppState,
    auth::{AdminUser, AuthUser, hash_password, issue_token, verify_password},
    error::ApiError,
    models::{
        LoginRequest, NewUser, ProfileChanges, ProfileUpdateRequest, PublicUser, RegisterRequest,
        Role, RoleAssignment, RoleChangeRequest, RoleChangeResponse, StoreProbe, TokenResponse,
    },
};

/// get_me
///
/// [Authenticated Route] Returns the caller's own account without the password hash.
#[utoipa::path(
    get,
    path = "/api/auth",
    responses(
        (status = 200, description = "Caller profile", body = PublicUser),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Account no longer exists")
    )
)]
pub async fn get_me(
    AuthUser { id }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<PublicUser>, ApiError> {
    let user = state
        .repo
        .get_user(id)
        .await?
        .ok_or_else(ApiError::user_not_found)?;
    Ok(Json(user.to_public()))
}

/// store_probe
///
/// [Public Route] Connectivity check against the user store.
#[utoipa::path(
    get,
    path = "/api/auth/test",
    responses((status = 200, description = "Store reachable", body = StoreProbe))
)]
pub async fn store_probe(State(state): State<AppState>) -> Result<Json<StoreProbe>, ApiError> {
    let count = state.repo.count_users().await?;
    Ok(Json(StoreProbe {
        success: true,
        message: "Store connection successful".to_string(),
        count,
    }))
}

/// list_users
///
/// [Admin Route] Every account, newest first, without password hashes.
#[utoipa::path(
    get,
    path = "/api/auth/users",
    responses(
        (status = 200, description = "All users", body = [PublicUser]),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn list_users(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    let users = state.repo.list_users().await?;
    Ok(Json(users.iter().map(|u| u.to_public()).collect()))
}

/// register
///
/// [Public Route] Creates an account and returns a token for it.
///
/// The role comes from the allow-list and first-account rules only; a `role` in the
/// body is at most a confirmation of what the account already qualifies for.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registered", body = TokenResponse),
        (status = 400, description = "Missing field"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let email = payload.email.trim().to_string();
    let name = payload.name.trim().to_string();
    if name.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Name, email and password are required".to_string(),
        ));
    }

    tracing::info!(email = %email, "registration attempt");

    if state.repo.get_user_by_email(&email).await?.is_some() {
        tracing::info!(email = %email, "registration refused: email already on file");
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    let assignment = RoleAssignment {
        on_allow_list: state.config.is_admin_email(&email),
        requested: payload.role,
    };

    let password_hash = hash_password(payload.password, state.config.bcrypt_cost).await?;

    // A concurrent registration of the same email surfaces here as DuplicateEmail.
    let user = state
        .repo
        .create_user(
            NewUser {
                name,
                email,
                password_hash,
            },
            assignment,
        )
        .await?;

    if assignment.requested == Some(Role::Admin) && user.role != Role::Admin {
        tracing::warn!(user_id = %user.id, "requested admin role ignored");
    }
    tracing::info!(user_id = %user.id, role = %user.role, "user created");

    let token = issue_token(user.id, &state.config)?;
    Ok(Json(TokenResponse { token }))
}

/// login
///
/// [Public Route] Exchanges credentials for a token. Unknown email and wrong password
/// produce the same error so accounts cannot be enumerated.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = TokenResponse),
        (status = 400, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = state
        .repo
        .get_user_by_email(payload.email.trim())
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !verify_password(payload.password, user.password_hash.clone()).await {
        return Err(ApiError::InvalidCredentials);
    }

    let token = issue_token(user.id, &state.config)?;
    Ok(Json(TokenResponse { token }))
}

/// make_admin
///
/// [Admin Route] Grants the admin role. Idempotent.
#[utoipa::path(
    post,
    path = "/api/auth/make-admin",
    request_body = RoleChangeRequest,
    responses(
        (status = 200, description = "Promoted", body = RoleChangeResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn make_admin(
    AdminUser { id: caller, .. }: AdminUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<RoleChangeRequest>,
) -> Result<Json<RoleChangeResponse>, ApiError> {
    let target = parse_id(&payload.user_id, ApiError::user_not_found)?;

    let user = state
        .repo
        .set_user_role(target, Role::Admin)
        .await?
        .ok_or_else(ApiError::user_not_found)?;

    tracing::info!(%caller, %target, "admin role granted");
    Ok(Json(RoleChangeResponse {
        msg: "User successfully made admin".to_string(),
        user: user.summary(),
    }))
}

/// remove_admin
///
/// [Admin Route] Demotes an account to `user`. An admin can never demote themselves
/// here. Demoting the last remaining admin from another admin account is not blocked.
#[utoipa::path(
    post,
    path = "/api/auth/remove-admin",
    request_body = RoleChangeRequest,
    responses(
        (status = 200, description = "Demoted", body = RoleChangeResponse),
        (status = 400, description = "Self-demotion attempt"),
        (status = 404, description = "User not found")
    )
)]
pub async fn remove_admin(
    AdminUser { id: caller, .. }: AdminUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<RoleChangeRequest>,
) -> Result<Json<RoleChangeResponse>, ApiError> {
    let target = parse_id(&payload.user_id, ApiError::user_not_found)?;

    if state.repo.get_user(target).await?.is_none() {
        return Err(ApiError::user_not_found());
    }

    if target == caller {
        return Err(ApiError::BadRequest(
            "Cannot remove your own admin privileges".to_string(),
        ));
    }

    let user = state
        .repo
        .set_user_role(target, Role::User)
        .await?
        .ok_or_else(ApiError::user_not_found)?;

    tracing::info!(%caller, %target, "admin role removed");
    Ok(Json(RoleChangeResponse {
        msg: "Admin privileges removed".to_string(),
        user: user.summary(),
    }))
}

/// update_profile
///
/// [Authenticated Route] Updates the caller's name and/or profile image. Omitted or
/// empty fields keep their stored value.
#[utoipa::path(
    put,
    path = "/api/auth/profile",
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Updated profile", body = PublicUser),
        (status = 404, description = "Account no longer exists")
    )
)]
pub async fn update_profile(
    AuthUser { id }: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<ProfileUpdateRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    let changes = ProfileChanges {
        name: non_empty(payload.name).map(|n| n.trim().to_string()),
        profile_image: non_empty(payload.profile_image),
    };

    let user = state
        .repo
        .update_profile(id, changes)
        .await?
        .ok_or_else(ApiError::user_not_found)?;
    Ok(Json(user.to_public()))
}
