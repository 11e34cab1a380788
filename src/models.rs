use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

/// Placeholder image stored on an actualite created without an `imageUrl`.
pub const DEFAULT_ACTUALITE_IMAGE: &str = "/images/news-default.jpg";
/// Placeholder image stored on an event created without an `imageUrl`.
pub const DEFAULT_EVENT_IMAGE: &str = "/images/event-default.jpg";

// --- Enumerations ---

/// Role
///
/// The RBAC flag carried by every account. Exactly one value at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Category
///
/// The closed set of sections an actualite or an event belongs to. Any other value is
/// rejected at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub enum Category {
    #[default]
    #[serde(rename = "académique")]
    Academique,
    #[serde(rename = "culturel")]
    Culturel,
    #[serde(rename = "sportif")]
    Sportif,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Academique, Category::Culturel, Category::Sportif];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Academique => "académique",
            Category::Culturel => "culturel",
            Category::Sportif => "sportif",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

// --- Stored Records ---

/// User
///
/// The canonical account record as persisted in the `users` table. It carries the
/// password hash and is therefore never serialized; use [`PublicUser`] on the wire.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub profile_image: Option<String>,
    pub date: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            profile_image: self.profile_image.clone(),
            date: self.date,
        }
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Actualite
///
/// A news article row. `author_id` is a bare reference; handlers resolve it into an
/// [`AuthorRef`] before anything leaves the server.
#[derive(Debug, Clone)]
pub struct Actualite {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub category: Category,
    pub date: DateTime<Utc>,
    pub image_url: String,
    pub author_id: Option<Uuid>,
}

/// Event
///
/// A calendar entry. `event_date` is supplied by the caller and is independent from
/// `created_at`; it alone decides whether the event is upcoming.
#[derive(Debug, Clone)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub event_date: DateTime<Utc>,
    pub location: String,
    pub image_url: String,
    pub author_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

// --- Response Schemas ---

/// PublicUser
///
/// Output schema for an account: everything except the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub profile_image: Option<String>,
    #[ts(type = "string")]
    pub date: DateTime<Utc>,
}

/// UserSummary
///
/// Compact account description returned by the role mutation endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// AuthorRef
///
/// The denormalized author attached to content views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AuthorRef {
    pub id: Uuid,
    pub name: String,
}

/// ActualiteView
///
/// An actualite as served to clients, with its author resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ActualiteView {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub category: Category,
    #[ts(type = "string")]
    pub date: DateTime<Utc>,
    pub image_url: String,
    pub author: Option<AuthorRef>,
}

impl ActualiteView {
    pub fn new(actualite: Actualite, author: Option<AuthorRef>) -> Self {
        Self {
            id: actualite.id,
            title: actualite.title,
            content: actualite.content,
            category: actualite.category,
            date: actualite.date,
            image_url: actualite.image_url,
            author,
        }
    }
}

/// EventView
///
/// An event as served to clients, with its author resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct EventView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Category,
    #[ts(type = "string")]
    pub event_date: DateTime<Utc>,
    pub location: String,
    pub image_url: String,
    pub author: Option<AuthorRef>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl EventView {
    pub fn new(event: Event, author: Option<AuthorRef>) -> Self {
        Self {
            id: event.id,
            title: event.title,
            description: event.description,
            category: event.category,
            event_date: event.event_date,
            location: event.location,
            image_url: event.image_url,
            author,
            created_at: event.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageResponse {
    pub msg: String,
}

impl MessageResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

/// RoleChangeResponse
///
/// Output of make-admin / remove-admin: a confirmation and the target's new state.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RoleChangeResponse {
    pub msg: String,
    pub user: UserSummary,
}

/// StoreProbe
///
/// Output of the connectivity probe (GET /api/auth/test).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoreProbe {
    pub success: bool,
    pub message: String,
    pub count: i64,
}

// --- Request Payloads (Input Schemas) ---

/// RegisterRequest
///
/// Input for POST /api/auth/register. `role` is a wish, not a grant: it never raises the
/// role above what the account already qualifies for.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "requested_role"
    )]
    pub role: Option<Role>,
}

// An unrecognised role name is treated as no request at all.
fn requested_role<'de, D>(deserializer: D) -> Result<Option<Role>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| value.parse().ok()))
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// RoleChangeRequest
///
/// Body of make-admin / remove-admin. The identifier is kept as text so a malformed
/// value resolves to "User not found" instead of a body rejection.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RoleChangeRequest {
    pub user_id: String,
}

/// ProfileUpdateRequest
///
/// Partial update of the caller's own profile. Omitted or empty fields are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProfileUpdateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}

/// ActualitePayload
///
/// Body of both create and update for actualites. `category` is validated by the
/// handler so an unknown value maps to a 400 with the usual message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ActualitePayload {
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// EventPayload
///
/// Body of both create and update for events.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct EventPayload {
    pub title: String,
    pub description: String,
    #[ts(type = "string")]
    pub event_date: DateTime<Utc>,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

// --- Repository Inputs ---

/// NewUser
///
/// An account about to be inserted. The role is not part of it: the store decides it
/// atomically through a [`RoleAssignment`].
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// RoleAssignment
///
/// The registration-time role rules, evaluated by the store inside the same critical
/// section as the insert so that "first account" is decided exactly once.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleAssignment {
    /// The email is on the configured administrator allow-list.
    pub on_allow_list: bool,
    /// The role asked for in the request body, if any.
    pub requested: Option<Role>,
}

impl RoleAssignment {
    /// Allow-list members and the very first account are admins; everyone else is a
    /// user. `requested` can only confirm admin for an account that already qualifies.
    pub fn resolve(&self, is_first_account: bool) -> Role {
        if self.on_allow_list || is_first_account {
            Role::Admin
        } else {
            Role::User
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub profile_image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewActualite {
    pub title: String,
    pub content: String,
    pub category: Category,
    pub image_url: String,
    pub author_id: Uuid,
}

/// ActualiteChanges
///
/// Update of an actualite: title and content are overwritten, `None` keeps the stored
/// category / image.
#[derive(Debug, Clone)]
pub struct ActualiteChanges {
    pub title: String,
    pub content: String,
    pub category: Option<Category>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub event_date: DateTime<Utc>,
    pub location: String,
    pub image_url: String,
    pub author_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct EventChanges {
    pub title: String,
    pub description: String,
    pub event_date: DateTime<Utc>,
    pub location: String,
    pub category: Option<Category>,
    pub image_url: Option<String>,
}
