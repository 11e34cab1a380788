use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};
use uuid::Uuid;

use super::{RepoResult, Repository};
use crate::{
    error::RepoError,
    models::{
        Actualite, ActualiteChanges, AuthorRef, Category, Event, EventChanges, NewActualite,
        NewEvent, NewUser, ProfileChanges, Role, RoleAssignment, User,
    },
};

const USER_COLUMNS: &str = "id, name, email, password, role, profile_image, date";
const ACTUALITE_COLUMNS: &str = "id, title, content, category, date, image_url, author_id";
const EVENT_COLUMNS: &str =
    "id, title, description, category, event_date, location, image_url, author_id, created_at";

/// Advisory lock key serializing registrations, so "is this the first account?" and
/// the insert that follows are observed by one transaction at a time.
const REGISTRATION_LOCK_KEY: i64 = 0x6a6f_7572_6e61_6c;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
/// All queries are checked at runtime; the schema lives in `migrations/`.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded migrations. Called once at startup.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

// --- Row Mapping ---

// Enumerations are stored as TEXT; a value outside the enum is reported as a
// column decode failure rather than silently defaulted.
fn decode_column<T>(row: &PgRow, column: &str) -> Result<T, sqlx::Error>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(|e: T::Err| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

impl<'r> FromRow<'r, PgRow> for User {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password")?,
            role: decode_column(row, "role")?,
            profile_image: row.try_get("profile_image")?,
            date: row.try_get("date")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for Actualite {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            category: decode_column(row, "category")?,
            date: row.try_get("date")?,
            image_url: row.try_get("image_url")?,
            author_id: row.try_get("author_id")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for Event {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            category: decode_column(row, "category")?,
            event_date: row.try_get("event_date")?,
            location: row.try_get("location")?,
            image_url: row.try_get("image_url")?,
            author_id: row.try_get("author_id")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    // --- USERS ---

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_users(&self) -> RepoResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY date DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn count_users(&self) -> RepoResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// create_user
    ///
    /// Runs inside a transaction holding a transaction-scoped advisory lock, so two
    /// concurrent registrations on an empty table cannot both be granted admin by the
    /// first-account rule. The lock is released on commit or rollback.
    async fn create_user(&self, user: NewUser, assignment: RoleAssignment) -> RepoResult<User> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(REGISTRATION_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *tx)
            .await?;
        let role = assignment.resolve(existing == 0);

        let inserted = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, name, email, password, role, date) \
             VALUES ($1, $2, $3, $4, $5, NOW()) RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(role.as_str())
        .fetch_one(&mut *tx)
        .await;

        let created = match inserted {
            Ok(created) => created,
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                return Err(RepoError::DuplicateEmail);
            }
            Err(e) => return Err(e.into()),
        };

        tx.commit().await?;
        Ok(created)
    }

    async fn set_user_role(&self, id: Uuid, role: Role) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET role = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// update_profile
    ///
    /// Uses `COALESCE` so that only the provided fields are written.
    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET name = COALESCE($2, name), \
             profile_image = COALESCE($3, profile_image) \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.profile_image)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_authors(&self, ids: &[Uuid]) -> RepoResult<Vec<AuthorRef>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<(Uuid, String)> =
            sqlx::query_as("SELECT id, name FROM users WHERE id = ANY($1)")
                .bind(ids.to_vec())
                .fetch_all(&self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .map(|(id, name)| AuthorRef { id, name })
            .collect())
    }

    // --- ACTUALITES ---

    async fn list_actualites(
        &self,
        category: Option<Category>,
        limit: Option<i64>,
    ) -> RepoResult<Vec<Actualite>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {ACTUALITE_COLUMNS} FROM actualites"));

        if let Some(category) = category {
            builder.push(" WHERE category = ").push_bind(category.as_str());
        }

        builder.push(" ORDER BY date DESC");

        if let Some(limit) = limit {
            builder.push(" LIMIT ").push_bind(limit);
        }

        let actualites = builder
            .build_query_as::<Actualite>()
            .fetch_all(&self.pool)
            .await?;
        Ok(actualites)
    }

    async fn get_actualite(&self, id: Uuid) -> RepoResult<Option<Actualite>> {
        let actualite = sqlx::query_as::<_, Actualite>(&format!(
            "SELECT {ACTUALITE_COLUMNS} FROM actualites WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(actualite)
    }

    async fn create_actualite(&self, actualite: NewActualite) -> RepoResult<Actualite> {
        let created = sqlx::query_as::<_, Actualite>(&format!(
            "INSERT INTO actualites (id, title, content, category, date, image_url, author_id) \
             VALUES ($1, $2, $3, $4, NOW(), $5, $6) RETURNING {ACTUALITE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(actualite.title)
        .bind(actualite.content)
        .bind(actualite.category.as_str())
        .bind(actualite.image_url)
        .bind(actualite.author_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    /// update_actualite
    ///
    /// Title and content are overwritten; `COALESCE` keeps the stored category and
    /// image when the change leaves them out. `author_id` is never touched.
    async fn update_actualite(
        &self,
        id: Uuid,
        changes: ActualiteChanges,
    ) -> RepoResult<Option<Actualite>> {
        let updated = sqlx::query_as::<_, Actualite>(&format!(
            "UPDATE actualites SET title = $2, content = $3, \
             category = COALESCE($4, category), image_url = COALESCE($5, image_url) \
             WHERE id = $1 RETURNING {ACTUALITE_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.title)
        .bind(changes.content)
        .bind(changes.category.map(|c| c.as_str()))
        .bind(changes.image_url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn delete_actualite(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM actualites WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- EVENTS ---

    async fn list_events(&self, category: Option<Category>) -> RepoResult<Vec<Event>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {EVENT_COLUMNS} FROM events"));

        if let Some(category) = category {
            builder.push(" WHERE category = ").push_bind(category.as_str());
        }

        builder.push(" ORDER BY event_date ASC");

        let events = builder
            .build_query_as::<Event>()
            .fetch_all(&self.pool)
            .await?;
        Ok(events)
    }

    async fn list_upcoming_events(&self, now: DateTime<Utc>, limit: i64) -> RepoResult<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE event_date >= $1 \
             ORDER BY event_date ASC LIMIT $2"
        ))
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    async fn get_event(&self, id: Uuid) -> RepoResult<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(event)
    }

    async fn create_event(&self, event: NewEvent) -> RepoResult<Event> {
        let created = sqlx::query_as::<_, Event>(&format!(
            "INSERT INTO events \
             (id, title, description, category, event_date, location, image_url, author_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW()) RETURNING {EVENT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(event.title)
        .bind(event.description)
        .bind(event.category.as_str())
        .bind(event.event_date)
        .bind(event.location)
        .bind(event.image_url)
        .bind(event.author_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn update_event(&self, id: Uuid, changes: EventChanges) -> RepoResult<Option<Event>> {
        let updated = sqlx::query_as::<_, Event>(&format!(
            "UPDATE events SET title = $2, description = $3, event_date = $4, location = $5, \
             category = COALESCE($6, category), image_url = COALESCE($7, image_url) \
             WHERE id = $1 RETURNING {EVENT_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.event_date)
        .bind(changes.location)
        .bind(changes.category.map(|c| c.as_str()))
        .bind(changes.image_url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn delete_event(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
