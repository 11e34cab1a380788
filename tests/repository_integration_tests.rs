//! Postgres-backed repository tests. They need a reachable database in `DATABASE_URL`
//! and are skipped otherwise. Each test starts from empty tables, so they run serially.

use campus_journal::{
    RepoError,
    models::{
        ActualiteChanges, Category, EventChanges, NewActualite, NewEvent, NewUser,
        ProfileChanges, Role, RoleAssignment, User,
    },
    repository::{PostgresRepository, Repository},
};
use chrono::{Duration, Utc};
use serial_test::serial;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::test;
use uuid::Uuid;

// --- Test Context and Setup ---

struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    /// Connects, migrates and empties the tables. Returns `None` without a database.
    async fn setup() -> Option<Self> {
        dotenv::dotenv().ok();

        let Ok(db_url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set; skipping Postgres repository test");
            return None;
        };

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        let repo = PostgresRepository::new(pool.clone());
        repo.migrate().await.expect("Failed to run database migrations.");

        sqlx::query("TRUNCATE events, actualites, users")
            .execute(&pool)
            .await
            .expect("Failed to reset tables");

        Some(DbTestContext { pool })
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }
}

// --- Test Data Helpers ---

fn new_user(email: &str) -> NewUser {
    NewUser {
        name: email.split('@').next().unwrap_or("user").to_string(),
        email: email.to_string(),
        password_hash: "$2b$04$placeholder".to_string(),
    }
}

async fn create_user(repo: &PostgresRepository, email: &str) -> User {
    repo.create_user(new_user(email), RoleAssignment::default())
        .await
        .expect("Failed to create test user")
}

fn new_actualite(author_id: Uuid, title: &str, category: Category) -> NewActualite {
    NewActualite {
        title: title.to_string(),
        content: "contenu".to_string(),
        category,
        image_url: "/img/a.jpg".to_string(),
        author_id,
    }
}

fn new_event(author_id: Uuid, title: &str, offset: Duration) -> NewEvent {
    NewEvent {
        title: title.to_string(),
        description: "desc".to_string(),
        category: Category::Sportif,
        event_date: Utc::now() + offset,
        location: "Stade".to_string(),
        image_url: "/img/e.jpg".to_string(),
        author_id,
    }
}

// --- Users ---

#[test]
#[serial]
async fn test_first_account_is_admin_and_email_is_unique() {
    let Some(ctx) = DbTestContext::setup().await else { return };
    let repo = ctx.repository();

    let first = create_user(&repo, "first@school.fr").await;
    let second = create_user(&repo, "second@school.fr").await;
    assert_eq!(first.role, Role::Admin);
    assert_eq!(second.role, Role::User);

    let duplicate = repo
        .create_user(new_user("first@school.fr"), RoleAssignment::default())
        .await;
    assert!(matches!(duplicate, Err(RepoError::DuplicateEmail)));
    assert_eq!(repo.count_users().await.unwrap(), 2);
}

#[test]
#[serial]
async fn test_concurrent_registrations_yield_one_first_admin() {
    let Some(ctx) = DbTestContext::setup().await else { return };
    let repo = Arc::new(ctx.repository());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let repo = repo.clone();
            tokio::spawn(async move {
                repo.create_user(new_user(&format!("racer{i}@school.fr")), RoleAssignment::default())
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut admins = 0;
    for handle in handles {
        if handle.await.unwrap().role == Role::Admin {
            admins += 1;
        }
    }
    assert_eq!(admins, 1);
}

#[test]
#[serial]
async fn test_role_and_profile_updates() {
    let Some(ctx) = DbTestContext::setup().await else { return };
    let repo = ctx.repository();

    create_user(&repo, "admin@school.fr").await;
    let user = create_user(&repo, "prof@school.fr").await;

    let promoted = repo.set_user_role(user.id, Role::Admin).await.unwrap().unwrap();
    assert_eq!(promoted.role, Role::Admin);
    assert!(repo.set_user_role(Uuid::new_v4(), Role::Admin).await.unwrap().is_none());

    let updated = repo
        .update_profile(
            user.id,
            ProfileChanges {
                name: None,
                profile_image: Some("/img/p.png".to_string()),
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.name, "prof");
    assert_eq!(updated.profile_image.as_deref(), Some("/img/p.png"));

    let by_email = repo.get_user_by_email("prof@school.fr").await.unwrap().unwrap();
    assert_eq!(by_email.id, user.id);
    assert_eq!(repo.list_users().await.unwrap().len(), 2);
}

// --- Actualites ---

#[test]
#[serial]
async fn test_actualite_crud_and_authors() {
    let Some(ctx) = DbTestContext::setup().await else { return };
    let repo = ctx.repository();
    let admin = create_user(&repo, "admin@school.fr").await;

    let created = repo
        .create_actualite(new_actualite(admin.id, "Kermesse", Category::Culturel))
        .await
        .unwrap();
    assert_eq!(created.author_id, Some(admin.id));

    let authors = repo.get_authors(&[admin.id, Uuid::new_v4()]).await.unwrap();
    assert_eq!(authors.len(), 1);
    assert_eq!(authors[0].name, "admin");

    let updated = repo
        .update_actualite(
            created.id,
            ActualiteChanges {
                title: "Kermesse 2".to_string(),
                content: "nouveau".to_string(),
                category: None,
                image_url: None,
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.title, "Kermesse 2");
    assert_eq!(updated.category, Category::Culturel);
    assert_eq!(updated.image_url, "/img/a.jpg");

    let culturel = repo
        .list_actualites(Some(Category::Culturel), None)
        .await
        .unwrap();
    assert_eq!(culturel.len(), 1);
    assert!(repo
        .list_actualites(Some(Category::Sportif), None)
        .await
        .unwrap()
        .is_empty());

    assert!(repo.delete_actualite(created.id).await.unwrap());
    assert!(!repo.delete_actualite(created.id).await.unwrap());
    assert!(repo.get_actualite(created.id).await.unwrap().is_none());
}

#[test]
#[serial]
async fn test_latest_actualites_are_limited() {
    let Some(ctx) = DbTestContext::setup().await else { return };
    let repo = ctx.repository();
    let admin = create_user(&repo, "admin@school.fr").await;

    for i in 0..5 {
        repo.create_actualite(new_actualite(admin.id, &format!("n{i}"), Category::Academique))
            .await
            .unwrap();
    }

    let latest = repo.list_actualites(None, Some(3)).await.unwrap();
    assert_eq!(latest.len(), 3);
    assert!(latest.windows(2).all(|w| w[0].date >= w[1].date));
}

// --- Events ---

#[test]
#[serial]
async fn test_upcoming_events_and_updates() {
    let Some(ctx) = DbTestContext::setup().await else { return };
    let repo = ctx.repository();
    let admin = create_user(&repo, "admin@school.fr").await;

    repo.create_event(new_event(admin.id, "past", -Duration::days(1))).await.unwrap();
    let soon = repo
        .create_event(new_event(admin.id, "soon", Duration::days(1)))
        .await
        .unwrap();
    repo.create_event(new_event(admin.id, "later", Duration::days(5))).await.unwrap();

    let upcoming = repo.list_upcoming_events(Utc::now(), 3).await.unwrap();
    let titles: Vec<_> = upcoming.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["soon", "later"]);

    let moved = repo
        .update_event(
            soon.id,
            EventChanges {
                title: "soon".to_string(),
                description: "desc".to_string(),
                event_date: soon.event_date + Duration::days(10),
                location: "Gymnase".to_string(),
                category: Some(Category::Culturel),
                image_url: None,
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(moved.category, Category::Culturel);
    assert_eq!(moved.image_url, "/img/e.jpg");

    let all = repo.list_events(None).await.unwrap();
    assert_eq!(all.first().map(|e| e.title.as_str()), Some("past"));
    assert_eq!(all.last().map(|e| e.title.as_str()), Some("soon"));

    assert!(repo.delete_event(soon.id).await.unwrap());
    assert!(repo.get_event(soon.id).await.unwrap().is_none());
}
