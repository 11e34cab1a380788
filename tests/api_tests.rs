use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use campus_journal::{
    AppConfig, AppState, InMemoryRepository, create_router,
    models::{ActualiteView, Category, EventView, PublicUser, TokenResponse},
    repository::RepositoryState,
};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceExt;

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    async fn register(&self, name: &str, email: &str, role: Option<&str>) -> reqwest::Response {
        let mut body = json!({ "name": name, "email": email, "password": "password123" });
        if let Some(role) = role {
            body["role"] = json!(role);
        }
        self.client
            .post(self.url("/api/auth/register"))
            .json(&body)
            .send()
            .await
            .expect("register request failed")
    }

    async fn register_token(&self, name: &str, email: &str) -> String {
        let response = self.register(name, email, None).await;
        assert_eq!(response.status(), 200);
        response.json::<TokenResponse>().await.unwrap().token
    }

    async fn me(&self, token: &str) -> PublicUser {
        self.client
            .get(self.url("/api/auth"))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }
}

async fn spawn_app() -> TestApp {
    let repo = Arc::new(InMemoryRepository::new()) as RepositoryState;
    let router = create_router(AppState::new(repo, AppConfig::default()));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp {
        address,
        client: reqwest::Client::new(),
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let response = app.client.get(app.url("/health")).send().await.expect("req fail");
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let router = create_router(AppState::new(
        Arc::new(InMemoryRepository::new()),
        AppConfig::default(),
    ));

    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let router = create_router(AppState::new(
        Arc::new(InMemoryRepository::new()),
        AppConfig::default(),
    ));

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let doc: Value = serde_json::from_slice(&body).unwrap();
    assert!(doc["paths"]["/api/auth/register"].is_object());
    assert!(doc["paths"]["/api/events/upcoming"].is_object());
}

/// The end-to-end access-control walkthrough: first account is admin, the second is
/// not, only the admin may publish, and category filters are validated.
#[tokio::test]
async fn test_access_control_scenario() {
    let app = spawn_app().await;

    // 1. First registrant becomes admin even when asking for nothing.
    let admin_token = app.register_token("Directrice", "direction@school.fr").await;
    let admin = app.me(&admin_token).await;
    assert_eq!(admin.role.as_str(), "admin");

    // 2. Second registrant asking for admin stays a user.
    let response = app.register("Élève", "eleve@school.fr", Some("admin")).await;
    assert_eq!(response.status(), 200);
    let user_token = response.json::<TokenResponse>().await.unwrap().token;
    let user = app.me(&user_token).await;
    assert_eq!(user.role.as_str(), "user");

    let actualite = json!({ "title": "X", "content": "Y", "category": "culturel" });

    // 3. Regular user cannot publish.
    let response = app
        .client
        .post(app.url("/api/actualites"))
        .bearer_auth(&user_token)
        .json(&actualite)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["msg"], "Access denied: admin role required");

    // 4. Admin publishes; author is the admin.
    let response = app
        .client
        .post(app.url("/api/actualites"))
        .bearer_auth(&admin_token)
        .json(&actualite)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let created: ActualiteView = response.json().await.unwrap();
    assert_eq!(created.title, "X");
    assert_eq!(created.content, "Y");
    assert_eq!(created.category, Category::Culturel);
    assert_eq!(created.author.as_ref().unwrap().id, admin.id);

    // 5. Public read by id round-trips.
    let fetched: ActualiteView = app
        .client
        .get(app.url(&format!("/api/actualites/{}", created.id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched, created);

    // 6. Unknown category is rejected.
    let response = app
        .client
        .get(app.url("/api/actualites/category/invalidcat"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_duplicate_registration_conflict() {
    let app = spawn_app().await;
    app.register_token("A", "a@school.fr").await;

    let response = app.register("A bis", "a@school.fr", None).await;
    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["msg"], "User already exists");

    let probe: Value = app
        .client
        .get(app.url("/api/auth/test"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(probe["count"], 1);
}

#[tokio::test]
async fn test_protected_routes_without_token() {
    let app = spawn_app().await;

    let response = app.client.get(app.url("/api/auth")).send().await.unwrap();
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["msg"], "No token, authorization denied");

    let response = app
        .client
        .delete(app.url(&format!("/api/events/{}", uuid::Uuid::new_v4())))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let response = app
        .client
        .get(app.url("/api/auth"))
        .bearer_auth("garbage")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_x_auth_token_header_is_accepted() {
    let app = spawn_app().await;
    let token = app.register_token("A", "a@school.fr").await;

    let response = app
        .client
        .get(app.url("/api/auth"))
        .header("x-auth-token", &token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_self_demotion_is_refused() {
    let app = spawn_app().await;
    let token = app.register_token("Admin", "admin@school.fr").await;
    let admin = app.me(&token).await;

    let response = app
        .client
        .post(app.url("/api/auth/remove-admin"))
        .bearer_auth(&token)
        .json(&json!({ "userId": admin.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    assert_eq!(app.me(&token).await.role.as_str(), "admin");
}

#[tokio::test]
async fn test_promotion_grants_admin_access() {
    let app = spawn_app().await;
    let admin_token = app.register_token("Admin", "admin@school.fr").await;
    let user_token = app.register_token("Prof", "prof@school.fr").await;
    let user = app.me(&user_token).await;

    let response = app
        .client
        .get(app.url("/api/auth/users"))
        .bearer_auth(&user_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let response = app
        .client
        .post(app.url("/api/auth/make-admin"))
        .bearer_auth(&admin_token)
        .json(&json!({ "userId": user.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["role"], "admin");

    // Same token, new role: the gate reads the store on every request.
    let response = app
        .client
        .get(app.url("/api/auth/users"))
        .bearer_auth(&user_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let users: Vec<PublicUser> = response.json().await.unwrap();
    assert_eq!(users.len(), 2);
}

#[tokio::test]
async fn test_event_lifecycle_and_upcoming() {
    let app = spawn_app().await;
    let token = app.register_token("Admin", "admin@school.fr").await;

    let mut created = Vec::new();
    for (title, offset) in [
        ("Passé", -Duration::days(1)),
        ("Tournoi", Duration::days(2)),
        ("Expo", Duration::days(1)),
    ] {
        let response = app
            .client
            .post(app.url("/api/events"))
            .bearer_auth(&token)
            .json(&json!({
                "title": title,
                "description": "desc",
                "eventDate": Utc::now() + offset,
                "location": "Cour",
                "category": "sportif",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        created.push(response.json::<EventView>().await.unwrap());
    }

    let upcoming: Vec<EventView> = app
        .client
        .get(app.url("/api/events/upcoming"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let titles: Vec<_> = upcoming.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["Expo", "Tournoi"]);

    let sport: Vec<EventView> = app
        .client
        .get(app.url("/api/events/category/sportif"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(sport.len(), 3);

    // Update without imageUrl keeps the default image.
    let target = &created[1];
    let response = app
        .client
        .put(app.url(&format!("/api/events/{}", target.id)))
        .bearer_auth(&token)
        .json(&json!({
            "title": "Tournoi final",
            "description": "desc",
            "eventDate": target.event_date,
            "location": "Gymnase",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let updated: EventView = response.json().await.unwrap();
    assert_eq!(updated.image_url, target.image_url);
    assert_eq!(updated.category, Category::Sportif);

    let response = app
        .client
        .delete(app.url(&format!("/api/events/{}", target.id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = app
        .client
        .get(app.url(&format!("/api/events/{}", target.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_accented_category_path() {
    let app = spawn_app().await;
    let token = app.register_token("Admin", "admin@school.fr").await;

    app.client
        .post(app.url("/api/actualites"))
        .bearer_auth(&token)
        .json(&json!({ "title": "Bac", "content": "Résultats" }))
        .send()
        .await
        .unwrap();

    let list: Vec<ActualiteView> = app
        .client
        .get(app.url("/api/actualites/category/académique"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].category, Category::Academique);
}

#[tokio::test]
async fn test_malformed_bodies_are_bad_requests() {
    let app = spawn_app().await;
    let token = app.register_token("Admin", "admin@school.fr").await;

    let response = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&json!({ "name": "No Password", "email": "np@school.fr" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["msg"].as_str().unwrap().contains("password"));

    let response = app
        .client
        .post(app.url("/api/events"))
        .bearer_auth(&token)
        .json(&json!({
            "title": "Match",
            "description": "Finale",
            "eventDate": "next friday",
            "location": "Gymnase"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["msg"].is_string());

    let response = app
        .client
        .post(app.url("/api/auth/make-admin"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["msg"].is_string());
}

#[tokio::test]
async fn test_unknown_requested_role_is_ignored() {
    let app = spawn_app().await;
    app.register_token("Admin", "admin@school.fr").await;

    let response = app.register("Curieux", "curieux@school.fr", Some("superuser")).await;
    assert_eq!(response.status(), 200);
    let token = response.json::<TokenResponse>().await.unwrap().token;
    assert_eq!(app.me(&token).await.role.as_str(), "user");
}
