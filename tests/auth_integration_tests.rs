use axum::{
    extract::FromRequestParts,
    http::{Method, Request, StatusCode, Uri, header, request::Parts},
};
use campus_journal::{
    AppConfig, AppState, InMemoryRepository,
    auth::{AdminUser, AuthUser, Claims, TOKEN_HEADER, hash_password, issue_token, verify_password, verify_token},
    models::{NewUser, Role, RoleAssignment, User},
    repository::Repository,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::{sync::Arc, time::SystemTime};
use uuid::Uuid;

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Signs a token with explicit timestamps so expiry can be tested.
fn create_token(user_id: Uuid, iat: u64, exp: u64, secret: &str) -> String {
    let claims = Claims {
        sub: user_id,
        iat: iat as usize,
        exp: exp as usize,
    };
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

fn create_app_state(repo: InMemoryRepository) -> AppState {
    AppState::new(Arc::new(repo), test_config())
}

/// Helper to get the mutable Parts struct from a generated Request
fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

fn with_bearer(token: &str) -> Parts {
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );
    parts
}

async fn seed_user(repo: &InMemoryRepository, email: &str) -> User {
    repo.create_user(
        NewUser {
            name: email.split('@').next().unwrap().to_string(),
            email: email.to_string(),
            password_hash: "not-a-real-hash".to_string(),
        },
        RoleAssignment::default(),
    )
    .await
    .unwrap()
}

// --- Token Tests ---

#[test]
fn test_issued_token_round_trips() {
    let config = test_config();
    let user_id = Uuid::new_v4();

    let token = issue_token(user_id, &config).unwrap();
    let claims = verify_token(&token, &config).unwrap();

    assert_eq!(claims.sub, user_id);
    assert_eq!(claims.exp - claims.iat, 3600);
}

#[test]
fn test_token_signed_with_other_secret_is_rejected() {
    let now = now_secs();
    let token = create_token(Uuid::new_v4(), now, now + 3600, "some-other-secret");

    let err = verify_token(&token, &test_config()).unwrap_err();
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(err.to_string(), "Token is not valid");
}

#[test]
fn test_expired_token_is_rejected() {
    // Well past the default validation leeway.
    let now = now_secs();
    let token = create_token(Uuid::new_v4(), now - 7200, now - 3600, TEST_JWT_SECRET);

    let err = verify_token(&token, &test_config()).unwrap_err();
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
}

// --- AuthUser Extractor Tests ---

#[tokio::test]
async fn test_auth_success_with_valid_jwt() {
    let app_state = create_app_state(InMemoryRepository::new());
    let user_id = Uuid::new_v4();
    let token = issue_token(user_id, &app_state.config).unwrap();

    let mut parts = with_bearer(&token);
    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    // The gate is token-only: the account does not need to exist.
    assert_eq!(auth_user.unwrap().id, user_id);
}

#[tokio::test]
async fn test_auth_success_with_token_header() {
    let app_state = create_app_state(InMemoryRepository::new());
    let user_id = Uuid::new_v4();
    let token = issue_token(user_id, &app_state.config).unwrap();

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::HeaderName::from_static(TOKEN_HEADER),
        header::HeaderValue::from_str(&token).unwrap(),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;
    assert_eq!(auth_user.unwrap().id, user_id);
}

#[tokio::test]
async fn test_auth_failure_with_missing_header() {
    let app_state = create_app_state(InMemoryRepository::new());
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());

    let err = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap_err();

    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(err.to_string(), "No token, authorization denied");
}

#[tokio::test]
async fn test_auth_failure_with_garbage_token() {
    let app_state = create_app_state(InMemoryRepository::new());
    let mut parts = with_bearer("definitely.not.a-jwt");

    let err = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_failure_with_expired_jwt() {
    let app_state = create_app_state(InMemoryRepository::new());
    let now = now_secs();
    let token = create_token(Uuid::new_v4(), now - 7200, now - 3600, TEST_JWT_SECRET);

    let mut parts = with_bearer(&token);
    let err = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
}

// --- AdminUser Extractor Tests ---

#[tokio::test]
async fn test_admin_gate_accepts_admin() {
    let repo = InMemoryRepository::new();
    // First account is the admin.
    let admin = seed_user(&repo, "head@school.fr").await;
    assert_eq!(admin.role, Role::Admin);

    let app_state = create_app_state(repo);
    let token = issue_token(admin.id, &app_state.config).unwrap();

    let mut parts = with_bearer(&token);
    let gate = AdminUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap();
    assert_eq!(gate.id, admin.id);
    assert!(gate.user.is_admin());
}

#[tokio::test]
async fn test_admin_gate_forbids_regular_user() {
    let repo = InMemoryRepository::new();
    seed_user(&repo, "head@school.fr").await;
    let pupil = seed_user(&repo, "pupil@school.fr").await;
    assert_eq!(pupil.role, Role::User);

    let app_state = create_app_state(repo);
    let token = issue_token(pupil.id, &app_state.config).unwrap();

    let mut parts = with_bearer(&token);
    let err = AdminUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::FORBIDDEN);
    assert_eq!(err.to_string(), "Access denied: admin role required");
}

#[tokio::test]
async fn test_admin_gate_rejects_deleted_account() {
    let app_state = create_app_state(InMemoryRepository::new());
    let token = issue_token(Uuid::new_v4(), &app_state.config).unwrap();

    let mut parts = with_bearer(&token);
    let err = AdminUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_gate_reports_store_failure() {
    let app_state = create_app_state(InMemoryRepository::new_failing());
    let token = issue_token(Uuid::new_v4(), &app_state.config).unwrap();

    let mut parts = with_bearer(&token);
    let err = AdminUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err.to_string(), "Server error");
}

#[tokio::test]
async fn test_admin_gate_follows_demotion() {
    let repo = InMemoryRepository::new();
    let admin = seed_user(&repo, "head@school.fr").await;
    let app_state = create_app_state(repo);
    let token = issue_token(admin.id, &app_state.config).unwrap();

    app_state
        .repo
        .set_user_role(admin.id, Role::User)
        .await
        .unwrap();

    // The same token no longer passes: the role is read from the store every time.
    let mut parts = with_bearer(&token);
    let err = AdminUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::FORBIDDEN);
}

// --- Password Hashing ---

#[tokio::test]
async fn test_password_hash_and_verify() {
    let hash = hash_password("s3cret!".to_string(), 4).await.unwrap();
    assert_ne!(hash, "s3cret!");
    assert!(verify_password("s3cret!".to_string(), hash.clone()).await);
    assert!(!verify_password("wrong".to_string(), hash).await);
}

#[tokio::test]
async fn test_verify_password_with_malformed_hash() {
    assert!(!verify_password("anything".to_string(), "not-a-hash".to_string()).await);
}
