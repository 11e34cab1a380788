use reqwest::{Client, Method, RequestBuilder};
use serde::{Serialize, de::DeserializeOwned};
use std::{sync::Arc, time::Duration};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::error::{ClientError, ClientResult};
use crate::models::{
    ActualitePayload, ActualiteView, Category, EventPayload, EventView, LoginRequest,
    MessageResponse, ProfileUpdateRequest, PublicUser, RegisterRequest, RoleChangeRequest,
    RoleChangeResponse, StoreProbe, TokenResponse,
};

/// ApiClient
///
/// Typed wrapper over every `/api` route. Clones share the same session token, so a
/// login performed through one handle authenticates all of them.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    timeout: Duration,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(30),
            token: Arc::new(RwLock::new(None)),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub async fn set_token(&self, token: impl Into<String>) {
        *self.token.write().await = Some(token.into());
    }

    pub async fn clear_token(&self) {
        *self.token.write().await = None;
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/api/{}", self.base_url, path.trim_start_matches('/'));
        self.http.request(method, url).timeout(self.timeout)
    }

    /// Sends the request with the current token and decodes the JSON body. Non-2xx
    /// responses become `ClientError::Api` with the server's `msg`.
    async fn send<T: DeserializeOwned>(&self, mut request: RequestBuilder) -> ClientResult<T> {
        if let Some(token) = self.token.read().await.as_deref() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let msg = match response.json::<MessageResponse>().await {
                Ok(body) => body.msg,
                Err(_) => status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string(),
            };
            tracing::debug!(status = status.as_u16(), %msg, "API request rejected");
            return Err(ClientError::Api {
                status: status.as_u16(),
                msg,
            });
        }

        Ok(response.json().await?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(self.request(Method::GET, path)).await
    }

    async fn with_body<B, T>(&self, method: Method, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.request(method, path).json(body)).await
    }

    // --- Auth ---

    /// Registers an account and keeps the returned token for subsequent calls.
    pub async fn register(&self, request: &RegisterRequest) -> ClientResult<TokenResponse> {
        let response: TokenResponse = self.with_body(Method::POST, "auth/register", request).await?;
        self.set_token(response.token.clone()).await;
        Ok(response)
    }

    /// Logs in and keeps the returned token for subsequent calls.
    pub async fn login(&self, request: &LoginRequest) -> ClientResult<TokenResponse> {
        let response: TokenResponse = self.with_body(Method::POST, "auth/login", request).await?;
        self.set_token(response.token.clone()).await;
        Ok(response)
    }

    pub async fn me(&self) -> ClientResult<PublicUser> {
        self.get("auth").await
    }

    pub async fn store_probe(&self) -> ClientResult<StoreProbe> {
        self.get("auth/test").await
    }

    pub async fn list_users(&self) -> ClientResult<Vec<PublicUser>> {
        self.get("auth/users").await
    }

    pub async fn make_admin(&self, user_id: Uuid) -> ClientResult<RoleChangeResponse> {
        let body = RoleChangeRequest {
            user_id: user_id.to_string(),
        };
        self.with_body(Method::POST, "auth/make-admin", &body).await
    }

    pub async fn remove_admin(&self, user_id: Uuid) -> ClientResult<RoleChangeResponse> {
        let body = RoleChangeRequest {
            user_id: user_id.to_string(),
        };
        self.with_body(Method::POST, "auth/remove-admin", &body).await
    }

    pub async fn update_profile(&self, request: &ProfileUpdateRequest) -> ClientResult<PublicUser> {
        self.with_body(Method::PUT, "auth/profile", request).await
    }

    // --- Actualites ---

    pub async fn list_actualites(&self) -> ClientResult<Vec<ActualiteView>> {
        self.get("actualites").await
    }

    pub async fn latest_actualites(&self) -> ClientResult<Vec<ActualiteView>> {
        self.get("actualites/latest").await
    }

    pub async fn actualites_by_category(&self, category: Category) -> ClientResult<Vec<ActualiteView>> {
        self.get(&format!("actualites/category/{category}")).await
    }

    pub async fn get_actualite(&self, id: Uuid) -> ClientResult<ActualiteView> {
        self.get(&format!("actualites/{id}")).await
    }

    pub async fn create_actualite(&self, payload: &ActualitePayload) -> ClientResult<ActualiteView> {
        self.with_body(Method::POST, "actualites", payload).await
    }

    pub async fn update_actualite(
        &self,
        id: Uuid,
        payload: &ActualitePayload,
    ) -> ClientResult<ActualiteView> {
        self.with_body(Method::PUT, &format!("actualites/{id}"), payload)
            .await
    }

    pub async fn delete_actualite(&self, id: Uuid) -> ClientResult<MessageResponse> {
        self.send(self.request(Method::DELETE, &format!("actualites/{id}")))
            .await
    }

    // --- Events ---

    pub async fn list_events(&self) -> ClientResult<Vec<EventView>> {
        self.get("events").await
    }

    pub async fn upcoming_events(&self) -> ClientResult<Vec<EventView>> {
        self.get("events/upcoming").await
    }

    pub async fn events_by_category(&self, category: Category) -> ClientResult<Vec<EventView>> {
        self.get(&format!("events/category/{category}")).await
    }

    pub async fn get_event(&self, id: Uuid) -> ClientResult<EventView> {
        self.get(&format!("events/{id}")).await
    }

    pub async fn create_event(&self, payload: &EventPayload) -> ClientResult<EventView> {
        self.with_body(Method::POST, "events", payload).await
    }

    pub async fn update_event(&self, id: Uuid, payload: &EventPayload) -> ClientResult<EventView> {
        self.with_body(Method::PUT, &format!("events/{id}"), payload).await
    }

    pub async fn delete_event(&self, id: Uuid) -> ClientResult<MessageResponse> {
        self.send(self.request(Method::DELETE, &format!("events/{id}")))
            .await
    }
}
