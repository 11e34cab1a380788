use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

use super::{api::ApiClient, error::ClientError};
use crate::models::{LoginRequest, ProfileUpdateRequest, PublicUser, RegisterRequest, UserSummary};

/// AuthSnapshot
///
/// Session state. `is_authenticated` is `None` until the first load attempt settles.
/// `users` is only filled for administrators managing accounts.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSnapshot {
    pub token: Option<String>,
    pub is_authenticated: Option<bool>,
    pub loading: bool,
    pub user: Option<PublicUser>,
    pub users: Vec<PublicUser>,
    pub error: Option<String>,
}

impl Default for AuthSnapshot {
    fn default() -> Self {
        Self {
            token: None,
            is_authenticated: None,
            loading: true,
            user: None,
            users: Vec::new(),
            error: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum AuthAction {
    /// Register or login returned a token.
    Authenticated(String),
    UserLoaded(PublicUser),
    /// The session is unusable: credentials rejected or the token no longer loads a user.
    AuthFailed(Option<String>),
    LoggedOut,
    ProfileUpdated(PublicUser),
    UsersLoaded(Vec<PublicUser>),
    RoleChanged(UserSummary),
    /// A request failed without invalidating the session.
    Failed(String),
    ClearErrors,
}

pub fn reduce_auth(state: &AuthSnapshot, action: AuthAction) -> AuthSnapshot {
    let mut next = state.clone();
    match action {
        AuthAction::Authenticated(token) => {
            next.token = Some(token);
            next.is_authenticated = Some(true);
            next.loading = false;
        }
        AuthAction::UserLoaded(user) => {
            next.user = Some(user);
            next.is_authenticated = Some(true);
            next.loading = false;
        }
        AuthAction::AuthFailed(error) => {
            next = AuthSnapshot {
                is_authenticated: Some(false),
                loading: false,
                error,
                ..AuthSnapshot::default()
            };
        }
        AuthAction::LoggedOut => {
            next = AuthSnapshot {
                is_authenticated: Some(false),
                loading: false,
                ..AuthSnapshot::default()
            };
        }
        AuthAction::ProfileUpdated(user) => {
            if let Some(listed) = next.users.iter_mut().find(|listed| listed.id == user.id) {
                *listed = user.clone();
            }
            next.user = Some(user);
        }
        AuthAction::UsersLoaded(users) => next.users = users,
        AuthAction::RoleChanged(summary) => {
            for user in next.users.iter_mut().filter(|user| user.id == summary.id) {
                user.role = summary.role;
            }
            if let Some(me) = next.user.as_mut().filter(|me| me.id == summary.id) {
                me.role = summary.role;
            }
        }
        AuthAction::Failed(msg) => next.error = Some(msg),
        AuthAction::ClearErrors => next.error = None,
    }
    next
}

/// AuthStore
///
/// Session container wrapping an [`ApiClient`]. The token obtained on register/login is
/// installed on the client, so every store built on the same client is authenticated.
#[derive(Clone)]
pub struct AuthStore {
    api: ApiClient,
    sender: Arc<watch::Sender<Arc<AuthSnapshot>>>,
}

impl AuthStore {
    pub fn new(api: ApiClient) -> Self {
        let (sender, _) = watch::channel(Arc::new(AuthSnapshot::default()));
        Self {
            api,
            sender: Arc::new(sender),
        }
    }

    pub fn snapshot(&self) -> Arc<AuthSnapshot> {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<AuthSnapshot>> {
        self.sender.subscribe()
    }

    fn dispatch(&self, action: AuthAction) {
        self.sender
            .send_modify(|state| *state = Arc::new(reduce_auth(&**state, action)));
    }

    fn fail(&self, err: ClientError) {
        tracing::warn!(error = %err, "auth store request failed");
        self.dispatch(AuthAction::Failed(err.to_string()));
    }

    pub async fn register(&self, request: &RegisterRequest) {
        match self.api.register(request).await {
            Ok(response) => {
                self.dispatch(AuthAction::Authenticated(response.token));
                self.load_user().await;
            }
            Err(err) => self.dispatch(AuthAction::AuthFailed(Some(err.to_string()))),
        }
    }

    pub async fn login(&self, request: &LoginRequest) {
        match self.api.login(request).await {
            Ok(response) => {
                self.dispatch(AuthAction::Authenticated(response.token));
                self.load_user().await;
            }
            Err(err) => self.dispatch(AuthAction::AuthFailed(Some(err.to_string()))),
        }
    }

    /// Loads the account behind the current token. A failure ends the session silently.
    pub async fn load_user(&self) {
        match self.api.me().await {
            Ok(user) => self.dispatch(AuthAction::UserLoaded(user)),
            Err(err) => {
                tracing::debug!(error = %err, "session could not be restored");
                self.api.clear_token().await;
                self.dispatch(AuthAction::AuthFailed(None));
            }
        }
    }

    pub async fn logout(&self) {
        self.api.clear_token().await;
        self.dispatch(AuthAction::LoggedOut);
    }

    pub fn clear_errors(&self) {
        self.dispatch(AuthAction::ClearErrors);
    }

    pub async fn update_profile(&self, request: &ProfileUpdateRequest) {
        match self.api.update_profile(request).await {
            Ok(user) => self.dispatch(AuthAction::ProfileUpdated(user)),
            Err(err) => self.fail(err),
        }
    }

    pub async fn list_users(&self) {
        match self.api.list_users().await {
            Ok(users) => self.dispatch(AuthAction::UsersLoaded(users)),
            Err(err) => self.fail(err),
        }
    }

    pub async fn make_admin(&self, user_id: Uuid) {
        match self.api.make_admin(user_id).await {
            Ok(response) => self.dispatch(AuthAction::RoleChanged(response.user)),
            Err(err) => self.fail(err),
        }
    }

    pub async fn remove_admin(&self, user_id: Uuid) {
        match self.api.remove_admin(user_id).await {
            Ok(response) => self.dispatch(AuthAction::RoleChanged(response.user)),
            Err(err) => self.fail(err),
        }
    }
}
