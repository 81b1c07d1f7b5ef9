use std::sync::Arc;

use tracing::{debug, error, info};

use crate::api::ApiRequest;
use crate::cache::{CacheGroup, QueryKey};
use crate::context::Core;
use crate::error::{ClientError, ClientResult};
use crate::models::{AuthSession, LoginInput, RegisterForm, User};
use crate::session::SessionEvent;

/// Login, registration and session lifecycle. The only writer of the
/// session store.
pub struct Auth {
    core: Arc<Core>,
}

impl Auth {
    pub(crate) fn new(core: Arc<Core>) -> Self {
        Self { core }
    }

    pub async fn login(&self, input: &LoginInput) -> ClientResult<User> {
        let request = ApiRequest::post("/auth/login").public().json(input)?;
        let session: AuthSession = self.core.api.fetch(request).await?.data;
        self.establish(session)
    }

    /// Validate the form locally, then register. The password confirmation
    /// never leaves the client.
    pub async fn register(&self, form: RegisterForm) -> ClientResult<User> {
        let input = form.validate()?;
        let request = ApiRequest::post("/auth/register").public().json(&input)?;
        let session: AuthSession = self.core.api.fetch(request).await?.data;
        self.establish(session)
    }

    /// The signed-in user, cached for the profile stale time. `None` without
    /// a stored credential or when the lookup fails.
    pub async fn current_user(&self) -> Option<User> {
        current_user(&self.core).await
    }

    /// Forget credentials, session and every cached query
    pub fn logout(&self) -> ClientResult<()> {
        let cleared = self.core.api.credentials().clear();
        if let Err(e) = &cleared {
            error!("failed to clear stored credentials: {}", e);
        }

        self.core.session.logout();
        self.core.cache.clear();
        self.core.events.emit(SessionEvent::LoggedOut);
        info!("logged out");

        cleared.map_err(ClientError::from)
    }

    /// Rotate the credential pair now instead of waiting for a 401
    pub async fn refresh(&self) -> ClientResult<()> {
        self.core.api.refresh_session().await
    }

    fn establish(&self, session: AuthSession) -> ClientResult<User> {
        self.core.api.credentials().store(&session.credentials())?;

        // a different user may have been signed in before
        self.core.cache.clear();
        self.core
            .cache
            .set(QueryKey::root(CacheGroup::CurrentUser), session.user.clone());
        self.core.session.sign_in(session.user.clone());
        self.core.events.emit(SessionEvent::LoggedIn);

        info!("signed in as {}", session.user.email);
        Ok(session.user)
    }
}

pub(crate) async fn current_user(core: &Core) -> Option<User> {
    if !core.api.credentials().has_access_token() {
        return None;
    }

    let key = QueryKey::root(CacheGroup::CurrentUser);
    let stale_after = Some(core.config.profile_stale_time());
    let result = core
        .cache
        .fetch(key, stale_after, move || async move {
            Ok(core.api.fetch::<User>(ApiRequest::get("/auth/me")).await?.data)
        })
        .await;

    match result {
        Ok(user) => {
            core.session.sign_in(user.clone());
            Some(user)
        }
        Err(e) => {
            debug!("current user unavailable: {}", e);
            None
        }
    }
}

/// The authenticated user the session knows about, resolving it from the
/// server when the store is still empty
pub(crate) async fn resolve_user(core: &Core) -> Option<User> {
    if !core.api.credentials().has_access_token() {
        return None;
    }

    let state = core.session.snapshot();
    match state.user {
        Some(user) if state.is_authenticated => Some(user),
        _ => current_user(core).await,
    }
}
