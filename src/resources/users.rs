use std::sync::Arc;

use tracing::info;

use crate::api::ApiRequest;
use crate::cache::{CacheGroup, OperationFlags};
use crate::context::Core;
use crate::error::{ClientError, ClientResult};
use crate::models::user::MIN_PASSWORD_LEN;
use crate::models::{PasswordChange, ProfileUpdate, User};
use crate::types::Operation;

/// Profile and password of the signed-in user
pub struct Users {
    core: Arc<Core>,
    flags: OperationFlags,
}

impl Users {
    pub(crate) fn new(core: Arc<Core>) -> Self {
        Self {
            core,
            flags: OperationFlags::new(),
        }
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> ClientResult<User> {
        self.flags
            .track(Operation::Update, async {
                let request = ApiRequest::patch("/users/profile").json(update)?;
                let user: User = self.core.api.fetch(request).await?.data;

                self.core.cache.invalidate(CacheGroup::CurrentUser);
                self.core.session.set_user(Some(user.clone()));
                info!("profile updated for {}", user.email);
                Ok(user)
            })
            .await
    }

    /// Returns the server's confirmation message
    pub async fn change_password(&self, change: &PasswordChange) -> ClientResult<String> {
        self.flags
            .track(Operation::Update, async {
                if change.new_password.chars().count() < MIN_PASSWORD_LEN {
                    return Err(ClientError::invalid_field(
                        "newPassword",
                        "Password must be at least 6 characters",
                    ));
                }
                let request = ApiRequest::post("/users/change-password").json(change)?;
                self.core.api.send(request).await
            })
            .await
    }

    pub fn is_pending(&self) -> bool {
        self.flags.is_pending(Operation::Update)
    }

    pub fn last_error(&self) -> Option<ClientError> {
        self.flags.last_error(Operation::Update)
    }
}
