use std::sync::Arc;

use crate::api::ApiRequest;
use crate::cache::{CacheGroup, OperationFlags, QueryKey};
use crate::context::Core;
use crate::error::{ClientError, ClientResult};
use crate::models::{Account, AccountInput, AccountUpdate};
use crate::resources::Resource;

/// Bank/cash accounts. Writes patch the cached list in place; the dashboard
/// totals derived from balances are invalidated.
pub struct Accounts {
    core: Arc<Core>,
    flags: OperationFlags,
}

impl Accounts {
    pub(crate) fn new(core: Arc<Core>) -> Self {
        Self {
            core,
            flags: OperationFlags::new(),
        }
    }

    pub async fn list(&self) -> ClientResult<Vec<Account>> {
        self.list_at(QueryKey::root(CacheGroup::Accounts), ApiRequest::get(Self::PATH))
            .await
    }

    /// Whatever is cached right now, stale or not
    pub fn cached(&self) -> Option<Vec<Account>> {
        self.core.cache.get(&QueryKey::root(CacheGroup::Accounts))
    }
}

impl Resource for Accounts {
    type Entity = Account;
    type Create = AccountInput;
    type Update = AccountUpdate;

    const PATH: &'static str = "/accounts";
    const GROUP: CacheGroup = CacheGroup::Accounts;
    const INVALIDATES: &'static [CacheGroup] = &[CacheGroup::Dashboard];
    const MERGE_ON_WRITE: bool = true;

    fn core(&self) -> &Core {
        &self.core
    }

    fn flags(&self) -> &OperationFlags {
        &self.flags
    }

    fn check_create(&self, input: &AccountInput) -> ClientResult<()> {
        if input.name.trim().is_empty() {
            return Err(ClientError::invalid_field("name", "Account name is required"));
        }
        Ok(())
    }
}
