use std::sync::Arc;

use tokio::sync::broadcast;

use crate::api::ApiClient;
use crate::cache::QueryCache;
use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::resources::{Accounts, Auth, Budgets, Categories, Dashboard, Transactions, Users};
use crate::session::{CredentialStore, SessionEvent, SessionEvents, SessionStore};

/// Handles every resource shares: the HTTP client, the session, the cache
pub struct Core {
    pub config: ClientConfig,
    pub api: ApiClient,
    pub session: SessionStore,
    pub cache: QueryCache,
    pub events: SessionEvents,
}

/// Application context, built once at startup and cloned into whatever
/// needs the session, cache or client. Cloning is cheap.
#[derive(Clone)]
pub struct AppContext {
    inner: Arc<Inner>,
}

struct Inner {
    core: Arc<Core>,
    accounts: Accounts,
    categories: Categories,
    transactions: Transactions,
    budgets: Budgets,
    dashboard: Dashboard,
    auth: Auth,
    users: Users,
}

impl AppContext {
    pub fn new(config: ClientConfig, credentials: Arc<dyn CredentialStore>) -> ClientResult<Self> {
        let events = SessionEvents::new();
        let api = ApiClient::new(&config, credentials, events.clone())?;

        let core = Arc::new(Core {
            config,
            api,
            session: SessionStore::new(),
            cache: QueryCache::new(),
            events,
        });

        Ok(Self {
            inner: Arc::new(Inner {
                accounts: Accounts::new(core.clone()),
                categories: Categories::new(core.clone()),
                transactions: Transactions::new(core.clone()),
                budgets: Budgets::new(core.clone()),
                dashboard: Dashboard::new(core.clone()),
                auth: Auth::new(core.clone()),
                users: Users::new(core.clone()),
                core,
            }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.core.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.inner.core.api
    }

    pub fn session(&self) -> &SessionStore {
        &self.inner.core.session
    }

    pub fn cache(&self) -> &QueryCache {
        &self.inner.core.cache
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        self.inner.core.api.credentials()
    }

    /// Presence-only credential check, as used by the route guard
    pub fn has_credential(&self) -> bool {
        self.credentials().has_access_token()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.core.events.subscribe()
    }

    pub fn accounts(&self) -> &Accounts {
        &self.inner.accounts
    }

    pub fn categories(&self) -> &Categories {
        &self.inner.categories
    }

    pub fn transactions(&self) -> &Transactions {
        &self.inner.transactions
    }

    pub fn budgets(&self) -> &Budgets {
        &self.inner.budgets
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.inner.dashboard
    }

    pub fn auth(&self) -> &Auth {
        &self.inner.auth
    }

    pub fn users(&self) -> &Users {
        &self.inner.users
    }
}
