use std::sync::Arc;

use crate::api::ApiRequest;
use crate::cache::{CacheGroup, OperationFlags, QueryKey};
use crate::context::Core;
use crate::error::ClientResult;
use crate::models::{Page, Transaction, TransactionFilters, TransactionInput, TransactionUpdate};
use crate::resources::Resource;
use crate::types::Operation;

/// Income/expense/transfer records.
///
/// Every write moves an account balance and the dashboard aggregates on the
/// server, so all three groups go stale on acknowledgment.
pub struct Transactions {
    core: Arc<Core>,
    flags: OperationFlags,
}

impl Transactions {
    pub(crate) fn new(core: Arc<Core>) -> Self {
        Self {
            core,
            flags: OperationFlags::new(),
        }
    }

    /// One page of transactions matching `filters`, with the server's
    /// pagination block
    pub async fn list(&self, filters: &TransactionFilters) -> ClientResult<Page<Transaction>> {
        let key = Self::key(filters);
        let request = ApiRequest::get(Self::PATH).query(filters.to_query());
        let api = &self.core.api;

        let fetch = self.core.cache.fetch(key, None, move || async move {
            let payload = api.fetch::<Vec<Transaction>>(request).await?;
            Ok(Page {
                items: payload.data,
                meta: payload.meta,
            })
        });
        self.flags.track(Operation::List, fetch).await
    }

    pub fn cached(&self, filters: &TransactionFilters) -> Option<Page<Transaction>> {
        self.core.cache.get(&Self::key(filters))
    }

    fn key(filters: &TransactionFilters) -> QueryKey {
        QueryKey::new(CacheGroup::Transactions, filters.cache_scope())
    }
}

impl Resource for Transactions {
    type Entity = Transaction;
    type Create = TransactionInput;
    type Update = TransactionUpdate;

    const PATH: &'static str = "/transactions";
    const GROUP: CacheGroup = CacheGroup::Transactions;
    const INVALIDATES: &'static [CacheGroup] = &[
        CacheGroup::Transactions,
        CacheGroup::Accounts,
        CacheGroup::Dashboard,
    ];

    fn core(&self) -> &Core {
        &self.core
    }

    fn flags(&self) -> &OperationFlags {
        &self.flags
    }

    fn check_create(&self, input: &TransactionInput) -> ClientResult<()> {
        input.validate()
    }

    fn check_update(&self, input: &TransactionUpdate) -> ClientResult<()> {
        input.validate()
    }
}
