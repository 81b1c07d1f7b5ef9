pub mod accounts;
pub mod auth;
pub mod budgets;
pub mod categories;
pub mod dashboard;
pub mod transactions;
pub mod users;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::api::ApiRequest;
use crate::cache::{CacheGroup, OperationFlags, QueryKey};
use crate::context::Core;
use crate::error::{ClientError, ClientResult};
use crate::models::{Entity, Page};
use crate::types::Operation;

pub use accounts::Accounts;
pub use auth::Auth;
pub use budgets::Budgets;
pub use categories::Categories;
pub use dashboard::{Dashboard, DashboardQuery, DashboardSnapshot};
pub use transactions::Transactions;
pub use users::Users;

/// A server-owned collection cached under one invalidation group.
///
/// Implementors supply the path, the group, the groups a write invalidates
/// and the merge policy; `create`, `update` and `delete` are shared. A write
/// only touches the cache after the server acknowledged it, so a failure
/// leaves every cached list exactly as it was.
#[async_trait]
pub trait Resource: Send + Sync {
    type Entity: Entity + Clone + DeserializeOwned + Send + Sync + 'static;
    type Create: Serialize + Send + Sync;
    type Update: Serialize + Send + Sync;

    /// Collection path relative to the API base, e.g. `/accounts`
    const PATH: &'static str;

    const GROUP: CacheGroup;

    /// Groups marked stale after every acknowledged write
    const INVALIDATES: &'static [CacheGroup];

    /// Patch acknowledged entities into the cached lists of `GROUP`
    const MERGE_ON_WRITE: bool = false;

    fn core(&self) -> &Core;

    fn flags(&self) -> &OperationFlags;

    fn check_create(&self, _input: &Self::Create) -> ClientResult<()> {
        Ok(())
    }

    fn check_update(&self, _input: &Self::Update) -> ClientResult<()> {
        Ok(())
    }

    fn is_pending(&self, op: Operation) -> bool {
        self.flags().is_pending(op)
    }

    fn last_error(&self, op: Operation) -> Option<ClientError> {
        self.flags().last_error(op)
    }

    /// Cached list under `key`, fetched with `request` on a miss
    async fn list_at(&self, key: QueryKey, request: ApiRequest) -> ClientResult<Vec<Self::Entity>> {
        let core = self.core();
        let fetch = core.cache.fetch(key, None, move || async move {
            Ok(core.api.fetch::<Vec<Self::Entity>>(request).await?.data)
        });
        self.flags().track(Operation::List, fetch).await
    }

    async fn get(&self, id: &str) -> ClientResult<Self::Entity> {
        let request = ApiRequest::get(format!("{}/{}", Self::PATH, id));
        Ok(self.core().api.fetch(request).await?.data)
    }

    async fn create(&self, input: &Self::Create) -> ClientResult<Self::Entity> {
        self.flags()
            .track(Operation::Create, async {
                self.check_create(input)?;
                let request = ApiRequest::post(Self::PATH).json(input)?;
                let created: Self::Entity = self.core().api.fetch(request).await?.data;
                self.acknowledge(Operation::Create, Some(&created), created.id());
                Ok(created)
            })
            .await
    }

    async fn update(&self, id: &str, input: &Self::Update) -> ClientResult<Self::Entity> {
        self.flags()
            .track(Operation::Update, async {
                self.check_update(input)?;
                let request = ApiRequest::patch(format!("{}/{}", Self::PATH, id)).json(input)?;
                let updated: Self::Entity = self.core().api.fetch(request).await?.data;
                self.acknowledge(Operation::Update, Some(&updated), id);
                Ok(updated)
            })
            .await
    }

    async fn delete(&self, id: &str) -> ClientResult<()> {
        self.flags()
            .track(Operation::Delete, async {
                let request = ApiRequest::delete(format!("{}/{}", Self::PATH, id));
                self.core().api.send(request).await?;
                self.acknowledge(Operation::Delete, None, id);
                Ok(())
            })
            .await
    }

    /// Apply an acknowledged write to the cache. `written` is the server's
    /// copy of the entity, `None` for a delete.
    fn acknowledge(&self, op: Operation, written: Option<&Self::Entity>, id: &str) {
        let cache = &self.core().cache;

        match written {
            Some(entity) if Self::MERGE_ON_WRITE => {
                let patched = cache.upsert_entity(Self::GROUP, entity);
                debug!("merged {} {} into {} cached lists", Self::GROUP.as_str(), id, patched);
            }
            Some(_) => {}
            None => {
                cache.remove_entity::<Self::Entity>(Self::GROUP, id);
                cache.update_group::<Page<Self::Entity>, _>(Self::GROUP, |page| Page {
                    items: page.items.iter().filter(|item| item.id() != id).cloned().collect(),
                    meta: page.meta.clone(),
                });
            }
        }

        for group in Self::INVALIDATES {
            cache.invalidate(*group);
        }
        info!("{} {}: {}", Self::GROUP.as_str(), op.as_str(), id);
    }
}
