use std::sync::Arc;

use crate::api::ApiRequest;
use crate::cache::{CacheGroup, OperationFlags, QueryKey};
use crate::context::Core;
use crate::error::ClientResult;
use crate::models::{Budget, BudgetForm, BudgetInput, BudgetUpdate};
use crate::resources::Resource;

const ALERTS_SCOPE: &str = "alerts";

pub struct Budgets {
    core: Arc<Core>,
    flags: OperationFlags,
}

impl Budgets {
    pub(crate) fn new(core: Arc<Core>) -> Self {
        Self {
            core,
            flags: OperationFlags::new(),
        }
    }

    pub async fn list(&self) -> ClientResult<Vec<Budget>> {
        self.list_at(QueryKey::root(CacheGroup::Budgets), ApiRequest::get(Self::PATH))
            .await
    }

    /// Budgets whose spending crossed their alert threshold
    pub async fn alerts(&self) -> ClientResult<Vec<Budget>> {
        self.list_at(
            QueryKey::new(CacheGroup::Budgets, ALERTS_SCOPE),
            ApiRequest::get(format!("{}/alerts", Self::PATH)),
        )
        .await
    }

    pub fn cached(&self) -> Option<Vec<Budget>> {
        self.core.cache.get(&QueryKey::root(CacheGroup::Budgets))
    }

    pub async fn create_from_form(&self, form: BudgetForm) -> ClientResult<Budget> {
        let input = form.into_create()?;
        self.create(&input).await
    }

    /// Save an edited form; the form's category is never sent
    pub async fn update_from_form(&self, id: &str, form: BudgetForm) -> ClientResult<Budget> {
        let update = form.into_update()?;
        self.update(id, &update).await
    }
}

impl Resource for Budgets {
    type Entity = Budget;
    type Create = BudgetInput;
    type Update = BudgetUpdate;

    const PATH: &'static str = "/budgets";
    const GROUP: CacheGroup = CacheGroup::Budgets;
    const INVALIDATES: &'static [CacheGroup] = &[CacheGroup::Budgets];

    fn core(&self) -> &Core {
        &self.core
    }

    fn flags(&self) -> &OperationFlags {
        &self.flags
    }
}
