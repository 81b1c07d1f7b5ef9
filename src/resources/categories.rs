use std::sync::Arc;

use crate::api::ApiRequest;
use crate::cache::{CacheGroup, OperationFlags, QueryKey};
use crate::context::Core;
use crate::error::{ClientError, ClientResult};
use crate::models::{Category, CategoryInput, CategoryType, CategoryUpdate};
use crate::resources::Resource;

pub struct Categories {
    core: Arc<Core>,
    flags: OperationFlags,
}

impl Categories {
    pub(crate) fn new(core: Arc<Core>) -> Self {
        Self {
            core,
            flags: OperationFlags::new(),
        }
    }

    /// Categories, optionally narrowed to one type. Each filter is cached
    /// separately.
    pub async fn list(&self, kind: Option<CategoryType>) -> ClientResult<Vec<Category>> {
        let mut request = ApiRequest::get(Self::PATH);
        if let Some(kind) = kind {
            request = request.query([("type", kind.as_str())]);
        }
        self.list_at(Self::key(kind), request).await
    }

    pub fn cached(&self, kind: Option<CategoryType>) -> Option<Vec<Category>> {
        self.core.cache.get(&Self::key(kind))
    }

    fn key(kind: Option<CategoryType>) -> QueryKey {
        match kind {
            Some(kind) => QueryKey::new(CacheGroup::Categories, format!("type={}", kind)),
            None => QueryKey::root(CacheGroup::Categories),
        }
    }
}

impl Resource for Categories {
    type Entity = Category;
    type Create = CategoryInput;
    type Update = CategoryUpdate;

    const PATH: &'static str = "/categories";
    const GROUP: CacheGroup = CacheGroup::Categories;
    const INVALIDATES: &'static [CacheGroup] = &[CacheGroup::Categories];

    fn core(&self) -> &Core {
        &self.core
    }

    fn flags(&self) -> &OperationFlags {
        &self.flags
    }

    fn check_create(&self, input: &CategoryInput) -> ClientResult<()> {
        if input.name.trim().is_empty() {
            return Err(ClientError::invalid_field("name", "Category name is required"));
        }
        Ok(())
    }
}
