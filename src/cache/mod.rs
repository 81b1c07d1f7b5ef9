pub mod flags;

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::ClientError;
use crate::models::Entity;

pub use flags::{OperationFlags, OperationStatus};

/// Invalidation groups. Every cached query belongs to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheGroup {
    CurrentUser,
    Accounts,
    Categories,
    Transactions,
    Budgets,
    Dashboard,
}

impl CacheGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheGroup::CurrentUser => "me",
            CacheGroup::Accounts => "accounts",
            CacheGroup::Categories => "categories",
            CacheGroup::Transactions => "transactions",
            CacheGroup::Budgets => "budgets",
            CacheGroup::Dashboard => "dashboard",
        }
    }
}

/// Group plus a scope string derived from the query's parameters; two
/// different parameter sets never share an entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub group: CacheGroup,
    pub scope: String,
}

impl QueryKey {
    pub fn new(group: CacheGroup, scope: impl Into<String>) -> Self {
        Self {
            group,
            scope: scope.into(),
        }
    }

    /// The unfiltered query of a group
    pub fn root(group: CacheGroup) -> Self {
        Self::new(group, "")
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.scope.is_empty() {
            write!(f, "{}", self.group.as_str())
        } else {
            write!(f, "{}[{}]", self.group.as_str(), self.scope)
        }
    }
}

struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    fetched_at: Instant,
    stale: bool,
}

impl Entry {
    fn is_fresh(&self, stale_after: Option<Duration>) -> bool {
        if self.stale {
            return false;
        }
        match stale_after {
            Some(limit) => self.fetched_at.elapsed() < limit,
            None => true,
        }
    }
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<QueryKey, Entry>,
    // bumped on every invalidation of the group
    generations: HashMap<CacheGroup, u64>,
    // bumped on every clear
    epoch: u64,
}

/// Keyed query cache shared by every resource.
///
/// Values are stored type-erased and handed out as clones. Locks are never
/// held across an `.await`.
#[derive(Default)]
pub struct QueryCache {
    state: RwLock<CacheState>,
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.read().entries.len())
            .finish()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a fresh cached value or run `fetcher` and cache its result.
    ///
    /// `stale_after` of `None` keeps an entry fresh until it is invalidated.
    /// A fetch that overlaps an invalidation of its group is stored already
    /// stale, so the next read goes back to the server. A fetch that overlaps
    /// a `clear` is returned to its caller but never stored.
    pub async fn fetch<T, F, Fut>(
        &self,
        key: QueryKey,
        stale_after: Option<Duration>,
        fetcher: F,
    ) -> Result<T, ClientError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        if let Some(hit) = self.get_fresh::<T>(&key, stale_after) {
            debug!("cache hit: {}", key);
            return Ok(hit);
        }

        debug!("cache miss: {}", key);
        let (generation, epoch) = {
            let state = self.read();
            (state.generations.get(&key.group).copied().unwrap_or(0), state.epoch)
        };
        let value = fetcher().await?;

        let mut state = self.write();
        if state.epoch != epoch {
            debug!("cache was cleared while fetching {}; dropping result", key);
            return Ok(value);
        }
        let raced = state.generations.get(&key.group).copied().unwrap_or(0) != generation;
        if raced {
            debug!("{} was invalidated while fetching; storing as stale", key);
        }
        state.entries.insert(
            key,
            Entry {
                value: Arc::new(value.clone()),
                fetched_at: Instant::now(),
                stale: raced,
            },
        );
        Ok(value)
    }

    /// Cached value regardless of staleness
    pub fn get<T: Clone + 'static>(&self, key: &QueryKey) -> Option<T> {
        self.read()
            .entries
            .get(key)
            .and_then(|entry| entry.value.downcast_ref::<T>().cloned())
    }

    pub fn get_fresh<T: Clone + 'static>(&self, key: &QueryKey, stale_after: Option<Duration>) -> Option<T> {
        self.read()
            .entries
            .get(key)
            .filter(|entry| entry.is_fresh(stale_after))
            .and_then(|entry| entry.value.downcast_ref::<T>().cloned())
    }

    pub fn set<T: Send + Sync + 'static>(&self, key: QueryKey, value: T) {
        self.write().entries.insert(
            key,
            Entry {
                value: Arc::new(value),
                fetched_at: Instant::now(),
                stale: false,
            },
        );
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.read().entries.contains_key(key)
    }

    /// Absent or marked stale: the next read will hit the server
    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.read().entries.get(key).map(|e| e.stale).unwrap_or(true)
    }

    /// Mark every entry of `group` stale
    pub fn invalidate(&self, group: CacheGroup) {
        let mut state = self.write();
        *state.generations.entry(group).or_insert(0) += 1;

        let mut marked = 0;
        for (key, entry) in state.entries.iter_mut() {
            if key.group == group {
                entry.stale = true;
                marked += 1;
            }
        }
        debug!("invalidated {} ({} entries)", group.as_str(), marked);
    }

    /// Apply `f` to every entry of `group` that holds a `T`; returns how many
    /// entries were rewritten
    pub fn update_group<T, F>(&self, group: CacheGroup, f: F) -> usize
    where
        T: Send + Sync + 'static,
        F: Fn(&T) -> T,
    {
        let mut state = self.write();
        let mut updated = 0;
        for (key, entry) in state.entries.iter_mut() {
            if key.group != group {
                continue;
            }
            if let Some(current) = entry.value.downcast_ref::<T>() {
                entry.value = Arc::new(f(current));
                updated += 1;
            }
        }
        updated
    }

    /// Merge `entity` into every cached `Vec<E>` of the group: replace by id,
    /// append when new
    pub fn upsert_entity<E>(&self, group: CacheGroup, entity: &E) -> usize
    where
        E: Entity + Clone + Send + Sync + 'static,
    {
        self.update_group::<Vec<E>, _>(group, |list| {
            let mut next = list.clone();
            match next.iter_mut().find(|item| item.id() == entity.id()) {
                Some(slot) => *slot = entity.clone(),
                None => next.push(entity.clone()),
            }
            next
        })
    }

    /// Drop the entity with `id` from every cached `Vec<E>` of the group
    pub fn remove_entity<E>(&self, group: CacheGroup, id: &str) -> usize
    where
        E: Entity + Clone + Send + Sync + 'static,
    {
        self.update_group::<Vec<E>, _>(group, |list| {
            list.iter().filter(|item| item.id() != id).cloned().collect()
        })
    }

    pub fn remove_group(&self, group: CacheGroup) {
        let mut state = self.write();
        *state.generations.entry(group).or_insert(0) += 1;
        state.entries.retain(|key, _| key.group != group);
    }

    /// Forget everything (logout). Fetches still in flight are not stored.
    pub fn clear(&self) {
        let mut state = self.write();
        state.epoch += 1;
        for generation in state.generations.values_mut() {
            *generation += 1;
        }
        for group in [
            CacheGroup::CurrentUser,
            CacheGroup::Accounts,
            CacheGroup::Categories,
            CacheGroup::Transactions,
            CacheGroup::Budgets,
            CacheGroup::Dashboard,
        ] {
            state.generations.entry(group).or_insert(1);
        }
        state.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
