use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::join4;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::api::ApiRequest;
use crate::cache::{CacheGroup, QueryKey};
use crate::context::Core;
use crate::error::{ClientError, ClientResult};
use crate::models::{CategorySummary, DashboardStats, MonthlyData, Transaction, User};
use crate::resources::auth;

/// The four independent dashboard queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DashboardQuery {
    Stats,
    MonthlyTrend,
    ExpenseByCategory,
    RecentTransactions,
}

impl DashboardQuery {
    pub const ALL: [DashboardQuery; 4] = [
        DashboardQuery::Stats,
        DashboardQuery::MonthlyTrend,
        DashboardQuery::ExpenseByCategory,
        DashboardQuery::RecentTransactions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DashboardQuery::Stats => "stats",
            DashboardQuery::MonthlyTrend => "monthly-trend",
            DashboardQuery::ExpenseByCategory => "expense-by-category",
            DashboardQuery::RecentTransactions => "recent-transactions",
        }
    }
}

/// Everything the dashboard view needs, fetched together
#[derive(Debug, Clone, Default)]
pub struct DashboardSnapshot {
    /// `None` when nobody is signed in; no query was sent in that case
    pub user: Option<User>,
    pub stats: Option<DashboardStats>,
    pub monthly_trend: Option<Vec<MonthlyData>>,
    pub expense_by_category: Option<Vec<CategorySummary>>,
    pub recent_transactions: Option<Vec<Transaction>>,
    pub errors: BTreeMap<DashboardQuery, ClientError>,
}

impl DashboardSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.is_authenticated() && self.errors.is_empty()
    }

    /// Some queries failed, at least one succeeded
    pub fn is_partial_failure(&self) -> bool {
        !self.errors.is_empty() && self.errors.len() < DashboardQuery::ALL.len()
    }

    pub fn is_total_failure(&self) -> bool {
        self.errors.len() == DashboardQuery::ALL.len()
    }

    fn record<T>(&mut self, query: DashboardQuery, result: ClientResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("dashboard {} failed: {}", query.as_str(), e);
                self.errors.insert(query, e);
                None
            }
        }
    }
}

/// Read-side composition of the dashboard aggregates.
///
/// Nothing is requested until an authenticated user is known. Cache keys
/// carry the user id so one user never sees another's aggregates.
pub struct Dashboard {
    core: Arc<Core>,
    loading: AtomicUsize,
}

impl Dashboard {
    pub(crate) fn new(core: Arc<Core>) -> Self {
        Self {
            core,
            loading: AtomicUsize::new(0),
        }
    }

    /// True while the user is being resolved or any query is in flight
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst) > 0
    }

    pub async fn load(&self) -> DashboardSnapshot {
        let user = {
            let _loading = Loading::begin(&self.loading);
            auth::resolve_user(&self.core).await
        };
        let Some(user) = user else {
            debug!("dashboard skipped: no authenticated user");
            return DashboardSnapshot::default();
        };

        let _loading = Loading::begin(&self.loading);
        let months = self.core.config.cache.monthly_trend_months;
        let limit = self.core.config.cache.recent_transactions_limit;

        let (stats, trend, by_category, recent) = join4(
            self.query::<DashboardStats>(&user, DashboardQuery::Stats, Vec::new()),
            self.query::<Vec<MonthlyData>>(
                &user,
                DashboardQuery::MonthlyTrend,
                vec![("months", months.to_string())],
            ),
            self.query::<Vec<CategorySummary>>(&user, DashboardQuery::ExpenseByCategory, Vec::new()),
            self.query::<Vec<Transaction>>(
                &user,
                DashboardQuery::RecentTransactions,
                vec![("limit", limit.to_string())],
            ),
        )
        .await;
        debug!("dashboard loaded for {}", user.id);

        let mut snapshot = DashboardSnapshot {
            user: Some(user),
            ..DashboardSnapshot::default()
        };
        snapshot.stats = snapshot.record(DashboardQuery::Stats, stats);
        snapshot.monthly_trend = snapshot.record(DashboardQuery::MonthlyTrend, trend);
        snapshot.expense_by_category = snapshot.record(DashboardQuery::ExpenseByCategory, by_category);
        snapshot.recent_transactions = snapshot.record(DashboardQuery::RecentTransactions, recent);
        snapshot
    }

    /// Drop cached aggregates and load them again
    pub async fn reload(&self) -> DashboardSnapshot {
        self.core.cache.invalidate(CacheGroup::Dashboard);
        self.load().await
    }

    async fn query<T>(
        &self,
        user: &User,
        query: DashboardQuery,
        params: Vec<(&'static str, String)>,
    ) -> ClientResult<T>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        let scope = std::iter::once(format!("{}/{}", user.id, query.as_str()))
            .chain(params.iter().map(|(k, v)| format!("{}={}", k, v)))
            .collect::<Vec<_>>()
            .join("&");
        let key = QueryKey::new(CacheGroup::Dashboard, scope);
        let request = ApiRequest::get(format!("/dashboard/{}", query.as_str())).query(params);
        let api = &self.core.api;

        self.core
            .cache
            .fetch(key, Some(self.core.config.dashboard_stale_time()), move || async move {
                Ok(api.fetch::<T>(request).await?.data)
            })
            .await
    }
}

struct Loading<'a>(&'a AtomicUsize);

impl<'a> Loading<'a> {
    fn begin(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
