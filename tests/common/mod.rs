#![allow(dead_code)]

//! In-process mock of the FinTrack API.
//!
//! Every test starts its own server on an ephemeral port, so tests never
//! share state. The mock records hits, bearer credentials and request bodies
//! per `METHOD /path` route and can be told to fail, stall or reject tokens.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header::AUTHORIZATION, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Map, Value};
use tokio::task::JoinHandle;

use fintrack_client::config::ClientConfig;
use fintrack_client::models::LoginInput;
use fintrack_client::session::{CredentialPair, CredentialStore, MemoryCredentialStore};
use fintrack_client::AppContext;

pub const API_PREFIX: &str = "/api/v1";
pub const EMAIL: &str = "a@b.com";
pub const PASSWORD: &str = "secret";
pub const USER_ID: &str = "u-1";

const PUBLIC_ROUTES: &[&str] = &["/auth/login", "/auth/register", "/auth/refresh"];

type Shared = Arc<Mutex<MockState>>;

pub struct MockState {
    pub hits: HashMap<String, usize>,
    pub bearers: Vec<(String, Option<String>)>,
    pub bodies: HashMap<String, Value>,
    pub valid_access: HashSet<String>,
    pub valid_refresh: HashSet<String>,
    pub fail_refresh: bool,
    pub forced: HashMap<String, VecDeque<(u16, Value)>>,
    pub delays: HashMap<String, Duration>,
    pub user: Value,
    pub accounts: Vec<Value>,
    pub categories: Vec<Value>,
    pub transactions: Vec<Value>,
    pub budgets: Vec<Value>,
    next_id: u64,
}

impl MockState {
    fn seeded() -> Self {
        Self {
            hits: HashMap::new(),
            bearers: Vec::new(),
            bodies: HashMap::new(),
            valid_access: HashSet::new(),
            valid_refresh: HashSet::new(),
            fail_refresh: false,
            forced: HashMap::new(),
            delays: HashMap::new(),
            user: json!({
                "id": USER_ID,
                "email": EMAIL,
                "first_name": "Ada",
                "last_name": "Lovelace",
                "currency": "ETB",
                "created_at": "2024-01-01T00:00:00.000Z"
            }),
            accounts: vec![
                json!({ "id": "acc-1", "user_id": USER_ID, "name": "Main", "type": "checking",
                        "balance": 1500.0, "currency": "ETB", "is_active": true }),
                json!({ "id": "acc-2", "user_id": USER_ID, "name": "Savings", "type": "savings",
                        "balance": 250.5, "currency": "ETB", "is_active": true }),
            ],
            categories: vec![
                json!({ "id": "cat-salary", "name": "Salary", "type": "income",
                        "color": "#10B981", "icon": "briefcase", "is_default": true }),
                json!({ "id": "cat-food", "name": "Food", "type": "expense",
                        "color": "#EF4444", "icon": "utensils", "is_default": true }),
                json!({ "id": "cat-fun", "user_id": USER_ID, "name": "Fun", "type": "expense",
                        "color": "#6366F1", "is_default": false }),
            ],
            transactions: vec![
                json!({ "id": "tx-1", "user_id": USER_ID, "account_id": "acc-1", "category_id": "cat-salary",
                        "type": "income", "amount": 5000.0, "description": "Salary",
                        "transaction_date": "2024-01-01", "account_name": "Main", "category_name": "Salary" }),
                json!({ "id": "tx-2", "user_id": USER_ID, "account_id": "acc-1", "category_id": "cat-food",
                        "type": "expense", "amount": 42.5, "description": "lunch",
                        "transaction_date": "2024-01-02", "account_name": "Main", "category_name": "Food" }),
            ],
            budgets: vec![
                json!({ "id": "b-1", "category_id": "cat-food", "amount": 500.0, "period": "monthly",
                        "start_date": "2024-01-01", "alert_threshold": 80, "category_name": "Food",
                        "spent": "450.00", "remaining": "50.00", "percentage_used": "90.00" }),
                json!({ "id": "b-2", "category_id": "cat-fun", "amount": 200.0, "period": "monthly",
                        "start_date": "2024-01-01", "alert_threshold": 80, "category_name": "Fun",
                        "spent": "20.00", "remaining": "180.00", "percentage_used": "10.00" }),
            ],
            next_id: 100,
        }
    }

    fn issue_pair(&mut self) -> CredentialPair {
        self.next_id += 1;
        let now = Utc::now().timestamp();
        let claims = json!({
            "userId": USER_ID,
            "email": EMAIL,
            "iat": now,
            "exp": now + 3600,
            "jti": self.next_id,
        });
        let access = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"mock-secret"))
            .expect("sign mock token");
        let refresh = format!("refresh-{}", self.next_id);

        self.valid_access.insert(access.clone());
        self.valid_refresh.insert(refresh.clone());
        CredentialPair::new(access, refresh)
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    fn collection(&mut self, name: &str) -> Option<&mut Vec<Value>> {
        match name {
            "accounts" => Some(&mut self.accounts),
            "categories" => Some(&mut self.categories),
            "transactions" => Some(&mut self.transactions),
            "budgets" => Some(&mut self.budgets),
            _ => None,
        }
    }

    fn route(&mut self, method: &Method, path: &str, query: &HashMap<String, String>, body: Value) -> (u16, Value) {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

        match (method.as_str(), segments.as_slice()) {
            ("POST", ["auth", "login"]) => self.login(&body),
            ("POST", ["auth", "register"]) => self.register(&body),
            ("POST", ["auth", "refresh"]) => self.refresh(&body),
            ("GET", ["auth", "me"]) => ok(self.user.clone()),

            ("PATCH", ["users", "profile"]) => {
                merge(&mut self.user, &body);
                ok(self.user.clone())
            }
            ("POST", ["users", "change-password"]) => {
                if body["currentPassword"] == PASSWORD {
                    (200, json!({ "success": true, "message": "Password changed successfully" }))
                } else {
                    fail(400, "Current password is incorrect")
                }
            }

            ("GET", ["dashboard", "stats"]) => ok(self.stats()),
            ("GET", ["dashboard", "monthly-trend"]) => {
                let months: usize = query.get("months").and_then(|m| m.parse().ok()).unwrap_or(6);
                let trend: Vec<Value> = (1..=months)
                    .map(|m| json!({ "month": format!("2024-{:02}", m), "income": "5000.00", "expense": 1200 }))
                    .collect();
                ok(json!(trend))
            }
            ("GET", ["dashboard", "expense-by-category"]) => ok(json!([
                { "category_id": "cat-food", "category_name": "Food", "category_color": "#EF4444",
                  "total": "450.00", "percentage": "90.00" },
                { "category_id": "cat-fun", "category_name": "Fun", "category_color": "#6366F1",
                  "total": 50, "percentage": 10 }
            ])),
            ("GET", ["dashboard", "recent-transactions"]) => {
                let limit: usize = query.get("limit").and_then(|l| l.parse().ok()).unwrap_or(5);
                let recent: Vec<Value> = self.transactions.iter().take(limit).map(amount_as_string).collect();
                ok(json!(recent))
            }

            ("GET", ["budgets", "alerts"]) => {
                let alerts: Vec<Value> = self
                    .budgets
                    .iter()
                    .filter(|b| {
                        let used: f64 = b["percentage_used"].as_str().and_then(|p| p.parse().ok()).unwrap_or(0.0);
                        used >= b["alert_threshold"].as_f64().unwrap_or(80.0)
                    })
                    .cloned()
                    .collect();
                ok(json!(alerts))
            }

            ("GET", ["transactions"]) => self.list_transactions(query),
            ("GET", ["categories"]) => {
                let kind = query.get("type");
                let list: Vec<Value> = self
                    .categories
                    .iter()
                    .filter(|c| kind.map(|k| c["type"] == k.as_str()).unwrap_or(true))
                    .cloned()
                    .collect();
                ok(json!(list))
            }
            ("GET", ["accounts"]) => ok(json!(self.accounts.iter().map(balance_as_string).collect::<Vec<_>>())),
            ("GET", [name]) => match self.collection(name) {
                Some(items) => ok(json!(items.clone())),
                None => fail(404, "Route not found"),
            },

            ("GET", [name, id]) => match self.collection(name).and_then(|items| items.iter().find(|i| i["id"] == *id)) {
                Some(item) => ok(item.clone()),
                None => fail(404, "Not found"),
            },
            ("POST", [name]) => self.create(name, body),
            ("PATCH", [name, id]) => self.update(name, id, &body),
            ("DELETE", [name, id]) => self.delete(name, id),

            _ => fail(404, "Route not found"),
        }
    }

    fn login(&mut self, body: &Value) -> (u16, Value) {
        if body["email"] != EMAIL || body["password"] != PASSWORD {
            return fail(401, "Invalid email or password");
        }
        let pair = self.issue_pair();
        (
            200,
            json!({
                "success": true,
                "message": "Login successful",
                "data": { "user": self.user, "accessToken": pair.access_token, "refreshToken": pair.refresh_token }
            }),
        )
    }

    fn register(&mut self, body: &Value) -> (u16, Value) {
        if body["email"] == EMAIL {
            return (
                409,
                json!({ "success": false, "message": "Email already registered",
                        "errors": [{ "field": "email", "message": "Email already registered" }] }),
            );
        }
        let user = json!({
            "id": self.next_id("u"),
            "email": body["email"],
            "first_name": body["first_name"],
            "last_name": body["last_name"],
            "currency": body.get("currency").cloned().unwrap_or(json!("ETB")),
        });
        self.user = user.clone();
        let pair = self.issue_pair();
        (
            201,
            json!({
                "success": true,
                "message": "Registration successful",
                "data": { "user": user, "accessToken": pair.access_token, "refreshToken": pair.refresh_token }
            }),
        )
    }

    fn refresh(&mut self, body: &Value) -> (u16, Value) {
        let presented = body["refreshToken"].as_str().unwrap_or_default().to_string();
        if self.fail_refresh || !self.valid_refresh.remove(&presented) {
            return fail(401, "Invalid refresh token");
        }
        let pair = self.issue_pair();
        ok(json!({ "accessToken": pair.access_token, "refreshToken": pair.refresh_token }))
    }

    fn stats(&self) -> Value {
        let total: f64 = self.accounts.iter().map(|a| a["balance"].as_f64().unwrap_or(0.0)).sum();
        json!({
            "total_balance": format!("{:.2}", total),
            "total_income": "5000.00",
            "total_expense": 42.5,
            "net_savings": "4957.50",
            "monthly_change": 12.5
        })
    }

    fn list_transactions(&self, query: &HashMap<String, String>) -> (u16, Value) {
        let matches = |tx: &&Value| {
            query.get("type").map(|t| tx["type"] == t.as_str()).unwrap_or(true)
                && query.get("accountId").map(|a| tx["account_id"] == a.as_str()).unwrap_or(true)
                && query.get("categoryId").map(|c| tx["category_id"] == c.as_str()).unwrap_or(true)
        };
        let filtered: Vec<Value> = self.transactions.iter().filter(matches).map(amount_as_string).collect();

        let page: usize = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1).max(1);
        let limit: usize = query.get("limit").and_then(|l| l.parse().ok()).unwrap_or(20).max(1);
        let total = filtered.len();
        let items: Vec<Value> = filtered.into_iter().skip((page - 1) * limit).take(limit).collect();

        (
            200,
            json!({
                "success": true,
                "message": "ok",
                "data": items,
                "meta": { "page": page, "limit": limit, "total": total, "totalPages": total.div_ceil(limit) }
            }),
        )
    }

    fn create(&mut self, name: &str, body: Value) -> (u16, Value) {
        let prefix = match name {
            "accounts" => "acc",
            "categories" => "cat",
            "transactions" => "tx",
            "budgets" => "b",
            _ => return fail(404, "Route not found"),
        };
        let mut item = body;
        item["id"] = json!(self.next_id(prefix));

        match name {
            "accounts" => {
                if item.get("balance").is_none() {
                    item["balance"] = json!(0.0);
                }
                item["is_active"] = json!(true);
            }
            "categories" => item["is_default"] = json!(false),
            "transactions" => {
                let delta = item["amount"].as_f64().unwrap_or(0.0);
                let signed = if item["type"] == "expense" { -delta } else { delta };
                let account_id = item["account_id"].clone();
                if let Some(account) = self.accounts.iter_mut().find(|a| a["id"] == account_id) {
                    let balance = account["balance"].as_f64().unwrap_or(0.0);
                    account["balance"] = json!(balance + signed);
                }
            }
            _ => {}
        }

        let response = match name {
            "accounts" => balance_as_string(&item),
            "transactions" => amount_as_string(&item),
            _ => item.clone(),
        };
        if let Some(items) = self.collection(name) {
            items.push(item);
        }
        (201, json!({ "success": true, "message": "Created", "data": response }))
    }

    fn update(&mut self, name: &str, id: &str, body: &Value) -> (u16, Value) {
        let Some(items) = self.collection(name) else {
            return fail(404, "Route not found");
        };
        match items.iter_mut().find(|i| i["id"] == id) {
            Some(item) => {
                merge(item, body);
                match name {
                    "accounts" => ok(balance_as_string(item)),
                    _ => ok(item.clone()),
                }
            }
            None => fail(404, "Not found"),
        }
    }

    fn delete(&mut self, name: &str, id: &str) -> (u16, Value) {
        let Some(items) = self.collection(name) else {
            return fail(404, "Route not found");
        };
        let Some(position) = items.iter().position(|i| i["id"] == id) else {
            return fail(404, "Not found");
        };
        if name == "categories" && items[position]["is_default"] == true {
            return fail(400, "Cannot delete default category");
        }
        items.remove(position);
        (200, json!({ "success": true, "message": "Deleted successfully" }))
    }
}

fn ok(data: Value) -> (u16, Value) {
    (200, json!({ "success": true, "message": "ok", "data": data }))
}

fn fail(status: u16, message: &str) -> (u16, Value) {
    (status, json!({ "success": false, "message": message }))
}

fn merge(target: &mut Value, patch: &Value) {
    if let (Some(target), Some(patch)) = (target.as_object_mut(), patch.as_object()) {
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
    }
}

/// Postgres DECIMAL columns come back as strings
fn balance_as_string(account: &Value) -> Value {
    let mut account = account.clone();
    if let Some(balance) = account["balance"].as_f64() {
        account["balance"] = json!(format!("{:.2}", balance));
    }
    account
}

fn amount_as_string(tx: &Value) -> Value {
    let mut tx = tx.clone();
    if let Some(amount) = tx["amount"].as_f64() {
        tx["amount"] = json!(format!("{:.2}", amount));
    }
    tx
}

async fn handle(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().strip_prefix(API_PREFIX).unwrap_or(uri.path()).to_string();
    let route = format!("{} {}", method, path);
    let query: HashMap<String, String> = url::form_urlencoded::parse(uri.query().unwrap_or("").as_bytes())
        .into_owned()
        .collect();
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    let delay = {
        let mut s = state.lock().unwrap();
        *s.hits.entry(route.clone()).or_default() += 1;
        s.bearers.push((route.clone(), bearer.clone()));
        if !body.is_null() {
            s.bodies.insert(route.clone(), body.clone());
        }
        s.delays.get(&route).copied()
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let (status, payload) = {
        let mut s = state.lock().unwrap();
        if let Some(forced) = s.forced.get_mut(&route).and_then(|queue| queue.pop_front()) {
            forced
        } else if !PUBLIC_ROUTES.contains(&path.as_str())
            && !bearer.as_ref().map(|t| s.valid_access.contains(t)).unwrap_or(false)
        {
            fail(401, "Invalid or expired token")
        } else {
            s.route(&method, &path, &query, body)
        }
    };

    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(payload)).into_response()
}

pub struct MockApi {
    pub base_url: String,
    state: Shared,
    task: JoinHandle<()>,
}

impl MockApi {
    pub async fn start() -> Result<Self> {
        let state: Shared = Arc::new(Mutex::new(MockState::seeded()));
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("failed to bind mock API")?;
        let addr = listener.local_addr()?;
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            base_url: format!("http://{}{}", addr, API_PREFIX),
            state,
            task,
        })
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::for_base_url(self.base_url.clone())
    }

    /// Context with an empty in-memory credential store
    pub fn context(&self) -> Result<AppContext> {
        self.context_with(Arc::new(MemoryCredentialStore::default()))
    }

    pub fn context_with(&self, store: Arc<dyn CredentialStore>) -> Result<AppContext> {
        Ok(AppContext::new(self.config(), store)?)
    }

    /// Context that went through `POST /auth/login`
    pub async fn signed_in(&self) -> Result<AppContext> {
        let ctx = self.context()?;
        ctx.auth()
            .login(&LoginInput {
                email: EMAIL.into(),
                password: PASSWORD.into(),
            })
            .await?;
        Ok(ctx)
    }

    /// Credential pair the server will accept, without a login round trip
    pub fn issue_pair(&self) -> CredentialPair {
        self.state.lock().unwrap().issue_pair()
    }

    /// Store holding a freshly issued pair
    pub fn authorized_store(&self) -> Arc<MemoryCredentialStore> {
        Arc::new(MemoryCredentialStore::with_pair(&self.issue_pair()))
    }

    /// Context with stored credentials but an empty session store, like a
    /// process that starts with credentials left by an earlier run
    pub fn authorized_context(&self) -> Result<(AppContext, Arc<MemoryCredentialStore>)> {
        let store = self.authorized_store();
        let ctx = self.context_with(store.clone())?;
        Ok((ctx, store))
    }

    pub fn hits(&self, route: &str) -> usize {
        self.state.lock().unwrap().hits.get(route).copied().unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.state.lock().unwrap().hits.values().sum()
    }

    pub fn reset_hits(&self) {
        let mut s = self.state.lock().unwrap();
        s.hits.clear();
        s.bearers.clear();
    }

    /// Bearer credentials sent to `route`, in order
    pub fn bearers(&self, route: &str) -> Vec<Option<String>> {
        self.state
            .lock()
            .unwrap()
            .bearers
            .iter()
            .filter(|(r, _)| r == route)
            .map(|(_, b)| b.clone())
            .collect()
    }

    pub fn last_body(&self, route: &str) -> Option<Value> {
        self.state.lock().unwrap().bodies.get(route).cloned()
    }

    /// Answer the next request to `route` with `status` and `body`
    pub fn force(&self, route: &str, status: u16, body: Value) {
        self.state
            .lock()
            .unwrap()
            .forced
            .entry(route.to_string())
            .or_default()
            .push_back((status, body));
    }

    pub fn delay(&self, route: &str, delay: Duration) {
        self.state.lock().unwrap().delays.insert(route.to_string(), delay);
    }

    /// Server-side expiry: every access token issued so far is rejected
    pub fn revoke_access_tokens(&self) {
        self.state.lock().unwrap().valid_access.clear();
    }

    pub fn fail_refresh(&self) {
        self.state.lock().unwrap().fail_refresh = true;
    }

    pub fn account_balance(&self, id: &str) -> Option<f64> {
        let s = self.state.lock().unwrap();
        s.accounts.iter().find(|a| a["id"] == id).and_then(|a| a["balance"].as_f64())
    }

    pub fn set_user_field(&self, field: &str, value: Value) {
        let mut s = self.state.lock().unwrap();
        if let Some(user) = s.user.as_object_mut() {
            user.insert(field.to_string(), value);
        }
    }
}

impl Drop for MockApi {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Access token whose `exp` is already in the past
pub fn expired_token() -> String {
    let now = Utc::now().timestamp();
    encode(
        &Header::default(),
        &json!({ "userId": USER_ID, "iat": now - 7200, "exp": now - 3600 }),
        &EncodingKey::from_secret(b"mock-secret"),
    )
    .expect("sign expired token")
}

/// A base URL nothing listens on
pub async fn dead_base_url() -> Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{}{}", addr, API_PREFIX))
}

pub fn object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

/// Every session event already queued on `rx`
pub fn drain_events(
    rx: &mut tokio::sync::broadcast::Receiver<fintrack_client::session::SessionEvent>,
) -> Vec<fintrack_client::session::SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
