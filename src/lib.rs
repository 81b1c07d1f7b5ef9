pub mod api;
pub mod auth;
pub mod cache;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod format;
pub mod guard;
pub mod models;
pub mod resources;
pub mod session;
pub mod types;

pub use api::{ApiClient, ApiRequest};
pub use cache::{CacheGroup, QueryCache, QueryKey};
pub use config::ClientConfig;
pub use context::AppContext;
pub use error::{ClientError, ClientResult, ErrorKind};
pub use guard::{GuardDecision, Navigator, RouteGuard};
pub use resources::Resource;
pub use session::{CredentialPair, CredentialStore, SessionEvent};
