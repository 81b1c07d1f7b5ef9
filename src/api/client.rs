use std::sync::Arc;

use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::api::envelope::{Envelope, ErrorBody, Payload};
use crate::api::request::ApiRequest;
use crate::auth;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::session::{CredentialPair, CredentialStore, SessionEvent, SessionEvents};

const SESSION_EXPIRED: &str = "Session expired. Please log in again.";

/// Status and body of a received response
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Authenticated HTTP client for the FinTrack API.
///
/// Every authenticated request runs through the same state machine:
///
/// 1. a stored access token is decoded locally; an expired or undecodable
///    token clears the credential pair, emits [`SessionEvent::Expired`] and
///    fails with `Unauthenticated` without touching the network;
/// 2. the request is sent with the token as bearer credential;
/// 3. a 401 triggers at most one refresh followed by at most one re-issue of
///    the same request. A second 401 is returned as a failure.
///
/// Refreshes are serialized: a request that hits a 401 after another request
/// already rotated the pair simply re-issues with the current token.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
    events: SessionEvents,
    refresh_gate: Mutex<()>,
    log_error_bodies: bool,
}

impl ApiClient {
    pub fn new(
        config: &ClientConfig,
        credentials: Arc<dyn CredentialStore>,
        events: SessionEvents,
    ) -> Result<Self, ClientError> {
        let base_url = config.api.base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| ClientError::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            credentials,
            events,
            refresh_gate: Mutex::new(()),
            log_error_bodies: config.api.log_error_bodies,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    /// Send a request and return `data` from the success envelope
    pub async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<Payload<T>, ClientError> {
        let response = self.execute(&request).await?;
        let envelope: Envelope<T> = response.json()?;

        match envelope.data {
            Some(data) => Ok(Payload {
                data,
                message: envelope.message,
                meta: envelope.meta,
            }),
            None => Err(ClientError::decode(format!(
                "{} returned no data",
                request.label()
            ))),
        }
    }

    /// Send a request whose success carries no payload; returns the envelope message
    pub async fn send(&self, request: ApiRequest) -> Result<String, ClientError> {
        let response = self.execute(&request).await?;
        if response.body.is_empty() {
            return Ok(String::new());
        }
        Ok(ErrorBody::parse(&response.body).message().unwrap_or_default())
    }

    /// Run the full request/refresh/retry state machine
    pub async fn execute(&self, request: &ApiRequest) -> Result<RawResponse, ClientError> {
        let token = if request.authenticated {
            self.preflight()?
        } else {
            None
        };

        let response = self.dispatch(request, token.as_deref()).await?;
        if !request.authenticated || response.status != StatusCode::UNAUTHORIZED {
            return self.finish(request, response);
        }

        // Retrying: entered at most once per original request
        warn!("{} returned 401, attempting token refresh", request.label());
        let renewed = self.renew(token.as_deref()).await?;
        let retried = self.dispatch(request, Some(&renewed)).await?;
        if retried.status == StatusCode::UNAUTHORIZED {
            warn!("{} still unauthorized after refresh, giving up", request.label());
        }
        self.finish(request, retried)
    }

    /// Explicitly rotate the credential pair
    pub async fn refresh_session(&self) -> Result<(), ClientError> {
        let _gate = self.refresh_gate.lock().await;
        self.rotate().await.map(|_| ())
    }

    /// Read the stored access token and reject it locally when expired or invalid
    fn preflight(&self) -> Result<Option<String>, ClientError> {
        let token = match self.credentials.access_token() {
            Ok(Some(token)) => token,
            Ok(None) => return Ok(None),
            Err(e) => {
                warn!("stored credentials unreadable: {}", e);
                self.expire_session(&format!("unreadable credentials: {}", e));
                return Err(ClientError::unauthenticated(SESSION_EXPIRED));
            }
        };

        match auth::check_expiry(&token, Utc::now()) {
            Ok(_) => Ok(Some(token)),
            Err(e) => {
                warn!("stored access token rejected before sending: {}", e);
                self.expire_session(&e.to_string());
                Err(ClientError::unauthenticated(SESSION_EXPIRED))
            }
        }
    }

    /// Obtain a usable access token after a 401 sent with `sent`
    async fn renew(&self, sent: Option<&str>) -> Result<String, ClientError> {
        let _gate = self.refresh_gate.lock().await;

        if let Some(current) = self.credentials.access_token()? {
            if sent != Some(current.as_str()) {
                debug!("credentials were renewed by a concurrent request");
                return Ok(current);
            }
        }

        self.rotate().await
    }

    /// Exchange the stored refresh token for a new pair. Callers hold the gate.
    async fn rotate(&self) -> Result<String, ClientError> {
        let Some(refresh_token) = self.credentials.refresh_token()? else {
            self.expire_session("no refresh token stored");
            return Err(ClientError::unauthenticated(SESSION_EXPIRED));
        };

        match self.request_refresh(&refresh_token).await {
            Ok(pair) => {
                self.credentials.store(&pair)?;
                info!("access token refreshed");
                self.events.emit(SessionEvent::Refreshed);
                Ok(pair.access_token)
            }
            Err(err) => {
                warn!("token refresh failed: {}", err);
                self.expire_session(&format!("refresh failed: {}", err));
                Err(ClientError::unauthenticated(SESSION_EXPIRED))
            }
        }
    }

    async fn request_refresh(&self, refresh_token: &str) -> Result<CredentialPair, ClientError> {
        let request = ApiRequest::post("/auth/refresh")
            .public()
            .json(&json!({ "refreshToken": refresh_token }))?;

        let response = self.dispatch(&request, None).await?;
        let response = self.finish(&request, response)?;
        let envelope: Envelope<CredentialPair> = response.json()?;

        envelope
            .data
            .ok_or_else(|| ClientError::decode("refresh response carried no credentials"))
    }

    fn expire_session(&self, reason: &str) {
        if let Err(e) = self.credentials.clear() {
            error!("failed to clear stored credentials: {}", e);
        }
        self.events.emit(SessionEvent::Expired {
            reason: reason.to_string(),
        });
    }

    fn url_for(&self, request: &ApiRequest) -> Result<Url, ClientError> {
        let path = if request.path.starts_with('/') {
            request.path.clone()
        } else {
            format!("/{}", request.path)
        };

        let mut url = Url::parse(&format!("{}{}", self.base_url, path))?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        Ok(url)
    }

    async fn dispatch(&self, request: &ApiRequest, token: Option<&str>) -> Result<RawResponse, ClientError> {
        let url = self.url_for(request)?;
        debug!("{} {}", request.method, url);

        let mut builder = self.http.request(request.method.clone(), url);
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| transport_failure(request, e))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| transport_failure(request, e))?
            .to_vec();

        Ok(RawResponse { status, body })
    }

    /// Pass successes through; turn anything else into a classified error
    fn finish(&self, request: &ApiRequest, response: RawResponse) -> Result<RawResponse, ClientError> {
        if response.status.is_success() {
            return Ok(response);
        }

        let status = response.status.as_u16();
        let body = ErrorBody::parse(&response.body);
        let err = ClientError::from_status(status, body.message(), body.field_errors());

        match status {
            403 => warn!("{} forbidden: {}", request.label(), err),
            500..=599 => error!("{} server error {}: {}", request.label(), status, err),
            _ => debug!("{} failed with {}: {}", request.label(), status, err),
        }
        if self.log_error_bodies {
            debug!("error body: {}", String::from_utf8_lossy(&response.body));
        }

        Err(err)
    }
}

fn transport_failure(request: &ApiRequest, err: reqwest::Error) -> ClientError {
    error!("{} received no response: {}", request.label(), err);
    ClientError::from(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{CredentialLifetimes, FileCredentialStore, MemoryCredentialStore};

    fn client(base: &str) -> ApiClient {
        ApiClient::new(
            &ClientConfig::for_base_url(base),
            Arc::new(MemoryCredentialStore::default()),
            SessionEvents::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_url_keeps_base_path_and_encodes_query() {
        let api = client("http://localhost:5000/api/v1/");
        let req = ApiRequest::get("transactions").query([("startDate", "2024-01-01"), ("type", "a b")]);
        let url = api.url_for(&req).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5000/api/v1/transactions?startDate=2024-01-01&type=a+b"
        );
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let result = ApiClient::new(
            &ClientConfig::for_base_url("not a url"),
            Arc::new(MemoryCredentialStore::default()),
            SessionEvents::new(),
        );
        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[test]
    fn test_expired_token_fails_preflight_and_clears_pair() {
        use jsonwebtoken::{encode, EncodingKey, Header};

        let expired = encode(
            &Header::default(),
            &json!({ "userId": "u-1", "exp": Utc::now().timestamp() - 60 }),
            &EncodingKey::from_secret(b"s"),
        )
        .unwrap();
        let store = Arc::new(MemoryCredentialStore::with_pair(&CredentialPair::new(expired, "r")));
        let events = SessionEvents::new();
        let mut rx = events.subscribe();
        let api = ApiClient::new(&ClientConfig::default(), store.clone(), events).unwrap();

        let err = api.preflight().unwrap_err();
        assert!(err.is_unauthenticated());
        assert_eq!(store.access_token().unwrap(), None);
        assert_eq!(store.refresh_token().unwrap(), None);
        assert!(matches!(rx.try_recv(), Ok(SessionEvent::Expired { .. })));
    }

    #[test]
    fn test_unreadable_credentials_expire_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = Arc::new(FileCredentialStore::new(&path, CredentialLifetimes::default()));
        let events = SessionEvents::new();
        let mut rx = events.subscribe();
        let api = ApiClient::new(&ClientConfig::default(), store, events).unwrap();

        let err = api.preflight().unwrap_err();
        assert!(err.is_unauthenticated());
        assert!(!path.exists());
        assert!(matches!(rx.try_recv(), Ok(SessionEvent::Expired { .. })));
    }
}
