use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, info, warn};

use crate::context::AppContext;
use crate::session::SessionEvent;

pub const LOGIN_PATH: &str = "/login";
pub const LANDING_PATH: &str = "/dashboard";

const PUBLIC_PATHS: &[&str] = &["/", "/login", "/register"];
const EXCLUDED_PREFIXES: &[&str] = &["/api", "/_next"];
const EXCLUDED_PATHS: &[&str] = &["/favicon.ico"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    Public,
    Protected,
    /// Infrastructure paths the guard never looks at
    Excluded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Continue,
    Redirect(&'static str),
}

/// Decides where a navigation may land. Presence-only: an expired credential
/// still counts as signed in here; the HTTP client catches expiry at call
/// time.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteGuard;

impl RouteGuard {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, path: &str) -> PathClass {
        let path = strip_suffixes(path);

        if EXCLUDED_PATHS.contains(&path)
            || EXCLUDED_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
        {
            return PathClass::Excluded;
        }
        if PUBLIC_PATHS.contains(&path) {
            return PathClass::Public;
        }
        PathClass::Protected
    }

    pub fn check(&self, path: &str, has_credential: bool) -> GuardDecision {
        match (self.classify(path), has_credential) {
            (PathClass::Protected, false) => GuardDecision::Redirect(LOGIN_PATH),
            (PathClass::Public, true) => GuardDecision::Redirect(LANDING_PATH),
            _ => GuardDecision::Continue,
        }
    }
}

fn strip_suffixes(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = &path[..end];
    if path.is_empty() {
        "/"
    } else {
        path
    }
}

/// The single listener that turns session events into navigation.
///
/// Holds the current location, runs the guard on every navigation and
/// reacts to `Expired`/`LoggedOut` (back to login) and `LoggedIn` (on to
/// the landing page).
pub struct Navigator {
    ctx: AppContext,
    guard: RouteGuard,
    events: broadcast::Receiver<SessionEvent>,
    location: String,
}

impl Navigator {
    /// Start at `path`, already passed through the guard
    pub fn new(ctx: AppContext, path: &str) -> Self {
        let events = ctx.subscribe();
        let mut navigator = Self {
            ctx,
            guard: RouteGuard::new(),
            events,
            location: String::new(),
        };
        navigator.navigate(path);
        navigator
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Go to `path`, or wherever the guard sends us instead. Returns the
    /// resulting location.
    pub fn navigate(&mut self, path: &str) -> &str {
        match self.guard.check(path, self.ctx.has_credential()) {
            GuardDecision::Continue => self.location = path.to_string(),
            GuardDecision::Redirect(target) => {
                debug!("guard redirected {} to {}", path, target);
                self.location = target.to_string();
            }
        }
        &self.location
    }

    /// Wait for the next session event and apply it. `None` once the
    /// context that feeds the channel is gone.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        loop {
            match self.events.recv().await {
                Ok(event) => {
                    self.apply(&event);
                    return Some(event);
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!("navigator missed {} session events", missed);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Apply every event already queued without waiting. Returns how many
    /// were handled.
    pub fn drain(&mut self) -> usize {
        let mut handled = 0;
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    self.apply(&event);
                    handled += 1;
                }
                Err(TryRecvError::Lagged(missed)) => {
                    warn!("navigator missed {} session events", missed);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return handled,
            }
        }
    }

    fn apply(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::Expired { reason } => {
                info!("session expired ({}), returning to login", reason);
                self.ctx.session().logout();
                self.ctx.cache().clear();
                self.location = LOGIN_PATH.to_string();
            }
            SessionEvent::LoggedOut => {
                self.location = LOGIN_PATH.to_string();
            }
            SessionEvent::LoggedIn => {
                let current = self.location.clone();
                self.navigate(&current);
            }
            SessionEvent::Refreshed => {}
        }
    }
}
