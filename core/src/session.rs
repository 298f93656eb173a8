//! Per-client session: backend location, project, and the current login.
//!
//! # Design
//! One `Session` is created with the client and shared (`Arc`) with the
//! dispatcher. All reads and writes go through a `parking_lot::RwLock`, so
//! concurrent requests see either the old or the new token, never a torn
//! mix of user id and token.

use parking_lot::RwLock;

use crate::config::GeocoreConfig;
use crate::error::GeocoreError;
use crate::result::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub base_url: Option<String>,
    pub project_id: Option<String>,
    pub user_id: Option<String>,
    pub token: Option<String>,
}

/// Where the session sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Unconfigured,
    Configured,
    Authenticated,
}

#[derive(Debug, Default)]
pub struct Session {
    state: RwLock<SessionState>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &GeocoreConfig) -> Self {
        Self {
            state: RwLock::new(SessionState {
                base_url: config.base_url.as_deref().map(normalize_base_url),
                project_id: config.project_id.clone(),
                user_id: None,
                token: None,
            }),
        }
    }

    /// Point the session at a backend and project. The last call wins.
    pub fn setup(&self, base_url: &str, project_id: &str) {
        let mut state = self.state.write();
        state.base_url = Some(normalize_base_url(base_url));
        state.project_id = Some(project_id.to_string());
        tracing::info!(base_url = %base_url, project_id = %project_id, "geocore session configured");
    }

    /// Record a successful login.
    pub fn authenticate(&self, user_id: &str, token: &str) {
        let mut state = self.state.write();
        state.user_id = Some(user_id.to_string());
        state.token = Some(token.to_string());
        tracing::info!(user_id = %user_id, "geocore session authenticated");
    }

    /// Drop the token; later requests are built unauthenticated.
    pub fn clear_token(&self) {
        let mut state = self.state.write();
        state.token = None;
        state.user_id = None;
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.read().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.state.read().token.clone()
    }

    pub fn user_id(&self) -> Option<String> {
        self.state.read().user_id.clone()
    }

    pub fn project_id(&self) -> Option<String> {
        self.state.read().project_id.clone()
    }

    pub fn base_url(&self) -> Option<String> {
        self.state.read().base_url.clone()
    }

    pub fn phase(&self) -> SessionPhase {
        let state = self.state.read();
        match (&state.base_url, &state.token) {
            (_, Some(_)) => SessionPhase::Authenticated,
            (Some(_), None) => SessionPhase::Configured,
            (None, None) => SessionPhase::Unconfigured,
        }
    }

    /// Absolute URL for an API path, e.g. `/objs` -> `<base_url>/objs`.
    pub fn url_for(&self, path: &str) -> Result<String> {
        let state = self.state.read();
        let base_url = state.base_url.as_deref().ok_or(GeocoreError::InvalidState)?;
        if path.is_empty() {
            return Ok(base_url.to_string());
        }
        Ok(format!("{base_url}/{}", path.trim_start_matches('/')))
    }
}

fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unconfigured() {
        let session = Session::new();
        assert_eq!(session.phase(), SessionPhase::Unconfigured);
        assert!(matches!(session.url_for("/objs"), Err(GeocoreError::InvalidState)));
    }

    #[test]
    fn config_prepopulates_state() {
        let session = Session::from_config(&GeocoreConfig::new("http://h/api/", "PRO-1"));
        assert_eq!(session.phase(), SessionPhase::Configured);
        assert_eq!(session.base_url().as_deref(), Some("http://h/api"));
        assert_eq!(session.project_id().as_deref(), Some("PRO-1"));
    }

    #[test]
    fn setup_twice_keeps_last_values_only() {
        let session = Session::new();
        session.setup("http://first", "PRO-A");
        session.setup("http://second/", "PRO-B");
        assert_eq!(
            session.snapshot(),
            SessionState {
                base_url: Some("http://second".to_string()),
                project_id: Some("PRO-B".to_string()),
                user_id: None,
                token: None,
            }
        );
    }

    #[test]
    fn login_and_relogin() {
        let session = Session::new();
        session.setup("http://h", "PRO-1");
        session.authenticate("u1", "t1");
        assert_eq!(session.phase(), SessionPhase::Authenticated);
        session.authenticate("u2", "t2");
        assert_eq!(session.user_id().as_deref(), Some("u2"));
        assert_eq!(session.token().as_deref(), Some("t2"));

        session.clear_token();
        assert_eq!(session.phase(), SessionPhase::Configured);
        assert_eq!(session.project_id().as_deref(), Some("PRO-1"));
    }

    #[test]
    fn url_for_joins_paths() {
        let session = Session::new();
        session.setup("http://h/api", "PRO-1");
        assert_eq!(session.url_for("/objs").unwrap(), "http://h/api/objs");
        assert_eq!(session.url_for("objs").unwrap(), "http://h/api/objs");
        assert_eq!(session.url_for("").unwrap(), "http://h/api");
    }
}
