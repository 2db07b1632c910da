//! Per-session wizard state
//!
//! Each browser gets an opaque cookie; the wizard state for that cookie lives
//! in a Moka cache and expires after the configured idle time. Transitions run
//! inside the cache's per-key compute, so overlapping requests on one session
//! apply one after another.

use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::Response;
use moka::future::Cache;
use moka::ops::compute::{CompResult, Op};
use std::future;
use std::time::Duration;

use crate::wizard::WizardState;

pub const SESSION_COOKIE: &str = "plant_session";

const MAX_SESSIONS: u64 = 10_000;

#[derive(Clone)]
pub struct SessionStore {
    states: Cache<String, WizardState>,
}

impl SessionStore {
    pub fn new(idle_ttl: Duration) -> Self {
        let states = Cache::builder()
            .max_capacity(MAX_SESSIONS)
            .time_to_idle(idle_ttl)
            .build();
        Self { states }
    }

    /// Current state, or a fresh wizard for unknown/expired sessions
    pub async fn load(&self, session: &Session) -> WizardState {
        self.states.get(&session.id).await.unwrap_or_default()
    }

    /// Apply `transition` to the session's state as a single cache update
    ///
    /// On error nothing is written and the previous state stays in place.
    pub async fn update<F>(&self, session: &Session, transition: F) -> anyhow::Result<WizardState>
    where
        F: FnOnce(WizardState) -> anyhow::Result<WizardState>,
    {
        let mut failure = None;

        let result = self
            .states
            .entry(session.id.clone())
            .and_compute_with(|entry| {
                let current = entry.map(|e| e.into_value()).unwrap_or_default();
                let op = match transition(current) {
                    Ok(next) => Op::Put(next),
                    Err(err) => {
                        failure = Some(err);
                        Op::Nop
                    }
                };
                future::ready(op)
            })
            .await;

        if let Some(err) = failure {
            return Err(err);
        }

        match result {
            CompResult::Inserted(entry)
            | CompResult::ReplacedWith(entry)
            | CompResult::Unchanged(entry) => Ok(entry.into_value()),
            _ => Ok(WizardState::default()),
        }
    }
}

/// Session identity resolved from the request cookie
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub is_new: bool,
}

impl Session {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        match cookie_value(headers, SESSION_COOKIE).filter(|id| is_valid_id(id)) {
            Some(id) => Session { id, is_new: false },
            None => {
                let id = new_session_id();
                tracing::debug!("starting session {}", id);
                Session { id, is_new: true }
            }
        }
    }

    /// Add `Set-Cookie` for sessions created by this request
    pub fn attach(&self, mut response: Response) -> Response {
        if self.is_new {
            let cookie = format!(
                "{}={}; Path=/; HttpOnly; SameSite=Lax",
                SESSION_COOKIE, self.id
            );
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
        }
        response
    }
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

fn new_session_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}

fn is_valid_id(id: &str) -> bool {
    id.len() == 32 && id.bytes().all(|b| b.is_ascii_hexdigit())
}
