//! Application state: the in-memory session store and the exam generator.
//!
//! Sessions live only in memory; nothing is persisted. Each session holds at most one
//! document (see `session`). Idle and ready sessions untouched for longer than the TTL are
//! dropped whenever a new session is created.

use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::{load_agent_config_from_env, session_ttl_from_env, ModelSettings, DEFAULT_SESSION_TTL};
use crate::error::GenerationError;
use crate::gemini::ExamGenerator;
use crate::protocol::{ApiError, SessionView};
use crate::session::{Session, Status};

#[derive(Clone)]
pub struct AppState {
  pub sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
  pub generator: ExamGenerator,
  pub session_ttl: Duration,
}

impl AppState {
  /// Build state from env: load prompt overrides, read model settings, wire the Gemini client.
  #[instrument(level = "info", skip_all)]
  pub fn from_env() -> Result<Self, GenerationError> {
    let prompts = load_agent_config_from_env().map(|c| c.prompts).unwrap_or_default();
    let settings = ModelSettings::from_env();

    if settings.api_key.is_some() {
      info!(target: "pas_generator", base_url = %settings.base_url, model = %settings.model, "Gemini enabled.");
    } else {
      warn!(target: "pas_generator", "API_KEY not set; every generation will fail with a configuration error.");
    }

    let generator = ExamGenerator::from_settings(&settings, prompts)?;
    Ok(Self::with_generator(generator).with_session_ttl(session_ttl_from_env()))
  }

  pub fn with_generator(generator: ExamGenerator) -> Self {
    Self { sessions: Arc::new(RwLock::new(HashMap::new())), generator, session_ttl: DEFAULT_SESSION_TTL }
  }

  pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
    self.session_ttl = ttl;
    self
  }

  #[instrument(level = "debug", skip(self))]
  pub async fn create_session(&self) -> SessionView {
    let id = Uuid::new_v4();
    let session = Session::new();
    let view = SessionView::of(id, &session);

    let mut sessions = self.sessions.write().await;
    let before = sessions.len();
    // A session with a call in flight is kept until the call settles.
    sessions.retain(|_, s| s.status() == Status::Generating || s.touched().elapsed() < self.session_ttl);
    let evicted = before - sessions.len();
    if evicted > 0 {
      info!(target: "exam", evicted, remaining = sessions.len(), "Evicted idle sessions");
    }
    sessions.insert(id, session);
    drop(sessions);

    info!(target: "exam", session_id = %id, "Session created");
    view
  }

  pub async fn remove_session(&self, id: Uuid) -> Result<(), ApiError> {
    self.sessions.write().await.remove(&id).map(|_| ()).ok_or(ApiError::SessionNotFound(id))
  }

  /// Read-only access to a session.
  pub async fn read_session<R>(&self, id: Uuid, f: impl FnOnce(&Session) -> R) -> Result<R, ApiError> {
    let sessions = self.sessions.read().await;
    sessions.get(&id).map(f).ok_or(ApiError::SessionNotFound(id))
  }

  /// Mutate a session under the write lock. The lock is released before returning,
  /// so callers never hold it across an await on the model.
  pub async fn update_session<R>(&self, id: Uuid, f: impl FnOnce(&mut Session) -> R) -> Result<R, ApiError> {
    let mut sessions = self.sessions.write().await;
    sessions.get_mut(&id).map(f).ok_or(ApiError::SessionNotFound(id))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use async_trait::async_trait;

  use crate::config::Prompts;
  use crate::domain::ExamConfig;
  use crate::gemini::ModelBackend;
  use crate::prompt::GenerationRequest;

  struct NoBackend;

  #[async_trait]
  impl ModelBackend for NoBackend {
    async fn generate_content(&self, _key: &str, _req: &GenerationRequest) -> Result<Option<String>, GenerationError> {
      Ok(None)
    }
  }

  fn state(ttl: Duration) -> AppState {
    AppState::with_generator(ExamGenerator::new(None, Prompts::default(), Arc::new(NoBackend))).with_session_ttl(ttl)
  }

  #[tokio::test]
  async fn stale_sessions_are_evicted_on_create() {
    let state = state(Duration::ZERO);
    let old = state.create_session().await.session_id;
    let new = state.create_session().await.session_id;

    let sessions = state.sessions.read().await;
    assert!(!sessions.contains_key(&old));
    assert!(sessions.contains_key(&new));
    assert_eq!(sessions.len(), 1);
  }

  #[tokio::test]
  async fn generating_sessions_survive_eviction() {
    let state = state(Duration::ZERO);
    let busy = state.create_session().await.session_id;
    state.update_session(busy, |s| s.begin(ExamConfig::default())).await.unwrap().unwrap();

    state.create_session().await;
    assert!(state.read_session(busy, |s| s.status()).await.is_ok());
  }

  #[tokio::test]
  async fn fresh_sessions_are_kept() {
    let state = state(Duration::from_secs(3600));
    let first = state.create_session().await.session_id;
    state.create_session().await;
    assert!(state.read_session(first, |_| ()).await.is_ok());
    assert_eq!(state.sessions.read().await.len(), 2);
  }
}
