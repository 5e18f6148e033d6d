//! Core behaviors behind the HTTP handlers.
//!
//! This includes:
//!   - Running one generation for a session (Idle -> Generating -> Ready | Idle+error)
//!   - Toggling answer-key visibility and resetting
//!   - Producing the plain-text export and the print view of the held document

use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::ExamConfig;
use crate::protocol::{ApiError, SessionView};
use crate::render::{export_plain_text, render_print_html};
use crate::session::SessionError;
use crate::state::AppState;

/// Look up the session, validate the form, move the session to `Generating`, call the model
/// without holding the session lock, then apply the outcome if this generation is still current.
#[instrument(level = "info", skip(state, config), fields(%session_id, question_type = %config.question_type))]
pub async fn generate_exam(state: &AppState, session_id: Uuid, config: ExamConfig) -> Result<SessionView, ApiError> {
  let ticket = state
    .update_session(session_id, |s| {
      config.validate()?;
      Ok::<_, ApiError>(s.begin(config.clone())?)
    })
    .await??;

  let outcome = state.generator.generate(&config).await;
  if let Err(e) = &outcome {
    error!(target: "exam", %session_id, ticket, kind = e.kind(), error = %e, "Generation failed");
  }
  let failure = outcome.as_ref().err().map(|e| e.user_message());

  let (applied, view) = state
    .update_session(session_id, |s| {
      let applied = s.finish(ticket, outcome.map_err(|e| e.user_message().to_string()));
      (applied, SessionView::of(session_id, s))
    })
    .await?;

  if !applied {
    warn!(target: "exam", %session_id, ticket, "Generation no longer current; outcome discarded");
    return Ok(view);
  }
  if let Some(message) = failure {
    return Err(ApiError::Generation(message));
  }
  info!(target: "exam", %session_id, ticket, "Session ready");
  Ok(view)
}

#[instrument(level = "info", skip(state))]
pub async fn toggle_key(state: &AppState, session_id: Uuid) -> Result<SessionView, ApiError> {
  state
    .update_session(session_id, |s| {
      s.toggle_key()?;
      Ok::<_, SessionError>(SessionView::of(session_id, s))
    })
    .await?
    .map_err(ApiError::from)
}

#[instrument(level = "info", skip(state))]
pub async fn reset(state: &AppState, session_id: Uuid) -> Result<SessionView, ApiError> {
  state
    .update_session(session_id, |s| {
      s.reset();
      SessionView::of(session_id, s)
    })
    .await
}

#[instrument(level = "info", skip(state))]
pub async fn export_text(state: &AppState, session_id: Uuid) -> Result<String, ApiError> {
  state
    .read_session(session_id, |s| {
      let doc = s.document().ok_or(SessionError::NoDocument)?;
      let class_name = s.config().map(|c| c.class_name.as_str());
      Ok::<_, SessionError>(export_plain_text(doc, class_name))
    })
    .await?
    .map_err(ApiError::from)
}

#[instrument(level = "info", skip(state))]
pub async fn print_view(state: &AppState, session_id: Uuid) -> Result<String, ApiError> {
  state
    .read_session(session_id, |s| {
      let doc = s.document().ok_or(SessionError::NoDocument)?;
      Ok::<_, SessionError>(render_print_html(doc, s.config(), s.show_key()))
    })
    .await?
    .map_err(ApiError::from)
}
