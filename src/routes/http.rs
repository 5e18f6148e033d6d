//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs the session id and basic result info.

use std::sync::Arc;
use axum::{
  extract::{Path, State},
  http::{header, StatusCode},
  response::{Html, IntoResponse},
  Json,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::ExamConfig;
use crate::logic;
use crate::protocol::*;
use crate::session::Session;
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, generation_enabled: state.generator.has_credential() })
}

#[instrument(level = "info")]
pub async fn http_form_options() -> impl IntoResponse { Json(FormOptions::current()) }

#[instrument(level = "info", skip(state))]
pub async fn http_create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(state.create_session().await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
  let view = state.read_session(id, |s: &Session| SessionView::of(id, s)).await?;
  Ok(Json(view))
}

#[instrument(level = "info", skip(state))]
pub async fn http_delete_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  state.remove_session(id).await?;
  info!(target: "exam", session_id = %id, "Session removed");
  Ok(StatusCode::NO_CONTENT)
}

#[instrument(
  level = "info",
  skip(state, body),
  fields(%id, question_type = %body.question_type, pg_count = body.pg_count, essay_count = body.essay_count)
)]
pub async fn http_post_generate(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ExamConfig>,
) -> Result<Json<SessionView>, ApiError> {
  let view = logic::generate_exam(&state, id, body).await?;
  info!(
    target: "exam",
    session_id = %id,
    multiple_choice = view.exam.as_ref().map_or(0, |e| e.multiple_choice.len()),
    essays = view.exam.as_ref().map_or(0, |e| e.essays.len()),
    "HTTP generate served"
  );
  Ok(Json(view))
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_toggle_key(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
  let view = logic::toggle_key(&state, id).await?;
  info!(target: "exam", session_id = %id, show_key = view.show_key, "Answer key toggled");
  Ok(Json(view))
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_reset(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
  Ok(Json(logic::reset(&state, id).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_export(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
  let text = logic::export_text(&state, id).await?;
  Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_print(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> Result<Html<String>, ApiError> {
  Ok(Html(logic::print_view(&state, id).await?))
}
