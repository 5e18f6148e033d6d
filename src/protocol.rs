//! Public protocol structs for the HTTP API (serde ready), plus the API error type.
//! Keep this small and stable to evolve backend and frontend independently.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
  CognitiveLevel, ConfigIssue, ExamConfig, GeneratedExam, QuestionType, ESSAY_COUNT_RANGE, PG_COUNT_RANGE,
};
use crate::session::{Session, SessionError, Status};

/// Everything the frontend needs to draw one session.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
  pub session_id: Uuid,
  pub status: Status,
  pub error: Option<String>,
  pub config: Option<ExamConfig>,
  pub exam: Option<GeneratedExam>,
  pub show_key: bool,
}

impl SessionView {
  pub fn of(session_id: Uuid, s: &Session) -> Self {
    Self {
      session_id,
      status: s.status(),
      error: s.error().map(str::to_string),
      config: s.config().cloned(),
      exam: s.document().map(|d| d.as_ref().clone()),
      show_key: s.show_key(),
    }
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountBounds {
  pub min: u32,
  pub max: u32,
}

/// Choices and defaults for the authoring form.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormOptions {
  pub cognitive_levels: Vec<&'static str>,
  pub question_types: Vec<&'static str>,
  pub defaults: ExamConfig,
  pub pg_count: CountBounds,
  pub essay_count: CountBounds,
}

impl FormOptions {
  pub fn current() -> Self {
    Self {
      cognitive_levels: CognitiveLevel::ALL.iter().map(|c| c.label()).collect(),
      question_types: QuestionType::ALL.iter().map(|q| q.label()).collect(),
      defaults: ExamConfig::default(),
      pg_count: CountBounds { min: PG_COUNT_RANGE.0, max: PG_COUNT_RANGE.1 },
      essay_count: CountBounds { min: ESSAY_COUNT_RANGE.0, max: ESSAY_COUNT_RANGE.1 },
    }
  }
}

#[derive(Serialize)]
pub struct HealthOut {
  pub ok: bool,
  pub generation_enabled: bool,
}

#[derive(Serialize)]
pub struct ErrorOut {
  pub error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unknown session {0}")]
  SessionNotFound(Uuid),
  #[error("invalid exam configuration: {0}")]
  InvalidConfig(#[from] ConfigIssue),
  #[error(transparent)]
  Session(#[from] SessionError),
  /// Generation failed; carries the user-facing message only.
  #[error("{0}")]
  Generation(&'static str),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::SessionNotFound(_) => StatusCode::NOT_FOUND,
      ApiError::InvalidConfig(_) => StatusCode::UNPROCESSABLE_ENTITY,
      ApiError::Session(_) => StatusCode::CONFLICT,
      ApiError::Generation(_) => StatusCode::BAD_GATEWAY,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    (self.status(), Json(ErrorOut { error: self.to_string() })).into_response()
  }
}
