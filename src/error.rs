//! Failure kinds of one generation attempt.

use thiserror::Error;

/// Shown to the user for every failure except a missing credential.
pub const GENERATION_FAILED_MESSAGE: &str =
  "Gagal membuat soal. Pastikan kuota API mencukupi atau coba kurangi jumlah soal.";

pub const MISSING_KEY_MESSAGE: &str = "API Key not found in environment variables";

#[derive(Debug, Error)]
pub enum GenerationError {
  /// No API key was configured; nothing was sent.
  #[error("API key missing")]
  Configuration,
  #[error("empty response from model")]
  EmptyResponse,
  #[error("malformed model response: {0}")]
  MalformedResponse(String),
  /// Transport, quota, rate limit or any non-success status.
  #[error("model service error: {0}")]
  Service(String),
}

impl GenerationError {
  /// The one message the user sees. Details stay in the logs.
  pub fn user_message(&self) -> &'static str {
    match self {
      GenerationError::Configuration => MISSING_KEY_MESSAGE,
      _ => GENERATION_FAILED_MESSAGE,
    }
  }

  pub fn kind(&self) -> &'static str {
    match self {
      GenerationError::Configuration => "configuration",
      GenerationError::EmptyResponse => "empty_response",
      GenerationError::MalformedResponse(_) => "malformed_response",
      GenerationError::Service(_) => "service",
    }
  }
}

impl From<reqwest::Error> for GenerationError {
  fn from(e: reqwest::Error) -> Self { GenerationError::Service(e.to_string()) }
}
