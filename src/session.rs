//! Per-session document lifecycle.
//!
//! ```text
//! Idle --submit--> Generating --ok--> Ready(doc) --reset--> Idle
//!                       \--err--> Idle { error }   (config kept for resubmission)
//! ```
//!
//! The answer-key flag is view state only; the document is never touched after creation.
//! Every `begin` hands out a fresh ticket, and only the matching `finish` may leave `Generating`.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;

use crate::domain::{ExamConfig, GeneratedExam};

#[derive(Clone, Debug)]
pub enum DocumentState {
  Idle { error: Option<String> },
  Generating { ticket: u64 },
  Ready(Arc<GeneratedExam>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
  Idle,
  Generating,
  Ready,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
  #[error("a generation is already in progress for this session")]
  AlreadyGenerating,
  #[error("an exam is already shown; reset before generating a new one")]
  DocumentReady,
  #[error("no exam has been generated yet")]
  NoDocument,
}

#[derive(Clone, Debug)]
pub struct Session {
  state: DocumentState,
  config: Option<ExamConfig>,
  show_key: bool,
  last_ticket: u64,
  touched: Instant,
}

impl Default for Session {
  fn default() -> Self {
    Self {
      state: DocumentState::Idle { error: None },
      config: None,
      show_key: false,
      last_ticket: 0,
      touched: Instant::now(),
    }
  }
}

impl Session {
  pub fn new() -> Self { Self::default() }

  pub fn status(&self) -> Status {
    match self.state {
      DocumentState::Idle { .. } => Status::Idle,
      DocumentState::Generating { .. } => Status::Generating,
      DocumentState::Ready(_) => Status::Ready,
    }
  }

  pub fn error(&self) -> Option<&str> {
    match &self.state {
      DocumentState::Idle { error } => error.as_deref(),
      _ => None,
    }
  }

  pub fn config(&self) -> Option<&ExamConfig> { self.config.as_ref() }

  pub fn document(&self) -> Option<&Arc<GeneratedExam>> {
    match &self.state {
      DocumentState::Ready(doc) => Some(doc),
      _ => None,
    }
  }

  pub fn show_key(&self) -> bool { self.show_key }

  /// Last time the session was created or changed.
  pub fn touched(&self) -> Instant { self.touched }

  /// Enter `Generating`. Only allowed from `Idle`; `Ready` must be reset first.
  /// The returned ticket identifies this generation in `finish`.
  pub fn begin(&mut self, config: ExamConfig) -> Result<u64, SessionError> {
    match self.state {
      DocumentState::Generating { .. } => return Err(SessionError::AlreadyGenerating),
      DocumentState::Ready(_) => return Err(SessionError::DocumentReady),
      DocumentState::Idle { .. } => {}
    }
    self.last_ticket += 1;
    let ticket = self.last_ticket;
    self.config = Some(config);
    self.show_key = false;
    self.state = DocumentState::Generating { ticket };
    self.touched = Instant::now();
    Ok(ticket)
  }

  /// Apply the outcome of the call started by the `begin` that returned `ticket`.
  /// Returns false (and changes nothing) unless that generation is still the current one,
  /// e.g. after a reset or a reset followed by a new submit.
  pub fn finish(&mut self, ticket: u64, outcome: Result<GeneratedExam, String>) -> bool {
    if !matches!(self.state, DocumentState::Generating { ticket: current } if current == ticket) {
      return false;
    }
    self.state = match outcome {
      Ok(doc) => DocumentState::Ready(Arc::new(doc)),
      Err(message) => DocumentState::Idle { error: Some(message) },
    };
    self.touched = Instant::now();
    true
  }

  /// Flip answer-key visibility. Only meaningful with a document.
  pub fn toggle_key(&mut self) -> Result<bool, SessionError> {
    if self.document().is_none() {
      return Err(SessionError::NoDocument);
    }
    self.show_key = !self.show_key;
    self.touched = Instant::now();
    Ok(self.show_key)
  }

  /// Back to an empty form: drops the document, the retained config and any error.
  /// Tickets keep counting so an outcome from before the reset can never match.
  pub fn reset(&mut self) {
    *self = Self { last_ticket: self.last_ticket, ..Self::default() };
  }
}
