//! Domain models: the authoring form (`ExamConfig`) and the generated exam document.
//!
//! Wire names follow the JSON the form sends and the schema the model answers with
//! (camelCase fields, Indonesian enum labels).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Form bounds for requested item counts.
pub const PG_COUNT_RANGE: (u32, u32) = (1, 50);
pub const ESSAY_COUNT_RANGE: (u32, u32) = (1, 10);

/// Which kinds of items the exam should contain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionType {
  #[serde(rename = "Pilihan Ganda", alias = "multiple_choice_only")]
  MultipleChoiceOnly,
  #[serde(rename = "Essai", alias = "essay_only")]
  EssayOnly,
  #[serde(rename = "Keduanya", alias = "both")]
  Both,
}

impl QuestionType {
  pub const ALL: [QuestionType; 3] = [QuestionType::Both, QuestionType::MultipleChoiceOnly, QuestionType::EssayOnly];

  pub fn label(self) -> &'static str {
    match self {
      QuestionType::MultipleChoiceOnly => "Pilihan Ganda",
      QuestionType::EssayOnly => "Essai",
      QuestionType::Both => "Keduanya",
    }
  }

  pub fn wants_multiple_choice(self) -> bool {
    matches!(self, QuestionType::MultipleChoiceOnly | QuestionType::Both)
  }

  pub fn wants_essays(self) -> bool {
    matches!(self, QuestionType::EssayOnly | QuestionType::Both)
  }
}

impl Default for QuestionType {
  fn default() -> Self { QuestionType::Both }
}

impl fmt::Display for QuestionType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.label()) }
}

/// Bloom's taxonomy target offered by the form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CognitiveLevel {
  #[serde(rename = "C1 - C6 (Campuran)", alias = "mixed")]
  Mixed,
  #[serde(rename = "C1 - Mengingat", alias = "C1")]
  C1,
  #[serde(rename = "C2 - Memahami", alias = "C2")]
  C2,
  #[serde(rename = "C3 - Menerapkan", alias = "C3")]
  C3,
  #[serde(rename = "C4 - Menganalisis", alias = "C4")]
  C4,
  #[serde(rename = "C5 - Mengevaluasi", alias = "C5")]
  C5,
  #[serde(rename = "C6 - Mencipta", alias = "C6")]
  C6,
}

impl CognitiveLevel {
  pub const ALL: [CognitiveLevel; 7] = [
    CognitiveLevel::Mixed,
    CognitiveLevel::C1,
    CognitiveLevel::C2,
    CognitiveLevel::C3,
    CognitiveLevel::C4,
    CognitiveLevel::C5,
    CognitiveLevel::C6,
  ];

  pub fn label(self) -> &'static str {
    match self {
      CognitiveLevel::Mixed => "C1 - C6 (Campuran)",
      CognitiveLevel::C1 => "C1 - Mengingat",
      CognitiveLevel::C2 => "C2 - Memahami",
      CognitiveLevel::C3 => "C3 - Menerapkan",
      CognitiveLevel::C4 => "C4 - Menganalisis",
      CognitiveLevel::C5 => "C5 - Mengevaluasi",
      CognitiveLevel::C6 => "C6 - Mencipta",
    }
  }
}

impl Default for CognitiveLevel {
  fn default() -> Self { CognitiveLevel::Mixed }
}

impl fmt::Display for CognitiveLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.label()) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
  #[serde(rename = "Mudah", alias = "Easy")]
  Easy,
  #[serde(rename = "Sedang", alias = "Medium")]
  Medium,
  #[serde(rename = "Sulit", alias = "Hard")]
  Hard,
}

impl Difficulty {
  pub const LABELS: [&'static str; 3] = ["Mudah", "Sedang", "Sulit"];

  pub fn label(self) -> &'static str {
    match self {
      Difficulty::Easy => "Mudah",
      Difficulty::Medium => "Sedang",
      Difficulty::Hard => "Sulit",
    }
  }
}

impl fmt::Display for Difficulty {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.label()) }
}

/// Authoring parameters for one generation action. Built fresh per submit, never stored
/// beyond the session that submitted it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamConfig {
  /// Kompetensi Dasar.
  pub kd: String,
  pub indicators: String,
  /// Materi Pokok.
  pub material: String,
  pub class_name: String,
  #[serde(default)]
  pub cognitive_level: CognitiveLevel,
  #[serde(default)]
  pub pg_count: u32,
  #[serde(default)]
  pub essay_count: u32,
  #[serde(default)]
  pub question_type: QuestionType,
}

impl Default for ExamConfig {
  fn default() -> Self {
    Self {
      kd: String::new(),
      indicators: String::new(),
      material: String::new(),
      class_name: String::new(),
      cognitive_level: CognitiveLevel::Mixed,
      pg_count: 10,
      essay_count: 5,
      question_type: QuestionType::Both,
    }
  }
}

/// First problem found in a submitted form.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigIssue {
  #[error("field '{0}' must not be empty")]
  MissingField(&'static str),
  #[error("field '{field}' must be between {min} and {max}, got {value}")]
  CountOutOfRange { field: &'static str, value: u32, min: u32, max: u32 },
}

impl ExamConfig {
  /// Counts actually requested, `(pg, essay)`. The side the question type does not ask for
  /// is `None` even if the form still holds a stale number for it.
  pub fn requested_counts(&self) -> (Option<u32>, Option<u32>) {
    let pg = self.question_type.wants_multiple_choice().then_some(self.pg_count);
    let essay = self.question_type.wants_essays().then_some(self.essay_count);
    (pg, essay)
  }

  pub fn validate(&self) -> Result<(), ConfigIssue> {
    let required = [
      ("kd", &self.kd),
      ("indicators", &self.indicators),
      ("material", &self.material),
      ("className", &self.class_name),
    ];
    for (name, value) in required {
      if value.trim().is_empty() {
        return Err(ConfigIssue::MissingField(name));
      }
    }

    let (pg, essay) = self.requested_counts();
    check_range("pgCount", pg, PG_COUNT_RANGE)?;
    check_range("essayCount", essay, ESSAY_COUNT_RANGE)?;
    Ok(())
  }
}

fn check_range(field: &'static str, value: Option<u32>, (min, max): (u32, u32)) -> Result<(), ConfigIssue> {
  match value {
    Some(v) if v < min || v > max => Err(ConfigIssue::CountOutOfRange { field, value: v, min, max }),
    _ => Ok(()),
  }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipleChoiceQuestion {
  pub number: u32,
  pub question: String,
  pub options: Vec<String>,
  /// Letter of the correct option, e.g. "A".
  pub key: String,
  pub explanation: String,
  pub level: String,
  pub difficulty: Difficulty,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EssayQuestion {
  pub number: u32,
  pub question: String,
  pub ideal_answer: String,
  pub rubric: String,
  pub level: String,
  pub difficulty: Difficulty,
}

/// The generated document. Immutable once created; sessions hold it behind an `Arc`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedExam {
  pub title: String,
  pub multiple_choice: Vec<MultipleChoiceQuestion>,
  pub essays: Vec<EssayQuestion>,
}

/// Allowed number of options on a multiple-choice item (A-D or A-E).
pub const OPTION_COUNT_RANGE: (usize, usize) = (4, 5);

impl GeneratedExam {
  /// Structural check on top of what serde already enforces. Answer keys are not checked
  /// against the options.
  pub fn check_shape(&self) -> Result<(), String> {
    let (min, max) = OPTION_COUNT_RANGE;
    for q in &self.multiple_choice {
      let n = q.options.len();
      if n < min || n > max {
        return Err(format!("multiple-choice item {} has {} options, expected {}-{}", q.number, n, min, max));
      }
    }
    Ok(())
  }
}

/// Letter for a zero-based option index: 0 -> 'A'.
pub fn option_letter(idx: usize) -> char {
  (b'A' + (idx % 26) as u8) as char
}
