//! Turns an `ExamConfig` into the prompt, system instruction and response schema sent to the model.
//!
//! Pure and deterministic: the same config and prompts always yield the same request.

use serde_json::{json, Value};

use crate::config::{Prompts, DEFAULT_TEMPERATURE};
use crate::domain::{Difficulty, ExamConfig};
use crate::util::fill_template;

/// Everything the generation backend needs for one call.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationRequest {
  pub prompt: String,
  pub system_instruction: String,
  /// Gemini `responseSchema` (OpenAPI subset).
  pub schema: Value,
  pub temperature: f32,
}

pub const MULTIPLE_CHOICE_FIELDS: [&str; 7] =
  ["number", "question", "options", "key", "explanation", "level", "difficulty"];
pub const ESSAY_FIELDS: [&str; 6] = ["number", "question", "idealAnswer", "rubric", "level", "difficulty"];
pub const EXAM_FIELDS: [&str; 3] = ["title", "multipleChoice", "essays"];

pub fn build_request(config: &ExamConfig, prompts: &Prompts) -> GenerationRequest {
  let item_counts = item_count_phrase(config);
  let prompt = fill_template(
    &prompts.exam_user_template,
    &[
      ("kd", config.kd.as_str()),
      ("indicators", config.indicators.as_str()),
      ("material", config.material.as_str()),
      ("class_name", config.class_name.as_str()),
      ("cognitive_level", config.cognitive_level.label()),
      ("item_counts", item_counts.as_str()),
      ("question_type", config.question_type.label()),
    ],
  );

  GenerationRequest {
    prompt,
    system_instruction: prompts.system_instruction.clone(),
    schema: exam_schema(),
    temperature: DEFAULT_TEMPERATURE,
  }
}

/// "10 PG", "5 Essai" or "10 PG dan 5 Essai". Only requested kinds are mentioned.
pub fn item_count_phrase(config: &ExamConfig) -> String {
  match config.requested_counts() {
    (Some(pg), Some(essay)) => format!("{} PG dan {} Essai", pg, essay),
    (Some(pg), None) => format!("{} PG", pg),
    (None, Some(essay)) => format!("{} Essai", essay),
    (None, None) => String::new(),
  }
}

/// Response schema describing `GeneratedExam`.
pub fn exam_schema() -> Value {
  json!({
    "type": "OBJECT",
    "properties": {
      "title": {
        "type": "STRING",
        "description": "Judul ujian yang relevan dengan materi"
      },
      "multipleChoice": {
        "type": "ARRAY",
        "description": "Daftar soal pilihan ganda",
        "items": {
          "type": "OBJECT",
          "properties": {
            "number": { "type": "INTEGER" },
            "question": { "type": "STRING" },
            "options": {
              "type": "ARRAY",
              "items": { "type": "STRING" },
              "description": "Array of 4 or 5 options (A, B, C, D, E)"
            },
            "key": { "type": "STRING", "description": "Jawaban benar (misal: 'A')" },
            "explanation": { "type": "STRING", "description": "Pembahasan singkat" },
            "level": { "type": "STRING", "description": "Level Kognitif (C1-C6)" },
            "difficulty": difficulty_schema("Tingkat Kesulitan (Mudah/Sedang/Sulit)")
          },
          "required": MULTIPLE_CHOICE_FIELDS
        }
      },
      "essays": {
        "type": "ARRAY",
        "description": "Daftar soal essai",
        "items": {
          "type": "OBJECT",
          "properties": {
            "number": { "type": "INTEGER" },
            "question": { "type": "STRING" },
            "idealAnswer": { "type": "STRING", "description": "Jawaban yang diharapkan" },
            "rubric": { "type": "STRING", "description": "Kisi-kisi atau poin penilaian" },
            "level": { "type": "STRING", "description": "Level Kognitif" },
            "difficulty": difficulty_schema("Tingkat Kesulitan")
          },
          "required": ESSAY_FIELDS
        }
      }
    },
    "required": EXAM_FIELDS
  })
}

fn difficulty_schema(description: &str) -> Value {
  json!({
    "type": "STRING",
    "format": "enum",
    "enum": Difficulty::LABELS,
    "description": description
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{CognitiveLevel, QuestionType};

  fn config(question_type: QuestionType) -> ExamConfig {
    ExamConfig {
      kd: "3.4 Menganalisis besaran-besaran fisis pada gerak lurus".into(),
      indicators: "Siswa dapat menghitung kecepatan rata-rata".into(),
      material: "Gerak Lurus Berubah Beraturan (GLBB)".into(),
      class_name: "X SMA".into(),
      cognitive_level: CognitiveLevel::C3,
      pg_count: 12,
      essay_count: 4,
      question_type,
    }
  }

  fn required(v: &Value) -> Vec<&str> {
    v["required"].as_array().expect("required").iter().filter_map(Value::as_str).collect()
  }

  #[test]
  fn prompt_embeds_every_field_verbatim() {
    let cfg = config(QuestionType::Both);
    let req = build_request(&cfg, &Prompts::default());
    for needle in [&cfg.kd, &cfg.indicators, &cfg.material, &cfg.class_name] {
      assert!(req.prompt.contains(needle.as_str()), "prompt missing {needle}");
    }
    assert!(req.prompt.contains("Level Kognitif Target: C3 - Menerapkan"));
    assert!(req.prompt.contains("Jenis Soal: Keduanya"));
    assert!(req.prompt.contains("Minimal 20% sulit"));
    assert!(req.prompt.contains("4 atau 5 opsi"));
    assert_eq!(req.temperature, 0.7);
    assert_eq!(req.system_instruction, Prompts::default().system_instruction);
  }

  #[test]
  fn item_counts_follow_question_type() {
    let pg_only = build_request(&config(QuestionType::MultipleChoiceOnly), &Prompts::default());
    assert!(pg_only.prompt.contains("Jumlah Soal: 12 PG\n"));
    assert!(!pg_only.prompt.contains("4 Essai"));

    let essay_only = build_request(&config(QuestionType::EssayOnly), &Prompts::default());
    assert!(essay_only.prompt.contains("Jumlah Soal: 4 Essai\n"));
    assert!(!essay_only.prompt.contains("12 PG"));

    let both = build_request(&config(QuestionType::Both), &Prompts::default());
    assert!(both.prompt.contains("Jumlah Soal: 12 PG dan 4 Essai"));
  }

  #[test]
  fn schema_requires_exact_field_sets() {
    let schema = exam_schema();
    assert_eq!(required(&schema), EXAM_FIELDS);

    let mc = &schema["properties"]["multipleChoice"]["items"];
    assert_eq!(required(mc), MULTIPLE_CHOICE_FIELDS);
    let mc_props: Vec<&String> = mc["properties"].as_object().unwrap().keys().collect();
    assert_eq!(mc_props.len(), MULTIPLE_CHOICE_FIELDS.len());

    let essay = &schema["properties"]["essays"]["items"];
    assert_eq!(required(essay), ESSAY_FIELDS);
    assert_eq!(essay["properties"].as_object().unwrap().len(), ESSAY_FIELDS.len());
  }

  #[test]
  fn building_is_deterministic() {
    let cfg = config(QuestionType::Both);
    assert_eq!(build_request(&cfg, &Prompts::default()), build_request(&cfg, &Prompts::default()));
  }

  #[test]
  fn braces_in_user_text_are_not_expanded() {
    let mut cfg = config(QuestionType::Both);
    cfg.material = "Himpunan {material}".into();
    let req = build_request(&cfg, &Prompts::default());
    assert!(req.prompt.contains("Materi Pokok: Himpunan {material}"));
  }
}
