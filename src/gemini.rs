//! Generation client: one structured-output call to Gemini per exam.
//!
//! `ExamGenerator` owns the contract (credential check, request building, payload parsing).
//! `ModelBackend` is the transport seam; `GeminiBackend` talks to the real API over reqwest.
//!
//! NOTE: We never log the API key and only log prompt/response sizes, not contents.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use crate::config::{ModelSettings, Prompts};
use crate::domain::{ExamConfig, GeneratedExam};
use crate::error::GenerationError;
use crate::prompt::{build_request, GenerationRequest};
use crate::util::trunc_for_log;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Sends one request to the model and returns its raw text payload (`None` when the
/// model produced no text at all).
#[async_trait]
pub trait ModelBackend: Send + Sync {
  async fn generate_content(
    &self,
    api_key: &str,
    request: &GenerationRequest,
  ) -> Result<Option<String>, GenerationError>;
}

#[derive(Clone)]
pub struct ExamGenerator {
  api_key: Option<String>,
  prompts: Prompts,
  backend: Arc<dyn ModelBackend>,
}

impl ExamGenerator {
  pub fn new(api_key: Option<String>, prompts: Prompts, backend: Arc<dyn ModelBackend>) -> Self {
    Self { api_key, prompts, backend }
  }

  /// Generator wired to the real Gemini API.
  pub fn from_settings(settings: &ModelSettings, prompts: Prompts) -> Result<Self, GenerationError> {
    let backend = GeminiBackend::new(&settings.base_url, &settings.model)?;
    Ok(Self::new(settings.api_key.clone(), prompts, Arc::new(backend)))
  }

  pub fn has_credential(&self) -> bool { self.api_key.is_some() }

  /// Build the request, call the model once, parse the payload. No retries.
  #[instrument(
    level = "info",
    skip(self, config),
    fields(question_type = %config.question_type, class_name = %config.class_name)
  )]
  pub async fn generate(&self, config: &ExamConfig) -> Result<GeneratedExam, GenerationError> {
    let Some(api_key) = self.api_key.as_deref() else {
      error!(target: "exam", "No API key configured; refusing to call the model");
      return Err(GenerationError::Configuration);
    };

    let request = build_request(config, &self.prompts);
    let start = Instant::now();
    let result = self.backend.generate_content(api_key, &request).await;
    let elapsed = start.elapsed();

    let text = match result {
      Ok(Some(t)) if !t.trim().is_empty() => t,
      Ok(_) => {
        warn!(target: "exam", ?elapsed, "Model returned an empty payload");
        return Err(GenerationError::EmptyResponse);
      }
      Err(e) => {
        error!(target: "exam", ?elapsed, error = %e, "Model call failed");
        return Err(e);
      }
    };

    let exam = parse_exam(&text).map_err(|e| {
      error!(target: "exam", ?elapsed, error = %e, payload = %trunc_for_log(&text, 200), "Model payload rejected");
      e
    })?;

    info!(
      target: "exam",
      ?elapsed,
      multiple_choice = exam.multiple_choice.len(),
      essays = exam.essays.len(),
      title = %trunc_for_log(&exam.title, 60),
      "Exam generated"
    );
    Ok(exam)
  }
}

/// Parse the model's JSON text into a `GeneratedExam` and check its structural shape.
pub fn parse_exam(text: &str) -> Result<GeneratedExam, GenerationError> {
  let exam: GeneratedExam =
    serde_json::from_str(text).map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;
  exam.check_shape().map_err(GenerationError::MalformedResponse)?;
  Ok(exam)
}

/// reqwest transport for `models/{model}:generateContent`.
#[derive(Clone)]
pub struct GeminiBackend {
  client: reqwest::Client,
  pub base_url: String,
  pub model: String,
}

impl GeminiBackend {
  /// No client timeout is configured; the transport default applies.
  pub fn new(base_url: &str, model: &str) -> Result<Self, GenerationError> {
    let client = reqwest::Client::builder().build()?;
    Ok(Self {
      client,
      base_url: base_url.trim_end_matches('/').to_string(),
      model: model.to_string(),
    })
  }

  fn endpoint(&self) -> String {
    format!("{}/models/{}:generateContent", self.base_url, self.model)
  }
}

#[async_trait]
impl ModelBackend for GeminiBackend {
  #[instrument(level = "info", skip_all, fields(prompt_len = request.prompt.len()))]
  async fn generate_content(
    &self,
    api_key: &str,
    request: &GenerationRequest,
  ) -> Result<Option<String>, GenerationError> {
    let body = GenerateContentRequest {
      contents: vec![Content { role: Some("user"), parts: vec![Part { text: &request.prompt }] }],
      system_instruction: Content { role: None, parts: vec![Part { text: &request.system_instruction }] },
      generation_config: GenerationConfig {
        temperature: request.temperature,
        response_mime_type: "application/json",
        response_schema: &request.schema,
      },
    };

    let res = self.client.post(self.endpoint())
      .header(USER_AGENT, "pas-generator/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(API_KEY_HEADER, api_key)
      .json(&body).send().await?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_gemini_error(&body).unwrap_or(body);
      return Err(GenerationError::Service(format!("Gemini HTTP {}: {}", status, msg)));
    }

    let body: GenerateContentResponse = res.json().await?;
    if let Some(usage) = &body.usage_metadata {
      info!(
        model = %self.model,
        prompt_tokens = ?usage.prompt_token_count,
        candidates_tokens = ?usage.candidates_token_count,
        total_tokens = ?usage.total_token_count,
        "Gemini usage"
      );
    }
    Ok(body.text())
  }
}

// --- Gemini DTOs ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
  contents: Vec<Content<'a>>,
  system_instruction: Content<'a>,
  generation_config: GenerationConfig<'a>,
}
#[derive(Serialize)]
struct Content<'a> {
  #[serde(skip_serializing_if = "Option::is_none")]
  role: Option<&'a str>,
  parts: Vec<Part<'a>>,
}
#[derive(Serialize)]
struct Part<'a> { text: &'a str }
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
  temperature: f32,
  response_mime_type: &'a str,
  response_schema: &'a Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
  #[serde(default)] candidates: Vec<Candidate>,
  #[serde(default)] usage_metadata: Option<UsageMetadata>,
}
#[derive(Deserialize)]
struct Candidate { #[serde(default)] content: Option<CandidateContent> }
#[derive(Deserialize)]
struct CandidateContent { #[serde(default)] parts: Vec<CandidatePart> }
#[derive(Deserialize)]
struct CandidatePart { #[serde(default)] text: Option<String> }
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
  #[serde(default)] prompt_token_count: Option<u32>,
  #[serde(default)] candidates_token_count: Option<u32>,
  #[serde(default)] total_token_count: Option<u32>,
}

impl GenerateContentResponse {
  /// Concatenated text parts of the first candidate.
  fn text(&self) -> Option<String> {
    let parts = &self.candidates.first()?.content.as_ref()?.parts;
    let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
    if text.is_empty() { None } else { Some(text) }
  }
}

/// Try to extract a clean error message from a Gemini error body.
fn extract_gemini_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Mutex;

  use serde_json::json;
  use wiremock::matchers::{body_partial_json, header, method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  use crate::domain::{Difficulty, QuestionType};

  struct FakeBackend {
    calls: AtomicUsize,
    reply: Mutex<Option<Result<Option<String>, GenerationError>>>,
  }

  impl FakeBackend {
    fn replying(reply: Result<Option<String>, GenerationError>) -> Arc<Self> {
      Arc::new(Self { calls: AtomicUsize::new(0), reply: Mutex::new(Some(reply)) })
    }
  }

  #[async_trait]
  impl ModelBackend for FakeBackend {
    async fn generate_content(&self, _api_key: &str, _req: &GenerationRequest) -> Result<Option<String>, GenerationError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      self.reply.lock().unwrap().take().unwrap_or(Ok(None))
    }
  }

  fn config() -> ExamConfig {
    ExamConfig {
      kd: "3.1 Memahami sistem persamaan linear".into(),
      indicators: "Menentukan himpunan penyelesaian".into(),
      material: "SPLDV".into(),
      class_name: "VIII SMP".into(),
      pg_count: 2,
      essay_count: 1,
      question_type: QuestionType::Both,
      ..ExamConfig::default()
    }
  }

  fn payload() -> Value {
    json!({
      "title": "PAS Matematika: SPLDV",
      "multipleChoice": [
        {
          "number": 1, "question": "Nilai x dari x + y = 5 dan x - y = 1 adalah ...",
          "options": ["1", "2", "3", "4"], "key": "C",
          "explanation": "Jumlahkan kedua persamaan.", "level": "C3", "difficulty": "Sedang"
        },
        {
          "number": 2, "question": "Bentuk umum SPLDV adalah ...",
          "options": ["ax + by = c", "ax^2 = c", "a/x = b", "x = y", "xy = c"], "key": "A",
          "explanation": "Definisi.", "level": "C1", "difficulty": "Mudah"
        }
      ],
      "essays": [
        {
          "number": 1, "question": "Selesaikan 2x + y = 7 dan x - y = 2.",
          "idealAnswer": "x = 3, y = 1", "rubric": "Eliminasi benar (5), substitusi benar (5)",
          "level": "C4", "difficulty": "Sulit"
        }
      ]
    })
  }

  fn generator(backend: Arc<FakeBackend>, key: Option<&str>) -> ExamGenerator {
    ExamGenerator::new(key.map(str::to_string), Prompts::default(), backend)
  }

  #[tokio::test]
  async fn missing_key_fails_without_calling_backend() {
    let backend = FakeBackend::replying(Ok(Some(payload().to_string())));
    let gen = generator(backend.clone(), None);
    let err = gen.generate(&config()).await.unwrap_err();
    assert!(matches!(err, GenerationError::Configuration));
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn well_formed_payload_round_trips_exactly() {
    let backend = FakeBackend::replying(Ok(Some(payload().to_string())));
    let gen = generator(backend.clone(), Some("k"));
    let exam = gen.generate(&config()).await.expect("exam");

    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    assert_eq!(exam.multiple_choice.len(), 2);
    assert_eq!(exam.essays.len(), 1);
    assert_eq!(exam.multiple_choice[1].options.len(), 5);
    assert_eq!(exam.essays[0].difficulty, Difficulty::Hard);
    // no fields dropped or added on the way back out
    assert_eq!(serde_json::to_value(&exam).unwrap(), payload());
  }

  #[tokio::test]
  async fn empty_payloads_are_empty_response() {
    for reply in [None, Some(String::new()), Some("  \n".to_string())] {
      let gen = generator(FakeBackend::replying(Ok(reply)), Some("k"));
      let err = gen.generate(&config()).await.unwrap_err();
      assert!(matches!(err, GenerationError::EmptyResponse), "got {err:?}");
    }
  }

  #[tokio::test]
  async fn invalid_json_and_wrong_shape_are_malformed() {
    let gen = generator(FakeBackend::replying(Ok(Some("{\"title\": ".into()))), Some("k"));
    assert!(matches!(gen.generate(&config()).await, Err(GenerationError::MalformedResponse(_))));

    let mut missing = payload();
    missing["essays"][0].as_object_mut().unwrap().remove("rubric");
    let gen = generator(FakeBackend::replying(Ok(Some(missing.to_string()))), Some("k"));
    assert!(matches!(gen.generate(&config()).await, Err(GenerationError::MalformedResponse(_))));

    let mut short = payload();
    short["multipleChoice"][0]["options"] = json!(["a", "b"]);
    let gen = generator(FakeBackend::replying(Ok(Some(short.to_string()))), Some("k"));
    assert!(matches!(gen.generate(&config()).await, Err(GenerationError::MalformedResponse(_))));
  }

  #[tokio::test]
  async fn service_errors_pass_through() {
    let gen = generator(FakeBackend::replying(Err(GenerationError::Service("429".into()))), Some("k"));
    let err = gen.generate(&config()).await.unwrap_err();
    assert!(matches!(err, GenerationError::Service(_)));
    assert!(err.user_message().contains("kuota API"));
  }

  #[tokio::test]
  async fn gemini_backend_sends_schema_and_reads_parts() {
    let server = MockServer::start().await;
    let text = payload().to_string();
    let (head, tail) = text.split_at(text.len() / 2);

    Mock::given(method("POST"))
      .and(path("/models/gemini-test:generateContent"))
      .and(header("x-goog-api-key", "secret"))
      .and(body_partial_json(json!({
        "generationConfig": { "temperature": 0.7, "responseMimeType": "application/json" },
        "systemInstruction": { "parts": [{ "text": Prompts::default().system_instruction }] }
      })))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{ "content": { "role": "model", "parts": [{ "text": head }, { "text": tail }] } }],
        "usageMetadata": { "promptTokenCount": 10, "candidatesTokenCount": 20, "totalTokenCount": 30 }
      })))
      .expect(1)
      .mount(&server)
      .await;

    let backend = GeminiBackend::new(&server.uri(), "gemini-test").expect("backend");
    let gen = ExamGenerator::new(Some("secret".into()), Prompts::default(), Arc::new(backend));
    let exam = gen.generate(&config()).await.expect("exam");
    assert_eq!(exam.title, "PAS Matematika: SPLDV");
  }

  #[tokio::test]
  async fn gemini_backend_maps_status_to_service_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(429).set_body_json(json!({
        "error": { "code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED" }
      })))
      .mount(&server)
      .await;

    let backend = GeminiBackend::new(&server.uri(), "gemini-test").expect("backend");
    let req = build_request(&config(), &Prompts::default());
    let err = backend.generate_content("k", &req).await.unwrap_err();
    match err {
      GenerationError::Service(msg) => assert!(msg.contains("Resource has been exhausted"), "{msg}"),
      other => panic!("unexpected {other:?}"),
    }
  }

  #[tokio::test]
  async fn gemini_backend_without_candidates_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
      .mount(&server)
      .await;

    let backend = GeminiBackend::new(&server.uri(), "gemini-test").expect("backend");
    let req = build_request(&config(), &Prompts::default());
    assert_eq!(backend.generate_content("k", &req).await.unwrap(), None);
  }
}
