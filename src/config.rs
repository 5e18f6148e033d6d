//! Runtime configuration: prompt overrides from TOML plus model settings from the environment.
//!
//! See `AgentConfig` and `Prompts` for the expected TOML schema:
//!
//! ```toml
//! [prompts]
//! system_instruction = "..."
//! exam_user_template = "... {kd} ... {item_counts} ..."
//! ```

use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
/// Balances variety of items against adherence to the schema.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Sessions untouched for this long are dropped when new ones are created.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(6 * 60 * 60);

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AgentConfig {
  #[serde(default)]
  pub prompts: Prompts,
}

/// Prompts sent to the model. Placeholders available in `exam_user_template`:
/// `{kd}`, `{indicators}`, `{material}`, `{class_name}`, `{cognitive_level}`,
/// `{item_counts}`, `{question_type}`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub system_instruction: String,
  pub exam_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      system_instruction: "Anda adalah pembuat soal ujian profesional untuk sekolah di Indonesia. Output harus dalam format JSON yang valid sesuai skema yang diberikan.".into(),
      exam_user_template: "Buatkan soal PAS (Penilaian Akhir Semester) lengkap berdasarkan data berikut:

1. Kompetensi Dasar (KD): {kd}
2. Indikator Soal: {indicators}
3. Materi Pokok: {material}
4. Kelas/Tingkat: {class_name} (Sesuaikan tingkat kesulitan bahasa dan logika dengan jenjang ini)
5. Level Kognitif Target: {cognitive_level}
6. Jumlah Soal: {item_counts}
7. Jenis Soal: {question_type}

Ketentuan:
- Soal harus original, relevan, dan akademik.
- Distribusi tingkat kesulitan: Variatif (Mudah, Sedang, Sulit). Minimal 20% sulit.
- Bahasa baku Indonesia.
- Pilihan ganda harus memiliki 4 atau 5 opsi.
".into(),
    }
  }
}

/// Connection settings for the Gemini API.
#[derive(Clone, Debug)]
pub struct ModelSettings {
  /// `None` means generation fails with a configuration error.
  pub api_key: Option<String>,
  pub base_url: String,
  pub model: String,
}

impl ModelSettings {
  /// Reads API_KEY (or GEMINI_API_KEY), GEMINI_BASE_URL and GEMINI_MODEL.
  pub fn from_env() -> Self {
    let api_key = ["API_KEY", "GEMINI_API_KEY"]
      .iter()
      .filter_map(|k| std::env::var(k).ok())
      .map(|v| v.trim().to_string())
      .find(|v| !v.is_empty());
    let base_url = std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
    let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
    Self { api_key, base_url, model }
  }
}

/// Reads SESSION_TTL_SECS; missing or unparsable values fall back to `DEFAULT_SESSION_TTL`.
pub fn session_ttl_from_env() -> Duration {
  match std::env::var("SESSION_TTL_SECS") {
    Ok(raw) => parse_session_ttl(&raw).unwrap_or_else(|| {
      warn!(target: "pas_generator", value = %raw, "Invalid SESSION_TTL_SECS; using default");
      DEFAULT_SESSION_TTL
    }),
    Err(_) => DEFAULT_SESSION_TTL,
  }
}

fn parse_session_ttl(raw: &str) -> Option<Duration> {
  raw.trim().parse::<u64>().ok().filter(|secs| *secs > 0).map(Duration::from_secs)
}

/// Attempt to load `AgentConfig` from AGENT_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_agent_config_from_env() -> Option<AgentConfig> {
  let path = std::env::var("AGENT_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_agent_config(&s) {
      Ok(cfg) => {
        info!(target: "pas_generator", %path, "Loaded agent config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "pas_generator", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "pas_generator", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

pub fn parse_agent_config(s: &str) -> Result<AgentConfig, toml::de::Error> {
  toml::from_str::<AgentConfig>(s)
}
