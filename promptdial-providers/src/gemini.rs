use crate::request::{Body, HttpRequest};
use promptdial_core::rails::GenerationRails;
use serde_json::json;

/// Fixed output ceiling for the cloud fallback path.
pub const MAX_OUTPUT_TOKENS: u32 = 512;

// Ranges the generateContent endpoint accepts; rails values are capped
// to these before they go on the wire.
const TEMPERATURE_RANGE: (f64, f64) = (0.0, 1.0);
const TOP_K_RANGE: (u32, u32) = (1, 64);

#[derive(Clone, PartialEq, Eq)]
pub struct GeminiGenerateConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl std::fmt::Debug for GeminiGenerateConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiGenerateConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

/// Builds the `generateContent` POST for the cloud fallback.
///
/// The system instruction and user input travel as one user-role part,
/// joined with an explicit role delimiter, matching what the on-device
/// session sees split across system prompt and prompt call.
pub fn build_generate_content_request(
    cfg: &GeminiGenerateConfig,
    system_instruction: &str,
    user_input: &str,
    rails: &GenerationRails,
) -> HttpRequest {
    let url = join_url(&cfg.base_url, &format!("models/{}:generateContent", cfg.model));

    let prompt = format!("{system_instruction}\n\nUser: {user_input}");
    let payload = json!({
        "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "temperature": rails.temperature.clamp(TEMPERATURE_RANGE.0, TEMPERATURE_RANGE.1),
            "topK": rails.top_k.clamp(TOP_K_RANGE.0, TOP_K_RANGE.1),
            "maxOutputTokens": MAX_OUTPUT_TOKENS,
        }
    });

    HttpRequest {
        method: "POST".into(),
        url,
        headers: vec![
            ("Content-Type".into(), "application/json".into()),
            ("x-goog-api-key".into(), cfg.api_key.clone()),
        ],
        body: Body::Json(payload.to_string()),
    }
}

fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{}/{}", base, path)
}
