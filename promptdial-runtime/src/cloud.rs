use async_trait::async_trait;
use promptdial_core::rails::GenerationRails;
use promptdial_engine::traits::{CloudError, CloudTextBackend};
use promptdial_providers::gemini::{GeminiGenerateConfig, build_generate_content_request};
use promptdial_providers::parse::parse_generate_content;
use promptdial_providers::runtime;

/// Cloud fallback backend over the Gemini `generateContent` endpoint.
///
/// The API key is injected at construction and only ever travels in the
/// request header; `GeminiGenerateConfig` redacts it from Debug output.
#[derive(Debug, Clone)]
pub struct GeminiCloudBackend {
    cfg: GeminiGenerateConfig,
}

impl GeminiCloudBackend {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            cfg: GeminiGenerateConfig {
                base_url: base_url.into(),
                api_key: api_key.into(),
                model: model.into(),
            },
        }
    }
}

#[async_trait]
impl CloudTextBackend for GeminiCloudBackend {
    async fn generate(
        &self,
        system_instruction: &str,
        user_input: &str,
        rails: &GenerationRails,
    ) -> Result<String, CloudError> {
        let req = build_generate_content_request(&self.cfg, system_instruction, user_input, rails);
        let resp = runtime::execute(&req)
            .await
            .map_err(CloudError::Transport)?;

        if !resp.is_success() {
            return Err(CloudError::Status {
                status: resp.status,
                body: String::from_utf8_lossy(&resp.body).into_owned(),
            });
        }

        parse_generate_content(&resp.body).map_err(CloudError::Decode)
    }
}
