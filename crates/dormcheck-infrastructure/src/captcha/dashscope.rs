use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::config::TimeoutConfig;
use dormcheck_domain::platform::{CaptchaSolver, PlatformError};

const SYSTEM_PROMPT: &str = "你被使用api调用，作用是验证码识别.";
const USER_PROMPT: &str = "4位长度字符类型验证码图像识别，只输出识别结果";

/// DashScope (OpenAI-compatible) vision model settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashScopeConfig {
    pub endpoint: String,
    pub model: String,
    /// Filled from the environment, never written back to disk
    #[serde(skip_serializing)]
    pub api_key: String,
}

impl Default for DashScopeConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://dashscope.aliyuncs.com/compatible-mode/v1/chat/completions"
                .to_string(),
            model: "qwen-vl-ocr-latest".to_string(),
            api_key: String::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Captcha OCR through a vision chat-completion model
pub struct DashScopeCaptchaSolver {
    client: Client,
    config: DashScopeConfig,
}

impl DashScopeCaptchaSolver {
    pub fn new(config: DashScopeConfig, timeouts: &TimeoutConfig) -> Result<Self, PlatformError> {
        if config.api_key.trim().is_empty() {
            return Err(PlatformError::CaptchaUnreadable(
                "DashScope API key is not set".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(timeouts.captcha_request)
            .connect_timeout(timeouts.connect_for(timeouts.captcha_request))
            .build()
            .map_err(|e| PlatformError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn build_request(&self, image_data_uri: &str) -> serde_json::Value {
        json!({
            "model": self.config.model,
            "messages": [
                {
                    "role": "system",
                    "content": [{ "type": "text", "text": SYSTEM_PROMPT }]
                },
                {
                    "role": "user",
                    "content": [
                        { "type": "image_url", "image_url": { "url": image_data_uri } },
                        { "type": "text", "text": USER_PROMPT }
                    ]
                }
            ]
        })
    }
}

/// First choice's content, trimmed. Empty means nothing was recognized.
fn parse_guess(body: &str) -> Result<String, PlatformError> {
    let response: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| PlatformError::Protocol(format!("captcha response is not JSON: {e}")))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|guess| !guess.is_empty())
        .ok_or_else(|| PlatformError::CaptchaUnreadable("model returned no text".to_string()))
}

#[async_trait]
impl CaptchaSolver for DashScopeCaptchaSolver {
    async fn recognize(&self, image_data_uri: &str) -> Result<String, PlatformError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.config.api_key))
            .json(&self.build_request(image_data_uri))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PlatformError::Transport("Captcha recognition timed out".to_string())
                } else {
                    PlatformError::Transport(format!("Captcha recognition: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PlatformError::Transport(format!("Captcha recognition: {e}")))?;

        if !status.is_success() {
            return Err(PlatformError::Transport(format!(
                "Captcha recognition returned HTTP {status}: {body}"
            )));
        }

        let guess = parse_guess(&body)?;
        debug!("Captcha recognized as {}", guess);
        Ok(guess)
    }
}
