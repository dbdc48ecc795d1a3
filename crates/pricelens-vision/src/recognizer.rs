//! Vision chat-completion client with provider fallback and offline
//! simulation.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use pricelens_core::AppConfig;

use crate::error::VisionError;
use crate::types::RecognitionResult;

const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const OPENAI_VISION_MODEL: &str = "gpt-4o-mini";

const RECOGNITION_PROMPT: &str = "分析這張商品圖片，請提供以下資訊：\n\
1. 商品名稱或類型（例如：iPhone 15 Pro、Nike運動鞋、筆記型電腦等）\n\
2. 商品類別（例如：3C產品、服飾、家電等）\n\
3. 主要特徵或屬性（例如：顏色、尺寸、品牌等）\n\
4. 適合用來搜尋這個商品的關鍵字（至少3-5個）\n\
\n\
請以JSON格式回應，格式如下：\n\
{\"keywords\": [\"關鍵字1\", \"關鍵字2\", \"關鍵字3\"], \"category\": \"商品類別\", \
\"attributes\": {\"品牌\": \"品牌名稱\"}, \"description\": \"商品簡述\"}";

/// Construction-time configuration for the recognizer. Built from
/// [`AppConfig`] at the composition root; the recognizer never reads the
/// process environment itself.
#[derive(Debug, Clone, Default)]
pub struct VisionConfig {
    pub openrouter_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    /// Model id sent to OpenRouter; the direct-OpenAI path uses its own
    /// fixed vision model.
    pub model: String,
    pub request_timeout_secs: u64,
}

impl VisionConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            openrouter_api_key: config.openrouter_api_key.clone(),
            openai_api_key: config.openai_api_key.clone(),
            model: config.vision_model.clone(),
            request_timeout_secs: config.vision_request_timeout_secs,
        }
    }
}

pub struct ImageRecognizer {
    client: reqwest::Client,
    config: VisionConfig,
    openrouter_url: String,
    openai_url: String,
}

impl ImageRecognizer {
    /// Creates a recognizer against the live provider endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`VisionError::Http`] if the HTTP client cannot be built.
    pub fn new(config: VisionConfig) -> Result<Self, VisionError> {
        Self::with_endpoints(config, OPENROUTER_URL.to_owned(), OPENAI_URL.to_owned())
    }

    /// Creates a recognizer against arbitrary endpoints (mock servers in
    /// tests).
    ///
    /// # Errors
    ///
    /// Returns [`VisionError::Http`] if the HTTP client cannot be built.
    pub fn with_endpoints(
        config: VisionConfig,
        openrouter_url: String,
        openai_url: String,
    ) -> Result<Self, VisionError> {
        let timeout = if config.request_timeout_secs == 0 {
            30
        } else {
            config.request_timeout_secs
        };
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()?;
        Ok(Self {
            client,
            config,
            openrouter_url,
            openai_url,
        })
    }

    /// Recognizes the product in an image and returns ranked keywords.
    ///
    /// Provider order: OpenRouter when its key is configured, then direct
    /// OpenAI, then the offline simulation. A recognition that produces no
    /// keywords is a hard failure for the calling search — there is no
    /// fallback keyword.
    ///
    /// # Errors
    ///
    /// Returns [`VisionError::NoKeywords`] when the model answered without
    /// usable keywords, or transport/parse errors from the provider call.
    pub async fn recognize(&self, image_url: &str) -> Result<RecognitionResult, VisionError> {
        let result = if self.config.openrouter_api_key.is_some() {
            self.recognize_with_openrouter(image_url).await?
        } else if self.config.openai_api_key.is_some() {
            self.recognize_with_openai(image_url).await?
        } else {
            tracing::warn!("no vision API key configured — using simulated recognition");
            simulated_recognition()
        };

        if result.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(VisionError::NoKeywords);
        }
        Ok(result)
    }

    async fn recognize_with_openrouter(
        &self,
        image_url: &str,
    ) -> Result<RecognitionResult, VisionError> {
        let key = self
            .config
            .openrouter_api_key
            .as_deref()
            .unwrap_or_default();
        let body = json!({
            "model": self.config.model,
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": RECOGNITION_PROMPT},
                    {"type": "image_url", "image_url": {"url": image_url}}
                ]
            }]
        });
        self.call_provider(&self.openrouter_url, key, &body, "openrouter")
            .await
    }

    async fn recognize_with_openai(
        &self,
        image_url: &str,
    ) -> Result<RecognitionResult, VisionError> {
        let key = self.config.openai_api_key.as_deref().unwrap_or_default();
        let body = json!({
            "model": OPENAI_VISION_MODEL,
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": RECOGNITION_PROMPT},
                    {"type": "image_url", "image_url": {"url": image_url}}
                ]
            }]
        });
        self.call_provider(&self.openai_url, key, &body, "openai")
            .await
    }

    async fn call_provider(
        &self,
        url: &str,
        api_key: &str,
        body: &serde_json::Value,
        provider: &'static str,
    ) -> Result<RecognitionResult, VisionError> {
        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(VisionError::UnexpectedStatus {
                status: status.as_u16(),
                provider,
            });
        }

        let raw = response.text().await?;
        let completion: ChatCompletionResponse =
            serde_json::from_str(&raw).map_err(|e| VisionError::Deserialize {
                context: format!("{provider} completion envelope"),
                source: e,
            })?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|c| !c.is_empty())
            .ok_or(VisionError::MissingContent { provider })?;

        parse_recognition_content(&content, provider)
    }
}

/// Extracts the JSON object from model output, tolerating code fences and
/// prose around it.
fn parse_recognition_content(
    content: &str,
    provider: &'static str,
) -> Result<RecognitionResult, VisionError> {
    let start = content.find('{');
    let end = content.rfind('}');
    let slice = match (start, end) {
        (Some(s), Some(e)) if e > s => &content[s..=e],
        _ => content,
    };
    serde_json::from_str(slice).map_err(|e| VisionError::Deserialize {
        context: format!("{provider} recognition content"),
        source: e,
    })
}

/// Canned recognitions used when no provider key is configured. Keeps the
/// image-search flow demonstrable without credentials.
fn simulated_recognition() -> RecognitionResult {
    let canned: [(&[&str], &str, &str); 5] = [
        (
            &["手機", "智慧型手機", "電子產品", "smartphone"],
            "3C電子",
            "這是一款智慧型手機產品",
        ),
        (
            &["筆電", "筆記型電腦", "laptop", "電腦"],
            "3C電子",
            "這是一款筆記型電腦",
        ),
        (
            &["運動鞋", "球鞋", "鞋子", "sneakers"],
            "鞋類",
            "這是一雙運動鞋",
        ),
        (
            &["耳機", "藍牙耳機", "earbuds", "無線耳機"],
            "3C配件",
            "這是一款無線藍牙耳機",
        ),
        (
            &["背包", "書包", "backpack", "後背包"],
            "包袋",
            "這是一款後背包",
        ),
    ];

    let (keywords, category, description) = canned[rand::random_range(0..canned.len())];
    RecognitionResult {
        keywords: keywords.iter().map(|k| (*k).to_owned()).collect(),
        category: Some(category.to_owned()),
        attributes: BTreeMap::new(),
        confidence: Some(0.7),
        description: Some(description.to_owned()),
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}
