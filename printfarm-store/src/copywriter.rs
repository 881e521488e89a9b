//! Client for the kie.ai chat-completions API that drafts listing titles and
//! descriptions.

use printfarm_catalog::{Marketplace, ProductDetails, Settings};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::app_config::CopywriterConfig;

const SYSTEM_PROMPT: &str = "You are an expert at writing marketplace listings that sell. \
    Produce SEO-optimised copy that attracts buyers.";
const TEMPERATURE: f64 = 0.7;
const TITLE_MAX_TOKENS: u32 = 100;
const DESCRIPTION_MAX_TOKENS: u32 = 1000;
/// Images attached in detailed mode.
const MAX_IMAGES: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum CopywriterError {
    #[error("AI API key is not configured; add it in settings")]
    MissingApiKey,

    #[error("AI API error: {0}")]
    Api(String),

    #[error("AI API request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentKind {
    WbTitle,
    WbDescription,
    OzonTitle,
    OzonDescription,
}

impl ContentKind {
    pub fn marketplace(self) -> Marketplace {
        match self {
            ContentKind::WbTitle | ContentKind::WbDescription => Marketplace::Wildberries,
            ContentKind::OzonTitle | ContentKind::OzonDescription => Marketplace::Ozon,
        }
    }

    pub fn is_title(self) -> bool {
        matches!(self, ContentKind::WbTitle | ContentKind::OzonTitle)
    }

    fn template(self, settings: &Settings) -> &str {
        match self {
            ContentKind::WbTitle => &settings.wb_title_prompt,
            ContentKind::WbDescription => &settings.wb_description_prompt,
            ContentKind::OzonTitle => &settings.ozon_title_prompt,
            ContentKind::OzonDescription => &settings.ozon_description_prompt,
        }
    }

    fn max_tokens(self) -> u32 {
        if self.is_title() {
            TITLE_MAX_TOKENS
        } else {
            DESCRIPTION_MAX_TOKENS
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    #[default]
    Fast,
    /// Adds the image-analysis prompt and attaches product photos.
    Detailed,
}

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f64,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

/// Fills the first occurrence of each placeholder.
pub fn render_prompt(template: &str, product: &ProductDetails) -> String {
    template
        .replacen("{name}", &product.name, 1)
        .replacen("{description}", &product.description, 1)
        .replacen("{specifications}", &product.specifications, 1)
}

#[derive(Clone)]
pub struct Copywriter {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl Copywriter {
    pub fn new(config: &CopywriterConfig) -> Result<Self, CopywriterError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    pub fn build_request(
        &self,
        product: &ProductDetails,
        kind: ContentKind,
        mode: GenerationMode,
        settings: &Settings,
    ) -> ChatRequest {
        let mut prompt = render_prompt(kind.template(settings), product);
        if mode == GenerationMode::Detailed {
            prompt = format!("{}\n\n{}", settings.detailed_generation_prompt, prompt);
        }

        let content = if mode == GenerationMode::Detailed && !product.images.is_empty() {
            let mut parts = vec![ContentPart::Text { text: prompt }];
            parts.extend(product.images.iter().take(MAX_IMAGES).map(|url| {
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url: url.clone() },
                }
            }));
            MessageContent::Parts(parts)
        } else {
            MessageContent::Text(prompt)
        };

        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: MessageContent::Text(SYSTEM_PROMPT.to_string()),
                },
                ChatMessage {
                    role: "user",
                    content,
                },
            ],
            max_tokens: kind.max_tokens(),
            temperature: TEMPERATURE,
        }
    }

    pub async fn generate(
        &self,
        product: &ProductDetails,
        kind: ContentKind,
        mode: GenerationMode,
        settings: &Settings,
    ) -> Result<String, CopywriterError> {
        if settings.kie_api_key.is_empty() {
            return Err(CopywriterError::MissingApiKey);
        }

        let request = self.build_request(product, kind, mode, settings);
        debug!(
            "Requesting {:?} ({:?}) for {} on {}",
            kind,
            mode,
            product.name,
            kind.marketplace()
        );

        let response = self
            .client
            .post(self.url("chat/completions"))
            .bearer_auth(settings.kie_api_key.expose())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .json::<ErrorResponse>()
                .await
                .ok()
                .and_then(|body| body.error)
                .and_then(|detail| detail.message)
                .unwrap_or_else(|| format!("upstream returned {}", status));
            warn!("Copywriter request failed: {}", message);
            return Err(CopywriterError::Api(message));
        }

        let body: ChatResponse = response.json().await?;
        Ok(body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .unwrap_or_default())
    }

    /// True when the provider accepts the key. Network failures count as invalid.
    pub async fn validate_key(&self, api_key: &str) -> bool {
        if api_key.trim().is_empty() {
            return false;
        }
        match self
            .client
            .get(self.url("models"))
            .bearer_auth(api_key)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!("API key check failed: {}", e);
                false
            }
        }
    }
}
