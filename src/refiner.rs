//! Rewrites conversational search input into provider-friendly keywords.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::RefinerConfig;
use crate::error::{Error, Result};

pub const REFINE_INSTRUCTION: &str = "You are an expert at refining search queries for a news API. \
Analyze the user's raw query and extract only the essential keywords. The output should be a \
concise string of keywords that will yield the best search results. Remove any conversational \
language, filler words, or unnecessary prepositions. Respond with a JSON object of the form \
{\"refinedQuery\": \"<keywords>\"} and nothing else.";

/// Few-shot anchors appended to every prompt.
pub const EXAMPLES: [(&str, &str); 3] = [
    (
        "show me the latest news about the stock market in japan",
        "stock market japan",
    ),
    (
        "what is happening with the election in south africa",
        "election south africa",
    ),
    (
        "latest news about tinibu in the president of nigeria 2025",
        "Tinubu president nigeria 2025",
    ),
];

/// A generative text service: one instruction, one prompt, one completion.
#[async_trait]
pub trait TextModel: Send + Sync {
    async fn generate(&self, instruction: &str, prompt: &str) -> Result<String>;

    fn name(&self) -> &str;
}

pub type SharedModel = Arc<dyn TextModel>;

/// Chat Completions client for OpenAI and compatible endpoints.
pub struct OpenAiChatModel {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiChatModel {
    pub fn new(config: &RefinerConfig, api_key: String) -> Result<Self> {
        let http = Client::builder()
            .user_agent("NewsHub/1.0 (Query Refiner)")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::ModelInvocation(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
        })
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl TextModel for OpenAiChatModel {
    async fn generate(&self, instruction: &str, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: instruction,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.0,
            max_tokens: 60,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::ModelInvocation(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ModelInvocation(format!("API error {}: {}", status, body)));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::ModelInvocation(format!("undecodable completion: {}", e)))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::ModelInvocation("completion had no content".to_string()))
    }

    fn name(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefinedOutput {
    refined_query: String,
}

pub struct QueryRefiner {
    model: SharedModel,
}

impl QueryRefiner {
    pub fn new(model: SharedModel) -> Self {
        Self { model }
    }

    /// Build a refiner from config, or `None` when refinement is switched
    /// off or no credential is available.
    pub fn from_config(config: &RefinerConfig) -> Result<Option<Self>> {
        if !config.enabled {
            return Ok(None);
        }
        match config.api_key() {
            Some(key) => {
                let model = OpenAiChatModel::new(config, key)?;
                Ok(Some(Self::new(Arc::new(model))))
            }
            None => Ok(None),
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Compress `query` into search keywords. Each call goes to the model;
    /// results are not cached and may differ between calls.
    pub async fn refine(&self, query: &str) -> Result<String> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::EmptyQuery);
        }

        let completion = self
            .model
            .generate(REFINE_INSTRUCTION, &build_prompt(query))
            .await?;
        let refined = parse_refined(&completion)?;

        info!("Refined search query '{}' -> '{}'", query, refined);
        Ok(refined)
    }
}

pub fn build_prompt(query: &str) -> String {
    let mut prompt = format!("User Query: {}\n", query);
    for (i, (raw, refined)) in EXAMPLES.iter().enumerate() {
        prompt.push_str(&format!(
            "\nExample {}:\nUser Query: \"{}\"\nRefined Query: \"{}\"\n",
            i + 1,
            raw,
            refined
        ));
    }
    prompt
}

/// Extract `refinedQuery` from a completion, tolerating a Markdown code fence.
fn parse_refined(completion: &str) -> Result<String> {
    let trimmed = completion.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    let output: RefinedOutput = serde_json::from_str(body).map_err(|e| {
        debug!("Unparseable completion: {}", completion);
        Error::ModelInvocation(format!("unparseable completion: {}", e))
    })?;

    let refined = output.refined_query.trim().trim_matches('"').trim();
    if refined.is_empty() {
        return Err(Error::ModelInvocation("model returned an empty query".to_string()));
    }
    Ok(refined.to_string())
}
