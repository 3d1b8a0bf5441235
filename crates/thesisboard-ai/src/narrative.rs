//! Narrative generation: state + context in, validated opinion document out.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thesisboard_core::{Headline, OpinionDocument, OpinionError, StateBlob};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum NarrativeError {
    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("response had no text content")]
    EmptyResponse,
    #[error("state serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    /// The model answered, but not with a valid opinion document. `raw` is
    /// kept so the caller can write it to a debug file.
    #[error("response violates the opinion schema: {source}")]
    Contract {
        raw: String,
        #[source]
        source: OpinionError,
    },
}

// Request URLs carry credentials (query keys, bot tokens). Strip them
// before the error is displayed or stored.
impl From<reqwest::Error> for NarrativeError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.without_url())
    }
}

// ── Prompt ──

pub const SYSTEM_PROMPT: &str = "\
You are an investment-thesis analyst maintaining a personal dashboard.

You receive the dashboard's current state document (live market data, derived metrics, \
the operator's manual figures, and the current editorial scorecard), a context document \
describing the thesis, and recent headlines. Assess whether the thesis is on track.

Respond ONLY with a JSON object. No markdown fences, no explanation, just raw JSON:
{
  \"overall_status\": \"confirmed\" | \"on_track\" | \"pending\" | \"at_risk\" | \"failed\",
  \"thesis_score\": number 0-100,
  \"probabilities\": {\"bull\": n, \"base\": n, \"bear\": n, \"tail\": n} (percent, summing to 100),
  \"scorecard\": [
    {\"category\": \"scorecard category name\", \"previous_status\": status, \
\"recommended_status\": status, \"reasoning\": \"one or two sentences\"}
  ],
  \"narrative\": {\"summary\": \"...\", \"market_context\": \"...\", \"outlook\": \"...\"},
  \"timeline_events\": [
    {\"date\": \"YYYY-MM-DD\", \"category\": \"...\", \"severity\": \"low\" | \"medium\" | \"high\", \
\"title\": \"short headline\", \"expanded\": \"two or three sentences\"}
  ]
}

Only propose scorecard changes you can justify from the data. Only add timeline events for \
material developments in the headlines; an empty array is fine.";

/// Longest context document included verbatim in the prompt.
const MAX_CONTEXT_CHARS: usize = 20_000;

pub fn build_user_prompt(
    state: &StateBlob,
    context: &str,
    headlines: &[Headline],
) -> Result<String, NarrativeError> {
    let state_json = serde_json::to_string_pretty(state)?;
    let context: String = context.chars().take(MAX_CONTEXT_CHARS).collect();
    let headline_lines = if headlines.is_empty() {
        "(none)".to_string()
    } else {
        headlines
            .iter()
            .map(|h| match (&h.published_at, &h.source) {
                (Some(at), Some(src)) => format!("- [{at}] {} ({src})", h.title),
                (Some(at), None) => format!("- [{at}] {}", h.title),
                _ => format!("- {}", h.title),
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    Ok(format!(
        "Current state document:\n\
         {state_json}\n\
         \n\
         Thesis context:\n\
         {context}\n\
         \n\
         Recent headlines:\n\
         {headline_lines}"
    ))
}

// ── Generator ──

/// A text-generation service. Implemented over HTTP by [`MessagesClient`];
/// tests substitute canned responses.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, system: &str, user: &str) -> Result<String, NarrativeError>;
}

#[derive(Debug, Clone)]
pub struct NarrativeConfig {
    /// Base URL, e.g. `https://api.anthropic.com` (no trailing slash needed).
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

/// Client for an Anthropic-style `/v1/messages` endpoint.
pub struct MessagesClient {
    client: reqwest::Client,
    config: NarrativeConfig,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

impl MessagesClient {
    pub fn new(mut config: NarrativeConfig) -> Result<Self, NarrativeError> {
        config.api_url = config.api_url.trim_end_matches('/').to_string();
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl TextGenerator for MessagesClient {
    async fn generate(&self, system: &str, user: &str) -> Result<String, NarrativeError> {
        let url = format!("{}/v1/messages", self.config.api_url);
        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            system,
            messages: [Message {
                role: "user",
                content: user,
            }],
        };

        info!(model = %self.config.model, prompt_chars = user.len(), "requesting narrative");
        let resp = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NarrativeError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: MessagesResponse = resp.json().await?;
        join_text(parsed)
    }
}

fn join_text(resp: MessagesResponse) -> Result<String, NarrativeError> {
    let text: String = resp
        .content
        .into_iter()
        .filter(|b| b.kind == "text")
        .map(|b| b.text)
        .collect();
    if text.trim().is_empty() {
        return Err(NarrativeError::EmptyResponse);
    }
    Ok(text)
}

/// Ask the generator for an opinion on `state` and validate the answer.
pub async fn generate_opinion(
    generator: &dyn TextGenerator,
    state: &StateBlob,
    context: &str,
) -> Result<OpinionDocument, NarrativeError> {
    let user = build_user_prompt(state, context, &state.news.value.headlines)?;
    let raw = generator.generate(SYSTEM_PROMPT, &user).await?;
    match OpinionDocument::parse_response(&raw) {
        Ok(doc) => {
            info!(
                scorecard = doc.scorecard.len(),
                events = doc.timeline_events.len(),
                "opinion parsed"
            );
            Ok(doc)
        }
        Err(source) => Err(NarrativeError::Contract { raw, source }),
    }
}
