//! OpenAI-compatible chat endpoint as a pairwise comparator.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use duelrank_core::{Comparator, Winner};
use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{AcquireError, Semaphore};
use tracing::{debug, warn};

use crate::parse::{parse_verdict, LogprobContent};
use crate::prompt::build_prompt;

/// Delay before retrying a failed HTTP request.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Configuration for the LLM endpoint.
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f64,
}

/// What the judge is asked and how.
pub struct JudgeSettings {
    pub criterion: String,
    pub template: String,
    pub analysis_length: String,
    pub max_retries: usize,
    pub concurrency: usize,
}

#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("LLM API returned {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("no choices in LLM response")]
    NoChoices,
    #[error("no verdict found in response: {0:?}")]
    Unparseable(String),
    #[error("judge called a draw")]
    Draw,
    #[error("request limiter closed")]
    LimiterClosed(#[from] AcquireError),
}

impl JudgeError {
    /// Transport and server errors are worth waiting out; bad verdicts are re-asked at once.
    fn is_transient(&self) -> bool {
        matches!(self, JudgeError::Http(_) | JudgeError::Api { .. })
    }
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
    logprobs: bool,
    top_logprobs: u8,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageContent,
    logprobs: Option<ChoiceLogprobs>,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceLogprobs {
    content: Option<Vec<LogprobContent>>,
}

/// Apply normal jitter to temperature: N(1.0, 0.1) clamped to [0.8, 1.2].
/// Box-Muller over two uniform samples.
fn jittered_temperature(base: f64) -> f64 {
    let mut rng = rand::rng();
    let u1: f64 = rng.random::<f64>().max(f64::MIN_POSITIVE);
    let u2: f64 = rng.random();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    base * (1.0 + 0.1 * z).clamp(0.8, 1.2)
}

fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Asks an LLM which of two items better meets a criterion.
///
/// Requests beyond `concurrency` wait for a permit. Failed HTTP requests are
/// retried after a one-second pause; unparseable or drawn verdicts are
/// re-sampled immediately. Both share the `max_retries` budget.
pub struct LlmComparator {
    client: Client,
    config: LlmConfig,
    settings: JudgeSettings,
    permits: Semaphore,
    retries: AtomicUsize,
}

impl LlmComparator {
    pub fn new(client: Client, config: LlmConfig, settings: JudgeSettings) -> Self {
        let permits = Semaphore::new(settings.concurrency.max(1));
        LlmComparator {
            client,
            config,
            settings,
            permits,
            retries: AtomicUsize::new(0),
        }
    }

    /// Retries spent across all comparisons so far.
    pub fn retries_used(&self) -> usize {
        self.retries.load(Ordering::Relaxed)
    }

    /// Send one request and read a winner from the reply.
    async fn ask(&self, prompt: &str) -> Result<Winner, JudgeError> {
        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt.to_string(),
            }],
            temperature: jittered_temperature(self.config.temperature),
            max_tokens: 4000,
            logprobs: true,
            top_logprobs: 10,
        };

        let url = format!("{}/v1/chat/completions", self.config.endpoint.trim_end_matches('/'));
        let mut req_builder = self.client.post(&url).json(&request);
        if let Some(ref key) = self.config.api_key {
            req_builder = req_builder.bearer_auth(key);
        }

        let resp = req_builder.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(JudgeError::Api {
                status,
                body: excerpt(&body, 200),
            });
        }

        let data: ChatCompletionResponse = resp.json().await?;
        let choice = data.choices.into_iter().next().ok_or(JudgeError::NoChoices)?;
        let content = choice.message.content.unwrap_or_default();
        let logprobs = choice.logprobs.and_then(|lp| lp.content).unwrap_or_default();

        let verdict = parse_verdict(&content, &logprobs)
            .ok_or_else(|| JudgeError::Unparseable(excerpt(content.trim_end(), 120)))?;
        debug!(preference = verdict.first_preference, "verdict");
        verdict.winner().ok_or(JudgeError::Draw)
    }
}

#[async_trait]
impl Comparator<String> for LlmComparator {
    type Error = JudgeError;

    async fn compare(&self, first: &String, second: &String) -> Result<Winner, JudgeError> {
        let prompt = build_prompt(
            &self.settings.template,
            &self.settings.criterion,
            first,
            second,
            &self.settings.analysis_length,
        );

        let _permit = self.permits.acquire().await?;
        let max_retries = self.settings.max_retries;
        let mut attempt = 0;
        loop {
            match self.ask(&prompt).await {
                Ok(winner) => {
                    debug!(%first, %second, ?winner, attempt, "compared");
                    return Ok(winner);
                }
                Err(e) if attempt < max_retries => {
                    attempt += 1;
                    self.retries.fetch_add(1, Ordering::Relaxed);
                    warn!(%first, %second, error = %e, "retry {attempt}/{max_retries}");
                    if e.is_transient() {
                        tokio::time::sleep(RETRY_DELAY).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}
