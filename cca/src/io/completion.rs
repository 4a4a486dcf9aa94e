//! Completion abstraction over a remote text-generation service.
//!
//! The [`Completion`] trait decouples the pipeline from the Ollama HTTP API.
//! Tests use scripted completions that return queued answers without any
//! network traffic.

use std::cell::Cell;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span, warn};

/// Errors from the completion service.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Single prompt in, single completion out.
pub trait Completion {
    fn generate(&self, prompt: &str) -> Result<String, CompletionError>;
}

impl<C: Completion + ?Sized> Completion for &C {
    fn generate(&self, prompt: &str) -> Result<String, CompletionError> {
        (**self).generate(prompt)
    }
}

impl<C: Completion + ?Sized> Completion for Box<C> {
    fn generate(&self, prompt: &str) -> Result<String, CompletionError> {
        (**self).generate(prompt)
    }
}

/// How completion calls are executed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Call the client directly.
    #[default]
    Direct,
    /// Run every call as a traced link of a chain.
    Chain,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Chain => "chain",
        }
    }

    /// Wrap `client` according to the strategy.
    pub fn wrap<C: Completion + 'static>(self, client: C) -> Box<dyn Completion> {
        match self {
            Self::Direct => Box::new(client),
            Self::Chain => Box::new(ChainedCompletion::new(client)),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "chain" => Ok(Self::Chain),
            other => Err(format!("unknown strategy '{other}' (expected direct or chain)")),
        }
    }
}

/// Request body for `POST /api/generate`.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

/// Non-streaming response from `POST /api/generate`.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Blocking client for an Ollama server.
///
/// No request timeout and no retries: a call blocks until the server answers
/// or the connection fails.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: Client,
    model: String,
    base_url: String,
    temperature: f32,
}

impl OllamaClient {
    pub fn new(
        model: impl Into<String>,
        host: &str,
        temperature: f32,
    ) -> Result<Self, CompletionError> {
        let http = Client::builder().timeout(None::<Duration>).build()?;
        Ok(Self {
            http,
            model: model.into(),
            base_url: host.trim_end_matches('/').to_string(),
            temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
            },
        }
    }
}

impl Completion for OllamaClient {
    fn generate(&self, prompt: &str) -> Result<String, CompletionError> {
        let url = self.endpoint();
        debug!(url = %url, model = %self.model, prompt_bytes = prompt.len(), "ollama generate");

        let response = self.http.post(&url).json(&self.request_body(prompt)).send()?;
        let status = response.status().as_u16();
        let body = response.text()?;

        if status >= 400 {
            let message = serde_json::from_str::<GenerateResponse>(&body)
                .ok()
                .and_then(|parsed| parsed.error)
                .unwrap_or(body);
            warn!(status, "ollama returned an error status");
            return Err(CompletionError::Api { status, message });
        }

        parse_generate_response(status, &body)
    }
}

fn parse_generate_response(status: u16, body: &str) -> Result<String, CompletionError> {
    let parsed: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| CompletionError::InvalidResponse(format!("failed to parse response: {e}")))?;
    if let Some(message) = parsed.error {
        return Err(CompletionError::Api { status, message });
    }
    parsed
        .response
        .ok_or_else(|| CompletionError::InvalidResponse("missing 'response' field".to_string()))
}

/// Runs each call as one link of a chain, tracing the link.
///
/// The wrapped client's answer and errors pass through untouched.
#[derive(Debug)]
pub struct ChainedCompletion<C> {
    inner: C,
    links: Cell<u32>,
}

impl<C> ChainedCompletion<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            links: Cell::new(0),
        }
    }

    /// Number of links run so far.
    pub fn links(&self) -> u32 {
        self.links.get()
    }
}

impl<C: Completion> Completion for ChainedCompletion<C> {
    fn generate(&self, prompt: &str) -> Result<String, CompletionError> {
        let link = self.links.get() + 1;
        self.links.set(link);
        let span = info_span!("chain_link", link);
        let _guard = span.enter();

        let started = Instant::now();
        let result = self.inner.generate(prompt);
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(text) => debug!(
                prompt_bytes = prompt.len(),
                response_bytes = text.len(),
                elapsed_ms,
                "link completed"
            ),
            Err(err) => debug!(elapsed_ms, error = %err, "link failed"),
        }
        result
    }
}
