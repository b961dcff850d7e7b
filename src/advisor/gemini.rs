use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::Advisor;
use crate::config::AdvisorConfig;

/// `generateContent` client for the Gemini API.
pub struct GeminiAdvisor {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiAdvisor {
    pub fn new(cfg: &AdvisorConfig, api_key: String) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .build()
            .context("build gemini http client")?;
        Ok(Self {
            client,
            endpoint: cfg.endpoint.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
            api_key,
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    async fn generate(&self, prompt: String) -> anyhow::Result<String> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: Some(prompt) }],
            }],
        };
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", self.api_key.as_str())
            .json(&body)
            .send()
            .await
            .context("send gemini request")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("gemini returned {status}: {}", truncate(&detail, 200));
        }

        let decoded: GenerateResponse = response.json().await.context("decode gemini response")?;
        decoded.first_text().context("gemini response had no text")
    }
}

#[async_trait]
impl Advisor for GeminiAdvisor {
    async fn impact_insight(&self, meals: i64, kg_saved: f64) -> anyhow::Result<String> {
        self.generate(impact_prompt(meals, kg_saved)).await
    }

    async fn collection_priority(&self, digest: &str) -> anyhow::Result<String> {
        self.generate(priority_prompt(digest)).await
    }
}

fn impact_prompt(meals: i64, kg_saved: f64) -> String {
    format!(
        "Generate a short, inspiring impact summary for a food donation platform. \
         Data: {meals} meals served, reducing food waste by approximately {kg_saved} kg. \
         Tone: encouraging, professional and community-focused. Keep it under 60 words."
    )
}

fn priority_prompt(digest: &str) -> String {
    format!(
        "Act as a logistics advisor for an NGO. Given these food availability posts: {digest}. \
         Recommend which batch should be collected first based on expiry and quantity. \
         Respond in a concise, bullet-pointed list."
    )
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .map(|t| t.trim().to_string())
            .find(|t| !t.is_empty())
    }
}
