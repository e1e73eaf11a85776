/// Analysis provider backed by the Gemini `generateContent` REST API
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::analysis::{Analysis, MAX_SOURCES, Source};
use crate::config::ProviderConfig;
use crate::error::AnalysisError;

/// Turns a query into a structured analysis
#[async_trait(?Send)]
pub trait AnalysisProvider {
    async fn analyze(&self, query: &str) -> Result<Analysis, AnalysisError>;
}

const SYSTEM_INSTRUCTION: &str = r#"# ROLE: utubext Arbitrage Finder (UK Market)

## 1. OPPORTUNITY METRICS
Find "SWEET SPOTS": topics with trendScore >= 70 and competitionLevel = "Düşük".
- trendScore: search velocity and social mentions in the UK, 0-100.
- competitionLevel: how many large UK creators (1M+ subscribers) covered the topic in the last 30 days.

## 2. OUTPUT SCHEMA (JSON)
Return ONLY valid JSON:
{
  "title": "CTR optimized UK title",
  "summary": "Why this is an arbitrage opportunity or why it is high risk",
  "trendScore": 0-100,
  "competitionLevel": "Düşük" | "Orta" | "Yüksek",
  "topKeywords": ["UK specific keyword"],
  "viralHooks": ["Psychological hook"],
  "suggestedTitles": ["Title 1", "Title 2", "Title 3"],
  "fullScriptPrompt": "Step-by-step retention optimized script prompt"
}"#;

fn research_prompt(query: &str) -> String {
    format!(
        "Search for: \"{}\".\n\
         Specific focus: identify whether this topic has high search demand but low high-quality video supply on YouTube UK.\n\
         Extract: weekly trend momentum, keyword difficulty for new channels, and specific UK income gaps.",
        query
    )
}

fn analysis_prompt(query: &str, research: &str) -> String {
    format!("Apply arbitrage logic to: \"{}\". Search data: {}", query, research)
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// Search-grounded free text request
    fn grounded(prompt: String) -> Self {
        GenerateContentRequest {
            contents: vec![Content::user(prompt)],
            tools: Some(vec![Tool {
                google_search: GoogleSearch {},
            }]),
            system_instruction: None,
            generation_config: None,
        }
    }

    /// JSON-mode request steered by the schema instruction
    fn json(prompt: String) -> Self {
        GenerateContentRequest {
            contents: vec![Content::user(prompt)],
            tools: None,
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part::text(SYSTEM_INSTRUCTION)],
            }),
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
            }),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn user(text: String) -> Self {
        Content {
            role: Some("user".to_string()),
            parts: vec![Part { text: Some(text) }],
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

impl Part {
    fn text(text: &str) -> Self {
        Part {
            text: Some(text.to_string()),
        }
    }
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Serialize, Debug, Clone)]
struct GoogleSearch {}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Deserialize, Debug, Clone, Default)]
struct GroundingChunk {
    web: Option<WebChunk>,
}

#[derive(Deserialize, Debug, Clone, Default)]
struct WebChunk {
    title: Option<String>,
    uri: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts.iter().filter_map(|p| p.text.as_deref()).collect();

        if text.trim().is_empty() { None } else { Some(text) }
    }

    /// Web grounding citations of the first candidate, capped
    fn sources(&self) -> Vec<Source> {
        let Some(metadata) = self.candidates.first().and_then(|c| c.grounding_metadata.as_ref()) else {
            return Vec::new();
        };

        metadata
            .grounding_chunks
            .iter()
            .filter_map(|chunk| chunk.web.as_ref())
            .filter_map(|web| {
                let uri = web.uri.clone()?;
                let title = web
                    .title
                    .clone()
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| "Source".to_string());
                Some(Source { title, uri })
            })
            .take(MAX_SOURCES)
            .collect()
    }
}

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\s*```[A-Za-z]*\s*(.*?)\s*```\s*$").expect("valid fence pattern"));

/// Drop a Markdown code fence wrapped around a JSON answer
fn strip_code_fences(text: &str) -> &str {
    match CODE_FENCE.captures(text).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => text.trim(),
    }
}

/// Gemini client performing the two-phase (research, then JSON) analysis
pub struct GeminiProvider {
    client: Client,
    config: ProviderConfig,
}

impl GeminiProvider {
    pub fn new(config: ProviderConfig) -> Self {
        GeminiProvider {
            client: Client::new(),
            config,
        }
    }

    fn endpoint(&self, api_key: &str) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.config.base_url.trim_end_matches('/'),
            self.config.model,
            api_key
        )
    }

    async fn generate(&self, request: &GenerateContentRequest) -> Result<GenerateContentResponse, AnalysisError> {
        let api_key = self.config.api_key.as_deref().ok_or(AnalysisError::MissingApiKey)?;

        let response = self.client.post(self.endpoint(api_key)).json(request).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(AnalysisError::Status(status.as_u16(), response.text().await.unwrap_or_default()));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| AnalysisError::Unparsable(e.to_string()))
    }
}

#[async_trait(?Send)]
impl AnalysisProvider for GeminiProvider {
    async fn analyze(&self, query: &str) -> Result<Analysis, AnalysisError> {
        let research = self.generate(&GenerateContentRequest::grounded(research_prompt(query))).await?;
        let sources = research.sources();
        let research_text = research.text().unwrap_or_default();
        log::info!("utubext: research phase returned {} sources", sources.len());

        let answer = self
            .generate(&GenerateContentRequest::json(analysis_prompt(query, &research_text)))
            .await?;
        let text = answer.text().ok_or(AnalysisError::EmptyResponse)?;

        Analysis::from_provider_json(strip_code_fences(&text), sources)
    }
}
