//! Gemini generative-AI client
//!
//! This module asks the Gemini API (with its web search tool enabled) for
//! current medicine prices and parses the JSON array it answers with into
//! `MedicineResult` values.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::{MedicineResult, DEFAULT_CURRENCY};

/// Base URL for the Gemini API
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Pharmacies every search must cover
const REQUIRED_STORES: &[&str] = &[
    "Condrogas",
    "Droguería Alemana",
    "Cruz Verde",
    "Farmatodo",
    "La Rebaja",
    "Farmacenter",
    "Farmacias Pasteur",
    "Farmalisto",
];

/// Pharmacies included when they carry the product
const OPTIONAL_STORES: &[&str] = &["Colsubsidio", "Multidrogas", "Botica Natural"];

/// Errors that can occur when fetching offers from the backend
#[derive(Debug, Error)]
pub enum FetchError {
    /// No API key was configured
    #[error("No API key configured (set FARMACHECK_API_KEY or GEMINI_API_KEY)")]
    MissingApiKey,

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The API answered with an error status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// The response carried no candidate text
    #[error("Response contained no text")]
    EmptyResponse,
}

/// Source of offers for a normalized query
///
/// The result cache calls this on a miss, a stale entry or a forced refresh.
/// Implementations return `Err` on transport or parse failures and `Ok` with
/// zero or more offers otherwise.
#[async_trait]
pub trait ResultFetcher: Send + Sync {
    async fn fetch(&self, query: &str) -> Result<Vec<MedicineResult>, FetchError>;
}

/// Client for fetching offers from the Gemini API
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a new GeminiClient with the default model and endpoint
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    /// Create a new GeminiClient with a custom HTTP client
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Use a different model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Use a different API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Returns the configured model
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Fetch offers for the given query
    ///
    /// # Arguments
    /// * `query` - Medicine name, already normalized by the caller
    ///
    /// # Returns
    /// * `Ok(Vec<MedicineResult>)` - Offers parsed from the response, possibly empty
    /// * `Err(FetchError)` - If the request, the API or parsing fails
    pub async fn fetch_offers(&self, query: &str) -> Result<Vec<MedicineResult>, FetchError> {
        let api_key = self.api_key.as_deref().ok_or(FetchError::MissingApiKey)?;
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = GenerateRequest::search(build_prompt(query));

        debug!(model = %self.model, query, "Requesting offers from Gemini");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(FetchError::Api {
                status: status.as_u16(),
                message: api_error_message(&text),
            });
        }

        let api_response: GenerateResponse = serde_json::from_str(&text)?;
        let content = api_response.text().ok_or(FetchError::EmptyResponse)?;

        parse_offers(&content, Utc::now().timestamp_millis())
    }
}

#[async_trait]
impl ResultFetcher for GeminiClient {
    async fn fetch(&self, query: &str) -> Result<Vec<MedicineResult>, FetchError> {
        self.fetch_offers(query).await
    }
}

/// Builds the search prompt for a medicine query
pub fn build_prompt(query: &str) -> String {
    format!(
        "PRODUCT: \"{query}\" in Colombia (priority Manizales, then national).\n\
         REQUIRED PHARMACIES: {required}.\n\
         OPTIONAL PHARMACIES: {optional}.\n\
         \n\
         REQUIREMENTS:\n\
         1. Return between 12 and 15 real, diverse results.\n\
         2. URLs MUST be direct links to the product page. No homepages or internal search pages.\n\
         3. Price must be the current value in Colombian pesos (COP).\n\
         4. Name must include the brand or generic and its concentration.\n\
         \n\
         RESPONSE FORMAT: a JSON array only.\n\
         SCHEMA: [{{name, presentation, price, storeName, url}}]",
        required = REQUIRED_STORES.join(", "),
        optional = OPTIONAL_STORES.join(", "),
    )
}

/// Parses the model's JSON answer into offers
///
/// Each offer gets an id of the form `fc-{stamp}-{index}` and the COP currency.
/// Offers with a negative or non-finite price are dropped.
pub fn parse_offers(text: &str, stamp: i64) -> Result<Vec<MedicineResult>, FetchError> {
    let raw: Vec<RawOffer> = serde_json::from_str(strip_code_fences(text))?;

    let offers = raw
        .into_iter()
        .filter(|offer| offer.price.is_finite() && offer.price >= 0.0)
        .enumerate()
        .map(|(index, offer)| MedicineResult {
            id: format!("fc-{}-{}", stamp, index),
            name: offer.name,
            presentation: offer.presentation,
            price: offer.price,
            store_name: offer.store_name,
            url: offer.url,
            currency: DEFAULT_CURRENCY.to_string(),
        })
        .collect();

    Ok(offers)
}

/// Removes a surrounding Markdown code fence, if any
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the info string ("json") on the opening fence line
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Extracts the error message from an API error body, falling back to the raw body
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

/// Offer as emitted by the model
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOffer {
    name: String,
    #[serde(default)]
    presentation: String,
    price: f64,
    store_name: String,
    #[serde(default)]
    url: String,
}

/// Request body for `generateContent`
#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    tools: Vec<Tool>,
}

impl GenerateRequest {
    /// Single-turn request with web search grounding
    fn search(prompt: String) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: Some(prompt) }],
            }],
            tools: vec![Tool {
                google_search: serde_json::Map::new(),
            }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct Tool {
    google_search: serde_json::Map<String, serde_json::Value>,
}

/// Response body for `generateContent`
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}
