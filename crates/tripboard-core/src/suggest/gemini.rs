//! Gemini `generateContent` client.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

use super::SuggestionProvider;
use crate::config::SuggestionConfig;
use crate::error::{Error, Result};
use crate::models::{AccommodationDraft, TripDetails};
use crate::util::compact_text;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const SUGGESTION_COUNT: usize = 3;

#[derive(Clone)]
pub struct GeminiSuggestionProvider {
    endpoint: String,
    api_key: String,
    destination: String,
    client: Client,
}

impl std::fmt::Debug for GeminiSuggestionProvider {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("GeminiSuggestionProvider")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .field("destination", &self.destination)
            .finish()
    }
}

impl GeminiSuggestionProvider {
    pub fn new(config: &SuggestionConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::Suggestion("API key is not configured".to_string()))?;
        let client = Client::builder()
            .build()
            .map_err(|error| Error::Suggestion(error.to_string()))?;
        Ok(Self {
            endpoint: format!("{GEMINI_API_BASE}/{}:generateContent", config.model),
            api_key,
            destination: config.destination.clone(),
            client,
        })
    }

    fn request_body(&self, params: &TripDetails) -> Value {
        json!({
            "contents": [{ "parts": [{ "text": build_prompt(&self.destination, params) }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "name": { "type": "STRING" },
                            "price": { "type": "STRING" },
                            "link": { "type": "STRING" },
                            "locationLink": { "type": "STRING" },
                            "images": { "type": "ARRAY", "items": { "type": "STRING" } },
                            "notes": { "type": "STRING" }
                        },
                        "required": ["name", "price", "link", "locationLink", "notes"]
                    }
                }
            }
        })
    }
}

#[async_trait]
impl SuggestionProvider for GeminiSuggestionProvider {
    async fn suggest(&self, params: &TripDetails) -> Result<Vec<AccommodationDraft>> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(params))
            .send()
            .await
            .map_err(|error| Error::Suggestion(error.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Suggestion(parse_api_error(status, &body)));
        }

        let payload = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|error| Error::Suggestion(format!("invalid response: {error}")))?;
        let drafts = parse_suggestions(payload)?;
        tracing::info!(count = drafts.len(), "Received accommodation suggestions");
        Ok(drafts)
    }
}

fn build_prompt(destination: &str, params: &TripDetails) -> String {
    format!(
        "Suggest {SUGGESTION_COUNT} places to stay in {destination} for a group of {people} people.\n\
         Budget is around {budget} per night.\n\
         Preferred style: {style}.\n\
         Reply with JSON only, each item having:\n\
         - name: the name of the place\n\
         - price: approximate price (a number or a range)\n\
         - link: a Google search or Facebook link\n\
         - locationLink: a Google Maps search link \
         (e.g. https://www.google.com/maps/search/?api=1&query=<name>)\n\
         - notes: short highlights\n\
         Leave images as an empty array [] because image links expire.",
        people = params.people.trim(),
        budget = params.budget.trim(),
        style = params.style.trim(),
    )
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Extract drafts from the first candidate. An empty answer is no suggestions.
fn parse_suggestions(payload: GenerateContentResponse) -> Result<Vec<AccommodationDraft>> {
    let text = payload
        .candidates
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts)
        .find_map(|part| part.text)
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let drafts: Vec<AccommodationDraft> = serde_json::from_str(&text)
        .map_err(|error| Error::Suggestion(format!("model returned invalid JSON: {error}")))?;
    Ok(drafts
        .into_iter()
        .filter_map(|draft| draft.validated().ok())
        .collect())
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<GeminiErrorBody>(body) {
        if let Some(message) = payload.error.and_then(|error| error.message) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config() -> SuggestionConfig {
        SuggestionConfig {
            api_key: Some("gemini-secret".to_string()),
            ..SuggestionConfig::default()
        }
    }

    fn details() -> TripDetails {
        TripDetails {
            budget: "2000".to_string(),
            people: "6".to_string(),
            style: "beachfront".to_string(),
        }
    }

    #[test]
    fn test_provider_targets_the_configured_model() {
        let provider = GeminiSuggestionProvider::new(&config()).unwrap();
        assert!(provider
            .endpoint
            .ends_with("/gemini-3-flash-preview:generateContent"));
        assert!(!format!("{provider:?}").contains("gemini-secret"));
    }

    #[test]
    fn test_provider_requires_a_key() {
        let err = GeminiSuggestionProvider::new(&SuggestionConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Suggestion(_)));
    }

    #[test]
    fn test_prompt_carries_trip_details() {
        let prompt = build_prompt("Koh Larn", &details());
        assert!(prompt.contains("3 places to stay in Koh Larn"));
        assert!(prompt.contains("6 people"));
        assert!(prompt.contains("around 2000 per night"));
        assert!(prompt.contains("style: beachfront"));
    }

    #[test]
    fn test_request_asks_for_json_array() {
        let provider = GeminiSuggestionProvider::new(&config()).unwrap();
        let body = provider.request_body(&details());
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(
            body["generationConfig"]["responseSchema"]["type"],
            "ARRAY"
        );
    }

    #[test]
    fn test_parses_candidate_text_and_tolerates_null_images() {
        let payload: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [{ "text": serde_json::to_string(&json!([
                    { "name": "Beach Resort", "price": 1800, "link": "", "locationLink": "",
                      "images": null, "notes": "pool" },
                    { "name": "  ", "price": "1000" }
                ])).unwrap() }] }
            }]
        }))
        .unwrap();

        let drafts = parse_suggestions(payload).unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].name, "Beach Resort");
        assert_eq!(drafts[0].price, "1800");
        assert!(drafts[0].images.is_empty());
    }

    #[test]
    fn test_empty_answer_is_no_suggestions() {
        let payload: GenerateContentResponse =
            serde_json::from_value(json!({ "candidates": [] })).unwrap();
        assert!(parse_suggestions(payload).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_answer_is_an_error() {
        let payload: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "not json" }] } }]
        }))
        .unwrap();
        assert!(matches!(
            parse_suggestions(payload),
            Err(Error::Suggestion(_))
        ));
    }

    #[test]
    fn test_api_error_message_is_extracted() {
        let message = parse_api_error(
            StatusCode::FORBIDDEN,
            r#"{"error":{"code":403,"message":"API key not valid"}}"#,
        );
        assert_eq!(message, "API key not valid (403)");
    }
}
