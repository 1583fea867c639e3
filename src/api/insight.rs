//! Ride summaries via the Gemini generative-text API

use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use super::{GeoApiClient, ensure_success, read_json, send};
use crate::Result;
use crate::error::{MotoPlanError, Service};

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    fn into_text(self) -> Result<String> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| {
                MotoPlanError::remote(Service::Insight, None, "Gemini returned no candidates.")
            })
    }
}

impl GeoApiClient {
    /// Generate text for a prompt with the configured model
    #[instrument(skip(self, prompt, key), fields(model = %self.services.insight_model))]
    pub async fn generate_content(&self, prompt: &str, key: &str) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.services.insight_url.trim_end_matches('/'),
            self.services.insight_model,
            urlencoding::encode(key)
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = send(Service::Insight, self.client.post(&url).json(&body)).await?;
        let response = ensure_success(Service::Insight, response, |_| {
            "Gemini API request failed.".to_string()
        })
        .await?;
        let generated: GenerateResponse = read_json(Service::Insight, response).await?;
        let text = generated.into_text()?;

        info!("Received {} characters of generated text", text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_candidate_text() {
        let body = r#"{
            "candidates": [{"content": {"parts": [{"text": "Ride safe."}], "role": "model"}}]
        }"#;
        let response: GenerateResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.into_text().unwrap(), "Ride safe.");
    }

    #[test]
    fn test_no_candidates() {
        let response: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(response.into_text().is_err());
    }
}
