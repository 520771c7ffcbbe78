/// External recommendation scoring service
///
/// Sends the full owned-game list and trusts the returned ranking verbatim.
use crate::{
    error::{AppError, AppResult},
    models::{OwnedGame, Recommendation, ScoringRequest, ScoringResponse},
    services::providers::Recommender,
};
use reqwest::Client as HttpClient;

const RECOMMEND_PATH: &str = "/recommend";

#[derive(Clone)]
pub struct DelegatedRecommender {
    http_client: HttpClient,
    api_url: String,
}

impl DelegatedRecommender {
    pub fn new(http_client: HttpClient, api_url: String) -> Self {
        Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait::async_trait]
impl Recommender for DelegatedRecommender {
    async fn recommend(&self, games: &[OwnedGame]) -> AppResult<Vec<Recommendation>> {
        let url = format!("{}{}", self.api_url, RECOMMEND_PATH);

        let response = self
            .http_client
            .post(&url)
            .json(&ScoringRequest { games })
            .send()
            .await
            .map_err(|e| AppError::EnrichmentFailed(format!("scoring request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Scoring service request failed");
            return Err(AppError::EnrichmentFailed(format!(
                "scoring service returned status {}",
                status
            )));
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| AppError::EnrichmentFailed(format!("scoring response unreadable: {}", e)))?;

        let scored: ScoringResponse = serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                response = %response_text,
                "Failed to deserialize scoring response"
            );
            AppError::EnrichmentFailed(format!("invalid scoring response: {}", e))
        })?;

        tracing::info!(
            input_games = games.len(),
            recommendations = scored.recommendations.len(),
            policy = self.name(),
            "Recommendations scored"
        );

        Ok(scored.recommendations)
    }

    fn name(&self) -> &'static str {
        "delegated"
    }
}
