/// Steam Web API client
///
/// Calls IPlayerService/GetOwnedGames with app metadata and played free games
/// included. The API key is injected at construction and only checked when a
/// request is made.
use crate::{
    error::{AppError, AppResult},
    services::providers::SteamClient,
};
use reqwest::Client as HttpClient;

const SERVICE: &str = "Steam";
const OWNED_GAMES_PATH: &str = "/IPlayerService/GetOwnedGames/v1/";

#[derive(Clone)]
pub struct SteamWebApi {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
}

impl SteamWebApi {
    pub fn new(http_client: HttpClient, api_key: Option<String>, api_url: String) -> Self {
        Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    fn owned_games_url(&self) -> String {
        format!("{}{}", self.api_url, OWNED_GAMES_PATH)
    }
}

#[async_trait::async_trait]
impl SteamClient for SteamWebApi {
    async fn get_owned_games(&self, steam_id: &str) -> AppResult<serde_json::Value> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(AppError::MissingApiKey)?;

        let response = self
            .http_client
            .get(self.owned_games_url())
            .query(&[
                ("key", api_key),
                ("steamid", steam_id),
                ("include_appinfo", "true"),
                ("include_played_free_games", "true"),
            ])
            .send()
            .await
            .map_err(|e| request_failed(steam_id, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| request_failed(steam_id, e))?;

        if !status.is_success() {
            tracing::warn!(
                steam_id = %steam_id,
                status = %status,
                "Steam API rejected owned-games request"
            );
            return Err(AppError::UpstreamRejected {
                service: SERVICE,
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                steam_id = %steam_id,
                error = %e,
                "Failed to parse Steam response"
            );
            AppError::UpstreamMalformed {
                service: SERVICE,
                details: format!("invalid JSON: {}", e),
            }
        })
    }
}

/// The request URL carries the API key, so it is stripped before the error
/// reaches logs or response bodies.
fn request_failed(steam_id: &str, e: reqwest::Error) -> AppError {
    let e = e.without_url();
    tracing::error!(steam_id = %steam_id, error = %e, "Steam request failed");
    AppError::UpstreamRequestFailed(e)
}
