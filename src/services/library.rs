use std::sync::Arc;

use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    models::{Library, ResolvedIdentifier, SteamOwnedGamesEnvelope},
    services::providers::SteamClient,
};

const SERVICE: &str = "Steam";

/// Fetches and validates a player's owned-games library
///
/// Every call issues exactly one upstream request; nothing is cached.
#[derive(Clone)]
pub struct LibraryFetcher {
    client: Arc<dyn SteamClient>,
}

impl LibraryFetcher {
    pub fn new(client: Arc<dyn SteamClient>) -> Self {
        Self { client }
    }

    /// Fetch and normalize the library for a resolved identifier
    pub async fn fetch(&self, identifier: &ResolvedIdentifier) -> AppResult<Library> {
        let raw = self.client.get_owned_games(identifier.as_str()).await?;
        let library = parse_library(raw)?;

        tracing::info!(
            steam_id = %identifier,
            game_count = library.games.len(),
            "Owned games fetched"
        );

        Ok(library)
    }

    /// Fetch the upstream response, returning it verbatim once it is known to
    /// carry a games list
    pub async fn fetch_raw(&self, steam_id: &str) -> AppResult<Value> {
        let raw = self.client.get_owned_games(steam_id).await?;
        let library = parse_library(raw.clone()).inspect_err(|e| {
            tracing::info!(steam_id = %steam_id, error = %e, "Steam response failed validation");
        })?;

        tracing::info!(
            steam_id = %steam_id,
            game_count = library.games.len(),
            "Owned games proxied"
        );

        Ok(raw)
    }
}

/// Converts a raw GetOwnedGames body into typed records
///
/// A missing `response` object or a badly shaped game record is malformed; a
/// `response` without `games` means the profile is private or unknown.
pub fn parse_library(raw: Value) -> AppResult<Library> {
    if raw.get("response").is_some_and(Value::is_object) && !has_games_list(&raw) {
        return Err(AppError::NoGamesFound { data: raw });
    }

    let envelope: SteamOwnedGamesEnvelope =
        serde_json::from_value(raw).map_err(|e| AppError::UpstreamMalformed {
            service: SERVICE,
            details: e.to_string(),
        })?;

    let body = envelope.response;
    let games = body.games.unwrap_or_default();

    if let Some(expected) = body.game_count {
        if expected as usize != games.len() {
            tracing::debug!(
                game_count = expected,
                received = games.len(),
                "Steam game_count differs from games list length"
            );
        }
    }

    Ok(Library {
        identity: body.players.into_iter().next(),
        games,
    })
}

fn has_games_list(raw: &Value) -> bool {
    raw.get("response")
        .and_then(|r| r.get("games"))
        .is_some_and(|games| !games.is_null())
}
