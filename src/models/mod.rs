use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt::Display};

/// A Steam account reference extracted from user input
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ResolvedIdentifier {
    /// 17-digit numeric account ID (e.g., "76561198012345678")
    SteamId64(String),
    /// Custom profile slug taken from a steamcommunity.com URL
    ProfileSlug(String),
}

impl ResolvedIdentifier {
    pub fn as_str(&self) -> &str {
        match self {
            ResolvedIdentifier::SteamId64(id) => id,
            ResolvedIdentifier::ProfileSlug(slug) => slug,
        }
    }
}

impl Display for ResolvedIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry in a player's library
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OwnedGame {
    #[serde(rename = "appid")]
    pub app_id: u32,
    #[serde(rename = "name", default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Cumulative playtime in minutes
    #[serde(
        rename = "playtime_forever",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub playtime_minutes_forever: Option<u64>,
}

impl OwnedGame {
    /// Playtime with a missing value treated as never played
    pub fn playtime(&self) -> u64 {
        self.playtime_minutes_forever.unwrap_or(0)
    }
}

/// Display identity of the profile owner
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerIdentity {
    #[serde(rename = "personaname", default)]
    pub persona_name: Option<String>,
    #[serde(rename = "avatarfull", default)]
    pub avatar_url: Option<String>,
}

/// Normalized result of one owned-games lookup
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Library {
    pub identity: Option<PlayerIdentity>,
    pub games: Vec<OwnedGame>,
}

/// A game suggested to the user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    #[serde(rename = "appid")]
    pub app_id: u32,
    #[serde(rename = "name", default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(rename = "score", default, skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<f64>,
    #[serde(rename = "owners", default, skip_serializing_if = "Option::is_none")]
    pub owner_count: Option<u64>,
    #[serde(rename = "genres", default, skip_serializing_if = "Option::is_none")]
    pub genre_tags: Option<String>,
}

impl From<&OwnedGame> for Recommendation {
    fn from(game: &OwnedGame) -> Self {
        Self {
            app_id: game.app_id,
            display_name: game.display_name.clone(),
            similarity_score: None,
            owner_count: None,
            genre_tags: None,
        }
    }
}

/// Store prices keyed by app ID.
///
/// A missing key means the price has not been fetched yet; `Some(None)` means
/// the lookup settled without a usable price.
pub type PriceMap = HashMap<u32, Option<f64>>;

// ============================================================================
// Steam Web API Types
// ============================================================================

/// Envelope returned by IPlayerService/GetOwnedGames
#[derive(Debug, Deserialize)]
pub struct SteamOwnedGamesEnvelope {
    pub response: SteamOwnedGamesBody,
}

#[derive(Debug, Deserialize)]
pub struct SteamOwnedGamesBody {
    #[serde(default)]
    pub game_count: Option<u32>,
    /// Absent when the profile is private or unknown
    #[serde(default)]
    pub games: Option<Vec<OwnedGame>>,
    #[serde(default)]
    pub players: Vec<PlayerIdentity>,
}

// ============================================================================
// Scoring / Pricing Service Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ScoringRequest<'a> {
    pub games: &'a [OwnedGame],
}

#[derive(Debug, Deserialize)]
pub struct ScoringResponse {
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Deserialize)]
pub struct PriceResponse {
    #[serde(default)]
    pub price: Option<serde_json::Value>,
}

impl PriceResponse {
    /// Only a numeric price counts; anything else is unavailable
    pub fn amount(&self) -> Option<f64> {
        self.price.as_ref().and_then(|p| p.as_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_identifier_display() {
        let id = ResolvedIdentifier::SteamId64("76561198012345678".to_string());
        assert_eq!(format!("{}", id), "76561198012345678");

        let slug = ResolvedIdentifier::ProfileSlug("examplename".to_string());
        assert_eq!(slug.as_str(), "examplename");
    }

    #[test]
    fn test_resolved_identifier_serde() {
        let slug = ResolvedIdentifier::ProfileSlug("examplename".to_string());
        let json = serde_json::to_string(&slug).unwrap();
        assert_eq!(json, r#"{"kind":"profile_slug","value":"examplename"}"#);
    }

    #[test]
    fn test_owned_game_deserialization() {
        let json = r#"{
            "appid": 440,
            "name": "Team Fortress 2",
            "playtime_forever": 1234,
            "img_icon_url": "e3f595a92552da3d664ad00277fad2107345f743"
        }"#;

        let game: OwnedGame = serde_json::from_str(json).unwrap();
        assert_eq!(game.app_id, 440);
        assert_eq!(game.display_name, Some("Team Fortress 2".to_string()));
        assert_eq!(game.playtime_minutes_forever, Some(1234));
    }

    #[test]
    fn test_owned_game_missing_optional_fields() {
        let game: OwnedGame = serde_json::from_str(r#"{"appid": 10}"#).unwrap();
        assert_eq!(game.display_name, None);
        assert_eq!(game.playtime(), 0);
    }

    #[test]
    fn test_owned_game_requires_appid() {
        let result: Result<OwnedGame, _> = serde_json::from_str(r#"{"name": "No Id"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_owned_game_serializes_with_steam_names() {
        let game = OwnedGame {
            app_id: 1,
            display_name: None,
            playtime_minutes_forever: Some(0),
        };
        let json = serde_json::to_value(&game).unwrap();
        assert_eq!(json, serde_json::json!({"appid": 1, "playtime_forever": 0}));
    }

    #[test]
    fn test_recommendation_deserialization() {
        let json = r#"{
            "appid": 620,
            "name": "Portal 2",
            "score": 0.93,
            "owners": 25000000,
            "genres": "Action, Adventure"
        }"#;

        let rec: Recommendation = serde_json::from_str(json).unwrap();
        assert_eq!(rec.app_id, 620);
        assert_eq!(rec.similarity_score, Some(0.93));
        assert_eq!(rec.owner_count, Some(25_000_000));
        assert_eq!(rec.genre_tags, Some("Action, Adventure".to_string()));
    }

    #[test]
    fn test_price_response_amount() {
        let free: PriceResponse = serde_json::from_str(r#"{"price": 0}"#).unwrap();
        assert_eq!(free.amount(), Some(0.0));

        let missing: PriceResponse = serde_json::from_str(r#"{"price": null}"#).unwrap();
        assert_eq!(missing.amount(), None);

        let text: PriceResponse = serde_json::from_str(r#"{"price": "9.99"}"#).unwrap();
        assert_eq!(text.amount(), None);
    }
}
