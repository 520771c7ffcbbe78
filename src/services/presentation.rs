//! Display-time transforms over fetched data.
//!
//! Nothing here mutates the underlying lists; every sort works on a vector of
//! borrowed references.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    models::{OwnedGame, PriceMap, Recommendation, ResolvedIdentifier},
    services::session::{Phase, ViewState},
};

const STORE_URL: &str = "https://store.steampowered.com/app";
const CAPSULE_URL: &str = "https://cdn.cloudflare.steamstatic.com/steam/apps";
const UNKNOWN_PERSONA: &str = "Unknown";

/// User-selectable ordering for the recommendation list
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Similarity score, highest first; unscored last
    #[default]
    Similarity,
    /// Owner count, highest first; unknown counts as zero
    Owners,
    /// Price, cheapest first; unknown price last
    Price,
}

/// Owned games ordered by playtime, most played first
pub fn games_by_playtime(games: &[OwnedGame]) -> Vec<&OwnedGame> {
    let mut sorted: Vec<&OwnedGame> = games.iter().collect();
    sorted.sort_by_key(|game| std::cmp::Reverse(game.playtime()));
    sorted
}

/// Owned games with essentially no playtime, in library order
pub fn unplayed_games(games: &[OwnedGame], limit: usize) -> Vec<&OwnedGame> {
    games
        .iter()
        .filter(|game| game.playtime() < 1)
        .take(limit)
        .collect()
}

pub fn sort_recommendations<'a>(
    recommendations: &'a [Recommendation],
    mode: SortMode,
    prices: &PriceMap,
) -> Vec<&'a Recommendation> {
    let mut sorted: Vec<&Recommendation> = recommendations.iter().collect();

    match mode {
        SortMode::Similarity => sorted.sort_by(|a, b| {
            let a = a.similarity_score.unwrap_or(f64::NEG_INFINITY);
            let b = b.similarity_score.unwrap_or(f64::NEG_INFINITY);
            b.total_cmp(&a)
        }),
        SortMode::Owners => {
            sorted.sort_by_key(|rec| std::cmp::Reverse(rec.owner_count.unwrap_or(0)))
        }
        SortMode::Price => sorted.sort_by(|a, b| {
            let a = known_price(prices, a.app_id);
            let b = known_price(prices, b.app_id);
            match (a, b) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        }),
    }

    sorted
}

fn known_price(prices: &PriceMap, app_id: u32) -> Option<f64> {
    prices.get(&app_id).copied().flatten()
}

pub fn playtime_label(minutes: u64) -> String {
    if minutes > 0 {
        format!("{:.1} h", minutes as f64 / 60.0)
    } else {
        "Never".to_string()
    }
}

/// Hidden (`None`) until the lookup has settled
pub fn price_label(prices: &PriceMap, app_id: u32) -> Option<String> {
    prices.get(&app_id).map(|price| match price {
        None => "N/A".to_string(),
        Some(p) if *p == 0.0 => "Free".to_string(),
        Some(p) => format!("${}", p),
    })
}

pub fn store_url(app_id: u32) -> String {
    format!("{}/{}", STORE_URL, app_id)
}

pub fn capsule_image_url(app_id: u32) -> String {
    format!("{}/{}/capsule_184x69.jpg", CAPSULE_URL, app_id)
}

// ============================================================================
// Rendered view
// ============================================================================

#[derive(Debug, Serialize)]
pub struct IdentityView {
    pub persona_name: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GameCard {
    pub appid: u32,
    pub name: Option<String>,
    pub playtime_minutes: u64,
    pub playtime_label: String,
    pub store_url: String,
    pub image_url: String,
}

impl From<&OwnedGame> for GameCard {
    fn from(game: &OwnedGame) -> Self {
        Self {
            appid: game.app_id,
            name: game.display_name.clone(),
            playtime_minutes: game.playtime(),
            playtime_label: playtime_label(game.playtime()),
            store_url: store_url(game.app_id),
            image_url: capsule_image_url(game.app_id),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecommendationCard {
    pub appid: u32,
    pub name: Option<String>,
    pub genres: Option<String>,
    pub score: Option<f64>,
    pub owners: Option<u64>,
    pub price: Option<f64>,
    pub price_label: Option<String>,
    pub store_url: String,
    pub image_url: String,
}

/// Everything a client needs to draw one session
#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub phase: Phase,
    pub message: Option<String>,
    pub identifier: Option<ResolvedIdentifier>,
    pub identity: Option<IdentityView>,
    pub sort: SortMode,
    pub top_games: Vec<GameCard>,
    pub recommendations: Vec<RecommendationCard>,
    pub unplayed: Vec<GameCard>,
    pub prices_settled: bool,
    pub updated_at: DateTime<Utc>,
}

pub fn render_view(state: &ViewState, sort: SortMode, unplayed_limit: usize) -> ProfileView {
    let games = state
        .library
        .as_ref()
        .map(|library| library.games.as_slice())
        .unwrap_or_default();

    let identity = state.library.as_ref().map(|library| {
        let identity = library.identity.as_ref();
        IdentityView {
            persona_name: identity
                .and_then(|i| i.persona_name.clone())
                .unwrap_or_else(|| UNKNOWN_PERSONA.to_string()),
            avatar_url: identity.and_then(|i| i.avatar_url.clone()),
        }
    });

    let recommendations = sort_recommendations(&state.recommendations, sort, &state.prices)
        .into_iter()
        .map(|rec| RecommendationCard {
            appid: rec.app_id,
            name: rec.display_name.clone(),
            genres: rec.genre_tags.clone(),
            score: rec.similarity_score,
            owners: rec.owner_count,
            price: known_price(&state.prices, rec.app_id),
            price_label: price_label(&state.prices, rec.app_id),
            store_url: store_url(rec.app_id),
            image_url: capsule_image_url(rec.app_id),
        })
        .collect();

    let prices_settled = state
        .recommendations
        .iter()
        .all(|rec| state.prices.contains_key(&rec.app_id));

    ProfileView {
        phase: state.phase,
        message: state.message.clone(),
        identifier: state.identifier.clone(),
        identity,
        sort,
        top_games: games_by_playtime(games).into_iter().map(GameCard::from).collect(),
        recommendations,
        unplayed: unplayed_games(games, unplayed_limit)
            .into_iter()
            .map(GameCard::from)
            .collect(),
        prices_settled,
        updated_at: state.updated_at,
    }
}
