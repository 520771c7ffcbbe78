/// Upstream service abstractions
///
/// Each external collaborator (Steam Web API, recommendation scoring service,
/// store price service) sits behind a trait so the pipeline can be exercised
/// with substitute clients.
use crate::{
    error::AppResult,
    models::{OwnedGame, Recommendation},
};

pub mod pricing;
pub mod recommender;
pub mod steam;

pub use pricing::StorePriceProvider;
pub use recommender::DelegatedRecommender;
pub use steam::SteamWebApi;

/// Client for the Steam owned-games endpoint
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SteamClient: Send + Sync {
    /// Fetch the raw GetOwnedGames response for an account ID or profile slug
    ///
    /// Fails on transport errors, non-success statuses, a missing API key and
    /// bodies that are not JSON. Shape validation is left to the caller.
    async fn get_owned_games(&self, steam_id: &str) -> AppResult<serde_json::Value>;
}

/// Produces a recommendation list from an owned-game library
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Recommender: Send + Sync {
    async fn recommend(&self, games: &[OwnedGame]) -> AppResult<Vec<Recommendation>>;

    /// Policy name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Looks up the current store price of a single app
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PriceProvider: Send + Sync {
    /// Returns `Ok(None)` when the store has no usable price for the app
    async fn fetch_price(&self, app_id: u32) -> AppResult<Option<f64>>;
}
