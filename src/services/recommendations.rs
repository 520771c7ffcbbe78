use std::{collections::HashSet, sync::Arc};

use crate::{
    config::{Config, PolicyKind},
    error::{AppError, AppResult},
    models::{OwnedGame, PriceMap, Recommendation},
    services::providers::{DelegatedRecommender, PriceProvider, Recommender},
};

/// Recommends owned games the player has barely touched
///
/// Keeps games whose playtime is strictly below the threshold, in library
/// order, capped at `limit`.
#[derive(Debug, Clone)]
pub struct LocalHeuristicRecommender {
    threshold_minutes: u64,
    limit: usize,
}

impl LocalHeuristicRecommender {
    pub fn new(threshold_minutes: u64, limit: usize) -> Self {
        Self {
            threshold_minutes,
            limit,
        }
    }

    pub fn select(&self, games: &[OwnedGame]) -> Vec<Recommendation> {
        games
            .iter()
            .filter(|game| game.playtime() < self.threshold_minutes)
            .take(self.limit)
            .map(Recommendation::from)
            .collect()
    }
}

#[async_trait::async_trait]
impl Recommender for LocalHeuristicRecommender {
    async fn recommend(&self, games: &[OwnedGame]) -> AppResult<Vec<Recommendation>> {
        let recommendations = self.select(games);

        tracing::info!(
            input_games = games.len(),
            recommendations = recommendations.len(),
            threshold_minutes = self.threshold_minutes,
            policy = self.name(),
            "Recommendations selected"
        );

        Ok(recommendations)
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

/// Builds the recommender selected by configuration
pub fn recommender_from_config(
    config: &Config,
    http_client: reqwest::Client,
) -> anyhow::Result<Arc<dyn Recommender>> {
    match config.recommendation_policy {
        PolicyKind::Local => Ok(Arc::new(LocalHeuristicRecommender::new(
            config.unplayed_threshold_minutes,
            config.recommendation_limit,
        ))),
        PolicyKind::Delegated => {
            let url = config.recommender_api_url.clone().ok_or_else(|| {
                anyhow::anyhow!("RECOMMENDER_API_URL is required for the delegated policy")
            })?;
            Ok(Arc::new(DelegatedRecommender::new(http_client, url)))
        }
    }
}

/// Looks up prices for every recommended app concurrently
///
/// One task per distinct app ID, all in flight at once. Each lookup settles on
/// its own: a failure or a panicked task records `None` for that app and
/// never affects the others. Returns only after every lookup has settled.
pub async fn fetch_prices(
    provider: Arc<dyn PriceProvider>,
    recommendations: &[Recommendation],
) -> PriceMap {
    let mut seen = HashSet::new();
    let mut tasks = Vec::new();

    for app_id in recommendations.iter().map(|rec| rec.app_id) {
        if !seen.insert(app_id) {
            continue;
        }
        let provider = provider.clone();
        let task = tokio::spawn(async move { provider.fetch_price(app_id).await });
        tasks.push((app_id, task));
    }

    let mut prices = PriceMap::with_capacity(tasks.len());
    let mut failures = 0usize;

    for (app_id, task) in tasks {
        let price = match task.await {
            Ok(Ok(price)) => price,
            Ok(Err(e)) => {
                tracing::warn!(app_id = app_id, error = %e, "Price lookup failed");
                failures += 1;
                None
            }
            Err(e) => {
                let e = AppError::Internal(e.to_string());
                tracing::error!(app_id = app_id, error = %e, "Price lookup task join error");
                failures += 1;
                None
            }
        };
        prices.insert(app_id, price);
    }

    if failures > 0 {
        tracing::warn!(
            success_count = prices.len() - failures,
            error_count = failures,
            "Partial price lookup failure"
        );
    }

    prices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::MockPriceProvider;

    fn game(app_id: u32, playtime: Option<u64>) -> OwnedGame {
        OwnedGame {
            app_id,
            display_name: Some(format!("Game {}", app_id)),
            playtime_minutes_forever: playtime,
        }
    }

    fn rec(app_id: u32) -> Recommendation {
        Recommendation::from(&game(app_id, None))
    }

    #[tokio::test]
    async fn test_local_policy_keeps_unplayed() {
        let recommender = LocalHeuristicRecommender::new(60, 3);
        let games = vec![game(1, Some(0)), game(2, Some(120))];

        let recs = recommender.recommend(&games).await.unwrap();

        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].app_id, 1);
        assert_eq!(recs[0].display_name.as_deref(), Some("Game 1"));
    }

    #[test]
    fn test_local_policy_caps_and_preserves_order() {
        let recommender = LocalHeuristicRecommender::new(60, 3);
        let games = vec![
            game(5, Some(59)),
            game(4, None),
            game(3, Some(60)),
            game(2, Some(0)),
            game(1, Some(1)),
        ];

        let ids: Vec<u32> = recommender.select(&games).iter().map(|r| r.app_id).collect();
        assert_eq!(ids, vec![5, 4, 2]);
    }

    #[test]
    fn test_local_policy_empty_library() {
        let recommender = LocalHeuristicRecommender::new(60, 3);
        assert!(recommender.select(&[]).is_empty());
    }

    #[test]
    fn test_recommender_from_config_local() {
        let config: Config = envy::from_iter(Vec::<(String, String)>::new()).unwrap();
        let recommender = recommender_from_config(&config, reqwest::Client::new()).unwrap();
        assert_eq!(recommender.name(), "local");
    }

    #[test]
    fn test_recommender_from_config_delegated_without_url() {
        let config: Config = envy::from_iter(vec![(
            "RECOMMENDATION_POLICY".to_string(),
            "delegated".to_string(),
        )])
        .unwrap();
        assert!(recommender_from_config(&config, reqwest::Client::new()).is_err());
    }

    #[tokio::test]
    async fn test_failed_lookup_does_not_affect_others() {
        let mut provider = MockPriceProvider::new();
        provider
            .expect_fetch_price()
            .withf(|app_id| *app_id == 10)
            .returning(|_| Ok(Some(0.0)));
        provider
            .expect_fetch_price()
            .withf(|app_id| *app_id == 20)
            .returning(|_| Err(AppError::EnrichmentFailed("price service down".to_string())));

        let prices = fetch_prices(Arc::new(provider), &[rec(10), rec(20)]).await;

        assert_eq!(prices.len(), 2);
        assert_eq!(prices.get(&10), Some(&Some(0.0)));
        assert_eq!(prices.get(&20), Some(&None));
    }

    #[tokio::test]
    async fn test_duplicate_apps_looked_up_once() {
        let mut provider = MockPriceProvider::new();
        provider
            .expect_fetch_price()
            .times(1)
            .returning(|_| Ok(Some(19.99)));

        let prices = fetch_prices(Arc::new(provider), &[rec(7), rec(7)]).await;

        assert_eq!(prices.len(), 1);
        assert_eq!(prices[&7], Some(19.99));
    }

    #[tokio::test]
    async fn test_no_recommendations_no_lookups() {
        let mut provider = MockPriceProvider::new();
        provider.expect_fetch_price().never();

        let prices = fetch_prices(Arc::new(provider), &[]).await;
        assert!(prices.is_empty());
    }
}
