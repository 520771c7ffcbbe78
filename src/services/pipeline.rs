use std::sync::Arc;

use tracing::Instrument;
use uuid::Uuid;

use crate::{
    error::AppError,
    services::{
        library::LibraryFetcher,
        providers::{PriceProvider, Recommender},
        recommendations::fetch_prices,
        resolver::resolve_identifier,
        session::{Phase, SessionStore, ViewState},
    },
};

/// Drives one submission through resolve, fetch and enrich
///
/// Each stage commits into the session's view state tagged with the
/// submission's generation, so a slower, superseded submission can never
/// overwrite the results of a newer one.
#[derive(Clone)]
pub struct SubmissionPipeline {
    library: LibraryFetcher,
    recommender: Arc<dyn Recommender>,
    prices: Option<Arc<dyn PriceProvider>>,
}

impl SubmissionPipeline {
    pub fn new(
        library: LibraryFetcher,
        recommender: Arc<dyn Recommender>,
        prices: Option<Arc<dyn PriceProvider>>,
    ) -> Self {
        Self {
            library,
            recommender,
            prices,
        }
    }

    pub fn library(&self) -> &LibraryFetcher {
        &self.library
    }

    pub fn recommender(&self) -> &Arc<dyn Recommender> {
        &self.recommender
    }

    /// Runs a full submission cycle and returns the session's resulting view
    ///
    /// Failures are recorded in the view (phase + message) rather than
    /// returned; the returned snapshot may belong to a newer submission if
    /// this one was superseded while in flight.
    pub async fn submit(&self, sessions: &SessionStore, session_id: Uuid, raw: &str) -> ViewState {
        let generation = sessions.begin(session_id).await;
        let span = tracing::info_span!("submission", session_id = %session_id, generation);

        self.run(sessions, session_id, generation, raw)
            .instrument(span)
            .await;

        sessions.snapshot(session_id).await.unwrap_or_default()
    }

    async fn run(&self, sessions: &SessionStore, session_id: Uuid, generation: u64, raw: &str) {
        sessions
            .commit(session_id, generation, |v| v.phase = Phase::Resolving)
            .await;

        let Some(identifier) = resolve_identifier(raw) else {
            tracing::info!(session_id = %session_id, generation, "Profile input did not resolve");
            let message = AppError::InvalidInput(raw.to_string()).user_message();
            sessions
                .commit(session_id, generation, |v| fail(v, message))
                .await;
            return;
        };

        let committed = sessions
            .commit(session_id, generation, |v| {
                v.identifier = Some(identifier.clone());
                v.phase = Phase::Fetching;
            })
            .await;
        if !committed {
            return;
        }

        let library = match self.library.fetch(&identifier).await {
            Ok(library) => library,
            Err(e) => {
                tracing::warn!(
                    session_id = %session_id,
                    generation,
                    steam_id = %identifier,
                    error = %e,
                    "Library fetch failed"
                );
                let message = e.user_message();
                sessions
                    .commit(session_id, generation, |v| fail(v, message))
                    .await;
                return;
            }
        };

        if library.games.is_empty() {
            let message = AppError::NoGamesFound {
                data: serde_json::Value::Null,
            }
            .user_message();
            sessions
                .commit(session_id, generation, |v| {
                    v.library = Some(library);
                    fail(v, message);
                })
                .await;
            return;
        }

        let games = library.games.clone();
        let committed = sessions
            .commit(session_id, generation, |v| {
                v.library = Some(library);
                v.phase = Phase::Enriching;
            })
            .await;
        if !committed {
            return;
        }

        let recommendations = match self.recommender.recommend(&games).await {
            Ok(recommendations) => recommendations,
            Err(e) => {
                tracing::warn!(
                    session_id = %session_id,
                    generation,
                    policy = self.recommender.name(),
                    error = %e,
                    "Recommendation failed; owned games still shown"
                );
                let message = e.user_message();
                sessions
                    .commit(session_id, generation, |v| fail(v, message))
                    .await;
                return;
            }
        };

        let committed = sessions
            .commit(session_id, generation, |v| {
                v.recommendations = recommendations.clone();
            })
            .await;
        if !committed {
            return;
        }

        if let Some(provider) = &self.prices {
            let prices = fetch_prices(provider.clone(), &recommendations).await;
            sessions
                .commit(session_id, generation, |v| v.prices = prices)
                .await;
        }

        sessions
            .commit(session_id, generation, |v| v.phase = Phase::Ready)
            .await;

        tracing::info!(
            session_id = %session_id,
            generation,
            recommendations = recommendations.len(),
            "Submission ready"
        );
    }
}

fn fail(view: &mut ViewState, message: String) {
    view.phase = Phase::Failed;
    view.message = Some(message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{OwnedGame, Recommendation},
        services::{
            providers::{MockPriceProvider, MockRecommender, MockSteamClient},
            recommendations::LocalHeuristicRecommender,
        },
    };
    use serde_json::json;

    fn steam_returning(body: serde_json::Value) -> LibraryFetcher {
        let mut client = MockSteamClient::new();
        client
            .expect_get_owned_games()
            .returning(move |_| Ok(body.clone()));
        LibraryFetcher::new(Arc::new(client))
    }

    fn local() -> Arc<dyn Recommender> {
        Arc::new(LocalHeuristicRecommender::new(60, 3))
    }

    #[tokio::test]
    async fn test_invalid_input_makes_no_calls() {
        let mut client = MockSteamClient::new();
        client.expect_get_owned_games().never();
        let pipeline =
            SubmissionPipeline::new(LibraryFetcher::new(Arc::new(client)), local(), None);
        let sessions = SessionStore::new();

        let view = pipeline
            .submit(&sessions, Uuid::new_v4(), "not a steam id")
            .await;

        assert_eq!(view.phase, Phase::Failed);
        assert_eq!(
            view.message.as_deref(),
            Some("Enter a valid Steam ID or profile URL.")
        );
        assert!(view.identifier.is_none());
    }

    #[tokio::test]
    async fn test_full_cycle_with_prices() {
        let library = steam_returning(json!({
            "response": {"games": [
                {"appid": 1, "name": "Unplayed", "playtime_forever": 0},
                {"appid": 2, "name": "Favourite", "playtime_forever": 120}
            ]}
        }));
        let mut prices = MockPriceProvider::new();
        prices.expect_fetch_price().returning(|_| Ok(Some(0.0)));

        let pipeline = SubmissionPipeline::new(library, local(), Some(Arc::new(prices)));
        let sessions = SessionStore::new();

        let view = pipeline
            .submit(&sessions, Uuid::new_v4(), "76561198012345678")
            .await;

        assert_eq!(view.phase, Phase::Ready);
        assert_eq!(view.message, None);
        assert_eq!(view.library.as_ref().unwrap().games.len(), 2);
        let ids: Vec<u32> = view.recommendations.iter().map(|r| r.app_id).collect();
        assert_eq!(ids, vec![1]);
        assert_eq!(view.prices.get(&1), Some(&Some(0.0)));
    }

    #[tokio::test]
    async fn test_missing_games_list_reports_no_games() {
        let pipeline =
            SubmissionPipeline::new(steam_returning(json!({"response": {}})), local(), None);
        let sessions = SessionStore::new();
        let session = Uuid::new_v4();

        let view = pipeline
            .submit(&sessions, session, "https://steamcommunity.com/id/private/")
            .await;

        assert_eq!(view.phase, Phase::Failed);
        assert_eq!(
            view.message.as_deref(),
            Some("No games found for this profile.")
        );
        assert!(view.library.is_none());
    }

    #[tokio::test]
    async fn test_empty_library_reports_no_games() {
        let pipeline = SubmissionPipeline::new(
            steam_returning(json!({"response": {"game_count": 0, "games": []}})),
            local(),
            None,
        );
        let sessions = SessionStore::new();

        let view = pipeline
            .submit(&sessions, Uuid::new_v4(), "76561198012345678")
            .await;

        assert_eq!(view.phase, Phase::Failed);
        assert_eq!(
            view.message.as_deref(),
            Some("No games found for this profile.")
        );
        assert!(view.recommendations.is_empty());
    }

    #[tokio::test]
    async fn test_enrichment_failure_keeps_owned_games() {
        let library = steam_returning(json!({
            "response": {"games": [{"appid": 1, "playtime_forever": 10}]}
        }));
        let mut recommender = MockRecommender::new();
        recommender
            .expect_recommend()
            .returning(|_| Err(AppError::EnrichmentFailed("scoring down".to_string())));
        recommender.expect_name().return_const("delegated");

        let pipeline = SubmissionPipeline::new(library, Arc::new(recommender), None);
        let sessions = SessionStore::new();

        let view = pipeline
            .submit(&sessions, Uuid::new_v4(), "76561198012345678")
            .await;

        assert_eq!(view.phase, Phase::Failed);
        assert_eq!(
            view.message.as_deref(),
            Some("Recommendations are unavailable right now.")
        );
        assert_eq!(view.library.unwrap().games[0].app_id, 1);
    }

    #[tokio::test]
    async fn test_new_submission_discards_previous_results() {
        let mut client = MockSteamClient::new();
        client
            .expect_get_owned_games()
            .withf(|id: &str| id == "76561198012345678")
            .returning(|_| Ok(json!({"response": {"games": [{"appid": 1}]}})));
        client
            .expect_get_owned_games()
            .withf(|id: &str| id == "private")
            .returning(|_| Ok(json!({"response": {}})));

        let pipeline =
            SubmissionPipeline::new(LibraryFetcher::new(Arc::new(client)), local(), None);
        let sessions = SessionStore::new();
        let session = Uuid::new_v4();

        let first = pipeline
            .submit(&sessions, session, "76561198012345678")
            .await;
        assert_eq!(first.phase, Phase::Ready);

        let second = pipeline
            .submit(&sessions, session, "steamcommunity.com/id/private")
            .await;
        assert_eq!(second.phase, Phase::Failed);
        assert!(second.library.is_none());
        assert!(second.recommendations.is_empty());
        assert_eq!(second.generation, first.generation + 1);
    }

    /// Holds the first call open until released
    struct GatedRecommender {
        gate: tokio::sync::Mutex<Option<tokio::sync::oneshot::Receiver<()>>>,
    }

    #[async_trait::async_trait]
    impl Recommender for GatedRecommender {
        async fn recommend(&self, games: &[OwnedGame]) -> crate::error::AppResult<Vec<Recommendation>> {
            let gate = self.gate.lock().await.take();
            if let Some(rx) = gate {
                let _ = rx.await;
            }
            Ok(games.iter().map(Recommendation::from).collect())
        }

        fn name(&self) -> &'static str {
            "gated"
        }
    }

    #[tokio::test]
    async fn test_superseded_submission_does_not_overwrite() {
        let library = steam_returning(json!({
            "response": {"games": [{"appid": 1, "playtime_forever": 0}]}
        }));
        let (release_tx, release_rx) = tokio::sync::oneshot::channel();
        let recommender = GatedRecommender {
            gate: tokio::sync::Mutex::new(Some(release_rx)),
        };

        let pipeline = SubmissionPipeline::new(library, Arc::new(recommender), None);
        let sessions = SessionStore::new();
        let session = Uuid::new_v4();

        let slow = {
            let pipeline = pipeline.clone();
            let sessions = sessions.clone();
            tokio::spawn(async move {
                pipeline
                    .submit(&sessions, session, "76561198012345678")
                    .await
            })
        };

        // Wait until the slow submission is parked in enrichment
        while sessions
            .snapshot(session)
            .await
            .map_or(true, |v| v.phase != Phase::Enriching)
        {
            tokio::task::yield_now().await;
        }

        let fast = pipeline
            .submit(&sessions, session, "not a steam id")
            .await;
        assert_eq!(fast.phase, Phase::Failed);

        release_tx.send(()).unwrap();
        let slow_view = slow.await.unwrap();

        assert_eq!(slow_view.generation, fast.generation);
        assert_eq!(slow_view.phase, Phase::Failed);
        assert!(slow_view.recommendations.is_empty());
        assert!(slow_view.library.is_none());
    }
}
