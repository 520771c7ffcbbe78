use std::{sync::Arc, time::Duration};

use crate::{
    config::Config,
    services::{
        providers::{PriceProvider, SteamWebApi, StorePriceProvider},
        recommendations::recommender_from_config,
        LibraryFetcher, SessionStore, SubmissionPipeline,
    },
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: SubmissionPipeline,
    pub sessions: SessionStore,
    pub unplayed_display_limit: usize,
}

impl AppState {
    pub fn new(
        pipeline: SubmissionPipeline,
        sessions: SessionStore,
        unplayed_display_limit: usize,
    ) -> Self {
        Self {
            pipeline,
            sessions,
            unplayed_display_limit,
        }
    }

    /// Wires the upstream clients described by `config`
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        let steam = SteamWebApi::new(
            http_client.clone(),
            config.steam_api_key.clone(),
            config.steam_api_url.clone(),
        );
        let recommender = recommender_from_config(config, http_client.clone())?;
        let prices = config.price_api_url.clone().map(|url| {
            Arc::new(StorePriceProvider::new(
                http_client.clone(),
                url,
                config.price_currency.clone(),
            )) as Arc<dyn PriceProvider>
        });

        tracing::info!(
            policy = recommender.name(),
            pricing = prices.is_some(),
            session_idle_ttl_secs = config.session_idle_ttl_secs,
            steam_api_key_set = config.steam_api_key.is_some(),
            "Application state initialized"
        );

        let pipeline =
            SubmissionPipeline::new(LibraryFetcher::new(Arc::new(steam)), recommender, prices);

        let idle_ttl =
            chrono::Duration::from_std(Duration::from_secs(config.session_idle_ttl_secs))?;

        Ok(Self::new(
            pipeline,
            SessionStore::with_idle_ttl(idle_ttl),
            config.unplayed_display_limit,
        ))
    }
}
