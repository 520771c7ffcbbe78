/// Store price lookup service
///
/// One GET per app: `/price?appid=<id>&cc=<country>` answering
/// `{ "price": number | null }`.
use crate::{
    error::{AppError, AppResult},
    models::PriceResponse,
    services::providers::PriceProvider,
};
use reqwest::Client as HttpClient;

const SERVICE: &str = "Price service";

#[derive(Clone)]
pub struct StorePriceProvider {
    http_client: HttpClient,
    api_url: String,
    currency: String,
}

impl StorePriceProvider {
    pub fn new(http_client: HttpClient, api_url: String, currency: String) -> Self {
        Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            currency,
        }
    }
}

#[async_trait::async_trait]
impl PriceProvider for StorePriceProvider {
    async fn fetch_price(&self, app_id: u32) -> AppResult<Option<f64>> {
        let url = format!("{}/price", self.api_url);
        let app_id_param = app_id.to_string();

        let response = self
            .http_client
            .get(&url)
            .query(&[("appid", app_id_param.as_str()), ("cc", self.currency.as_str())])
            .send()
            .await
            .map_err(|e| {
                AppError::EnrichmentFailed(format!("price request failed: {}", e.without_url()))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::EnrichmentFailed(format!("price response unreadable: {}", e.without_url()))
        })?;

        if !status.is_success() {
            return Err(AppError::UpstreamRejected {
                service: SERVICE,
                status: status.as_u16(),
                body,
            });
        }

        let parsed: PriceResponse =
            serde_json::from_str(&body).map_err(|e| AppError::UpstreamMalformed {
                service: SERVICE,
                details: e.to_string(),
            })?;

        tracing::debug!(app_id = app_id, price = ?parsed.amount(), "Price fetched");

        Ok(parsed.amount())
    }
}
