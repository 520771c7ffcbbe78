use serde::Deserialize;

/// Which recommendation policy the server runs
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// Suggest owned games with little or no playtime
    #[default]
    Local,
    /// Forward the library to an external scoring service
    Delegated,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Steam Web API key. Lookups fail at request time when absent.
    #[serde(default)]
    pub steam_api_key: Option<String>,

    /// Steam Web API base URL
    #[serde(default = "default_steam_api_url")]
    pub steam_api_url: String,

    #[serde(default)]
    pub recommendation_policy: PolicyKind,

    /// Scoring service base URL, required by the delegated policy
    #[serde(default)]
    pub recommender_api_url: Option<String>,

    /// Store price service base URL. Pricing is skipped when unset.
    #[serde(default)]
    pub price_api_url: Option<String>,

    /// Country code passed to the price service
    #[serde(default = "default_price_currency")]
    pub price_currency: String,

    /// Local policy: games under this many minutes count as unplayed
    #[serde(default = "default_unplayed_threshold_minutes")]
    pub unplayed_threshold_minutes: u64,

    /// Local policy: maximum number of recommendations
    #[serde(default = "default_recommendation_limit")]
    pub recommendation_limit: usize,

    /// How many never-played games the view lists
    #[serde(default = "default_unplayed_display_limit")]
    pub unplayed_display_limit: usize,

    /// Timeout applied to every outbound request
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Sessions idle for longer than this are dropped
    #[serde(default = "default_session_idle_ttl_secs")]
    pub session_idle_ttl_secs: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_steam_api_url() -> String {
    "https://api.steampowered.com".to_string()
}

fn default_price_currency() -> String {
    "US".to_string()
}

fn default_unplayed_threshold_minutes() -> u64 {
    60
}

fn default_recommendation_limit() -> usize {
    3
}

fn default_unplayed_display_limit() -> usize {
    5
}

fn default_http_timeout_secs() -> u64 {
    10
}

fn default_session_idle_ttl_secs() -> u64 {
    30 * 60
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks combinations envy cannot express on its own
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.recommendation_policy == PolicyKind::Delegated
            && self.recommender_api_url.is_none()
        {
            anyhow::bail!("RECOMMENDER_API_URL must be set when RECOMMENDATION_POLICY=delegated");
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
