use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::provider::{OddsEvent, OddsProvider};
use crate::db::models::MarketKind;

/// Odds provider backed by The Odds API v4.
/// Docs: <https://the-odds-api.com/liveapi/guides/v4/>
pub struct TheOddsApi {
    http: Client,
    api_key: String,
    /// Sport odds endpoint, e.g. `.../v4/sports/basketball_nba/odds`
    odds_url: String,
    regions: String,
}

impl TheOddsApi {
    pub fn new(api_key: &str, odds_url: &str, timeout_secs: u64) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(TheOddsApi {
            http,
            api_key: api_key.to_string(),
            odds_url: odds_url.to_string(),
            regions: "us".to_string(),
        })
    }

    fn request_url(&self, market: MarketKind) -> Result<Url> {
        Url::parse_with_params(
            &self.odds_url,
            &[
                ("apiKey", self.api_key.as_str()),
                ("regions", self.regions.as_str()),
                ("markets", market.as_str()),
                ("oddsFormat", "decimal"),
            ],
        )
        .with_context(|| format!("Invalid odds URL '{}'", self.odds_url))
    }
}

#[async_trait]
impl OddsProvider for TheOddsApi {
    fn name(&self) -> &str {
        "TheOddsAPI"
    }

    async fn fetch_odds(&self, market: MarketKind) -> Result<Vec<OddsEvent>> {
        let url = self.request_url(market)?;
        debug!("Fetching {} odds from {}", market.as_str(), self.odds_url);

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .context("Odds API request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Odds API error {}: {}", status, body);
        }

        if let Some(remaining) = resp
            .headers()
            .get("x-requests-remaining")
            .and_then(|v| v.to_str().ok())
        {
            debug!("Odds API requests remaining: {}", remaining);
        }

        let body = resp.text().await.context("Failed to read odds response")?;
        parse_odds_response(&body)
    }
}

/// Parse the odds endpoint's JSON array. Events that don't match the
/// expected shape are skipped rather than failing the whole batch.
pub fn parse_odds_response(body: &str) -> Result<Vec<OddsEvent>> {
    let raw: serde_json::Value =
        serde_json::from_str(body).context("Failed to parse odds response")?;
    let Some(items) = raw.as_array() else {
        anyhow::bail!("Odds response is not an array");
    };
    let events = items
        .iter()
        .filter_map(|item| match serde_json::from_value::<OddsEvent>(item.clone()) {
            Ok(ev) => Some(ev),
            Err(e) => {
                debug!("Skipping malformed odds event: {}", e);
                None
            }
        })
        .collect();
    Ok(events)
}
