use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::db::models::MarketKind;

/// Trait every odds source must implement.
#[async_trait]
pub trait OddsProvider: Send + Sync {
    /// All currently listed games with bookmaker lines for one market.
    async fn fetch_odds(&self, market: MarketKind) -> Result<Vec<OddsEvent>>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

/// One game as the odds feed lists it (teams by full name).
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OddsEvent {
    #[serde(default)]
    pub id: String,
    pub commence_time: DateTime<Utc>,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub bookmakers: Vec<Bookmaker>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Bookmaker {
    pub key: String,
    #[serde(default)]
    pub markets: Vec<BookMarket>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BookMarket {
    pub key: String,
    #[serde(default)]
    pub outcomes: Vec<Outcome>,
}

/// A priced outcome. For spreads `name` is a team's full name; for totals
/// it is "Over" / "Under".
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Outcome {
    pub name: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub point: Option<f64>,
}
