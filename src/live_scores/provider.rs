use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::db::models::{BoxscoreRow, LiveGame};

/// Trait that every scoreboard provider must implement.
#[async_trait]
pub trait ScoreProvider: Send + Sync {
    /// All games listed on the given scoreboard dates, de-duplicated by
    /// event id, with team codes already canonical.
    async fn fetch_games(&self, dates: &[NaiveDate]) -> Result<Vec<LiveGame>>;

    /// Per-player lines for one game. An empty vector means the provider
    /// has no boxscore yet.
    async fn fetch_boxscore(&self, event_id: &str) -> Result<Vec<BoxscoreRow>>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}
