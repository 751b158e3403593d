use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;

use crate::identity::{MatchupKey, NormalizedName, TeamCode};

/// Game state as reported by the scoreboard provider, already normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveGame {
    /// Scoreboard event ID (also the boxscore lookup key)
    pub event_id: String,
    pub matchup: MatchupKey,
    pub home_score: i32,
    pub away_score: i32,
    pub status: GameStatus,
    /// Provider text, e.g. "Halftime", "Final", "3rd Quarter"
    pub status_detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Scheduled,
    InProgress,
    HalfTime,
    Finished,
}

/// One player's line from a live boxscore.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxscoreRow {
    pub normalized_name: NormalizedName,
    pub display_name: String,
    pub team: TeamCode,
    pub points: u32,
    /// Raw "mm:ss" (or bare minutes) string from the provider
    pub minutes: String,
    /// Field-goal attempts; `None` when the provider omitted the FG column
    pub field_goal_attempts: Option<u32>,
}

/// A high-usage player whose halftime pace we watch.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedPlayer {
    pub normalized_name: NormalizedName,
    pub display_name: String,
    pub season_ppg: f64,
    /// season_ppg / league-leader PPG, clamped to ≤ 1
    pub ppg_weight: f64,
}

/// Odds market the line book tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarketKind {
    Spreads,
    Totals,
}

impl MarketKind {
    /// Market key as the odds provider spells it.
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketKind::Spreads => "spreads",
            MarketKind::Totals => "totals",
        }
    }
}

/// Pregame spread/total captured for one matchup on one operating day.
#[derive(Debug, Clone, PartialEq)]
pub struct PregameLine {
    pub matchup: MatchupKey,
    /// Home-relative spread (negative = home favoured)
    pub spread: Option<f64>,
    pub total: Option<f64>,
    pub captured_date: NaiveDate,
}

/// What produced an alert line; stored with each journal row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Player,
    Spread,
    Total,
    /// Operator-facing data gap (e.g. missing boxscore)
    Notice,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Player => "player",
            AlertKind::Spread => "spread",
            AlertKind::Total => "total",
            AlertKind::Notice => "notice",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "player" => AlertKind::Player,
            "spread" => AlertKind::Spread,
            "total" => AlertKind::Total,
            _ => AlertKind::Notice,
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sent halftime alert, as recorded in the journal.
#[derive(Debug, Clone)]
pub struct AlertRecord {
    pub id: Option<i64>,
    pub operating_date: NaiveDate,
    pub event_id: String,
    /// "AWY @ HOME"
    pub matchup: String,
    pub kind: AlertKind,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}
