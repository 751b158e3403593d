use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// NBA halftime monitor: pregame line capture, halftime alerts, daily recap
#[derive(Parser, Debug, Clone)]
#[command(name = "halftime-edge", version, about)]
pub struct Config {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Log alerts instead of posting them to Discord
    #[arg(long, env = "DRY_RUN", default_value = "false")]
    pub dry_run: bool,

    /// SQLite alert journal path
    #[arg(long, env = "DATABASE_PATH", default_value = "halftime.db")]
    pub database_path: String,

    /// Directory for the pregame snapshot and processed-events files
    #[arg(long, env = "STATE_DIR", default_value = "state")]
    pub state_dir: PathBuf,

    /// Tracked-player roster (`{"players": [...]}` or a bare array)
    #[arg(long, env = "TRACKED_PLAYERS_PATH", default_value = "state/top_scorers.json")]
    pub tracked_players_path: PathBuf,

    /// Maximum number of roster entries to track
    #[arg(long, env = "TRACKED_PLAYER_LIMIT", default_value = "50")]
    pub tracked_player_limit: usize,

    /// The Odds API key
    #[arg(long, env = "ODDS_API_KEY")]
    pub odds_api_key: Option<String>,

    /// The Odds API v4 NBA odds endpoint
    #[arg(
        long,
        env = "ODDS_API_URL",
        default_value = "https://api.the-odds-api.com/v4/sports/basketball_nba/odds"
    )]
    pub odds_api_url: String,

    /// Preferred bookmaker key (e.g. "draftkings"); first listed book otherwise
    #[arg(long, env = "BOOKMAKER")]
    pub bookmaker: Option<String>,

    /// ESPN NBA site API root
    #[arg(
        long,
        env = "SCOREBOARD_API_URL",
        default_value = "https://site.api.espn.com/apis/site/v2/sports/basketball/nba"
    )]
    pub scoreboard_api_url: String,

    /// Discord webhook URLs, comma separated
    #[arg(long, env = "DISCORD_WEBHOOK_URLS", value_delimiter = ',')]
    pub discord_webhook_urls: Vec<String>,

    /// Seconds between scoreboard polls
    #[arg(long, env = "POLL_INTERVAL_SECS", default_value = "300")]
    pub poll_interval_secs: u64,

    /// Seconds a fetched odds market stays fresh
    #[arg(long, env = "ODDS_CACHE_TTL_SECS", default_value = "300")]
    pub odds_cache_ttl_secs: u64,

    /// UTC hour the nightly capture window opens
    #[arg(long, env = "CAPTURE_START_HOUR", default_value = "17")]
    pub capture_start_hour: u32,

    /// Timeout for provider HTTP requests (seconds)
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value = "10")]
    pub http_timeout_secs: u64,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Poll continuously, running the daily setup whenever a new day starts (default)
    Run,
    /// Reset state, capture pregame lines and send the pregame summary
    Pregame,
    /// Check for new halftimes once and exit
    Once,
    /// Send the alert log and final results for one operating day
    Recap {
        /// Operating day (YYYY-MM-DD); defaults to the previous day
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

impl Config {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }

    pub fn processed_events_path(&self) -> PathBuf {
        self.state_dir.join("processed_events.json")
    }

    pub fn pregame_lines_path(&self) -> PathBuf {
        self.state_dir.join("pregame_lines.json")
    }

    /// Validate configuration values at startup
    pub fn validate(&self) -> anyhow::Result<()> {
        let needs_odds = !matches!(self.command(), Command::Recap { .. });
        if needs_odds && self.odds_api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            anyhow::bail!("ODDS_API_KEY is required to capture and compare lines.");
        }
        if !self.dry_run && self.discord_webhook_urls.iter().all(|u| u.trim().is_empty()) {
            anyhow::bail!(
                "DISCORD_WEBHOOK_URLS is required unless running with --dry-run."
            );
        }
        if self.capture_start_hour > 23 {
            anyhow::bail!("capture_start_hour must be between 0 and 23");
        }
        if self.poll_interval_secs == 0 {
            anyhow::bail!("poll_interval_secs must be positive");
        }
        if self.tracked_player_limit == 0 {
            anyhow::bail!("tracked_player_limit must be positive");
        }
        Ok(())
    }
}
