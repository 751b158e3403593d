use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use std::collections::HashSet;
use tracing::{debug, warn};

use super::provider::ScoreProvider;
use crate::db::models::{BoxscoreRow, GameStatus, LiveGame};
use crate::identity::{normalize_player_name, normalize_team, MatchupKey, SourceSystem};

/// Scoreboard provider backed by ESPN's public site API.
pub struct Espn {
    http: Client,
    /// League root, e.g. `https://site.api.espn.com/apis/site/v2/sports/basketball/nba`
    base_url: String,
}

impl Espn {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Espn {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json(&self, url: &str) -> Result<serde_json::Value> {
        let resp = self.http.get(url).send().await.context("ESPN request failed")?;
        if !resp.status().is_success() {
            anyhow::bail!("ESPN error: {}", resp.status());
        }
        resp.json().await.context("Failed to parse ESPN response")
    }
}

#[async_trait]
impl ScoreProvider for Espn {
    fn name(&self) -> &str {
        "ESPN"
    }

    async fn fetch_games(&self, dates: &[NaiveDate]) -> Result<Vec<LiveGame>> {
        let mut seen = HashSet::new();
        let mut games = Vec::new();
        let mut last_err = None;

        for date in dates {
            let url = format!("{}/scoreboard?dates={}", self.base_url, date.format("%Y%m%d"));
            debug!("Fetching scoreboard {}", url);
            match self.get_json(&url).await {
                Ok(raw) => {
                    for game in parse_scoreboard_response(&raw) {
                        if seen.insert(game.event_id.clone()) {
                            games.push(game);
                        }
                    }
                }
                Err(e) => {
                    warn!("ESPN scoreboard for {} failed: {:#}", date, e);
                    last_err = Some(e);
                }
            }
        }

        match last_err {
            Some(e) if games.is_empty() && !dates.is_empty() => Err(e),
            _ => Ok(games),
        }
    }

    async fn fetch_boxscore(&self, event_id: &str) -> Result<Vec<BoxscoreRow>> {
        let url = format!("{}/summary?event={}", self.base_url, event_id);
        let raw = self.get_json(&url).await?;
        Ok(parse_boxscore_response(&raw))
    }
}

pub(crate) fn parse_scoreboard_response(raw: &serde_json::Value) -> Vec<LiveGame> {
    let Some(events) = raw["events"].as_array() else {
        return vec![];
    };

    events
        .iter()
        .filter_map(|ev| {
            let event_id = ev["id"].as_str()?.to_string();
            let competitors = ev["competitions"][0]["competitors"].as_array()?;

            let mut home = None;
            let mut away = None;
            for c in competitors {
                let abbr = c["team"]["abbreviation"].as_str()?;
                let score = c["score"]
                    .as_str()
                    .and_then(|s| s.parse::<i32>().ok())
                    .or_else(|| c["score"].as_i64().map(|v| v as i32))
                    .unwrap_or(0);
                let side = (normalize_team(abbr, SourceSystem::Scoreboard), score);
                match c["homeAway"].as_str() {
                    Some("home") => home = Some(side),
                    Some("away") => away = Some(side),
                    _ => {}
                }
            }
            let (home_team, home_score) = home?;
            let (away_team, away_score) = away?;
            for team in [&home_team, &away_team] {
                if !team.is_known() {
                    debug!("Event {}: unmapped team code '{}'", event_id, team);
                }
            }

            let status_type = &ev["status"]["type"];
            let status_detail = status_type["description"]
                .as_str()
                .or_else(|| ev["status"]["detail"].as_str())
                .unwrap_or_default()
                .to_string();
            let status = status_from_fields(
                status_type["name"].as_str().unwrap_or_default(),
                status_type["state"].as_str().unwrap_or_default(),
                &status_detail,
            );

            Some(LiveGame {
                event_id,
                matchup: MatchupKey::new(away_team, home_team),
                home_score,
                away_score,
                status,
                status_detail,
            })
        })
        .collect()
}

fn status_from_fields(name: &str, state: &str, detail: &str) -> GameStatus {
    if name == "STATUS_HALFTIME" || detail.contains("Halftime") {
        GameStatus::HalfTime
    } else if state == "post" || name.starts_with("STATUS_FINAL") {
        GameStatus::Finished
    } else if state == "pre" || name == "STATUS_SCHEDULED" {
        GameStatus::Scheduled
    } else {
        GameStatus::InProgress
    }
}

/// Flatten the summary boxscore into one row per listed athlete.
///
/// Columns are located by label (`MIN`, `PTS`, `FG`) so reordering on the
/// provider side doesn't shift values.
pub(crate) fn parse_boxscore_response(raw: &serde_json::Value) -> Vec<BoxscoreRow> {
    let Some(blocks) = raw["boxscore"]["players"].as_array() else {
        return vec![];
    };

    let mut rows = Vec::new();
    for block in blocks {
        let team = normalize_team(
            block["team"]["abbreviation"].as_str().unwrap_or_default(),
            SourceSystem::Scoreboard,
        );
        let stats = &block["statistics"][0];
        let labels: Vec<&str> = stats["labels"]
            .as_array()
            .map(|a| a.iter().filter_map(|l| l.as_str()).collect())
            .unwrap_or_default();
        let col = |label: &str| labels.iter().position(|l| *l == label);
        let (idx_min, idx_pts, idx_fg) = (col("MIN"), col("PTS"), col("FG"));

        let Some(athletes) = stats["athletes"].as_array() else {
            continue;
        };
        for a in athletes {
            let Some(name) = a["athlete"]["displayName"].as_str() else {
                continue;
            };
            let values: Vec<&str> = a["stats"]
                .as_array()
                .map(|s| s.iter().map(|v| v.as_str().unwrap_or_default()).collect())
                .unwrap_or_default();
            let stat = |idx: Option<usize>| idx.and_then(|i| values.get(i).copied());

            rows.push(BoxscoreRow {
                normalized_name: normalize_player_name(name),
                display_name: name.to_string(),
                team: team.clone(),
                points: stat(idx_pts).and_then(|s| s.parse().ok()).unwrap_or(0),
                minutes: stat(idx_min).unwrap_or("0:00").to_string(),
                field_goal_attempts: stat(idx_fg).and_then(parse_attempts),
            });
        }
    }
    rows
}

/// Attempts from a "made-attempted" shooting column, e.g. `"4-11"` → 11.
fn parse_attempts(made_attempted: &str) -> Option<u32> {
    made_attempted
        .split_once('-')
        .and_then(|(_, a)| a.trim().parse().ok())
}
