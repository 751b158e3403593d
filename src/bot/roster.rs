//! Tracked-player roster: the high-usage scorers whose halftime pace is
//! worth an alert. Rebuilt from disk once per operating day.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use super::confidence::EXPECTED_LEAGUE_LEADER_PPG;
use crate::db::json_file;
use crate::db::models::TrackedPlayer;
use crate::identity::{normalize_player_name, NormalizedName};

/// Default roster size.
pub const TRACKED_PLAYER_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
struct RosterEntry {
    name: String,
    ppg: f64,
    #[serde(default)]
    ppg_weight: Option<f64>,
}

/// `{ "players": [...] }` or a bare `[...]`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RosterFile {
    Wrapped { players: Vec<RosterEntry> },
    Bare(Vec<RosterEntry>),
}

impl RosterFile {
    fn into_entries(self) -> Vec<RosterEntry> {
        match self {
            RosterFile::Wrapped { players } | RosterFile::Bare(players) => players,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct TrackedRoster {
    players: HashMap<NormalizedName, TrackedPlayer>,
}

impl TrackedRoster {
    /// Load the roster file, keeping the first `limit` entries in file
    /// order. A missing or unreadable file yields an empty roster.
    pub fn load(path: &Path, limit: usize) -> Self {
        match json_file::load::<RosterFile>(path) {
            Some(file) => {
                let roster = Self::from_entries(file.into_entries(), limit);
                info!("Tracking {} player(s) from {}", roster.len(), path.display());
                roster
            }
            None => {
                warn!("No tracked-player roster at {}; player alerts disabled", path.display());
                Self::default()
            }
        }
    }

    fn from_entries(entries: Vec<RosterEntry>, limit: usize) -> Self {
        let players = entries
            .into_iter()
            .take(limit)
            .map(|e| {
                let weight = e
                    .ppg_weight
                    .filter(|w| w.is_finite())
                    .unwrap_or(e.ppg / EXPECTED_LEAGUE_LEADER_PPG);
                let player = TrackedPlayer {
                    normalized_name: normalize_player_name(&e.name),
                    display_name: e.name,
                    season_ppg: e.ppg,
                    ppg_weight: weight.clamp(0.0, 1.0),
                };
                (player.normalized_name.clone(), player)
            })
            .collect();
        TrackedRoster { players }
    }

    pub fn get(&self, name: &NormalizedName) -> Option<&TrackedPlayer> {
        self.players.get(name)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
