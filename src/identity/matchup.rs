use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::TeamCode;

/// Canonical address of one game: away team @ home team.
///
/// Built only from normalized [`TeamCode`]s; every snapshot read and write
/// goes through this key, never through raw provider strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatchupKey {
    pub away: TeamCode,
    pub home: TeamCode,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseMatchupError {
    #[error("matchup '{0}' is missing the ' @ ' separator")]
    MissingSeparator(String),
    #[error("matchup '{0}' has an empty team code")]
    EmptyTeam(String),
}

impl MatchupKey {
    pub fn new(away: TeamCode, home: TeamCode) -> Self {
        MatchupKey { away, home }
    }
}

impl fmt::Display for MatchupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.away, self.home)
    }
}

impl FromStr for MatchupKey {
    type Err = ParseMatchupError;

    /// Parses the persisted `"AWY @ HOME"` form. Codes are taken as
    /// already canonical.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (away, home) = s
            .split_once(" @ ")
            .ok_or_else(|| ParseMatchupError::MissingSeparator(s.to_string()))?;
        if away.trim().is_empty() || home.trim().is_empty() {
            return Err(ParseMatchupError::EmptyTeam(s.to_string()));
        }
        Ok(MatchupKey::new(
            TeamCode::canonical(away),
            TeamCode::canonical(home),
        ))
    }
}

// Serialized as the "AWY @ HOME" string so it can key JSON objects.
impl Serialize for MatchupKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MatchupKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
