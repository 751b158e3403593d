//! Cross-provider identity resolution.
//!
//! The scoreboard feed and the odds feed spell the same teams differently
//! ("GS" vs "Golden State Warriors"), and player names drift in punctuation
//! ("P.J. Washington" vs "PJ Washington").  Everything downstream compares
//! canonical forms only, so this module is the single place that knows about
//! source-specific spellings.
//!
//! Unknown spellings never fail: team codes fall back to the raw input and
//! surface later as a lookup miss rather than a crash.

pub mod matchup;

pub use matchup::{MatchupKey, ParseMatchupError};

use std::fmt;

/// Which provider a raw identifier came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceSystem {
    /// ESPN scoreboard / boxscore abbreviations ("GS", "NO", "UTAH").
    Scoreboard,
    /// The Odds API full team names ("Golden State Warriors").
    Odds,
}

/// Canonical three-letter team code ("GSW", "NOP", ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TeamCode(String);

impl TeamCode {
    /// Wrap a code that is already canonical (persisted keys, constants).
    /// Input is trimmed and upper-cased but not alias-mapped.
    pub fn canonical(code: &str) -> Self {
        TeamCode(code.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this code is one of the 30 known franchises.
    pub fn is_known(&self) -> bool {
        full_name(self).is_some()
    }
}

impl fmt::Display for TeamCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical code → full franchise name, as the odds feed spells it.
/// Total over the league and injective in this direction.
const TEAMS: &[(&str, &str)] = &[
    ("ATL", "Atlanta Hawks"),
    ("BOS", "Boston Celtics"),
    ("BKN", "Brooklyn Nets"),
    ("CHA", "Charlotte Hornets"),
    ("CHI", "Chicago Bulls"),
    ("CLE", "Cleveland Cavaliers"),
    ("DAL", "Dallas Mavericks"),
    ("DEN", "Denver Nuggets"),
    ("DET", "Detroit Pistons"),
    ("GSW", "Golden State Warriors"),
    ("HOU", "Houston Rockets"),
    ("IND", "Indiana Pacers"),
    ("LAC", "Los Angeles Clippers"),
    ("LAL", "Los Angeles Lakers"),
    ("MEM", "Memphis Grizzlies"),
    ("MIA", "Miami Heat"),
    ("MIL", "Milwaukee Bucks"),
    ("MIN", "Minnesota Timberwolves"),
    ("NOP", "New Orleans Pelicans"),
    ("NYK", "New York Knicks"),
    ("OKC", "Oklahoma City Thunder"),
    ("ORL", "Orlando Magic"),
    ("PHI", "Philadelphia 76ers"),
    ("PHX", "Phoenix Suns"),
    ("POR", "Portland Trail Blazers"),
    ("SAC", "Sacramento Kings"),
    ("SAS", "San Antonio Spurs"),
    ("TOR", "Toronto Raptors"),
    ("UTA", "Utah Jazz"),
    ("WAS", "Washington Wizards"),
];

/// Scoreboard abbreviations that differ from the canonical code.
const SCOREBOARD_ALIASES: &[(&str, &str)] = &[
    ("GS", "GSW"),
    ("NO", "NOP"),
    ("NY", "NYK"),
    ("SA", "SAS"),
    ("UTAH", "UTA"),
    ("PHO", "PHX"),
    ("WSH", "WAS"),
    ("INDY", "IND"),
    ("CHAR", "CHA"),
    ("BRK", "BKN"),
];

/// Odds-feed spellings that are not the canonical full name.
const ODDS_ALIASES: &[(&str, &str)] = &[("LA Clippers", "LAC"), ("LA Lakers", "LAL")];

/// Map a raw provider identifier to its canonical team code.
///
/// Unmapped input comes back unchanged (upper-cased for the scoreboard,
/// trimmed for the odds feed) so a formatting drift shows up as a missed
/// lookup downstream instead of an error here.
pub fn normalize_team(raw: &str, source: SourceSystem) -> TeamCode {
    let raw = raw.trim();
    match source {
        SourceSystem::Scoreboard => {
            let upper = raw.to_uppercase();
            let code = SCOREBOARD_ALIASES
                .iter()
                .find(|(alias, _)| *alias == upper)
                .map(|(_, code)| code.to_string())
                .unwrap_or(upper);
            TeamCode(code)
        }
        SourceSystem::Odds => {
            let by_name = TEAMS
                .iter()
                .map(|(code, name)| (*code, *name))
                .chain(ODDS_ALIASES.iter().map(|(name, code)| (*code, *name)))
                .find(|(_, name)| name.eq_ignore_ascii_case(raw))
                .map(|(code, _)| code.to_string());
            TeamCode(by_name.unwrap_or_else(|| raw.to_string()))
        }
    }
}

/// Canonical code → odds-feed full name. `None` for unknown codes.
pub fn full_name(code: &TeamCode) -> Option<&'static str> {
    TEAMS
        .iter()
        .find(|(c, _)| *c == code.as_str())
        .map(|(_, name)| *name)
}

/// Player name reduced to the form used for every cross-provider comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedName(String);

impl NormalizedName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lower-case and strip `.`, `'`, `’`, `-` and all whitespace.
///
/// Both the boxscore rows and the tracked roster MUST go through this before
/// any equality check; a single un-normalized side silently drops every
/// player match for the night.
pub fn normalize_player_name(raw: &str) -> NormalizedName {
    NormalizedName(
        raw.chars()
            .filter(|c| !matches!(c, '.' | '\'' | '’' | '-') && !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect(),
    )
}
