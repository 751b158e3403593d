//! Halftime spread movement against the pregame line.

use rand::Rng;
use std::time::Instant;

use super::confidence::{label_for_confidence, AlertFamily};
use crate::db::models::MarketKind;
use crate::identity::{MatchupKey, TeamCode};
use crate::odds::OddsProvider;
use crate::snapshot::LineBook;

/// Point move that is worth reporting on its own.
pub const SPREAD_MOVE_TRIGGER: f64 = 3.0;

/// Which pregame side the alert points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Favorite,
    Underdog,
}

/// Look up both lines for `key` and describe the move, if it matters.
pub async fn analyze_spread_movement<R: Rng + ?Sized>(
    book: &mut LineBook,
    odds: &dyn OddsProvider,
    key: &MatchupKey,
    now: Instant,
    rng: &mut R,
) -> Vec<String> {
    let Some(pregame) = book.pregame_line(key).and_then(|l| l.spread) else {
        return vec![];
    };
    let Some(live) = book.live_line(odds, key, MarketKind::Spreads, now).await else {
        return vec![];
    };
    spread_alert(key, pregame, live, rng).into_iter().collect()
}

/// The favorite holds the pick unless the underdog is already beating the
/// pregame number by the live market's own estimate of the margin.
pub fn pick_side(pregame: f64, live: f64) -> Side {
    let margin = -live;
    let side_margin = if pregame < 0.0 { margin } else { -margin };
    if side_margin > pregame.abs() {
        Side::Underdog
    } else {
        Side::Favorite
    }
}

/// Alert text for a home-relative spread moving from `pregame` to `live`.
pub fn spread_alert<R: Rng + ?Sized>(
    key: &MatchupKey,
    pregame: f64,
    live: f64,
    rng: &mut R,
) -> Option<String> {
    let delta = live - pregame;
    let flip = pregame < 0.0 && live > 0.0;
    if delta.abs() < SPREAD_MOVE_TRIGGER && !flip {
        return None;
    }

    let home_favored = pregame < 0.0;
    let (favorite, underdog): (&TeamCode, &TeamCode) = if home_favored {
        (&key.home, &key.away)
    } else {
        (&key.away, &key.home)
    };
    let (team, line) = match pick_side(pregame, live) {
        Side::Favorite => (favorite, if home_favored { live } else { -live }),
        Side::Underdog => (underdog, if home_favored { -live } else { live }),
    };

    let marker = if flip { "🚨 UPSET WATCH:" } else { "↔️" };
    let label = label_for_confidence(delta.abs(), AlertFamily::Spread, rng);
    Some(format!(
        "{} Spread changed by {:.1} pts (Pre: {:+.1}, Live: {:+.1})\nTake: {} {} {:+.1}",
        marker,
        delta.abs(),
        pregame,
        live,
        label,
        team,
        line
    ))
}
