//! Halftime game-total movement against the pregame line.
//!
//! The pick fades the move: a total pushed up at the break leans Under,
//! one pulled down leans Over.

use rand::Rng;
use std::time::Instant;

use super::confidence::{label_for_confidence, AlertFamily};
use crate::db::models::MarketKind;
use crate::identity::MatchupKey;
use crate::odds::OddsProvider;
use crate::snapshot::LineBook;

/// Relative move (5%) that is worth reporting.
pub const TOTAL_MOVE_TRIGGER: f64 = 0.05;

pub async fn analyze_total_movement<R: Rng + ?Sized>(
    book: &mut LineBook,
    odds: &dyn OddsProvider,
    key: &MatchupKey,
    now: Instant,
    rng: &mut R,
) -> Vec<String> {
    let Some(pregame) = book.pregame_line(key).and_then(|l| l.total) else {
        return vec![];
    };
    let Some(live) = book.live_line(odds, key, MarketKind::Totals, now).await else {
        return vec![];
    };
    total_alert(pregame, live, rng).into_iter().collect()
}

pub fn total_alert<R: Rng + ?Sized>(pregame: f64, live: f64, rng: &mut R) -> Option<String> {
    if !(pregame > 0.0) {
        return None;
    }
    let delta = live - pregame;
    let pct = delta.abs() / pregame;
    if !(pct >= TOTAL_MOVE_TRIGGER) {
        return None;
    }

    let (tag, direction, pick) = if delta > 0.0 {
        ("📈", "up", "Under")
    } else {
        ("📉", "down", "Over")
    };
    let label = label_for_confidence(pct, AlertFamily::Total, rng);
    Some(format!(
        "{tag} Total moved {direction} {:.1} pts (Pre: {pregame:.1}, Live: {live:.1})\nTake: {label} {pick} {live:.1}",
        delta.abs()
    ))
}
