//! Halftime confidence model and alert copy.
//!
//! The player score is a weighted sum of five sub-signals, each already in
//! [0, 1]:
//!
//! | signal | meaning                                          | weight |
//! |--------|--------------------------------------------------|--------|
//! | U      | share of expected half-points already scored     | 0.35 (as 1-U) |
//! | M      | minutes played vs. a normal half                 | 0.20   |
//! | Y      | field-goal attempts vs. a normal half            | 0.20   |
//! | C      | closeness of the game                            | 0.15   |
//! | P      | superstar weight (PPG vs. league leader)         | 0.10   |
//!
//! `1-U` is used so that colder players score *higher*: the alert is about
//! second-half upside, not about how bad the first half was.

use rand::seq::SliceRandom;
use rand::Rng;

/// Minutes a starter typically logs in one half.
pub const EXPECTED_HALF_MINUTES: f64 = 18.0;
/// Field-goal attempts a high-usage player typically takes in one half.
pub const EXPECTED_HALF_FGA: f64 = 10.0;
/// PPG of the league's leading scorer; also the fallback when a player's
/// own average is missing.
pub const EXPECTED_LEAGUE_LEADER_PPG: f64 = 30.0;
/// Score margin at which the competitiveness signal reaches zero.
const BLOWOUT_MARGIN: f64 = 25.0;

const W_UNDERPERFORMANCE: f64 = 0.35;
const W_MINUTES: f64 = 0.20;
const W_USAGE: f64 = 0.20;
const W_COMPETITIVENESS: f64 = 0.15;
const W_SUPERSTAR: f64 = 0.10;

/// Composite halftime confidence for a tracked player, in `[0, 1]`,
/// rounded to two decimals.
///
/// * `avg_ppg` of zero (or non-finite) falls back to half the league
///   leader's average as the expected half.
/// * `fga` of `None` contributes nothing to the usage term.
pub fn score_player_confidence(
    points: f64,
    avg_ppg: f64,
    minutes: f64,
    fga: Option<f64>,
    home_score: i32,
    away_score: i32,
    ppg_weight: f64,
) -> f64 {
    let expected_half_points = if avg_ppg.is_finite() && avg_ppg > 0.0 {
        avg_ppg / 2.0
    } else {
        EXPECTED_LEAGUE_LEADER_PPG / 2.0
    };

    let u = unit(points / expected_half_points);
    let m = unit(minutes / EXPECTED_HALF_MINUTES);
    let y = fga.map(|a| unit(a / EXPECTED_HALF_FGA)).unwrap_or(0.0);
    let margin = (home_score - away_score).abs() as f64;
    let c = (1.0 - margin / BLOWOUT_MARGIN).max(0.0);
    let p = unit(ppg_weight);

    let raw = (1.0 - u) * W_UNDERPERFORMANCE
        + m * W_MINUTES
        + y * W_USAGE
        + c * W_COMPETITIVENESS
        + p * W_SUPERSTAR;

    let clamped = if raw.is_finite() { raw.clamp(0.0, 1.0) } else { 0.0 };
    (clamped * 100.0).round() / 100.0
}

/// Clamp a ratio into `[0, 1]`, mapping NaN to 0.
fn unit(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

/// Which banded label table applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertFamily {
    /// Player confidence score in `[0, 1]`
    Points,
    /// Fractional total movement (0.07 = 7%)
    Total,
    /// Spread movement in points
    Spread,
}

type Band = (f64, &'static [&'static str]);

const POINTS_BANDS: &[Band] = &[
    (0.30, &["Fade him", "Let this one go", "Not the night"]),
    (0.50, &["Lowkey could turn it up", "Keep an eye on it", "Second-half bounce possible"]),
    (0.60, &["Get the line while it's low", "Buy the dip", "Line's soft, take a look"]),
    (f64::INFINITY, &["Hammer the over 🔨🔒", "Smash the over", "Max it on the over"]),
];

const TOTAL_BANDS: &[Band] = &[
    (0.05, &["Not worth touching", "Pass on it"]),
    (0.10, &["It's worth considering", "Worth a look at"]),
    (0.15, &["Tail the", "Lean"]),
    (f64::INFINITY, &["Hammer the", "Smash the"]),
];

const SPREAD_BANDS: &[Band] = &[
    (3.0, &["Not worth touching", "Pass on it"]),
    (6.0, &["Consider taking the cover for", "Worth a look at"]),
    (9.0, &["Tail the", "Lean"]),
    (f64::INFINITY, &["Hammer the", "Smash the"]),
];

fn bands(family: AlertFamily) -> &'static [Band] {
    match family {
        AlertFamily::Points => POINTS_BANDS,
        AlertFamily::Total => TOTAL_BANDS,
        AlertFamily::Spread => SPREAD_BANDS,
    }
}

/// Pick alert copy for `value`: the first band whose threshold is `>= value`,
/// then one phrase from that band drawn with `rng`.
///
/// The last band of every family is unbounded, so any input (NaN included)
/// yields a label.
pub fn label_for_confidence<R: Rng + ?Sized>(
    value: f64,
    family: AlertFamily,
    rng: &mut R,
) -> &'static str {
    let table = bands(family);
    let phrases = table
        .iter()
        .find(|(threshold, _)| value <= *threshold)
        .or_else(|| table.last())
        .map(|(_, phrases)| *phrases)
        .unwrap_or(&[]);
    phrases.choose(rng).copied().unwrap_or("Worth a look")
}
