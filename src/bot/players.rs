//! Halftime underperformance check for tracked players.

use rand::Rng;
use tracing::{debug, warn};

use super::confidence::{label_for_confidence, score_player_confidence, AlertFamily};
use super::roster::TrackedRoster;
use crate::db::models::{BoxscoreRow, LiveGame};
use crate::live_scores::ScoreProvider;

/// Minutes below which a stint is too short to judge (unless the player
/// has already scored).
pub const MIN_SAMPLE_MINUTES: f64 = 5.0;
const MIN_SAMPLE_POINTS: u32 = 5;
/// Alert when a player has fewer than this share of his season average.
pub const UNDERPERFORMANCE_PACE: f64 = 0.50;

/// Prefix for operator-facing lines that report a data gap, not a pick.
pub const NOTICE_MARKER: &str = "⚠️";

/// `"mm:ss"` or bare `"mm"` to fractional minutes. Anything else is 0.
pub fn parse_minutes(raw: &str) -> f64 {
    let raw = raw.trim();
    let parsed = match raw.split_once(':') {
        Some((mm, ss)) => mm
            .parse::<u32>()
            .ok()
            .zip(ss.parse::<u32>().ok())
            .map(|(m, s)| m as f64 + s as f64 / 60.0),
        None => raw.parse::<u32>().ok().map(|m| m as f64),
    };
    parsed.unwrap_or(0.0)
}

/// Fetch the boxscore for `game` and report every tracked player running
/// below half his season scoring average.
///
/// A missing or empty boxscore produces a single notice line instead.
pub async fn analyze_game_players<R: Rng + ?Sized>(
    scores: &dyn ScoreProvider,
    game: &LiveGame,
    roster: &TrackedRoster,
    rng: &mut R,
) -> Vec<String> {
    let rows = match scores.fetch_boxscore(&game.event_id).await {
        Ok(rows) if !rows.is_empty() => rows,
        Ok(_) => {
            warn!("{}: empty boxscore for {}", scores.name(), game.matchup);
            return vec![boxscore_notice(game)];
        }
        Err(e) => {
            warn!("{}: boxscore for {} failed: {:#}", scores.name(), game.matchup, e);
            return vec![boxscore_notice(game)];
        }
    };
    debug!("{}: {} boxscore row(s)", game.matchup, rows.len());
    evaluate_rows(&rows, roster, game.home_score, game.away_score, rng)
}

fn boxscore_notice(game: &LiveGame) -> String {
    format!("{NOTICE_MARKER} Boxscore unavailable for {}", game.matchup)
}

/// Alert lines for `rows`, in row order.
pub fn evaluate_rows<R: Rng + ?Sized>(
    rows: &[BoxscoreRow],
    roster: &TrackedRoster,
    home_score: i32,
    away_score: i32,
    rng: &mut R,
) -> Vec<String> {
    let mut alerts = Vec::new();
    for row in rows {
        let minutes = parse_minutes(&row.minutes);
        if row.points == 0 && minutes == 0.0 {
            continue;
        }
        if minutes < MIN_SAMPLE_MINUTES && row.points < MIN_SAMPLE_POINTS {
            continue;
        }
        let Some(player) = roster.get(&row.normalized_name) else {
            continue;
        };

        let points = row.points as f64;
        let pace = if player.season_ppg > 0.0 {
            points / player.season_ppg
        } else {
            0.0
        };
        if pace >= UNDERPERFORMANCE_PACE {
            continue;
        }

        let confidence = score_player_confidence(
            points,
            player.season_ppg,
            minutes,
            row.field_goal_attempts.map(f64::from),
            home_score,
            away_score,
            player.ppg_weight,
        );
        let label = label_for_confidence(confidence, AlertFamily::Points, rng);
        debug!(
            "{} pace {:.2} confidence {:.2}",
            row.display_name, pace, confidence
        );
        alerts.push(format!(
            "🎯 {}: {} pts in {} min (season avg {:.1})\nTake: {}",
            row.display_name, row.points, row.minutes, player.season_ppg, label
        ));
    }
    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::GameStatus;
    use crate::live_scores::fake::{game, row, FakeScores};
    use approx::assert_relative_eq;
    use rand::rngs::mock::StepRng;

    fn roster() -> TrackedRoster {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.json");
        std::fs::write(
            &path,
            r#"[{"name":"Anthony Edwards","ppg":20.0},{"name":"Zero Average","ppg":0.0}]"#,
        )
        .unwrap();
        TrackedRoster::load(&path, 50)
    }

    #[test]
    fn test_parse_minutes() {
        assert_relative_eq!(parse_minutes("12:30"), 12.5);
        assert_relative_eq!(parse_minutes("17"), 17.0);
        assert_relative_eq!(parse_minutes("0:00"), 0.0);
        assert_relative_eq!(parse_minutes("--"), 0.0);
        assert_relative_eq!(parse_minutes("ab:cd"), 0.0);
        assert_relative_eq!(parse_minutes(""), 0.0);
    }

    #[test]
    fn test_cold_tracked_player_alerts() {
        let rows = [row("Anthony Edwards", "MIN", 4, "6:00", Some(5))];
        let alerts = evaluate_rows(&rows, &roster(), 50, 48, &mut StepRng::new(0, 0));
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].contains("Anthony Edwards"));
        assert!(alerts[0].contains("4 pts in 6:00 min"));
        assert!(alerts[0].contains("season avg 20.0"));
        assert!(alerts[0].contains("Take: "));
    }

    #[test]
    fn test_on_pace_player_is_quiet() {
        let rows = [row("Anthony Edwards", "MIN", 12, "6:00", Some(5))];
        assert!(evaluate_rows(&rows, &roster(), 50, 48, &mut StepRng::new(0, 0)).is_empty());
    }

    #[test]
    fn test_short_stints_and_untracked_players_are_skipped() {
        let rows = [
            row("Anthony Edwards", "MIN", 0, "0:00", None),
            row("Anthony Edwards", "MIN", 2, "3:10", Some(1)),
            row("Bench Guy", "MIN", 0, "14:00", Some(4)),
        ];
        assert!(evaluate_rows(&rows, &roster(), 50, 48, &mut StepRng::new(0, 0)).is_empty());
    }

    #[test]
    fn test_zero_average_counts_as_zero_pace() {
        let rows = [row("Zero Average", "MIN", 9, "15:00", Some(8))];
        assert_eq!(evaluate_rows(&rows, &roster(), 50, 48, &mut StepRng::new(0, 0)).len(), 1);
    }

    #[tokio::test]
    async fn test_missing_boxscore_yields_notice() {
        let scores = FakeScores::default();
        let g = game("401", "LAL @ BOS", 50, 55, GameStatus::HalfTime);
        let alerts = analyze_game_players(&scores, &g, &roster(), &mut StepRng::new(0, 0)).await;
        assert_eq!(alerts, vec!["⚠️ Boxscore unavailable for LAL @ BOS".to_string()]);

        scores.set_boxscore("401", vec![]);
        let alerts = analyze_game_players(&scores, &g, &roster(), &mut StepRng::new(0, 0)).await;
        assert!(alerts[0].starts_with(NOTICE_MARKER));
    }

    #[tokio::test]
    async fn test_boxscore_rows_flow_through() {
        let scores = FakeScores::default();
        scores.set_boxscore("401", vec![row("Anthony Edwards", "MIN", 3, "16:20", Some(9))]);
        let g = game("401", "MIN @ DEN", 50, 52, GameStatus::HalfTime);
        let alerts = analyze_game_players(&scores, &g, &roster(), &mut StepRng::new(0, 0)).await;
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].starts_with("🎯 Anthony Edwards"));
    }
}
