use chrono::{DateTime, NaiveDate, Utc};
use rand::RngCore;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::players::{analyze_game_players, NOTICE_MARKER};
use super::roster::TrackedRoster;
use super::spread::analyze_spread_movement;
use super::total::analyze_total_movement;
use crate::config::Config;
use crate::db::models::{AlertKind, AlertRecord, GameStatus, LiveGame};
use crate::db::Database;
use crate::live_scores::ScoreProvider;
use crate::notify::Notifier;
use crate::odds::{LineCache, OddsProvider};
use crate::snapshot::{scoreboard_dates, CaptureSummary, CaptureWindow, LineBook, ProcessedEvents};

const NOTHING_NOTABLE: &str = "❌ Nothing notable.";

/// The halftime monitor.  Owns all mutable state (line book, processed set,
/// roster, label RNG) and is driven one poll at a time by the caller.
pub struct HalftimeEngine {
    config: Config,
    db: Database,
    scores: Arc<dyn ScoreProvider>,
    odds: Arc<dyn OddsProvider>,
    notifier: Arc<dyn Notifier>,
    book: LineBook,
    processed: ProcessedEvents,
    roster: TrackedRoster,
    rng: Box<dyn RngCore + Send>,
    /// Operating day the last setup ran for; `None` until one has.
    setup_date: Option<NaiveDate>,
}

impl HalftimeEngine {
    pub fn new(
        config: Config,
        db: Database,
        scores: Arc<dyn ScoreProvider>,
        odds: Arc<dyn OddsProvider>,
        notifier: Arc<dyn Notifier>,
        rng: Box<dyn RngCore + Send>,
        now: DateTime<Utc>,
    ) -> Self {
        let today = CaptureWindow::containing(now, config.capture_start_hour).operating_date();
        let cache = LineCache::new(
            Duration::from_secs(config.odds_cache_ttl_secs),
            config.bookmaker.clone(),
        );
        let book = LineBook::open(
            config.pregame_lines_path(),
            today,
            config.capture_start_hour,
            cache,
        );
        let processed = ProcessedEvents::open(config.processed_events_path());
        let roster = TrackedRoster::load(&config.tracked_players_path, config.tracked_player_limit);

        // A restart mid-evening must not wipe the processed set.
        let setup_date = book.is_captured().then(|| book.date());
        if let Some(date) = setup_date {
            info!(
                "Resuming operating day {} ({} halftime(s) already handled)",
                date,
                processed.len()
            );
        }

        HalftimeEngine {
            config,
            db,
            scores,
            odds,
            notifier,
            book,
            processed,
            roster,
            rng,
            setup_date,
        }
    }

    fn operating_date(&self, now: DateTime<Utc>) -> NaiveDate {
        CaptureWindow::containing(now, self.config.capture_start_hour).operating_date()
    }

    /// Start a new operating day: clear the processed set, reload the roster,
    /// capture pregame lines and post the pregame summary.
    pub async fn daily_setup(&mut self, now: DateTime<Utc>) -> Option<CaptureSummary> {
        let date = self.operating_date(now);
        info!("Daily setup for {}", date);

        if let Err(e) = self.processed.reset() {
            error!("Failed to reset processed events: {:#}", e);
        }
        self.roster = TrackedRoster::load(
            &self.config.tracked_players_path,
            self.config.tracked_player_limit,
        );

        let summary = match self
            .book
            .capture_pregame_lines(self.odds.as_ref(), now, Instant::now())
            .await
        {
            Ok(s) => Some(s),
            Err(e) => {
                error!("Pregame capture failed: {:#}", e);
                None
            }
        };

        let body = self.pregame_summary();
        self.deliver("🚀 Pregame Lines", &body).await;
        self.setup_date = Some(date);
        summary
    }

    fn pregame_summary(&self) -> String {
        let lines = self.book.pregame_lines();
        if lines.is_empty() {
            return "⚠️ No pregame lines found.".to_string();
        }
        lines
            .iter()
            .map(|l| {
                let mut parts = Vec::new();
                if let Some(spread) = l.spread {
                    parts.push(format!("{} {:+.1}", l.matchup.home, spread));
                }
                if let Some(total) = l.total {
                    parts.push(format!("Total {:.1}", total));
                }
                format!("{}\n{}", l.matchup, parts.join(" | "))
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// One monitoring pass.  Returns how many new halftimes were handled.
    pub async fn poll_once(&mut self, now: DateTime<Utc>) -> usize {
        if self.setup_date != Some(self.operating_date(now)) {
            self.daily_setup(now).await;
        }

        let dates = scoreboard_dates(now);
        let games = match self.scores.fetch_games(&dates).await {
            Ok(g) => g,
            Err(e) => {
                warn!("{} scoreboard unavailable: {:#}", self.scores.name(), e);
                return 0;
            }
        };

        let halftimes: Vec<LiveGame> = games
            .into_iter()
            .filter(|g| g.status == GameStatus::HalfTime)
            .collect();
        if halftimes.is_empty() {
            debug!("No halftimes right now");
            return 0;
        }

        let mut handled = 0;
        for game in &halftimes {
            if self.processed.is_processed(&game.event_id) {
                continue;
            }
            info!(
                "Halftime detected: {} ({}-{}, {})",
                game.matchup, game.away_score, game.home_score, game.status_detail
            );
            self.handle_halftime(game, now).await;
            handled += 1;
        }
        if handled == 0 {
            debug!("All {} halftime(s) already processed", halftimes.len());
        } else {
            info!("Processed {} new halftime(s)", handled);
        }
        handled
    }

    async fn handle_halftime(&mut self, game: &LiveGame, now: DateTime<Utc>) {
        let clock = Instant::now();
        let odds = Arc::clone(&self.odds);
        let scores = Arc::clone(&self.scores);

        let mut alerts: Vec<(AlertKind, String)> = Vec::new();
        for line in analyze_game_players(scores.as_ref(), game, &self.roster, &mut *self.rng).await {
            let kind = if line.starts_with(NOTICE_MARKER) {
                AlertKind::Notice
            } else {
                AlertKind::Player
            };
            alerts.push((kind, line));
        }
        for line in analyze_spread_movement(
            &mut self.book,
            odds.as_ref(),
            &game.matchup,
            clock,
            &mut *self.rng,
        )
        .await
        {
            alerts.push((AlertKind::Spread, line));
        }
        for line in analyze_total_movement(
            &mut self.book,
            odds.as_ref(),
            &game.matchup,
            clock,
            &mut *self.rng,
        )
        .await
        {
            alerts.push((AlertKind::Total, line));
        }

        let title = format!("📊 {} Halftime", game.matchup);
        let body = if alerts.is_empty() {
            NOTHING_NOTABLE.to_string()
        } else {
            alerts
                .iter()
                .map(|(_, line)| line.as_str())
                .collect::<Vec<_>>()
                .join("\n\n")
        };
        self.deliver(&title, &body).await;

        let operating_date = self.operating_date(now);
        for (kind, line) in alerts {
            let record = AlertRecord {
                id: None,
                operating_date,
                event_id: game.event_id.clone(),
                matchup: game.matchup.to_string(),
                kind,
                body: line,
                sent_at: now,
            };
            if let Err(e) = self.db.insert_alert(&record) {
                error!("Failed to journal {} alert for {}: {:#}", kind, game.matchup, e);
            }
        }

        if let Err(e) = self.processed.mark_processed(&game.event_id) {
            error!("Failed to persist processed event {}: {:#}", game.event_id, e);
        }
    }

    /// Post the alert journal and final results for one operating day.
    pub async fn recap(&self, date: NaiveDate) {
        let alerts = match self.db.list_alerts_for_date(date) {
            Ok(a) => a,
            Err(e) => {
                error!("Failed to read alert journal for {}: {:#}", date, e);
                Vec::new()
            }
        };
        let finals = match self.scores.fetch_games(&[date]).await {
            Ok(games) => games,
            Err(e) => {
                warn!("{} finals for {} unavailable: {:#}", self.scores.name(), date, e);
                Vec::new()
            }
        };
        let body = recap_body(&alerts, &finals);
        self.deliver(&format!("{}'s Log", date), &body).await;
    }

    async fn deliver(&self, title: &str, body: &str) {
        if let Err(e) = self.notifier.send(title, body).await {
            error!("{} could not deliver '{}': {:#}", self.notifier.name(), title, e);
        }
    }
}

fn recap_body(alerts: &[AlertRecord], games: &[LiveGame]) -> String {
    let mut body = String::new();
    if alerts.is_empty() {
        body.push_str("⚠️ No alerts were sent.");
    } else {
        let mut by_matchup: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for a in alerts {
            by_matchup.entry(a.matchup.as_str()).or_default().push(a.body.as_str());
        }
        let sections: Vec<String> = by_matchup
            .into_iter()
            .map(|(matchup, lines)| format!("Halftime Alerts for {}:\n{}", matchup, lines.join("\n\n")))
            .collect();
        body.push_str(&sections.join("\n\n"));
    }

    let finals: Vec<String> = games
        .iter()
        .filter(|g| g.status == GameStatus::Finished)
        .map(final_line)
        .collect();
    if finals.is_empty() {
        body.push_str("\n\n⚠️ No final results found yet.");
    } else {
        body.push_str("\n\n🏁 **Final Results:**\n");
        body.push_str(&finals.join("\n"));
    }
    body
}

fn final_line(g: &LiveGame) -> String {
    format!(
        "{} → Final: {}-{} | Spread: {:+} | Total: {}",
        g.matchup,
        g.away_score,
        g.home_score,
        g.home_score - g.away_score,
        g.home_score + g.away_score
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live_scores::fake::{game, row, FakeScores};
    use crate::notify::tests::RecordingNotifier;
    use crate::odds::cache::tests::{odds_event, FakeOdds};
    use crate::db::models::MarketKind;
    use clap::Parser;
    use rand::rngs::mock::StepRng;
    use std::sync::atomic::Ordering;

    struct Harness {
        _dir: tempfile::TempDir,
        config: Config,
        db: Database,
        scores: Arc<FakeScores>,
        odds: Arc<FakeOdds>,
        notifier: Arc<RecordingNotifier>,
    }

    impl Harness {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let state = dir.path().join("state");
            let roster = dir.path().join("top_scorers.json");
            std::fs::write(&roster, r#"{"players":[{"name":"Jayson Tatum","ppg":26.0}]}"#).unwrap();
            let config = Config::try_parse_from([
                "halftime-edge",
                "--dry-run",
                "--odds-api-key",
                "k",
                "--state-dir",
                state.to_str().unwrap(),
                "--tracked-players-path",
                roster.to_str().unwrap(),
                // Every lookup sees the current fake market.
                "--odds-cache-ttl-secs",
                "0",
            ])
            .unwrap();
            Harness {
                _dir: dir,
                config,
                db: Database::open_in_memory().unwrap(),
                scores: Arc::new(FakeScores::default()),
                odds: Arc::new(FakeOdds::default()),
                notifier: Arc::new(RecordingNotifier::default()),
            }
        }

        fn engine(&self, now: DateTime<Utc>) -> HalftimeEngine {
            HalftimeEngine::new(
                self.config.clone(),
                self.db.clone(),
                self.scores.clone(),
                self.odds.clone(),
                self.notifier.clone(),
                Box::new(StepRng::new(0, 0)),
                now,
            )
        }

        fn sent(&self) -> Vec<(String, String)> {
            self.notifier.sent.lock().unwrap().clone()
        }
    }

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn slate(odds: &FakeOdds, spread: f64, total: f64) {
        odds.set(
            MarketKind::Spreads,
            vec![odds_event("Los Angeles Lakers", "Boston Celtics", "2025-11-04T00:30:00Z", MarketKind::Spreads, spread)],
        );
        odds.set(
            MarketKind::Totals,
            vec![odds_event("Los Angeles Lakers", "Boston Celtics", "2025-11-04T00:30:00Z", MarketKind::Totals, total)],
        );
    }

    #[tokio::test]
    async fn test_halftime_is_reported_exactly_once() {
        let h = Harness::new();
        slate(&h.odds, -5.0, 220.0);
        let mut engine = h.engine(at("2025-11-03T18:00:00Z"));

        let summary = engine.daily_setup(at("2025-11-03T18:00:00Z")).await.unwrap();
        assert_eq!((summary.spreads, summary.totals), (1, 1));
        let sent = h.sent();
        assert_eq!(sent[0].0, "🚀 Pregame Lines");
        assert_eq!(sent[0].1, "LAL @ BOS\nBOS -5.0 | Total 220.0");

        // Halftime: the line flipped, the total jumped, Tatum is cold.
        slate(&h.odds, 1.5, 232.0);
        h.scores.set_games(vec![
            game("401", "LAL @ BOS", 60, 48, GameStatus::HalfTime),
            game("402", "MIA @ ORL", 30, 35, GameStatus::InProgress),
        ]);
        h.scores.set_boxscore("401", vec![row("Jayson Tatum", "BOS", 4, "16:00", Some(10))]);

        assert_eq!(engine.poll_once(at("2025-11-04T01:40:00Z")).await, 1);
        assert_eq!(engine.poll_once(at("2025-11-04T01:45:00Z")).await, 0);

        let sent = h.sent();
        assert_eq!(sent.len(), 2);
        let (title, body) = &sent[1];
        assert_eq!(title, "📊 LAL @ BOS Halftime");
        assert!(body.contains("🎯 Jayson Tatum"), "{body}");
        assert!(body.contains("🚨 UPSET WATCH:"), "{body}");
        assert!(body.contains("Under 232.0"), "{body}");
        assert_eq!(h.scores.boxscore_calls.load(Ordering::SeqCst), 1);

        let journal = h.db.list_alerts_for_date("2025-11-03".parse().unwrap()).unwrap();
        let kinds: Vec<AlertKind> = journal.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![AlertKind::Player, AlertKind::Spread, AlertKind::Total]);

        // A restart the same evening keeps the processed set.
        let mut restarted = h.engine(at("2025-11-04T01:50:00Z"));
        assert_eq!(restarted.poll_once(at("2025-11-04T01:50:00Z")).await, 0);
        assert_eq!(h.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_quiet_halftime_and_missing_boxscore() {
        let h = Harness::new();
        let mut engine = h.engine(at("2025-11-03T18:00:00Z"));
        h.scores.set_games(vec![game("401", "LAL @ BOS", 50, 50, GameStatus::HalfTime)]);

        // First poll runs the day's setup on its own.
        assert_eq!(engine.poll_once(at("2025-11-03T19:00:00Z")).await, 1);
        let sent = h.sent();
        assert_eq!(sent[0].1, "⚠️ No pregame lines found.");
        assert_eq!(sent[1].1, "⚠️ Boxscore unavailable for LAL @ BOS");

        h.scores.set_games(vec![game("403", "PHX @ SAS", 50, 50, GameStatus::HalfTime)]);
        h.scores.set_boxscore("403", vec![row("Devin Booker", "PHX", 14, "17:00", Some(9))]);
        assert_eq!(engine.poll_once(at("2025-11-03T19:05:00Z")).await, 1);
        assert_eq!(h.sent()[2].1, NOTHING_NOTABLE);
    }

    #[tokio::test]
    async fn test_new_operating_day_resets_processed_set() {
        let h = Harness::new();
        let mut engine = h.engine(at("2025-11-03T18:00:00Z"));
        h.scores.set_games(vec![game("401", "LAL @ BOS", 50, 50, GameStatus::HalfTime)]);
        assert_eq!(engine.poll_once(at("2025-11-03T19:00:00Z")).await, 1);

        // Same event id reported the next evening (provider reuse) is handled again.
        assert_eq!(engine.poll_once(at("2025-11-04T19:00:00Z")).await, 1);
        let pregame_posts = h.sent().iter().filter(|(t, _)| t == "🚀 Pregame Lines").count();
        assert_eq!(pregame_posts, 2);
    }

    #[tokio::test]
    async fn test_late_halftime_spanning_window_close_is_reported_once() {
        let h = Harness::new();
        slate(&h.odds, -5.0, 220.0);
        let mut engine = h.engine(at("2025-11-03T18:00:00Z"));
        engine.daily_setup(at("2025-11-03T18:00:00Z")).await;

        slate(&h.odds, 1.5, 232.0);
        h.scores.set_games(vec![game("409", "LAL @ BOS", 60, 48, GameStatus::HalfTime)]);
        assert_eq!(engine.poll_once(at("2025-11-04T04:58:00Z")).await, 1);
        // Window closed at 05:00; same day, same halftime.
        assert_eq!(engine.poll_once(at("2025-11-04T05:03:00Z")).await, 0);

        let sent = h.sent();
        let count = |title: &str| sent.iter().filter(|(t, _)| t == title).count();
        assert_eq!(count("📊 LAL @ BOS Halftime"), 1);
        assert_eq!(count("🚀 Pregame Lines"), 1);
        assert!(sent[1].1.contains("🚨 UPSET WATCH:"), "{}", sent[1].1);
        assert_eq!(
            engine.book.pregame_line(&"LAL @ BOS".parse().unwrap()).unwrap().spread,
            Some(-5.0)
        );

        // The new day starts mid-morning.
        h.scores.set_games(vec![]);
        engine.poll_once(at("2025-11-04T10:05:00Z")).await;
        let pregame_posts = h.sent().iter().filter(|(t, _)| t == "🚀 Pregame Lines").count();
        assert_eq!(pregame_posts, 2);
    }

    #[tokio::test]
    async fn test_recap_lists_alerts_and_finals() {
        let h = Harness::new();
        let date: NaiveDate = "2025-11-03".parse().unwrap();
        h.db.insert_alert(&AlertRecord {
            id: None,
            operating_date: date,
            event_id: "401".into(),
            matchup: "LAL @ BOS".into(),
            kind: AlertKind::Total,
            body: "📈 Total moved up 12.0 pts".into(),
            sent_at: at("2025-11-04T01:40:00Z"),
        })
        .unwrap();
        h.scores.set_games(vec![
            game("401", "LAL @ BOS", 110, 117, GameStatus::Finished),
            game("402", "MIA @ ORL", 30, 35, GameStatus::InProgress),
        ]);

        let engine = h.engine(at("2025-11-04T15:00:00Z"));
        engine.recap(date).await;

        let sent = h.sent();
        assert_eq!(sent[0].0, "2025-11-03's Log");
        assert!(sent[0].1.starts_with("Halftime Alerts for LAL @ BOS:\n📈 Total moved up"));
        assert!(sent[0]
            .1
            .ends_with("🏁 **Final Results:**\nLAL @ BOS → Final: 110-117 | Spread: +7 | Total: 227"));
        assert_eq!(h.scores.last_dates.lock().unwrap().clone(), vec![date]);
    }
}
