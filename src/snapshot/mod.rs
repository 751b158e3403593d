//! Pregame line snapshot and live-line lookups, addressed by [`MatchupKey`].
//!
//! Pregame values are write-once per operating day: the first capture of a
//! matchup is the opening line, and later capture passes must not drift it
//! toward the live market. A snapshot from a previous operating day is
//! discarded wholesale before anything new is written.

pub mod processed;
pub mod window;

pub use processed::ProcessedEvents;
pub use window::{scoreboard_dates, CaptureWindow};

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

use crate::db::json_file;
use crate::db::models::{MarketKind, PregameLine};
use crate::identity::MatchupKey;
use crate::odds::{LineCache, OddsProvider};

/// On-disk form: `{ "date", "spreads": {"AWY @ HOME": f}, "totals": {...} }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SnapshotFile {
    date: NaiveDate,
    #[serde(default)]
    spreads: BTreeMap<MatchupKey, f64>,
    #[serde(default)]
    totals: BTreeMap<MatchupKey, f64>,
}

impl SnapshotFile {
    fn empty(date: NaiveDate) -> Self {
        SnapshotFile {
            date,
            spreads: BTreeMap::new(),
            totals: BTreeMap::new(),
        }
    }
}

/// Result of one capture pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSummary {
    pub date: NaiveDate,
    /// Lines written by this pass (already-present keys are not counted)
    pub new_spreads: usize,
    pub new_totals: usize,
    /// Lines held after this pass
    pub spreads: usize,
    pub totals: usize,
}

/// Owner of the pregame snapshot and the live-line cache.
pub struct LineBook {
    path: PathBuf,
    snapshot: SnapshotFile,
    live: LineCache,
    start_hour: u32,
    /// A capture for `snapshot.date` is on disk
    captured: bool,
}

impl LineBook {
    /// Load the snapshot at `path`. A missing or corrupt file, or one captured
    /// on a date other than `today`, starts empty.
    pub fn open(path: impl Into<PathBuf>, today: NaiveDate, start_hour: u32, live: LineCache) -> Self {
        let path = path.into();
        let loaded = json_file::load::<SnapshotFile>(&path);
        let captured = matches!(&loaded, Some(s) if s.date == today);
        let snapshot = match loaded {
            Some(s) if s.date == today => {
                info!(
                    "Pregame lines loaded for {}: {} spreads, {} totals",
                    s.date,
                    s.spreads.len(),
                    s.totals.len()
                );
                s
            }
            Some(s) => {
                info!("Discarding stale pregame lines from {} (today is {})", s.date, today);
                SnapshotFile::empty(today)
            }
            None => SnapshotFile::empty(today),
        };
        LineBook {
            path,
            snapshot,
            live,
            start_hour,
            captured,
        }
    }

    /// Operating date the held snapshot belongs to.
    pub fn date(&self) -> NaiveDate {
        self.snapshot.date
    }

    /// Whether a capture for [`Self::date`] has been persisted.
    pub fn is_captured(&self) -> bool {
        self.captured
    }

    /// Record opening lines for every game tipping inside the current
    /// capture window. Keys already present for the day are left untouched.
    ///
    /// Provider failures leave that market uncaptured for this pass; only a
    /// failure to persist the snapshot is returned as an error.
    pub async fn capture_pregame_lines(
        &mut self,
        odds: &dyn OddsProvider,
        now: DateTime<Utc>,
        clock: Instant,
    ) -> Result<CaptureSummary> {
        let window = CaptureWindow::containing(now, self.start_hour);
        let date = window.operating_date();
        if self.snapshot.date != date {
            info!(
                "New operating day {}: dropping {} spreads / {} totals from {}",
                date,
                self.snapshot.spreads.len(),
                self.snapshot.totals.len(),
                self.snapshot.date
            );
            self.snapshot = SnapshotFile::empty(date);
            self.captured = false;
        }

        // Capture reads the market as it is now, not a cached view.
        self.live.clear();

        let mut new_counts = [0usize; 2];
        for (slot, kind) in [MarketKind::Spreads, MarketKind::Totals].into_iter().enumerate() {
            let Some(quotes) = self.live.quotes(odds, kind, clock).await else {
                continue;
            };
            let target = match kind {
                MarketKind::Spreads => &mut self.snapshot.spreads,
                MarketKind::Totals => &mut self.snapshot.totals,
            };
            for q in quotes.iter().filter(|q| window.contains(q.commence_time)) {
                if !target.contains_key(&q.matchup) {
                    target.insert(q.matchup.clone(), q.value);
                    new_counts[slot] += 1;
                } else {
                    debug!("{} {} already captured, keeping opening line", q.matchup, kind.as_str());
                }
            }
        }

        json_file::save_atomic(&self.path, &self.snapshot)?;
        self.captured = true;

        let summary = CaptureSummary {
            date,
            new_spreads: new_counts[0],
            new_totals: new_counts[1],
            spreads: self.snapshot.spreads.len(),
            totals: self.snapshot.totals.len(),
        };
        info!(
            "Pregame capture for {}: +{} spreads, +{} totals ({} / {} held)",
            date, summary.new_spreads, summary.new_totals, summary.spreads, summary.totals
        );
        Ok(summary)
    }

    pub fn pregame_line(&self, key: &MatchupKey) -> Option<PregameLine> {
        let spread = self.snapshot.spreads.get(key).copied();
        let total = self.snapshot.totals.get(key).copied();
        if spread.is_none() && total.is_none() {
            return None;
        }
        Some(PregameLine {
            matchup: key.clone(),
            spread,
            total,
            captured_date: self.snapshot.date,
        })
    }

    /// Every held pregame line, ordered by matchup key.
    pub fn pregame_lines(&self) -> Vec<PregameLine> {
        let mut keys: Vec<&MatchupKey> = self
            .snapshot
            .spreads
            .keys()
            .chain(self.snapshot.totals.keys())
            .collect();
        keys.sort();
        keys.dedup();
        keys.into_iter().filter_map(|k| self.pregame_line(k)).collect()
    }

    /// Current market value for `key`, or `None` when the provider is down
    /// or no longer lists the game.
    pub async fn live_line(
        &mut self,
        odds: &dyn OddsProvider,
        key: &MatchupKey,
        kind: MarketKind,
        now: Instant,
    ) -> Option<f64> {
        self.live
            .quotes(odds, kind, now)
            .await?
            .iter()
            .find(|q| &q.matchup == key)
            .map(|q| q.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::odds::cache::tests::{odds_event, FakeOdds};
    use std::time::Duration;

    const START_HOUR: u32 = 17;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn book(path: &std::path::Path, today: NaiveDate) -> LineBook {
        LineBook::open(
            path,
            today,
            START_HOUR,
            LineCache::new(Duration::from_secs(300), None),
        )
    }

    fn key(s: &str) -> MatchupKey {
        s.parse().unwrap()
    }

    fn slate(odds: &FakeOdds, spread: f64, total: f64) {
        odds.set(
            MarketKind::Spreads,
            vec![
                odds_event("Los Angeles Lakers", "Boston Celtics", "2025-11-04T00:30:00Z", MarketKind::Spreads, spread),
                // Tomorrow night's game: outside the window
                odds_event("Miami Heat", "Orlando Magic", "2025-11-05T00:00:00Z", MarketKind::Spreads, -2.0),
            ],
        );
        odds.set(
            MarketKind::Totals,
            vec![odds_event("Los Angeles Lakers", "Boston Celtics", "2025-11-04T00:30:00Z", MarketKind::Totals, total)],
        );
    }

    #[tokio::test]
    async fn test_capture_filters_to_window_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pregame_lines.json");
        let odds = FakeOdds::default();
        slate(&odds, -5.5, 224.5);

        let mut lines = book(&path, date("2025-11-03"));
        let summary = lines
            .capture_pregame_lines(&odds, at("2025-11-03T18:00:00Z"), Instant::now())
            .await
            .unwrap();
        assert_eq!(summary.new_spreads, 1);
        assert_eq!(summary.new_totals, 1);

        let line = lines.pregame_line(&key("LAL @ BOS")).unwrap();
        assert_eq!(line.spread, Some(-5.5));
        assert_eq!(line.total, Some(224.5));
        assert!(lines.pregame_line(&key("MIA @ ORL")).is_none());

        let raw = std::fs::read_to_string(&path).unwrap();
        let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(v["date"], "2025-11-03");
        assert_eq!(v["spreads"]["LAL @ BOS"], -5.5);
        assert_eq!(v["totals"]["LAL @ BOS"], 224.5);
    }

    #[tokio::test]
    async fn test_capture_is_write_once_within_a_day() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pregame_lines.json");
        let odds = FakeOdds::default();
        slate(&odds, -5.5, 224.5);

        let mut lines = book(&path, date("2025-11-03"));
        lines
            .capture_pregame_lines(&odds, at("2025-11-03T18:00:00Z"), Instant::now())
            .await
            .unwrap();

        // Same response again: nothing new, nothing changed.
        let again = lines
            .capture_pregame_lines(&odds, at("2025-11-03T19:00:00Z"), Instant::now())
            .await
            .unwrap();
        assert_eq!((again.new_spreads, again.new_totals), (0, 0));

        // Market moves before tip: opening line is kept.
        slate(&odds, -8.0, 231.0);
        lines
            .capture_pregame_lines(&odds, at("2025-11-03T23:00:00Z"), Instant::now())
            .await
            .unwrap();
        let line = lines.pregame_line(&key("LAL @ BOS")).unwrap();
        assert_eq!(line.spread, Some(-5.5));
        assert_eq!(line.total, Some(224.5));

        // A restart reads the same opening line back.
        let reopened = book(&path, date("2025-11-03"));
        assert!(reopened.is_captured());
        assert_eq!(reopened.pregame_line(&key("LAL @ BOS")).unwrap().spread, Some(-5.5));
    }

    #[tokio::test]
    async fn test_new_day_discards_prior_lines_before_capture() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pregame_lines.json");
        let odds = FakeOdds::default();
        slate(&odds, -5.5, 224.5);

        let mut lines = book(&path, date("2025-11-03"));
        lines
            .capture_pregame_lines(&odds, at("2025-11-03T18:00:00Z"), Instant::now())
            .await
            .unwrap();

        // Next evening, different slate.
        odds.set(
            MarketKind::Spreads,
            vec![odds_event("Miami Heat", "Orlando Magic", "2025-11-05T00:00:00Z", MarketKind::Spreads, -2.0)],
        );
        odds.set(MarketKind::Totals, vec![]);
        let summary = lines
            .capture_pregame_lines(&odds, at("2025-11-04T18:00:00Z"), Instant::now())
            .await
            .unwrap();
        assert_eq!(summary.date, date("2025-11-04"));
        assert_eq!((summary.spreads, summary.totals), (1, 0));
        assert!(lines.pregame_line(&key("LAL @ BOS")).is_none());
        assert_eq!(lines.pregame_line(&key("MIA @ ORL")).unwrap().spread, Some(-2.0));
    }

    #[test]
    fn test_open_discards_stale_or_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pregame_lines.json");
        std::fs::write(
            &path,
            r#"{"date":"2025-11-02","spreads":{"LAL @ BOS":-3.0},"totals":{}}"#,
        )
        .unwrap();
        let lines = book(&path, date("2025-11-03"));
        assert!(!lines.is_captured());
        assert_eq!(lines.date(), date("2025-11-03"));
        assert!(lines.pregame_lines().is_empty());

        std::fs::write(&path, "{{{").unwrap();
        assert!(book(&path, date("2025-11-03")).pregame_lines().is_empty());
    }

    #[tokio::test]
    async fn test_live_line_and_provider_failure() {
        let dir = tempfile::tempdir().unwrap();
        let odds = FakeOdds::default();
        slate(&odds, -1.5, 230.0);
        let mut lines = book(&dir.path().join("p.json"), date("2025-11-03"));
        let now = Instant::now();

        assert_eq!(
            lines.live_line(&odds, &key("LAL @ BOS"), MarketKind::Spreads, now).await,
            Some(-1.5)
        );
        assert_eq!(
            lines.live_line(&odds, &key("LAL @ BOS"), MarketKind::Totals, now).await,
            Some(230.0)
        );
        assert_eq!(
            lines.live_line(&odds, &key("PHX @ SAS"), MarketKind::Spreads, now).await,
            None
        );

        odds.fail.store(true, std::sync::atomic::Ordering::SeqCst);
        let later = now + Duration::from_secs(600);
        assert_eq!(
            lines.live_line(&odds, &key("LAL @ BOS"), MarketKind::Spreads, later).await,
            None
        );
    }
}
