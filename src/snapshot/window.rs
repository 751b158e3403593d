use chrono::{DateTime, Duration, NaiveDate, TimeZone, Timelike, Utc};

/// Length of the nightly capture window.
pub const CAPTURE_WINDOW_HOURS: i64 = 12;

/// A new operating day begins this many hours before its window opens
/// (10:00 UTC for a 17:00 start), well after the previous night's late games
/// have finished.
pub const ROLLOVER_LEAD_HOURS: i64 = 7;

/// Operating day `now` belongs to. The day turns over `ROLLOVER_LEAD_HOURS`
/// before the capture window opens, never at the window's close, so a game
/// still running past the close stays on the day it tipped.
pub fn operating_day(now: DateTime<Utc>, start_hour: u32) -> NaiveDate {
    let offset = i64::from(start_hour.min(23)) - ROLLOVER_LEAD_HOURS;
    (now - Duration::hours(offset)).date_naive()
}

/// Half-open `[start, end)` slice of time that makes up one operating day's
/// slate. A night's games that tip after midnight UTC still belong to the
/// window that opened the evening before.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl CaptureWindow {
    /// The window of the operating day `now` belongs to, anchored at
    /// `start_hour` UTC. Between the close and the next rollover this is
    /// still the previous evening's (closed) window.
    pub fn containing(now: DateTime<Utc>, start_hour: u32) -> Self {
        Self::for_day(operating_day(now, start_hour), start_hour)
    }

    pub fn for_day(date: NaiveDate, start_hour: u32) -> Self {
        let start = Utc.from_utc_datetime(
            &date
                .and_hms_opt(start_hour.min(23), 0, 0)
                .unwrap_or_default(),
        );
        CaptureWindow {
            start,
            end: start + Duration::hours(CAPTURE_WINDOW_HOURS),
        }
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t < self.end
    }

    /// Date that names this operating day (the evening the window opens).
    pub fn operating_date(&self) -> NaiveDate {
        self.start.date_naive()
    }
}

/// Scoreboard dates to request so late West-coast games and early tips
/// are both visible: before 10:00 UTC the previous day's slate is still
/// live; from 22:00 UTC tonight's games can run into tomorrow's date.
pub fn scoreboard_dates(now: DateTime<Utc>) -> Vec<NaiveDate> {
    let today = now.date_naive();
    match now.hour() {
        h if h < 10 => vec![today - Duration::days(1), today],
        h if h >= 22 => vec![today, today + Duration::days(1)],
        _ => vec![today],
    }
}
