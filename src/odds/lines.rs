//! Turns raw odds-feed events into canonical line quotes.
//!
//! Team names are normalized here on the way in. Spread outcomes are labelled
//! with the event's own team spelling, so the home outcome is looked up by the
//! event's `home_team` first and by the canonical full name after that.

use chrono::{DateTime, Utc};

use super::provider::{BookMarket, Bookmaker, OddsEvent};
use crate::db::models::MarketKind;
use crate::identity::{full_name, normalize_team, MatchupKey, SourceSystem};

/// One market value for one matchup.
#[derive(Debug, Clone, PartialEq)]
pub struct LineQuote {
    pub matchup: MatchupKey,
    pub commence_time: DateTime<Utc>,
    /// Home spread point for `Spreads`, posted total for `Totals`
    pub value: f64,
}

/// Extract one quote per event for `kind`.
///
/// When `bookmaker` is set and that book carries the market it wins;
/// otherwise the first book listing the market is used. Events without a
/// usable value are dropped.
pub fn quotes_for(events: &[OddsEvent], kind: MarketKind, bookmaker: Option<&str>) -> Vec<LineQuote> {
    events
        .iter()
        .filter_map(|ev| {
            let matchup = MatchupKey::new(
                normalize_team(&ev.away_team, SourceSystem::Odds),
                normalize_team(&ev.home_team, SourceSystem::Odds),
            );
            let market = select_market(ev, kind, bookmaker)?;
            let value = match kind {
                MarketKind::Spreads => {
                    let named = |name: &str| {
                        market
                            .outcomes
                            .iter()
                            .find(|o| o.name.eq_ignore_ascii_case(name))
                    };
                    named(&ev.home_team)
                        .or_else(|| full_name(&matchup.home).and_then(named))
                        .and_then(|o| o.point)?
                }
                MarketKind::Totals => market
                    .outcomes
                    .iter()
                    .find(|o| o.name.eq_ignore_ascii_case("over"))
                    .and_then(|o| o.point)
                    .filter(|p| *p > 0.0)?,
            };
            Some(LineQuote {
                matchup,
                commence_time: ev.commence_time,
                value,
            })
        })
        .collect()
}

fn select_market<'a>(
    ev: &'a OddsEvent,
    kind: MarketKind,
    bookmaker: Option<&str>,
) -> Option<&'a BookMarket> {
    let market_of = |b: &'a Bookmaker| {
        b.markets.iter().find(|m| m.key == kind.as_str())
    };
    bookmaker
        .and_then(|key| ev.bookmakers.iter().find(|b| b.key == key))
        .and_then(market_of)
        .or_else(|| ev.bookmakers.iter().find_map(market_of))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::odds::provider::Outcome;

    fn outcome(name: &str, point: f64) -> Outcome {
        Outcome {
            name: name.into(),
            price: Some(1.91),
            point: Some(point),
        }
    }

    fn event(home: &str, away: &str, books: Vec<Bookmaker>) -> OddsEvent {
        OddsEvent {
            id: "e1".into(),
            commence_time: "2025-11-04T00:10:00Z".parse().unwrap(),
            home_team: home.into(),
            away_team: away.into(),
            bookmakers: books,
        }
    }

    fn book(key: &str, market: &str, outcomes: Vec<Outcome>) -> Bookmaker {
        Bookmaker {
            key: key.into(),
            markets: vec![BookMarket {
                key: market.into(),
                outcomes,
            }],
        }
    }

    #[test]
    fn test_spread_quote_uses_home_outcome() {
        let ev = event(
            "Golden State Warriors",
            "Phoenix Suns",
            vec![book(
                "fanduel",
                "spreads",
                vec![outcome("Phoenix Suns", 3.5), outcome("Golden State Warriors", -3.5)],
            )],
        );
        let quotes = quotes_for(&[ev], MarketKind::Spreads, None);
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].matchup.to_string(), "PHX @ GSW");
        assert_eq!(quotes[0].value, -3.5);
    }

    #[test]
    fn test_spread_quote_for_alias_spelled_home_team() {
        let ev = event(
            "LA Clippers",
            "Phoenix Suns",
            vec![book(
                "fanduel",
                "spreads",
                vec![outcome("LA Clippers", -4.5), outcome("Phoenix Suns", 4.5)],
            )],
        );
        let quotes = quotes_for(&[ev], MarketKind::Spreads, None);
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].matchup.to_string(), "PHX @ LAC");
        assert_eq!(quotes[0].value, -4.5);
    }

    #[test]
    fn test_spread_quote_falls_back_to_canonical_name() {
        let ev = event(
            "LA Lakers",
            "Boston Celtics",
            vec![book(
                "dk",
                "spreads",
                vec![outcome("Boston Celtics", 2.0), outcome("Los Angeles Lakers", -2.0)],
            )],
        );
        let quotes = quotes_for(&[ev], MarketKind::Spreads, None);
        assert_eq!(quotes[0].matchup.to_string(), "BOS @ LAL");
        assert_eq!(quotes[0].value, -2.0);
    }

    #[test]
    fn test_total_quote_uses_over_point() {
        let ev = event(
            "Utah Jazz",
            "New York Knicks",
            vec![book("dk", "totals", vec![outcome("Over", 229.5), outcome("Under", 229.5)])],
        );
        let quotes = quotes_for(&[ev], MarketKind::Totals, None);
        assert_eq!(quotes[0].matchup.to_string(), "NYK @ UTA");
        assert_eq!(quotes[0].value, 229.5);
    }

    #[test]
    fn test_preferred_bookmaker_wins_when_present() {
        let ev = event(
            "Boston Celtics",
            "Miami Heat",
            vec![
                book("dk", "spreads", vec![outcome("Boston Celtics", -6.0)]),
                book("fanduel", "spreads", vec![outcome("Boston Celtics", -6.5)]),
            ],
        );
        let evs = [ev];
        assert_eq!(quotes_for(&evs, MarketKind::Spreads, Some("fanduel"))[0].value, -6.5);
        assert_eq!(quotes_for(&evs, MarketKind::Spreads, Some("caesars"))[0].value, -6.0);
        assert_eq!(quotes_for(&evs, MarketKind::Spreads, None)[0].value, -6.0);
    }

    #[test]
    fn test_events_without_market_are_dropped() {
        let ev = event(
            "Boston Celtics",
            "Miami Heat",
            vec![book("dk", "h2h", vec![outcome("Boston Celtics", 0.0)])],
        );
        assert!(quotes_for(&[ev], MarketKind::Spreads, None).is_empty());
    }
}
