//! Time-boxed cache of odds quotes, one slot per market kind.
//!
//! Every halftime in a poll cycle asks for the same two markets; the cache
//! keeps that to one provider call per market per TTL window. The cache is
//! a plain owned value: the engine holds it and passes `&mut` down.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::lines::{quotes_for, LineQuote};
use super::provider::OddsProvider;
use crate::db::models::MarketKind;

pub struct LineCache {
    ttl: Duration,
    /// Preferred bookmaker key, if any
    bookmaker: Option<String>,
    entries: HashMap<MarketKind, CachedMarket>,
}

struct CachedMarket {
    fetched_at: Instant,
    quotes: Vec<LineQuote>,
}

impl LineCache {
    pub fn new(ttl: Duration, bookmaker: Option<String>) -> Self {
        LineCache {
            ttl,
            bookmaker,
            entries: HashMap::new(),
        }
    }

    /// Cached quotes for `kind` if younger than the TTL at `now`.
    pub fn fresh(&self, kind: MarketKind, now: Instant) -> Option<&[LineQuote]> {
        self.entries
            .get(&kind)
            .filter(|c| now.saturating_duration_since(c.fetched_at) < self.ttl)
            .map(|c| c.quotes.as_slice())
    }

    pub fn store(&mut self, kind: MarketKind, quotes: Vec<LineQuote>, now: Instant) {
        self.entries.insert(
            kind,
            CachedMarket {
                fetched_at: now,
                quotes,
            },
        );
    }

    /// Drop everything; the next lookup goes to the provider.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Quotes for `kind`, from cache when fresh, otherwise from `odds`.
    ///
    /// A provider failure is logged and reported as `None`; callers treat
    /// that as "no data this cycle".
    pub async fn quotes(
        &mut self,
        odds: &dyn OddsProvider,
        kind: MarketKind,
        now: Instant,
    ) -> Option<&[LineQuote]> {
        if self.fresh(kind, now).is_none() {
            match odds.fetch_odds(kind).await {
                Ok(events) => {
                    let quotes = quotes_for(&events, kind, self.bookmaker.as_deref());
                    debug!(
                        "{}: {} {} quote(s) from {} event(s)",
                        odds.name(),
                        quotes.len(),
                        kind.as_str(),
                        events.len()
                    );
                    self.store(kind, quotes, now);
                }
                Err(e) => {
                    warn!("{} {} fetch failed: {:#}", odds.name(), kind.as_str(), e);
                    return None;
                }
            }
        }
        self.entries.get(&kind).map(|c| c.quotes.as_slice())
    }
}
