pub mod cache;
pub mod lines;
pub mod provider;
pub mod the_odds_api;

pub use cache::LineCache;
pub use lines::LineQuote;
pub use provider::OddsProvider;
pub use the_odds_api::TheOddsApi;
