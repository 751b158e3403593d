pub mod espn;
pub mod provider;

pub use espn::Espn;
pub use provider::ScoreProvider;
