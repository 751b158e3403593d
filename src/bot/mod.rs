pub mod confidence;
pub mod engine;
pub mod players;
pub mod roster;
pub mod spread;
pub mod total;

pub use engine::HalftimeEngine;
