pub mod engine;
pub mod eval;
pub mod search;

pub use engine::{Engine, InterruptHandle, MAX_STRENGTH, MIN_STRENGTH, SearchStats, SearchTask};
