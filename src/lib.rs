// Slingshot tower-destruction core
//
// Physics, collision rules and level flow with no window or renderer attached.
// A host feeds frames and throws into a `Session` and draws what it reports.

pub mod config;
pub mod core;
pub mod engine;
pub mod game;

pub use config::{ConfigError, GameConfig};
pub use engine::game_loop::FrameClock;
pub use game::{Session, SessionEvent};
