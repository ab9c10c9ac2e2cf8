// Game rules layered on the physics engine
//
// - Entities, categories and their physical constants
// - Slingshot launching
// - Destruction rules run after every step
// - Levels, progress and the session state machine

pub mod entity;
pub mod launcher;
pub mod level;
pub mod progress;
pub mod resolver;
pub mod session;
pub mod stats;

// Re-export commonly used types
pub use entity::{Category, Entity, EntityId, EntityTable};
pub use launcher::{ImpulseLauncher, ThrowGesture};
pub use level::{DefaultLevel, LevelCatalog, LevelEntry, LevelSource, Placement, StaticLevels};
pub use progress::{InMemoryProgressStore, JsonProgressStore, ProgressError, ProgressStore};
pub use resolver::{CollisionResolver, DestroyCause, Destroyed, Resolution};
pub use session::{Session, SessionError, SessionEvent, SessionState};
pub use stats::CategoryStats;
