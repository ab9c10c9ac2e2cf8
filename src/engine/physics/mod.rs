// Physics system: rigid bodies, registry, integration and contact resolution
//
// Shapes and narrow-phase queries come from parry2d; integration is our own so
// that damping stays a per-step multiplier and every step is deterministic.

pub mod body;
mod collision;
mod registry;
mod world;

pub use body::{BodyBuilder, BodyHandle, BodyKind, BodyShape, PhysicalBody};
pub use collision::{Contact, SolverSettings};
pub use registry::BodyRegistry;
pub use world::{PhysicsWorld, DEFAULT_GRAVITY};

/// Errors raised by the physics layer
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PhysicsError {
    /// Physical constants rejected at registration
    #[error("Invalid body for entity {entity}: {reason}")]
    InvalidBody { entity: u64, reason: String },

    /// Operation requested on a handle that is not (or no longer) registered
    #[error("No body registered for {0}")]
    MissingBody(BodyHandle),

    /// Operation requested on an entity that never had a body
    #[error("Entity {0} has no physical body")]
    NoBody(u64),
}
