use std::fmt;

use glam::Vec2;
use parry2d::bounding_volume::Aabb;
use parry2d::shape::{Ball, Cuboid, Shape};

use super::PhysicsError;
use crate::core::math::{in_unit_range, is_finite, isometry_at, to_vector};

/// Handle to identify bodies in the registry
///
/// Handles are issued in registration order and never reused, so ordering by
/// handle is ordering by age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(u32);

impl BodyHandle {
    /// Build a handle from its raw index
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Raw index of this handle
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for BodyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body#{}", self.0)
    }
}

/// Whether a body is integrated or acts as an immovable obstacle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Never moves, infinite mass
    Static,
    /// Affected by gravity, impulses and contacts
    Dynamic,
}

/// Collision shape. Bodies do not rotate, so rectangles stay axis-aligned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyShape {
    Rect { half_extents: Vec2 },
    Circle { radius: f32 },
}

impl BodyShape {
    /// Axis-aligned rectangle from half extents
    pub const fn rect(half_width: f32, half_height: f32) -> Self {
        Self::Rect {
            half_extents: Vec2::new(half_width, half_height),
        }
    }

    /// Circle from its radius
    pub const fn circle(radius: f32) -> Self {
        Self::Circle { radius }
    }

    fn is_valid(&self) -> bool {
        match *self {
            Self::Rect { half_extents } => {
                is_finite(half_extents) && half_extents.x > 0.0 && half_extents.y > 0.0
            }
            Self::Circle { radius } => radius.is_finite() && radius > 0.0,
        }
    }

    /// Run a query against the parry2d version of this shape
    pub(crate) fn with_shape<R>(&self, f: impl FnOnce(&dyn Shape) -> R) -> R {
        match *self {
            Self::Rect { half_extents } => f(&Cuboid::new(to_vector(half_extents))),
            Self::Circle { radius } => f(&Ball::new(radius)),
        }
    }

    /// World-space bounding box when centred at `position`
    pub fn aabb(&self, position: Vec2) -> Aabb {
        self.with_shape(|shape| shape.compute_aabb(&isometry_at(position)))
    }
}

/// A simulated rigid body
///
/// Mass, friction, damping and shape are fixed once built; only the world
/// mutates position and velocity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalBody {
    pub(crate) kind: BodyKind,
    pub(crate) shape: BodyShape,
    pub(crate) mass: f32,
    pub(crate) friction: f32,
    pub(crate) damping: f32,
    pub(crate) position: Vec2,
    pub(crate) velocity: Vec2,
}

impl PhysicalBody {
    pub fn kind(&self) -> BodyKind {
        self.kind
    }

    pub fn shape(&self) -> BodyShape {
        self.shape
    }

    /// Mass in kg (`f32::INFINITY` for static bodies)
    pub fn mass(&self) -> f32 {
        match self.kind {
            BodyKind::Static => f32::INFINITY,
            BodyKind::Dynamic => self.mass,
        }
    }

    /// Inverse mass used by the solver (zero for static bodies)
    pub fn inverse_mass(&self) -> f32 {
        match self.kind {
            BodyKind::Static => 0.0,
            BodyKind::Dynamic => 1.0 / self.mass,
        }
    }

    pub fn friction(&self) -> f32 {
        self.friction
    }

    pub fn damping(&self) -> f32 {
        self.damping
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    pub fn is_dynamic(&self) -> bool {
        self.kind == BodyKind::Dynamic
    }

    /// World-space bounding box
    pub fn aabb(&self) -> Aabb {
        self.shape.aabb(self.position)
    }

    /// Check the physical constants before the body enters the simulation
    pub(crate) fn validate(&self, entity: u64) -> Result<(), PhysicsError> {
        let invalid = |reason: String| PhysicsError::InvalidBody { entity, reason };

        if self.kind == BodyKind::Dynamic && !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(invalid(format!(
                "dynamic mass must be positive, got {}",
                self.mass
            )));
        }
        if !in_unit_range(self.friction) {
            return Err(invalid(format!(
                "friction must be in [0, 1], got {}",
                self.friction
            )));
        }
        if !in_unit_range(self.damping) {
            return Err(invalid(format!(
                "damping must be in [0, 1], got {}",
                self.damping
            )));
        }
        if !self.shape.is_valid() {
            return Err(invalid(format!("degenerate shape {:?}", self.shape)));
        }
        if !is_finite(self.position) || !is_finite(self.velocity) {
            return Err(invalid("non-finite position or velocity".to_string()));
        }
        Ok(())
    }
}

/// Builder for creating bodies with common configurations
pub struct BodyBuilder {
    kind: BodyKind,
    shape: BodyShape,
    mass: f32,
    friction: f32,
    damping: f32,
    position: Vec2,
    velocity: Vec2,
}

impl BodyBuilder {
    /// Create a new dynamic body (affected by gravity, impulses and contacts)
    pub fn new_dynamic(mass: f32) -> Self {
        Self {
            kind: BodyKind::Dynamic,
            shape: BodyShape::rect(0.5, 0.5),
            mass,
            friction: 0.5,
            damping: 1.0,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
        }
    }

    /// Create a new static body (completely immovable)
    pub fn new_static() -> Self {
        Self {
            kind: BodyKind::Static,
            shape: BodyShape::rect(0.5, 0.5),
            mass: f32::INFINITY,
            friction: 1.0,
            damping: 1.0,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
        }
    }

    /// Set the collision shape
    pub fn shape(mut self, shape: BodyShape) -> Self {
        self.shape = shape;
        self
    }

    /// Set the initial position of the body centre
    pub fn position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    /// Set the initial linear velocity
    pub fn linvel(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Set friction coefficient (0.0 = no friction, 1.0 = high friction)
    pub fn friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    /// Set linear damping (fraction of velocity kept per step, 1.0 = none lost)
    pub fn damping(mut self, damping: f32) -> Self {
        self.damping = damping;
        self
    }

    /// Build the body. Validation happens when it is registered.
    pub fn build(self) -> PhysicalBody {
        let velocity = match self.kind {
            BodyKind::Static => Vec2::ZERO,
            BodyKind::Dynamic => self.velocity,
        };

        PhysicalBody {
            kind: self.kind,
            shape: self.shape,
            mass: self.mass,
            friction: self.friction,
            damping: self.damping,
            position: self.position,
            velocity,
        }
    }
}
