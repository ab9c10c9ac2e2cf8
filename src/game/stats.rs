// Per-category physical constants
//
// One table replaces the per-class constants of every entity variant. Mass and
// friction come from here at registration and never change afterwards.

use glam::Vec2;

use super::entity::Category;
use crate::engine::physics::{BodyBuilder, BodyKind, BodyShape};

/// Fixed properties shared by every entity of a category
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStats {
    /// Body kind, or `None` for decorative entities
    pub body: Option<BodyKind>,
    /// Mass in kg (ignored for static bodies)
    pub mass: f32,
    /// Contact friction coefficient
    pub friction: f32,
    /// Velocity kept per step (1.0 = no decay)
    pub damping: f32,
    /// Collision shape
    pub shape: BodyShape,
    /// Sprite the host draws for this category
    pub sprite_key: &'static str,
}

pub const PLAYER_STATS: CategoryStats = CategoryStats {
    body: None,
    mass: 0.0,
    friction: 0.0,
    damping: 1.0,
    shape: BodyShape::rect(20.0, 20.0),
    sprite_key: "throwing_chimp",
};

/// The banana, undamped in flight
pub const PROJECTILE_STATS: CategoryStats = CategoryStats {
    body: Some(BodyKind::Dynamic),
    mass: 0.5,
    friction: 0.6,
    damping: 1.0,
    shape: BodyShape::circle(12.0),
    sprite_key: "banana_sprite",
};

pub const ENEMY_STATS: CategoryStats = CategoryStats {
    body: Some(BodyKind::Dynamic),
    mass: 0.8,
    friction: 0.9,
    damping: 1.0,
    shape: BodyShape::rect(20.0, 20.0),
    sprite_key: "big_head_ape",
};

/// Bamboo: lighter, breaks easily
pub const BREAKABLE_STATS: CategoryStats = CategoryStats {
    body: Some(BodyKind::Dynamic),
    mass: 0.3,
    friction: 0.5,
    damping: 1.0,
    shape: BodyShape::rect(20.0, 20.0),
    sprite_key: "bamboo_wall_1",
};

/// Wood: heavier, never breaks but falls
pub const SOLID_STATS: CategoryStats = CategoryStats {
    body: Some(BodyKind::Dynamic),
    mass: 1.0,
    friction: 0.7,
    damping: 1.0,
    shape: BodyShape::rect(20.0, 20.0),
    sprite_key: "wood_wall_1",
};

pub const GROUND_STATS: CategoryStats = CategoryStats {
    body: Some(BodyKind::Static),
    mass: f32::INFINITY,
    friction: 1.0,
    damping: 1.0,
    shape: BodyShape::rect(1000.0, 10.0),
    sprite_key: "ground",
};

impl CategoryStats {
    /// Look up the constants for a category
    pub fn for_category(category: Category) -> &'static CategoryStats {
        match category {
            Category::Player => &PLAYER_STATS,
            Category::Projectile => &PROJECTILE_STATS,
            Category::Enemy => &ENEMY_STATS,
            Category::BreakableBlock => &BREAKABLE_STATS,
            Category::SolidBlock => &SOLID_STATS,
            Category::StaticGround => &GROUND_STATS,
        }
    }

    /// Body builder for an entity of this category at `position`
    pub fn body_builder(&self, position: Vec2) -> Option<BodyBuilder> {
        let builder = match self.body? {
            BodyKind::Dynamic => BodyBuilder::new_dynamic(self.mass),
            BodyKind::Static => BodyBuilder::new_static(),
        };

        Some(
            builder
                .shape(self.shape)
                .friction(self.friction)
                .damping(self.damping)
                .position(position),
        )
    }
}
