// Game entities and the table that owns them

use std::collections::BTreeMap;

use glam::Vec2;
use log::debug;

use super::stats::CategoryStats;
use crate::engine::physics::{BodyHandle, PhysicsError, PhysicsWorld};

/// Unique identifier for an entity
pub type EntityId = u64;

/// What an entity is. Drives its constants and which collision rules apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// The thrower, decorative
    Player,
    /// A thrown banana
    Projectile,
    /// A monkey to knock out
    Enemy,
    /// Bamboo, breaks when hit fast enough
    BreakableBlock,
    /// Wood, falls and crushes bamboo but never breaks
    SolidBlock,
    /// Immovable floor
    StaticGround,
}

impl Category {
    /// Whether entities of this category get a physical body
    pub fn has_body(self) -> bool {
        CategoryStats::for_category(self).body.is_some()
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Projectile => "projectile",
            Self::Enemy => "enemy",
            Self::BreakableBlock => "bamboo",
            Self::SolidBlock => "wood",
            Self::StaticGround => "ground",
        }
    }
}

/// A game object
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub category: Category,
    /// Centre position, mirrored from the body after every step
    pub position: Vec2,
    /// Handle of the physical body, if the category has one
    pub body: Option<BodyHandle>,
}

impl Entity {
    pub fn stats(&self) -> &'static CategoryStats {
        CategoryStats::for_category(self.category)
    }

    pub fn sprite_key(&self) -> &'static str {
        self.stats().sprite_key
    }
}

/// Build an entity of `category` without registering anything
pub fn make_entity(id: EntityId, category: Category, position: Vec2) -> Entity {
    Entity {
        id,
        category,
        position,
        body: None,
    }
}

/// All entities of a session, in spawn order
#[derive(Debug, Default)]
pub struct EntityTable {
    entities: BTreeMap<EntityId, Entity>,
    next_id: EntityId,
}

impl EntityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an entity and, for physical categories, register its body
    ///
    /// A rejected body leaves the table untouched.
    pub fn spawn(
        &mut self,
        world: &mut PhysicsWorld,
        category: Category,
        position: Vec2,
    ) -> Result<EntityId, PhysicsError> {
        let id = self.next_id;
        let mut entity = make_entity(id, category, position);

        if let Some(builder) = CategoryStats::for_category(category).body_builder(position) {
            entity.body = Some(world.register(id, builder.build())?);
        }

        self.next_id += 1;
        self.entities.insert(id, entity);
        debug!("Spawned {} #{} at {:?}", category.name(), id, position);

        Ok(id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Drop an entity from the table. The caller owns body removal.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    /// Entities of one category in spawn order
    pub fn of_category(&self, category: Category) -> impl Iterator<Item = &Entity> {
        self.entities
            .values()
            .filter(move |entity| entity.category == category)
    }

    /// IDs of one category in spawn order
    pub fn ids(&self, category: Category) -> Vec<EntityId> {
        self.of_category(category).map(|entity| entity.id).collect()
    }

    pub fn count(&self, category: Category) -> usize {
        self.of_category(category).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Copy body positions back onto their entities
    pub fn sync_positions(&mut self, world: &PhysicsWorld) {
        for entity in self.entities.values_mut() {
            if let Some(position) = entity.body.and_then(|handle| world.position(handle)) {
                entity.position = position;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_entity_has_no_body() {
        let entity = make_entity(3, Category::SolidBlock, Vec2::new(1.0, 1.0));
        assert_eq!(entity.body, None);
        assert_eq!(entity.sprite_key(), "wood_wall_1");
    }

    #[test]
    fn test_spawn_registers_bodies_for_physical_categories() {
        let mut world = PhysicsWorld::new();
        let mut table = EntityTable::new();

        let player = table.spawn(&mut world, Category::Player, Vec2::ZERO).unwrap();
        let enemy = table
            .spawn(&mut world, Category::Enemy, Vec2::new(100.0, 50.0))
            .unwrap();

        assert_eq!(table.get(player).unwrap().body, None);
        let handle = table.get(enemy).unwrap().body.unwrap();
        assert_eq!(world.registry().entity_of(handle), Some(enemy));
        assert_eq!(world.registry().len(), 1);
    }

    #[test]
    fn test_category_queries_in_spawn_order() {
        let mut world = PhysicsWorld::new();
        let mut table = EntityTable::new();

        let a = table.spawn(&mut world, Category::BreakableBlock, Vec2::ZERO).unwrap();
        table.spawn(&mut world, Category::Enemy, Vec2::new(0.0, 100.0)).unwrap();
        let b = table
            .spawn(&mut world, Category::BreakableBlock, Vec2::new(100.0, 0.0))
            .unwrap();

        assert_eq!(table.ids(Category::BreakableBlock), vec![a, b]);
        assert_eq!(table.count(Category::Enemy), 1);
        assert_eq!(table.count(Category::Projectile), 0);

        table.remove(a);
        assert_eq!(table.ids(Category::BreakableBlock), vec![b]);
    }

    #[test]
    fn test_sync_positions_follows_bodies() {
        let mut world = PhysicsWorld::new();
        let mut table = EntityTable::new();
        let id = table
            .spawn(&mut world, Category::SolidBlock, Vec2::new(0.0, 500.0))
            .unwrap();

        world.step(1.0 / 60.0);
        table.sync_positions(&world);

        assert!(table.get(id).unwrap().position.y < 500.0);
    }

    #[test]
    fn test_has_body() {
        assert!(!Category::Player.has_body());
        assert!(Category::Projectile.has_body());
        assert!(Category::StaticGround.has_body());
    }
}
