// Destruction rules applied after every physics step
//
// Rules run in a fixed order after each step. A pair counts as touching if the
// step's contact list joined them or their shapes still overlap; the solver
// separates colliding bodies within the step, so post-step shapes alone miss
// most impacts. Speeds are taken at impact for the same reason.
//
// Removals are only scheduled here; the session flushes them once all rules
// have run, so a block broken by one rule is still seen (but not reported
// twice) by the next.

use log::{debug, warn};

use super::entity::{Category, EntityId, EntityTable};
use crate::config::CollisionConfig;
use crate::engine::physics::{BodyHandle, PhysicsError, PhysicsWorld};

/// Which rule destroyed an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DestroyCause {
    /// Bamboo hit by a fast projectile
    ProjectileImpact,
    /// Enemy touched by a projectile or a wood block
    EnemyStruck,
    /// Bamboo crushed by a fast wood block
    Crushed,
}

/// An entity scheduled for removal by the resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destroyed {
    pub id: EntityId,
    pub category: Category,
    pub cause: DestroyCause,
}

/// Outcome of one resolution pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Entities scheduled for removal, each reported once
    pub destroyed: Vec<Destroyed>,
    /// Projectiles slowed down by breaking bamboo
    pub slowed: Vec<EntityId>,
}

impl Resolution {
    pub fn is_empty(&self) -> bool {
        self.destroyed.is_empty() && self.slowed.is_empty()
    }
}

/// Applies the per-step destruction and slowdown rules
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionResolver {
    speed_threshold: f32,
    overlap_tolerance: f32,
    impact_slowdown: f32,
}

impl CollisionResolver {
    pub fn new(speed_threshold: f32, overlap_tolerance: f32, impact_slowdown: f32) -> Self {
        Self {
            speed_threshold,
            overlap_tolerance,
            impact_slowdown,
        }
    }

    pub fn from_config(config: &CollisionConfig) -> Self {
        Self::new(
            config.speed_threshold,
            config.overlap_tolerance,
            config.impact_slowdown,
        )
    }

    /// Run every rule once and schedule the resulting removals
    pub fn resolve(&self, world: &mut PhysicsWorld, entities: &EntityTable) -> Resolution {
        let projectiles = bodies_of(entities, Category::Projectile);
        let breakables = bodies_of(entities, Category::BreakableBlock);
        let enemies = bodies_of(entities, Category::Enemy);
        let solids = bodies_of(entities, Category::SolidBlock);

        let mut resolution = Resolution::default();

        // Projectile vs bamboo: break everything it overlaps, slow it down once
        for &(projectile, projectile_body) in &projectiles {
            let Some(speed) = world.impact_speed(projectile_body) else {
                continue;
            };
            if speed <= self.speed_threshold {
                continue;
            }

            let hits = self.overlapping(world, projectile_body, &breakables);
            if hits.is_empty() {
                continue;
            }
            for (block, block_body) in hits {
                schedule(
                    world,
                    &mut resolution,
                    block,
                    block_body,
                    Category::BreakableBlock,
                    DestroyCause::ProjectileImpact,
                );
            }

            match world.scale_velocity(projectile_body, self.impact_slowdown) {
                Ok(()) => {
                    debug!("Projectile #{} slowed after breaking bamboo at speed {:.1}", projectile, speed);
                    resolution.slowed.push(projectile);
                }
                Err(err) => warn!("Projectile slowdown skipped: {}", err),
            }
        }

        // Enemy vs projectile or wood: any contact is lethal
        for &(enemy, enemy_body) in &enemies {
            let struck = projectiles
                .iter()
                .chain(solids.iter())
                .any(|&(_, other)| self.touching(world, enemy_body, other));
            if struck {
                schedule(
                    world,
                    &mut resolution,
                    enemy,
                    enemy_body,
                    Category::Enemy,
                    DestroyCause::EnemyStruck,
                );
            }
        }

        // Falling wood crushes bamboo
        for &(_, solid_body) in &solids {
            let Some(speed) = world.impact_speed(solid_body) else {
                continue;
            };
            if speed <= self.speed_threshold {
                continue;
            }
            for (block, block_body) in self.overlapping(world, solid_body, &breakables) {
                schedule(
                    world,
                    &mut resolution,
                    block,
                    block_body,
                    Category::BreakableBlock,
                    DestroyCause::Crushed,
                );
            }
        }

        resolution
    }

    fn overlapping(
        &self,
        world: &PhysicsWorld,
        body: BodyHandle,
        candidates: &[(EntityId, BodyHandle)],
    ) -> Vec<(EntityId, BodyHandle)> {
        candidates
            .iter()
            .copied()
            .filter(|&(_, other)| self.touching(world, body, other))
            .collect()
    }

    /// Contact during the last step, or overlap right now
    fn touching(&self, world: &PhysicsWorld, a: BodyHandle, b: BodyHandle) -> bool {
        world
            .contact_between(a, b)
            .is_some_and(|contact| contact.depth > self.overlap_tolerance)
            || world.overlaps(a, b, self.overlap_tolerance)
    }
}

impl Default for CollisionResolver {
    fn default() -> Self {
        Self::from_config(&CollisionConfig::default())
    }
}

/// Bodies of every entity in a category, in spawn order
fn bodies_of(entities: &EntityTable, category: Category) -> Vec<(EntityId, BodyHandle)> {
    entities
        .of_category(category)
        .filter_map(|entity| match entity.body {
            Some(handle) => Some((entity.id, handle)),
            None => {
                debug!("Skipping collision checks: {}", PhysicsError::NoBody(entity.id));
                None
            }
        })
        .collect()
}

fn schedule(
    world: &mut PhysicsWorld,
    resolution: &mut Resolution,
    id: EntityId,
    body: BodyHandle,
    category: Category,
    cause: DestroyCause,
) {
    if world.schedule_removal(body) {
        debug!("{} #{} scheduled for removal ({:?})", category.name(), id, cause);
        resolution.destroyed.push(Destroyed {
            id,
            category,
            cause,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    struct Scene {
        world: PhysicsWorld,
        entities: EntityTable,
        resolver: CollisionResolver,
    }

    impl Scene {
        fn new() -> Self {
            Self {
                world: PhysicsWorld::with_gravity(Vec2::ZERO),
                entities: EntityTable::new(),
                resolver: CollisionResolver::default(),
            }
        }

        fn spawn(&mut self, category: Category, position: Vec2) -> EntityId {
            self.entities
                .spawn(&mut self.world, category, position)
                .unwrap()
        }

        fn moving(&mut self, category: Category, position: Vec2, velocity: Vec2) -> EntityId {
            let id = self.spawn(category, position);
            let body = self.body(id);
            self.world.set_velocity(body, velocity).unwrap();
            id
        }

        fn body(&self, id: EntityId) -> BodyHandle {
            self.entities.get(id).unwrap().body.unwrap()
        }

        fn resolve(&mut self) -> Resolution {
            let resolution = self.resolver.resolve(&mut self.world, &self.entities);
            for (_, entity) in self.world.flush_removals() {
                self.entities.remove(entity);
            }
            resolution
        }
    }

    #[test]
    fn test_slow_projectile_leaves_bamboo() {
        let mut scene = Scene::new();
        let bamboo = scene.spawn(Category::BreakableBlock, Vec2::new(200.0, 100.0));
        let banana = scene.moving(Category::Projectile, Vec2::new(185.0, 100.0), Vec2::new(100.0, 0.0));

        let resolution = scene.resolve();

        assert!(resolution.is_empty());
        assert!(scene.entities.get(bamboo).is_some());
        assert_eq!(scene.world.velocity(scene.body(banana)), Some(Vec2::new(100.0, 0.0)));
    }

    #[test]
    fn test_fast_projectile_breaks_bamboo_and_slows() {
        let mut scene = Scene::new();
        let bamboo = scene.spawn(Category::BreakableBlock, Vec2::new(200.0, 100.0));
        let other = scene.spawn(Category::BreakableBlock, Vec2::new(400.0, 100.0));
        let banana = scene.moving(Category::Projectile, Vec2::new(185.0, 100.0), Vec2::new(300.0, 40.0));

        let resolution = scene.resolve();

        assert_eq!(
            resolution.destroyed,
            vec![Destroyed {
                id: bamboo,
                category: Category::BreakableBlock,
                cause: DestroyCause::ProjectileImpact,
            }]
        );
        assert_eq!(resolution.slowed, vec![banana]);
        assert!(scene.entities.get(bamboo).is_none());
        assert!(scene.entities.get(other).is_some());
        assert_eq!(scene.world.velocity(scene.body(banana)), Some(Vec2::new(150.0, 20.0)));
    }

    #[test]
    fn test_multiple_bamboo_break_together_slowdown_once() {
        let mut scene = Scene::new();
        let low = scene.spawn(Category::BreakableBlock, Vec2::new(200.0, 85.0));
        let high = scene.spawn(Category::BreakableBlock, Vec2::new(200.0, 115.0));
        let banana = scene.moving(Category::Projectile, Vec2::new(185.0, 100.0), Vec2::new(400.0, 0.0));

        let resolution = scene.resolve();

        let ids: Vec<_> = resolution.destroyed.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![low, high]);
        assert_eq!(scene.world.velocity(scene.body(banana)), Some(Vec2::new(200.0, 0.0)));
    }

    #[test]
    fn test_enemy_dies_on_contact_at_any_speed() {
        let mut scene = Scene::new();
        let enemy = scene.spawn(Category::Enemy, Vec2::new(500.0, 100.0));
        scene.spawn(Category::Projectile, Vec2::new(490.0, 100.0));

        let resolution = scene.resolve();

        assert_eq!(resolution.destroyed.len(), 1);
        assert_eq!(resolution.destroyed[0].id, enemy);
        assert_eq!(resolution.destroyed[0].cause, DestroyCause::EnemyStruck);
        assert_eq!(scene.entities.count(Category::Enemy), 0);
    }

    #[test]
    fn test_enemy_crushed_by_wood() {
        let mut scene = Scene::new();
        let enemy = scene.spawn(Category::Enemy, Vec2::new(500.0, 100.0));
        scene.spawn(Category::SolidBlock, Vec2::new(500.0, 130.0));

        let resolution = scene.resolve();
        assert_eq!(resolution.destroyed[0].id, enemy);
    }

    #[test]
    fn test_enemy_survives_bamboo_and_near_misses() {
        let mut scene = Scene::new();
        let enemy = scene.spawn(Category::Enemy, Vec2::new(500.0, 100.0));
        scene.moving(Category::BreakableBlock, Vec2::new(500.0, 130.0), Vec2::new(0.0, -500.0));
        // Wood beside it with a one unit gap
        scene.spawn(Category::SolidBlock, Vec2::new(541.0, 100.0));

        let resolution = scene.resolve();

        assert!(resolution.destroyed.is_empty());
        assert!(scene.entities.get(enemy).is_some());
    }

    #[test]
    fn test_falling_wood_crushes_bamboo_only_when_fast() {
        let mut scene = Scene::new();
        let crushed = scene.spawn(Category::BreakableBlock, Vec2::new(100.0, 100.0));
        scene.moving(Category::SolidBlock, Vec2::new(100.0, 130.0), Vec2::new(0.0, -150.0));
        let spared = scene.spawn(Category::BreakableBlock, Vec2::new(300.0, 100.0));
        scene.moving(Category::SolidBlock, Vec2::new(300.0, 130.0), Vec2::new(0.0, -50.0));

        let resolution = scene.resolve();

        assert_eq!(resolution.destroyed.len(), 1);
        assert_eq!(resolution.destroyed[0].id, crushed);
        assert_eq!(resolution.destroyed[0].cause, DestroyCause::Crushed);
        assert!(scene.entities.get(spared).is_some());
    }

    #[test]
    fn test_bamboo_hit_by_two_rules_reported_once() {
        let mut scene = Scene::new();
        let bamboo = scene.spawn(Category::BreakableBlock, Vec2::new(100.0, 100.0));
        scene.moving(Category::Projectile, Vec2::new(85.0, 100.0), Vec2::new(500.0, 0.0));
        scene.moving(Category::SolidBlock, Vec2::new(100.0, 130.0), Vec2::new(0.0, -500.0));

        let resolution = scene.resolve();

        assert_eq!(resolution.destroyed.len(), 1);
        assert_eq!(resolution.destroyed[0].id, bamboo);
        assert_eq!(resolution.destroyed[0].cause, DestroyCause::ProjectileImpact);
    }

    #[test]
    fn test_impact_speed_counts_after_solver_slows_projectile() {
        let mut scene = Scene::new();
        let bamboo = scene.spawn(Category::BreakableBlock, Vec2::new(300.0, 100.0));
        // One unit short of the bamboo, closing at 150
        let banana = scene.moving(Category::Projectile, Vec2::new(267.0, 100.0), Vec2::new(150.0, 0.0));

        scene.world.step(1.0 / 60.0);
        let after_solve = scene.world.speed(scene.body(banana)).unwrap();
        assert!(after_solve < 100.0, "solver left {}", after_solve);

        let resolution = scene.resolve();

        assert_eq!(resolution.destroyed.len(), 1);
        assert_eq!(resolution.destroyed[0].id, bamboo);
        assert_eq!(resolution.slowed, vec![banana]);
        let slowed = scene.world.speed(scene.body(banana)).unwrap();
        assert!((slowed - after_solve * 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_removals_deferred_until_flush() {
        let mut scene = Scene::new();
        let bamboo = scene.spawn(Category::BreakableBlock, Vec2::new(100.0, 100.0));
        scene.moving(Category::Projectile, Vec2::new(85.0, 100.0), Vec2::new(500.0, 0.0));

        let resolution = scene.resolver.resolve(&mut scene.world, &scene.entities);
        assert_eq!(resolution.destroyed.len(), 1);

        let handle = scene.body(bamboo);
        assert!(scene.world.registry().contains(handle));
        assert!(scene.world.registry().is_pending_removal(handle));

        scene.world.flush_removals();
        assert!(!scene.world.registry().contains(handle));
    }
}
