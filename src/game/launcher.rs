// Slingshot throwing: drag gesture tracking and impulse launch

use glam::Vec2;
use log::{info, warn};

use super::entity::{Category, EntityId, EntityTable};
use crate::config::LaunchConfig;
use crate::core::math::is_finite;
use crate::engine::physics::{PhysicsError, PhysicsWorld};

/// Tracks a press-drag-release throw gesture
///
/// The host feeds pointer positions in; the gesture hands back the
/// `(start, end)` pair on release and exposes the aim line while dragging.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ThrowGesture {
    start: Option<Vec2>,
    end: Option<Vec2>,
}

impl ThrowGesture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin aiming at `position`
    pub fn press(&mut self, position: Vec2) {
        self.start = Some(position);
        self.end = Some(position);
    }

    /// Move the drag end. Ignored unless aiming.
    pub fn drag(&mut self, position: Vec2) {
        if self.start.is_some() {
            self.end = Some(position);
        }
    }

    /// Finish the throw. Returns `(start, end)` if a press was in progress.
    pub fn release(&mut self, position: Vec2) -> Option<(Vec2, Vec2)> {
        let start = self.start.take()?;
        self.end = None;
        Some((start, position))
    }

    /// Abandon the current aim without throwing
    pub fn cancel(&mut self) {
        self.start = None;
        self.end = None;
    }

    pub fn is_aiming(&self) -> bool {
        self.start.is_some()
    }

    /// The slingshot line to draw while aiming
    pub fn aim_line(&self) -> Option<(Vec2, Vec2)> {
        Some((self.start?, self.end?))
    }
}

/// Turns a drag vector into a projectile with an initial impulse
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpulseLauncher {
    /// Spawn point of every projectile
    origin: Vec2,
    /// Drag length to impulse scale
    force_multiplier: f32,
}

impl ImpulseLauncher {
    pub fn new(origin: Vec2, force_multiplier: f32) -> Self {
        Self {
            origin,
            force_multiplier,
        }
    }

    pub fn from_config(config: &LaunchConfig) -> Self {
        Self::new(config.origin, config.force_multiplier)
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Slingshot impulse: launch opposite the drag direction
    pub fn impulse_for(&self, start: Vec2, end: Vec2) -> Vec2 {
        (start - end) * self.force_multiplier
    }

    /// Spawn a projectile at the launch origin and apply the throw impulse
    ///
    /// A zero-length drag is a valid throw: the projectile just drops.
    pub fn launch(
        &self,
        world: &mut PhysicsWorld,
        entities: &mut EntityTable,
        start: Vec2,
        end: Vec2,
    ) -> Result<EntityId, PhysicsError> {
        let mut impulse = self.impulse_for(start, end);
        if !is_finite(impulse) {
            warn!("Non-finite throw from {:?} to {:?}, dropping projectile instead", start, end);
            impulse = Vec2::ZERO;
        }

        let id = entities.spawn(world, Category::Projectile, self.origin)?;
        match entities.get(id).and_then(|entity| entity.body) {
            Some(handle) => {
                if let Err(err) = world.apply_impulse(handle, impulse) {
                    warn!("Launch impulse skipped: {}", err);
                }
            }
            None => warn!("Launch impulse skipped: {}", PhysicsError::NoBody(id)),
        }

        info!("Projectile #{} launched with impulse {:?}", id, impulse);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const DT: f32 = 1.0 / 60.0;

    fn launcher() -> ImpulseLauncher {
        ImpulseLauncher::from_config(&LaunchConfig::default())
    }

    #[test]
    fn test_gesture_press_drag_release() {
        let mut gesture = ThrowGesture::new();
        assert!(!gesture.is_aiming());

        gesture.press(Vec2::new(100.0, 100.0));
        gesture.drag(Vec2::new(60.0, 80.0));
        assert_eq!(
            gesture.aim_line(),
            Some((Vec2::new(100.0, 100.0), Vec2::new(60.0, 80.0)))
        );

        let throw = gesture.release(Vec2::new(50.0, 70.0));
        assert_eq!(throw, Some((Vec2::new(100.0, 100.0), Vec2::new(50.0, 70.0))));
        assert!(!gesture.is_aiming());
        assert_eq!(gesture.aim_line(), None);
    }

    #[test]
    fn test_gesture_release_without_press() {
        let mut gesture = ThrowGesture::new();
        gesture.drag(Vec2::ONE);
        assert_eq!(gesture.aim_line(), None);
        assert_eq!(gesture.release(Vec2::ONE), None);
    }

    #[test]
    fn test_gesture_cancel() {
        let mut gesture = ThrowGesture::new();
        gesture.press(Vec2::ZERO);
        gesture.cancel();
        assert_eq!(gesture.release(Vec2::ONE), None);
    }

    #[test]
    fn test_impulse_opposes_drag() {
        let impulse = launcher().impulse_for(Vec2::ZERO, Vec2::new(-120.0, -40.0));
        assert_eq!(impulse, Vec2::new(480.0, 160.0));
    }

    #[test]
    fn test_launch_spawns_at_origin_with_velocity() {
        let mut world = PhysicsWorld::new();
        let mut entities = EntityTable::new();

        let id = launcher()
            .launch(&mut world, &mut entities, Vec2::new(300.0, 300.0), Vec2::new(200.0, 250.0))
            .unwrap();

        let entity = entities.get(id).unwrap();
        assert_eq!(entity.category, Category::Projectile);
        assert_eq!(entity.position, Vec2::new(170.0, 200.0));

        // impulse (400, 200) on a 0.5 kg banana
        let handle = entity.body.unwrap();
        assert_eq!(world.velocity(handle), Some(Vec2::new(800.0, 400.0)));
    }

    #[test]
    fn test_zero_drag_drops_under_gravity() {
        let mut world = PhysicsWorld::new();
        let mut entities = EntityTable::new();
        let point = Vec2::new(42.0, 42.0);

        let id = launcher()
            .launch(&mut world, &mut entities, point, point)
            .unwrap();
        let handle = entities.get(id).unwrap().body.unwrap();
        assert_eq!(world.velocity(handle), Some(Vec2::ZERO));

        world.step(DT);
        let velocity = world.velocity(handle).unwrap();
        assert_eq!(velocity.x, 0.0);
        assert_relative_eq!(velocity.y, -1000.0 * DT, epsilon = 1e-4);
    }

    #[test]
    fn test_non_finite_drag_becomes_drop() {
        let mut world = PhysicsWorld::new();
        let mut entities = EntityTable::new();

        let id = launcher()
            .launch(&mut world, &mut entities, Vec2::new(f32::NAN, 0.0), Vec2::ZERO)
            .unwrap();
        let handle = entities.get(id).unwrap().body.unwrap();
        assert_eq!(world.velocity(handle), Some(Vec2::ZERO));
    }
}
