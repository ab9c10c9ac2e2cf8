use glam::Vec2;
use log::debug;
use parry2d::bounding_volume::BoundingVolume;
use parry2d::query;

use super::body::{BodyHandle, PhysicalBody};
use super::registry::BodyRegistry;
use crate::core::math::{from_vector, is_finite, isometry_at};

/// Tuning for the contact solver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverSettings {
    /// Velocity passes over the contact list per step
    pub iterations: u32,

    /// Penetration left uncorrected so resting contacts stay in contact
    pub penetration_slop: f32,

    /// Fraction of the remaining penetration removed each step (0..=1)
    pub correction_percent: f32,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            iterations: 4,
            penetration_slop: 0.5,
            correction_percent: 0.8,
        }
    }
}

/// A penetrating pair found after integration
///
/// Depth and speeds are captured before the solver touches either body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub a: BodyHandle,
    pub b: BodyHandle,
    /// Unit normal pointing from `a` towards `b`
    pub normal: Vec2,
    /// Penetration depth (always positive)
    pub depth: f32,
    /// Closing speed along the normal, positive when approaching
    pub approach_speed: f32,
    /// Speed of `a` at impact
    pub speed_a: f32,
    /// Speed of `b` at impact
    pub speed_b: f32,
}

impl Contact {
    /// Whether this contact joins `x` and `y`, in either order
    pub fn joins(&self, x: BodyHandle, y: BodyHandle) -> bool {
        (self.a == x && self.b == y) || (self.a == y && self.b == x)
    }

    /// Impact speed of one side of the contact
    pub fn speed_of(&self, handle: BodyHandle) -> Option<f32> {
        if handle == self.a {
            Some(self.speed_a)
        } else if handle == self.b {
            Some(self.speed_b)
        } else {
            None
        }
    }
}

/// Penetration between two bodies: normal from `a` to `b` and depth
///
/// Touching without overlap is not a penetration.
pub(crate) fn penetration(a: &PhysicalBody, b: &PhysicalBody) -> Option<(Vec2, f32)> {
    // Broad phase
    if !a.aabb().intersects(&b.aabb()) {
        return None;
    }

    let pos_a = isometry_at(a.position);
    let pos_b = isometry_at(b.position);
    let result = a.shape.with_shape(|shape_a| {
        b.shape
            .with_shape(|shape_b| query::contact(&pos_a, shape_a, &pos_b, shape_b, 0.0))
    });

    match result {
        Ok(Some(contact)) if contact.dist < 0.0 => {
            let normal = from_vector(&contact.normal1);
            if !is_finite(normal) {
                return None;
            }
            Some((normal, -contact.dist))
        }
        Ok(_) => None,
        Err(unsupported) => {
            debug!("Unsupported shape pair in contact query: {:?}", unsupported);
            None
        }
    }
}

/// Find every penetrating pair with at least one dynamic body, in handle order
pub(crate) fn find_contacts(registry: &BodyRegistry) -> Vec<Contact> {
    let bodies: Vec<(BodyHandle, &PhysicalBody)> = registry.iter().collect();
    let mut contacts = Vec::new();

    for (i, (handle_a, body_a)) in bodies.iter().enumerate() {
        for (handle_b, body_b) in &bodies[i + 1..] {
            if !body_a.is_dynamic() && !body_b.is_dynamic() {
                continue;
            }
            if let Some((normal, depth)) = penetration(body_a, body_b) {
                contacts.push(Contact {
                    a: *handle_a,
                    b: *handle_b,
                    normal,
                    depth,
                    approach_speed: -(body_b.velocity - body_a.velocity).dot(normal),
                    speed_a: body_a.speed(),
                    speed_b: body_b.speed(),
                });
            }
        }
    }

    contacts
}

/// Resolve all contacts: inelastic normal response with Coulomb friction,
/// then partial positional correction
///
/// Returns the contacts as they were found, before any response.
pub(crate) fn solve_contacts(registry: &mut BodyRegistry, settings: &SolverSettings) -> Vec<Contact> {
    let contacts = find_contacts(registry);
    if contacts.is_empty() {
        return contacts;
    }

    for _ in 0..settings.iterations.max(1) {
        for contact in &contacts {
            resolve_velocity(registry, contact);
        }
    }

    for contact in &contacts {
        correct_position(registry, contact, settings);
    }

    contacts
}

fn pair(registry: &BodyRegistry, contact: &Contact) -> Option<(PhysicalBody, PhysicalBody)> {
    Some((*registry.get(contact.a)?, *registry.get(contact.b)?))
}

fn write_back(registry: &mut BodyRegistry, contact: &Contact, a: PhysicalBody, b: PhysicalBody) {
    if let Some(body) = registry.get_mut(contact.a) {
        *body = a;
    }
    if let Some(body) = registry.get_mut(contact.b) {
        *body = b;
    }
}

fn resolve_velocity(registry: &mut BodyRegistry, contact: &Contact) {
    let Some((mut a, mut b)) = pair(registry, contact) else {
        return;
    };

    let inv_a = a.inverse_mass();
    let inv_b = b.inverse_mass();
    let inv_sum = inv_a + inv_b;
    if inv_sum <= 0.0 {
        return;
    }

    let normal = contact.normal;
    let relative = b.velocity - a.velocity;
    let normal_speed = relative.dot(normal);
    if normal_speed >= 0.0 {
        // Already separating
        return;
    }

    // No restitution: cancel the approaching normal velocity
    let j = -normal_speed / inv_sum;
    let mut impulse = normal * j;

    let tangent_velocity = relative - normal * normal_speed;
    let tangent_speed = tangent_velocity.length();
    if tangent_speed > f32::EPSILON {
        let tangent = tangent_velocity / tangent_speed;
        let mu = a.friction * b.friction;
        let jt = (-relative.dot(tangent) / inv_sum).clamp(-mu * j, mu * j);
        impulse += tangent * jt;
    }

    a.velocity -= impulse * inv_a;
    b.velocity += impulse * inv_b;
    write_back(registry, contact, a, b);
}

fn correct_position(registry: &mut BodyRegistry, contact: &Contact, settings: &SolverSettings) {
    let Some((mut a, mut b)) = pair(registry, contact) else {
        return;
    };

    let inv_sum = a.inverse_mass() + b.inverse_mass();
    let excess = (contact.depth - settings.penetration_slop).max(0.0);
    if inv_sum <= 0.0 || excess == 0.0 {
        return;
    }

    let correction = contact.normal * (excess * settings.correction_percent / inv_sum);
    a.position -= correction * a.inverse_mass();
    b.position += correction * b.inverse_mass();
    write_back(registry, contact, a, b);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::physics::{BodyBuilder, BodyShape};
    use approx::assert_relative_eq;

    fn ground() -> PhysicalBody {
        BodyBuilder::new_static()
            .shape(BodyShape::rect(100.0, 10.0))
            .position(Vec2::new(0.0, 0.0))
            .build()
    }

    fn block_at(position: Vec2, velocity: Vec2) -> PhysicalBody {
        BodyBuilder::new_dynamic(1.0)
            .shape(BodyShape::rect(5.0, 5.0))
            .position(position)
            .linvel(velocity)
            .build()
    }

    #[test]
    fn test_penetration_separated() {
        let a = block_at(Vec2::ZERO, Vec2::ZERO);
        let b = block_at(Vec2::new(20.0, 0.0), Vec2::ZERO);
        assert!(penetration(&a, &b).is_none());
    }

    #[test]
    fn test_touching_is_not_penetration() {
        let a = block_at(Vec2::ZERO, Vec2::ZERO);
        let b = block_at(Vec2::new(10.0, 0.0), Vec2::ZERO);
        assert!(penetration(&a, &b).is_none());
    }

    #[test]
    fn test_penetration_normal_and_depth() {
        let floor = ground();
        let block = block_at(Vec2::new(0.0, 13.0), Vec2::ZERO);

        let (normal, depth) = penetration(&floor, &block).unwrap();
        assert_relative_eq!(normal.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(normal.y, 1.0, epsilon = 1e-5);
        assert_relative_eq!(depth, 2.0, epsilon = 1e-4);
    }

    #[test]
    fn test_circle_against_rect() {
        let floor = ground();
        let ball = BodyBuilder::new_dynamic(0.5)
            .shape(BodyShape::circle(4.0))
            .position(Vec2::new(0.0, 13.0))
            .build();

        let (_, depth) = penetration(&floor, &ball).unwrap();
        assert_relative_eq!(depth, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_static_pairs_skipped() {
        let mut registry = BodyRegistry::new();
        registry.register(1, ground()).unwrap();
        registry.register(2, ground()).unwrap();
        assert!(find_contacts(&registry).is_empty());
    }

    #[test]
    fn test_landing_block_stops_and_is_pushed_out() {
        let mut registry = BodyRegistry::new();
        registry.register(1, ground()).unwrap();
        let block = registry
            .register(2, block_at(Vec2::new(0.0, 12.0), Vec2::new(0.0, -50.0)))
            .unwrap();

        let solved = solve_contacts(&mut registry, &SolverSettings::default());
        assert_eq!(solved.len(), 1);
        // Reported as found, not as corrected
        assert_relative_eq!(solved[0].depth, 3.0, epsilon = 1e-4);
        assert_relative_eq!(solved[0].approach_speed, 50.0, epsilon = 1e-4);
        assert_relative_eq!(solved[0].speed_b, 50.0, epsilon = 1e-4);

        let body = registry.get(block).unwrap();
        assert_relative_eq!(body.velocity.y, 0.0, epsilon = 1e-4);
        // 3 units deep, 0.5 slop, 80% corrected
        assert_relative_eq!(body.position.y, 14.0, epsilon = 1e-3);
    }

    #[test]
    fn test_friction_slows_sliding() {
        let mut registry = BodyRegistry::new();
        registry.register(1, ground()).unwrap();
        let block = registry
            .register(2, block_at(Vec2::new(0.0, 14.0), Vec2::new(30.0, -10.0)))
            .unwrap();

        solve_contacts(&mut registry, &SolverSettings::default());

        let body = registry.get(block).unwrap();
        assert!(body.velocity.x < 30.0);
        assert!(body.velocity.x >= 0.0, "friction never reverses motion");
    }

    #[test]
    fn test_separating_pair_untouched() {
        let mut registry = BodyRegistry::new();
        registry.register(1, ground()).unwrap();
        let block = registry
            .register(2, block_at(Vec2::new(0.0, 14.0), Vec2::new(0.0, 25.0)))
            .unwrap();

        solve_contacts(&mut registry, &SolverSettings::default());
        assert_eq!(registry.get(block).unwrap().velocity, Vec2::new(0.0, 25.0));
    }

    #[test]
    fn test_inelastic_dynamic_pair_shares_momentum() {
        let mut registry = BodyRegistry::new();
        let a = registry
            .register(1, block_at(Vec2::ZERO, Vec2::new(10.0, 0.0)))
            .unwrap();
        let b = registry
            .register(2, block_at(Vec2::new(9.0, 0.0), Vec2::ZERO))
            .unwrap();

        solve_contacts(&mut registry, &SolverSettings::default());

        let va = registry.get(a).unwrap().velocity;
        let vb = registry.get(b).unwrap().velocity;
        assert_relative_eq!(va.x, 5.0, epsilon = 1e-4);
        assert_relative_eq!(vb.x, 5.0, epsilon = 1e-4);
    }

    #[test]
    fn test_contact_joins_either_order() {
        let mut registry = BodyRegistry::new();
        let a = registry
            .register(1, block_at(Vec2::ZERO, Vec2::new(10.0, 0.0)))
            .unwrap();
        let b = registry
            .register(2, block_at(Vec2::new(9.0, 0.0), Vec2::ZERO))
            .unwrap();
        let stranger = BodyHandle::from_raw(99);

        let contacts = find_contacts(&registry);
        assert_eq!(contacts.len(), 1);
        assert!(contacts[0].joins(a, b));
        assert!(contacts[0].joins(b, a));
        assert!(!contacts[0].joins(a, stranger));
        assert_eq!(contacts[0].speed_of(a), Some(10.0));
        assert_eq!(contacts[0].speed_of(b), Some(0.0));
        assert_eq!(contacts[0].speed_of(stranger), None);
    }
}
