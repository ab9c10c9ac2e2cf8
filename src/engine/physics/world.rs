use glam::Vec2;
use log::warn;

use super::body::{BodyHandle, PhysicalBody};
use super::collision::{self, Contact, SolverSettings};
use super::registry::BodyRegistry;
use super::PhysicsError;

/// Screen-space gravity (pixels/s², y up)
pub const DEFAULT_GRAVITY: Vec2 = Vec2::new(0.0, -1000.0);

/// Physics world that manages all physics simulation
pub struct PhysicsWorld {
    /// Gravity acceleration applied to dynamic bodies
    gravity: Vec2,

    /// Contact solver tuning
    settings: SolverSettings,

    /// Every registered body
    registry: BodyRegistry,

    /// Contacts found during the last step, before the solver responded
    contacts: Vec<Contact>,
}

impl PhysicsWorld {
    /// Create a new physics world with default settings
    pub fn new() -> Self {
        Self::with_gravity(DEFAULT_GRAVITY)
    }

    /// Create a new physics world with custom gravity
    pub fn with_gravity(gravity: Vec2) -> Self {
        Self::with_settings(gravity, SolverSettings::default())
    }

    pub fn with_settings(gravity: Vec2, settings: SolverSettings) -> Self {
        Self {
            gravity,
            settings,
            registry: BodyRegistry::new(),
            contacts: Vec::new(),
        }
    }

    /// Step the simulation forward by `dt` seconds
    ///
    /// Dynamic bodies get `v += g*dt`, then `v *= damping`, then `p += v*dt`.
    /// Damping is a per-call factor, so its effect depends on the frame rate.
    pub fn step(&mut self, dt: f32) {
        if !dt.is_finite() || dt < 0.0 {
            warn!("Ignoring physics step with invalid dt {}", dt);
            return;
        }

        let gravity = self.gravity;
        for (_, body) in self.registry.iter_mut() {
            if !body.is_dynamic() {
                continue;
            }
            body.velocity += gravity * dt;
            body.velocity *= body.damping;
            body.position += body.velocity * dt;
        }

        self.contacts = collision::solve_contacts(&mut self.registry, &self.settings);
    }

    /// Add a body to the world on behalf of an entity
    pub fn register(&mut self, entity: u64, body: PhysicalBody) -> Result<BodyHandle, PhysicsError> {
        self.registry.register(entity, body)
    }

    /// Remove a body immediately (no-op for unknown handles)
    pub fn unregister(&mut self, handle: BodyHandle) -> Option<PhysicalBody> {
        self.registry.unregister(handle)
    }

    /// Queue a removal that is safe to request while iterating
    pub fn schedule_removal(&mut self, handle: BodyHandle) -> bool {
        self.registry.schedule_removal(handle)
    }

    /// Apply queued removals
    pub fn flush_removals(&mut self) -> Vec<(BodyHandle, u64)> {
        self.registry.flush_removals()
    }

    /// Instantaneous velocity change of `impulse / mass`
    ///
    /// Static bodies ignore impulses.
    pub fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec2) -> Result<(), PhysicsError> {
        let body = self
            .registry
            .get_mut(handle)
            .ok_or(PhysicsError::MissingBody(handle))?;

        if body.is_dynamic() {
            body.velocity += impulse * body.inverse_mass();
        }
        Ok(())
    }

    /// Penetration depth between two bodies, if they overlap
    pub fn overlap_depth(&self, a: BodyHandle, b: BodyHandle) -> Option<f32> {
        let body_a = self.registry.get(a)?;
        let body_b = self.registry.get(b)?;
        collision::penetration(body_a, body_b).map(|(_, depth)| depth)
    }

    /// Check if two bodies overlap by more than `tolerance`
    pub fn overlaps(&self, a: BodyHandle, b: BodyHandle, tolerance: f32) -> bool {
        self.overlap_depth(a, b)
            .is_some_and(|depth| depth > tolerance)
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&PhysicalBody> {
        self.registry.get(handle)
    }

    pub fn position(&self, handle: BodyHandle) -> Option<Vec2> {
        self.registry.get(handle).map(|body| body.position)
    }

    pub fn velocity(&self, handle: BodyHandle) -> Option<Vec2> {
        self.registry.get(handle).map(|body| body.velocity)
    }

    pub fn speed(&self, handle: BodyHandle) -> Option<f32> {
        self.registry.get(handle).map(PhysicalBody::speed)
    }

    /// Overwrite a dynamic body's velocity
    pub fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec2) -> Result<(), PhysicsError> {
        let body = self
            .registry
            .get_mut(handle)
            .ok_or(PhysicsError::MissingBody(handle))?;

        if body.is_dynamic() {
            body.velocity = velocity;
        }
        Ok(())
    }

    /// Multiply a body's velocity by `factor`
    pub fn scale_velocity(&mut self, handle: BodyHandle, factor: f32) -> Result<(), PhysicsError> {
        let body = self
            .registry
            .get_mut(handle)
            .ok_or(PhysicsError::MissingBody(handle))?;
        body.velocity *= factor;
        Ok(())
    }

    pub fn registry(&self) -> &BodyRegistry {
        &self.registry
    }

    /// Set gravity for the physics world
    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    /// Get current gravity
    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    /// Number of contacts resolved in the most recent step
    pub fn last_contact_count(&self) -> usize {
        self.contacts.len()
    }

    /// Contacts of the most recent step with their depth and speeds at impact
    ///
    /// The solver separates bodies right after finding them, so this is the
    /// record of what touched during the step.
    pub fn last_contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// The contact between two bodies in the most recent step, if any
    pub fn contact_between(&self, a: BodyHandle, b: BodyHandle) -> Option<&Contact> {
        self.contacts.iter().find(|contact| contact.joins(a, b))
    }

    /// Speed of a body as it hit something in the last step, or its current
    /// speed if it touched nothing
    pub fn impact_speed(&self, handle: BodyHandle) -> Option<f32> {
        let current = self.speed(handle)?;
        Some(
            self.contacts
                .iter()
                .find_map(|contact| contact.speed_of(handle))
                .unwrap_or(current),
        )
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}
