// Game session: one level from setup to completion
//
// The host drives the session with `on_frame` and `on_throw_released` and reads
// back `SessionEvent`s for sounds, effects and screen changes.

use glam::Vec2;
use log::{debug, info, warn};

use super::entity::{Category, EntityId, EntityTable};
use super::launcher::ImpulseLauncher;
use super::level::{LevelSource, Placement};
use super::progress::{InMemoryProgressStore, ProgressStore};
use super::resolver::{CollisionResolver, Destroyed, Resolution};
use crate::config::GameConfig;
use crate::engine::physics::{PhysicsError, PhysicsWorld};

/// Phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// Throws accepted, simulation running
    #[default]
    InProgress,
    /// Every enemy is gone; counting down to level select
    Complete,
}

impl SessionState {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// Check if the player may still throw
    pub fn accepts_throws(&self) -> bool {
        matches!(self, Self::InProgress)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Complete => "complete",
        }
    }
}

/// Something the host may want to react to
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A projectile was spawned by a throw
    ProjectileLaunched { id: EntityId, impulse: Vec2 },
    /// An entity was removed by a collision rule
    EntityDestroyed(Destroyed),
    /// A projectile lost speed breaking bamboo
    ProjectileSlowed { id: EntityId },
    /// The last enemy of a numbered level fell
    LevelComplete { level: u32 },
    /// Time to go back to the level-select screen
    ReturnToLevelSelect,
}

/// Errors raised while setting up a session
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Level {0} is locked")]
    LevelLocked(u32),

    #[error(transparent)]
    Physics(#[from] PhysicsError),
}

/// A running level
pub struct Session<S: ProgressStore = InMemoryProgressStore> {
    /// `None` in practice mode, which never completes
    level: Option<u32>,
    state: SessionState,
    /// Seconds spent in `Complete`
    completion_timer: f32,
    completion_delay: f32,
    return_requested: bool,
    world: PhysicsWorld,
    entities: EntityTable,
    player: EntityId,
    launcher: ImpulseLauncher,
    resolver: CollisionResolver,
    progress: S,
    events: Vec<SessionEvent>,
    frames: u64,
}

impl<S: ProgressStore> Session<S> {
    /// Build the world: ground, player, then every placement in order
    ///
    /// Placements of categories that never come from level data are skipped.
    pub fn new(
        config: &GameConfig,
        level: Option<u32>,
        placements: &[Placement],
        progress: S,
    ) -> Result<Self, SessionError> {
        let mut world = PhysicsWorld::with_settings(config.physics.gravity, config.solver_settings());
        let mut entities = EntityTable::new();

        entities.spawn(&mut world, Category::StaticGround, config.world.ground_center)?;
        let player = entities.spawn(&mut world, Category::Player, config.launch.player_position)?;

        for placement in placements {
            if !placement.is_placeable() {
                warn!(
                    "Skipping {} placement at {:?}",
                    placement.category.name(),
                    placement.position
                );
                continue;
            }
            entities.spawn(&mut world, placement.category, placement.position)?;
        }

        match level {
            Some(number) => info!(
                "Level {} started: {} enemies, {} bamboo, {} wood",
                number,
                entities.count(Category::Enemy),
                entities.count(Category::BreakableBlock),
                entities.count(Category::SolidBlock)
            ),
            None => info!("Practice started with {} entities", entities.len()),
        }

        Ok(Self {
            level,
            state: SessionState::InProgress,
            completion_timer: 0.0,
            completion_delay: config.session.completion_delay,
            return_requested: false,
            world,
            entities,
            player,
            launcher: ImpulseLauncher::from_config(&config.launch),
            resolver: CollisionResolver::from_config(&config.collision),
            progress,
            events: Vec::new(),
            frames: 0,
        })
    }

    /// Start a numbered level if the progress store allows it
    pub fn start_level(
        config: &GameConfig,
        level: u32,
        source: &dyn LevelSource,
        progress: S,
    ) -> Result<Self, SessionError> {
        if !progress.is_unlocked(level) {
            return Err(SessionError::LevelLocked(level));
        }
        Self::new(config, Some(level), &source.placements(Some(level)), progress)
    }

    /// Free play on the source's practice layout
    pub fn practice(
        config: &GameConfig,
        source: &dyn LevelSource,
        progress: S,
    ) -> Result<Self, SessionError> {
        Self::new(config, None, &source.placements(None), progress)
    }

    /// Advance the session by `dt` seconds
    pub fn on_frame(&mut self, dt: f32) {
        if !dt.is_finite() || dt < 0.0 {
            warn!("Ignoring frame with invalid dt {}", dt);
            return;
        }
        self.frames += 1;

        match self.state {
            SessionState::InProgress => {
                self.world.step(dt);
                self.entities.sync_positions(&self.world);

                let resolution = self.resolver.resolve(&mut self.world, &self.entities);
                self.apply(resolution);
                self.check_completion();
            }
            SessionState::Complete => {
                self.completion_timer += dt;
                if self.completion_timer > self.completion_delay && !self.return_requested {
                    self.return_requested = true;
                    self.events.push(SessionEvent::ReturnToLevelSelect);
                    info!("Returning to level select");
                }
            }
        }
    }

    /// Throw a projectile along the released drag
    ///
    /// Returns the new projectile, or `None` once the level is complete.
    pub fn on_throw_released(&mut self, start: Vec2, end: Vec2) -> Option<EntityId> {
        if !self.state.accepts_throws() {
            debug!("Throw ignored in state {}", self.state.name());
            return None;
        }

        let impulse = Some(self.launcher.impulse_for(start, end))
            .filter(|impulse| impulse.is_finite())
            .unwrap_or(Vec2::ZERO);
        match self.launcher.launch(&mut self.world, &mut self.entities, start, end) {
            Ok(id) => {
                self.events.push(SessionEvent::ProjectileLaunched { id, impulse });
                Some(id)
            }
            Err(err) => {
                warn!("Throw failed: {}", err);
                None
            }
        }
    }

    /// Leave the level early. Ignored once complete; the countdown takes over.
    pub fn request_exit(&mut self) -> bool {
        if self.state.is_complete() {
            return false;
        }
        if !self.return_requested {
            self.return_requested = true;
            self.events.push(SessionEvent::ReturnToLevelSelect);
            info!("Exit requested");
        }
        true
    }

    fn apply(&mut self, resolution: Resolution) {
        for (_, entity) in self.world.flush_removals() {
            self.entities.remove(entity);
        }

        for id in resolution.slowed {
            self.events.push(SessionEvent::ProjectileSlowed { id });
        }
        self.events
            .extend(resolution.destroyed.into_iter().map(SessionEvent::EntityDestroyed));
    }

    fn check_completion(&mut self) {
        let Some(level) = self.level else {
            return;
        };
        if self.state.is_complete() || self.entities.count(Category::Enemy) > 0 {
            return;
        }

        self.state = SessionState::Complete;
        self.completion_timer = 0.0;
        self.progress.mark_complete(level);
        self.events.push(SessionEvent::LevelComplete { level });
        info!("Level {} complete after {} frames", level, self.frames);
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }

    /// Whether the host should switch to level select
    pub fn should_return_to_menu(&self) -> bool {
        self.return_requested
    }

    pub fn level(&self) -> Option<u32> {
        self.level
    }

    /// Seconds since completion, zero while in progress
    pub fn completion_timer(&self) -> f32 {
        self.completion_timer
    }

    /// Enemies still standing, in spawn order
    pub fn active_enemies(&self) -> Vec<EntityId> {
        self.entities.ids(Category::Enemy)
    }

    /// Take all events raised since the last call
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn entities(&self) -> &EntityTable {
        &self.entities
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn player(&self) -> EntityId {
        self.player
    }

    pub fn launch_origin(&self) -> Vec2 {
        self.launcher.origin()
    }

    pub fn progress(&self) -> &S {
        &self.progress
    }

    /// End the session and hand the progress store back to the host
    pub fn into_progress(self) -> S {
        self.progress
    }
}
