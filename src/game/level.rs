// Level layouts and the level-select model
//
// Where placements come from (tilemaps, editors, code) is the host's business;
// the session only consumes `(category, position)` pairs.

use std::collections::BTreeMap;

use glam::Vec2;
use log::warn;

use super::entity::Category;
use super::progress::ProgressStore;
use super::stats::{CategoryStats, GROUND_STATS};
use crate::config::GameConfig;
use crate::engine::physics::BodyShape;

/// One object to put in the level before the simulation starts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub category: Category,
    pub position: Vec2,
}

impl Placement {
    pub fn new(category: Category, position: Vec2) -> Self {
        Self { category, position }
    }

    /// Only bamboo, wood and enemies come from level data
    pub fn is_placeable(&self) -> bool {
        matches!(
            self.category,
            Category::BreakableBlock | Category::SolidBlock | Category::Enemy
        ) && self.position.is_finite()
    }
}

/// Supplies placements at session setup
pub trait LevelSource {
    /// Layout for a numbered level, or the practice layout for `None`.
    /// Unknown levels yield an empty list.
    fn placements(&self, level: Option<u32>) -> Vec<Placement>;
}

fn half_height(shape: BodyShape) -> f32 {
    match shape {
        BodyShape::Rect { half_extents } => half_extents.y,
        BodyShape::Circle { radius } => radius,
    }
}

/// The built-in four-row tower used when no level data is available
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefaultLevel {
    /// Horizontal centre of the tower
    tower_x: f32,
    /// Height of the ground's top surface
    ground_top: f32,
}

impl DefaultLevel {
    pub fn new(tower_x: f32, ground_top: f32) -> Self {
        Self {
            tower_x,
            ground_top,
        }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(
            config.world.screen_width - 200.0,
            config.world.ground_center.y + half_height(GROUND_STATS.shape),
        )
    }

    /// Tower layout: three bamboo at the base, an enemy between two wood
    /// pillars, a bamboo slab, an enemy on top
    ///
    /// Wood never touches an enemy while the tower stands; columns are 50
    /// apart, leaving a 10 unit gap beside each 40 unit block.
    pub fn layout(&self) -> Vec<Placement> {
        let x = self.tower_x;
        let size = 2.0 * half_height(CategoryStats::for_category(Category::SolidBlock).shape);
        let row = |n: f32| self.ground_top + size * (n + 0.5);

        vec![
            // Base
            Placement::new(Category::BreakableBlock, Vec2::new(x - 50.0, row(0.0))),
            Placement::new(Category::BreakableBlock, Vec2::new(x, row(0.0))),
            Placement::new(Category::BreakableBlock, Vec2::new(x + 50.0, row(0.0))),
            // Enemy 1 between pillars
            Placement::new(Category::SolidBlock, Vec2::new(x - 50.0, row(1.0))),
            Placement::new(Category::Enemy, Vec2::new(x, row(1.0))),
            Placement::new(Category::SolidBlock, Vec2::new(x + 50.0, row(1.0))),
            // Slab
            Placement::new(Category::BreakableBlock, Vec2::new(x, row(2.0))),
            // Enemy 2
            Placement::new(Category::Enemy, Vec2::new(x, row(3.0))),
        ]
    }
}

impl LevelSource for DefaultLevel {
    fn placements(&self, _level: Option<u32>) -> Vec<Placement> {
        self.layout()
    }
}

/// Placements held in memory per level number
#[derive(Debug, Clone, Default)]
pub struct StaticLevels {
    levels: BTreeMap<u32, Vec<Placement>>,
    practice: Vec<Placement>,
}

impl StaticLevels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a numbered level
    pub fn with_level(mut self, level: u32, placements: Vec<Placement>) -> Self {
        self.levels.insert(level, placements);
        self
    }

    /// Layout used when no level number is given
    pub fn with_practice(mut self, placements: Vec<Placement>) -> Self {
        self.practice = placements;
        self
    }

    /// Level numbers with data, ascending
    pub fn level_numbers(&self) -> Vec<u32> {
        self.levels.keys().copied().collect()
    }
}

impl LevelSource for StaticLevels {
    fn placements(&self, level: Option<u32>) -> Vec<Placement> {
        match level {
            None => self.practice.clone(),
            Some(number) => match self.levels.get(&number) {
                Some(placements) => placements.clone(),
                None => {
                    warn!("No layout for level {}, starting it empty", number);
                    Vec::new()
                }
            },
        }
    }
}

/// One row of the level-select screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelEntry {
    pub number: u32,
    pub unlocked: bool,
}

/// The set of levels a player can pick from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelCatalog {
    levels: Vec<u32>,
}

impl LevelCatalog {
    pub fn new(levels: impl IntoIterator<Item = u32>) -> Self {
        let mut levels: Vec<u32> = levels.into_iter().collect();
        levels.sort_unstable();
        levels.dedup();
        Self { levels }
    }

    /// Every available level with its lock state
    pub fn entries(&self, progress: &dyn ProgressStore) -> Vec<LevelEntry> {
        self.levels
            .iter()
            .map(|&number| LevelEntry {
                number,
                unlocked: progress.is_unlocked(number),
            })
            .collect()
    }

    /// Whether the level exists and is unlocked
    pub fn can_start(&self, level: u32, progress: &dyn ProgressStore) -> bool {
        self.levels.contains(&level) && progress.is_unlocked(level)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}
