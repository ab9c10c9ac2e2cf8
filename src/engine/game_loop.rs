/// Fixed timestep frame clock
///
/// The host reports how long each rendered frame took and runs the returned
/// number of fixed session steps. Time is never read from the system clock,
/// so a headless run with a constant frame time is fully reproducible.

/// Target update rate (60 updates per second)
pub const FIXED_TIMESTEP: f32 = 1.0 / 60.0;

/// Maximum number of steps per frame to prevent spiral of death
pub const MAX_STEPS_PER_FRAME: u32 = 5;

/// FPS tracking window (average over last N frames)
const FPS_WINDOW_SIZE: usize = 60;

/// Frame timing state
#[derive(Debug)]
pub struct FrameClock {
    /// Length of one fixed step in seconds
    timestep: f32,

    /// Time not yet consumed by fixed steps
    accumulator: f32,

    /// Whether stepping is paused
    paused: bool,

    /// Recent frame times for FPS calculation
    frame_times: Vec<f32>,

    /// Frames reported so far
    frame_count: u64,

    /// Fixed steps handed out so far
    update_count: u64,

    /// Sum of reported frame times
    elapsed: f64,

    /// Current FPS (updated periodically)
    current_fps: f32,
}

impl FrameClock {
    /// Clock stepping at `FIXED_TIMESTEP`
    pub fn new() -> Self {
        Self::with_timestep(FIXED_TIMESTEP)
    }

    /// Clock with a custom step length. Non-positive values fall back to the default.
    pub fn with_timestep(timestep: f32) -> Self {
        let timestep = if timestep.is_finite() && timestep > 0.0 {
            timestep
        } else {
            log::warn!("Invalid timestep {}, using {}", timestep, FIXED_TIMESTEP);
            FIXED_TIMESTEP
        };

        Self {
            timestep,
            accumulator: 0.0,
            paused: false,
            frame_times: Vec::with_capacity(FPS_WINDOW_SIZE),
            frame_count: 0,
            update_count: 0,
            elapsed: 0.0,
            current_fps: 0.0,
        }
    }

    /// Begin a new frame that took `frame_time` seconds, returns the number of fixed steps to run
    pub fn begin_frame(&mut self, frame_time: f32) -> u32 {
        if !frame_time.is_finite() || frame_time < 0.0 {
            log::warn!("Ignoring invalid frame time {}", frame_time);
            return 0;
        }

        self.frame_count += 1;
        self.elapsed += frame_time as f64;

        self.frame_times.push(frame_time);
        if self.frame_times.len() > FPS_WINDOW_SIZE {
            self.frame_times.remove(0);
        }
        if self.frame_count % 10 == 0 {
            self.update_fps();
        }

        if self.paused {
            return 0;
        }

        self.accumulator += frame_time;

        let mut updates = 0;
        while self.accumulator >= self.timestep && updates < MAX_STEPS_PER_FRAME {
            self.accumulator -= self.timestep;
            updates += 1;
        }

        // Drop time that could not be caught up
        if updates == MAX_STEPS_PER_FRAME && self.accumulator >= self.timestep {
            log::debug!("Frame clock behind by {:.3}s, dropping it", self.accumulator);
            self.accumulator %= self.timestep;
        }

        self.update_count += updates as u64;
        updates
    }

    /// Length of one fixed step in seconds
    pub fn fixed_timestep(&self) -> f32 {
        self.timestep
    }

    /// Interpolation alpha between the last two fixed steps
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.timestep).clamp(0.0, 1.0)
    }

    pub fn fps(&self) -> f32 {
        self.current_fps
    }

    /// Total reported time in seconds
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            log::info!("Simulation paused");
        }
    }

    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            // Reset accumulator to prevent update burst
            self.accumulator = 0.0;
            log::info!("Simulation resumed");
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    fn update_fps(&mut self) {
        let total: f32 = self.frame_times.iter().sum();
        self.current_fps = if total > 0.0 {
            self.frame_times.len() as f32 / total
        } else {
            0.0
        };
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
