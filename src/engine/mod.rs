// Engine modules: physics and frame timing

pub mod game_loop;
pub mod physics;
