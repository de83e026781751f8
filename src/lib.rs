//! Plinko - peg-board drop game core
//!
//! Core modules:
//! - `sim`: Frame-stepped simulation (ball physics, peg collisions, landings, effects)
//! - `session`: Balance and cooldown bookkeeping with durable persistence
//! - `driver`: Game loop state machine, deferred action queue, drop requests
//! - `platform`: Clock and tick-source abstraction (browser/native/headless)
//! - `persistence`: Key-value storage backends
//! - `tuning`: Data-driven game balance

pub mod driver;
pub mod error;
pub mod format;
pub mod persistence;
pub mod platform;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use driver::{DropTicket, Game, LoopState};
pub use error::GameError;
pub use session::{Session, SessionRecord};
pub use settings::{QualityPreset, Settings};
pub use tuning::Tuning;

/// Physics and layout constants
///
/// Velocities are in pixels per second. The board was tuned at one step per
/// 60 Hz frame, so per-frame values are multiplied by `FRAME_RATE`.
pub mod consts {
    /// Simulation steps per second (one per rendered frame)
    pub const FRAME_RATE: f32 = 60.0;
    /// Fixed simulation timestep
    pub const SIM_DT: f32 = 1.0 / FRAME_RATE;
    /// Nominal frame interval for fixed-rate tick sources
    pub const FRAME_MS: u64 = 16;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 10.0;
    /// Downward acceleration (0.5 px/frame²)
    pub const GRAVITY: f32 = 0.5 * FRAME_RATE * FRAME_RATE;
    /// Per-component velocity cap (15 px/frame)
    pub const MAX_VELOCITY: f32 = 15.0 * FRAME_RATE;
    /// Fraction of horizontal velocity kept (and reversed) on a wall bounce
    pub const WALL_RESTITUTION: f32 = 0.7;
    /// Number of recent positions kept per ball
    pub const TRAIL_LENGTH: usize = 10;

    /// Peg defaults
    pub const PEG_RADIUS: f32 = 5.0;
    /// Speed a ball leaves a peg at before jitter (4 px/frame)
    pub const PEG_BOUNCE_SPEED: f32 = 4.0 * FRAME_RATE;
    /// Upper bound of the multiplicative bounce jitter
    pub const BOUNCE_VARIATION: f32 = 0.3;
    /// Half-range of the random horizontal kick after a peg hit (1 px/frame)
    pub const PEG_NUDGE: f32 = 1.0 * FRAME_RATE;
    /// Broad-phase half extent for peg candidates
    pub const BROAD_PHASE_EXTENT: f32 = 50.0;
    /// Glow set on a peg when struck
    pub const PEG_HIT_GLOW: f32 = 0.5;
    /// Per-frame glow decay factor
    pub const GLOW_DECAY: f32 = 0.95;

    /// Vertical space below the peg field reserved for slots
    pub const PEG_FIELD_BOTTOM_MARGIN: f32 = 150.0;
    /// Distance of the slot row above the bottom edge
    pub const SLOT_ROW_OFFSET: f32 = 50.0;
    /// Gap between neighbouring slot bands
    pub const SLOT_GAP: f32 = 10.0;
    /// Balls further than this below the board are culled
    pub const OFFSCREEN_MARGIN: f32 = 100.0;

    /// Drop zone width as a fraction of the board, capped at `DROP_ZONE_MAX`
    pub const DROP_ZONE_FRACTION: f32 = 0.3;
    pub const DROP_ZONE_MAX: f32 = 200.0;
    /// Half-range of the initial horizontal velocity (1 px/frame)
    pub const DROP_NUDGE: f32 = 1.0 * FRAME_RATE;
}
