//! Frame-stepped simulation module
//!
//! All board logic lives here:
//! - Fixed timestep only (one step per rendered frame)
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - No rendering, storage, or platform dependencies

pub mod collision;
pub mod effects;
pub mod payout;
pub mod state;
pub mod tick;

pub use collision::{CollisionResult, ball_peg_collision, bounce_off_walls, collide_pegs};
pub use effects::{Effects, Particle, Popup, WinTier};
pub use payout::{Landing, LandingResolver, Payout, Resolution, payout_amount, resolve_landing};
pub use state::{Ball, Board, Peg, SimState, Slot};
pub use tick::{cleanup, integrate, tick};
