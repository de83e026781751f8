//! Collision detection and response
//!
//! Walls reflect with energy loss. Pegs do not reflect at all: a hit sends
//! the ball away from the peg centre at a fixed speed with random jitter,
//! which reads better on screen than an elastic bounce.

use glam::Vec2;
use rand::Rng;

use super::state::{Ball, Peg};
use crate::consts::*;

/// Result of a ball/peg overlap check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Unit vector from peg centre toward ball centre
    pub normal: Vec2,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
        }
    }
}

/// Exact circle-circle overlap between a ball and a peg
pub fn ball_peg_collision(ball_pos: Vec2, ball_radius: f32, peg: &Peg) -> CollisionResult {
    let delta = ball_pos - peg.pos;
    let distance = delta.length();

    if distance < ball_radius + peg.radius {
        // Dead-centre overlap has no direction; push straight up
        let normal = if distance > f32::EPSILON {
            delta / distance
        } else {
            Vec2::NEG_Y
        };
        return CollisionResult { hit: true, normal };
    }

    CollisionResult::miss()
}

/// Cheap box rejection before the exact distance test
#[inline]
pub fn in_broad_phase(ball_pos: Vec2, peg_pos: Vec2) -> bool {
    (peg_pos.x - ball_pos.x).abs() < BROAD_PHASE_EXTENT
        && (peg_pos.y - ball_pos.y).abs() < BROAD_PHASE_EXTENT
}

/// Velocity after bouncing off a peg
///
/// Direction follows the impact normal; each component gets its own
/// `1..1+BOUNCE_VARIATION` multiplier, then a small horizontal kick.
pub fn peg_bounce_velocity(normal: Vec2, rng: &mut impl Rng) -> Vec2 {
    let jitter_x = 1.0 + rng.random::<f32>() * BOUNCE_VARIATION;
    let jitter_y = 1.0 + rng.random::<f32>() * BOUNCE_VARIATION;
    let nudge = (rng.random::<f32>() - 0.5) * 2.0 * PEG_NUDGE;

    Vec2::new(
        normal.x * PEG_BOUNCE_SPEED * jitter_x + nudge,
        normal.y * PEG_BOUNCE_SPEED * jitter_y,
    )
}

/// Resolve every peg the ball overlaps this tick
///
/// Hits apply in peg order; the last one decides the outgoing velocity and
/// every struck peg lights up. Returns the number of hits.
pub fn collide_pegs(ball: &mut Ball, pegs: &mut [Peg], rng: &mut impl Rng) -> u32 {
    let mut hits = 0;
    for peg in pegs.iter_mut() {
        if !in_broad_phase(ball.pos, peg.pos) {
            continue;
        }
        let result = ball_peg_collision(ball.pos, ball.radius, peg);
        if result.hit {
            peg.strike();
            ball.vel = peg_bounce_velocity(result.normal, rng);
            hits += 1;
        }
    }
    hits
}

/// Keep the ball inside `[radius, width - radius]`
///
/// Returns true if the ball hit a side wall. Horizontal velocity is reversed
/// and scaled by `WALL_RESTITUTION`.
pub fn bounce_off_walls(ball: &mut Ball, width: f32) -> bool {
    let min_x = ball.radius;
    let max_x = width - ball.radius;

    if ball.pos.x < min_x {
        ball.pos.x = min_x;
        ball.vel.x *= -WALL_RESTITUTION;
        true
    } else if ball.pos.x > max_x {
        ball.pos.x = max_x;
        ball.vel.x *= -WALL_RESTITUTION;
        true
    } else {
        false
    }
}
