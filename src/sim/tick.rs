//! Fixed timestep simulation tick
//!
//! Advances every ball by one frame. Balls that cross the floor leave the
//! active list and come back as [`Landing`]s for the resolver.

use glam::Vec2;

use super::collision::{bounce_off_walls, collide_pegs};
use super::payout::Landing;
use super::state::{Ball, SimState};
use crate::consts::*;

/// Semi-implicit Euler step: gravity, clamp, then move
pub fn integrate(ball: &mut Ball, dt: f32) {
    ball.vel.y += GRAVITY * dt;
    ball.vel = ball
        .vel
        .clamp(Vec2::splat(-MAX_VELOCITY), Vec2::splat(MAX_VELOCITY));
    ball.pos += ball.vel * dt;
}

/// Advance the simulation by one frame
///
/// All balls move before anything else happens; landings are returned in
/// the order the balls were spawned.
pub fn tick(state: &mut SimState, dt: f32) -> Vec<Landing> {
    state.frame += 1;

    let width = state.board.width;
    let mut landings = Vec::new();
    let mut remaining = Vec::with_capacity(state.balls.len());

    for mut ball in std::mem::take(&mut state.balls) {
        integrate(&mut ball, dt);
        bounce_off_walls(&mut ball, width);

        if ball.pos.y > state.board.floor_y(ball.radius) {
            log::debug!("Ball {} landed at x={:.1}", ball.id, ball.pos.x);
            landings.push(Landing::from_ball(&ball));
            continue;
        }

        collide_pegs(&mut ball, &mut state.board.pegs, &mut state.rng);
        if state.record_trails {
            ball.record_trail();
        }
        remaining.push(ball);
    }

    state.balls = remaining;
    landings
}

/// Per-frame housekeeping: faded effects, culled balls, peg glow
pub fn cleanup(state: &mut SimState) {
    state.effects.cleanup();

    let cull_y = state.board.height + OFFSCREEN_MARGIN;
    state.balls.retain(|b| b.pos.y < cull_y);

    for peg in &mut state.board.pegs {
        peg.decay_glow();
    }
}
