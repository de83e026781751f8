//! Board layout and simulation entities
//!
//! Pegs and slots are rebuilt from the board size; balls and effects are the
//! per-frame mutable state.

use std::collections::VecDeque;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::effects::Effects;
use crate::consts::*;
use crate::settings::Settings;
use crate::tuning::Tuning;

/// A ball in flight
#[derive(Debug, Clone)]
pub struct Ball {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Bet this ball carries into its slot
    pub bet: u64,
    /// Recent positions, oldest first
    pub trail: VecDeque<Vec2>,
}

impl Ball {
    pub fn new(id: u32, pos: Vec2, vel: Vec2, bet: u64) -> Self {
        Self {
            id,
            pos,
            vel,
            radius: BALL_RADIUS,
            bet,
            trail: VecDeque::with_capacity(TRAIL_LENGTH),
        }
    }

    /// Record current position to trail, evicting the oldest point
    pub fn record_trail(&mut self) {
        if self.trail.len() == TRAIL_LENGTH {
            self.trail.pop_front();
        }
        self.trail.push_back(self.pos);
    }
}

/// A fixed peg
#[derive(Debug, Clone)]
pub struct Peg {
    pub pos: Vec2,
    pub radius: f32,
    /// Hit highlight, 0 when idle
    pub glow: f32,
}

impl Peg {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            radius: PEG_RADIUS,
            glow: 0.0,
        }
    }

    /// Light the peg up after a hit
    pub fn strike(&mut self) {
        self.glow = PEG_HIT_GLOW;
    }

    /// Geometric glow decay; snaps to zero once invisible
    pub fn decay_glow(&mut self) {
        self.glow *= GLOW_DECAY;
        if self.glow < 0.001 {
            self.glow = 0.0;
        }
    }
}

/// A multiplier bucket on the bottom row
#[derive(Debug, Clone)]
pub struct Slot {
    /// Band centre
    pub x: f32,
    pub y: f32,
    /// Band width
    pub width: f32,
    pub multiplier: f64,
}

impl Slot {
    /// Whether `x` falls inside this slot's band
    pub fn contains(&self, x: f32) -> bool {
        (self.x - x).abs() < self.width / 2.0
    }
}

/// Peg field and slot row for a given playfield size
#[derive(Debug, Clone)]
pub struct Board {
    pub width: f32,
    pub height: f32,
    pub pegs: Vec<Peg>,
    pub slots: Vec<Slot>,
}

impl Board {
    /// Lay out a staggered peg grid and the slot row
    pub fn new(width: f32, height: f32, tuning: &Tuning) -> Self {
        let rows = tuning.peg_rows;
        let cols = tuning.peg_cols;
        let spacing_x = width / (cols + 1) as f32;
        let spacing_y = (height - PEG_FIELD_BOTTOM_MARGIN) / (rows + 1) as f32;

        let mut pegs = Vec::new();
        for row in 0..rows {
            // Odd rows hold one fewer peg, shifted half a spacing
            let (row_cols, offset_x) = if row % 2 == 0 {
                (cols, 0.0)
            } else {
                (cols.saturating_sub(1), spacing_x / 2.0)
            };
            for col in 0..row_cols {
                pegs.push(Peg::new(Vec2::new(
                    offset_x + spacing_x * (col + 1) as f32,
                    spacing_y * (row + 1) as f32,
                )));
            }
        }

        let n = tuning.multipliers.len() as f32;
        let slot_span = width / n;
        let slots = tuning
            .multipliers
            .iter()
            .enumerate()
            .map(|(i, &multiplier)| Slot {
                x: (i as f32 + 0.5) * slot_span,
                y: height - SLOT_ROW_OFFSET,
                width: slot_span - SLOT_GAP,
                multiplier,
            })
            .collect();

        Self {
            width,
            height,
            pegs,
            slots,
        }
    }

    /// Slot whose band holds `x`, if any
    pub fn slot_at(&self, x: f32) -> Option<&Slot> {
        self.slots.iter().find(|s| s.contains(x))
    }

    /// Y coordinate past which a ball has landed
    pub fn floor_y(&self, ball_radius: f32) -> f32 {
        self.height - ball_radius
    }
}

/// Mutable simulation context
#[derive(Debug, Clone)]
pub struct SimState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Bounce and spawn randomness
    pub rng: Pcg32,
    pub board: Board,
    /// Active balls, in spawn order
    pub balls: Vec<Ball>,
    pub effects: Effects,
    /// Whether balls keep trails
    pub record_trails: bool,
    /// Frames simulated so far
    pub frame: u64,
    next_id: u32,
}

impl SimState {
    pub fn new(seed: u64, tuning: &Tuning, settings: &Settings) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            board: Board::new(tuning.board_width, tuning.board_height, tuning),
            balls: Vec::new(),
            effects: Effects::new(settings, tuning.max_popups),
            record_trails: settings.trails,
            frame: 0,
            next_id: 1,
        }
    }

    /// Allocate a new ball ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Rebuild pegs and slots for a new playfield size; balls keep flying
    pub fn resize(&mut self, width: f32, height: f32, tuning: &Tuning) {
        log::info!("Board resized to {}x{}", width, height);
        self.board = Board::new(width, height, tuning);
    }
}
