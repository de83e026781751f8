//! Win bursts and floating popups
//!
//! Purely visual. Both containers are trimmed on insert (oldest first) so they
//! never grow past their caps.

use glam::Vec2;
use rand::Rng;

use crate::consts::FRAME_RATE;
use crate::settings::Settings;

/// Life lost per second (0.02 per frame)
const FADE_RATE: f32 = 0.02 * FRAME_RATE;
/// Popup rise speed (2 px/frame)
const POPUP_RISE: f32 = 2.0 * FRAME_RATE;
/// Payout popups float this far above the landing point
const POPUP_LIFT: f32 = 50.0;

const BIG_PALETTE: [u32; 3] = [0x4ECDC4, 0x45B7AF, 0x2FB4AE];
const HUGE_PALETTE: [u32; 3] = [0xFFD700, 0xFFA500, 0xFF4500];
const JACKPOT_PALETTE: [u32; 3] = [0xFF4D4D, 0xFF6B6B, 0xFF8E8E];

/// How loud a landing should look
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WinTier {
    Standard,
    /// Multiplier ≥ 25
    Big,
    /// Multiplier ≥ 100
    Huge,
    /// Multiplier ≥ 200
    Jackpot,
}

impl WinTier {
    pub fn for_multiplier(multiplier: f64) -> Self {
        if multiplier >= 200.0 {
            WinTier::Jackpot
        } else if multiplier >= 100.0 {
            WinTier::Huge
        } else if multiplier >= 25.0 {
            WinTier::Big
        } else {
            WinTier::Standard
        }
    }

    /// Burst shape: particle count, angular spread in degrees, palette
    fn burst(&self) -> Option<(usize, f32, &'static [u32])> {
        match self {
            WinTier::Standard => None,
            WinTier::Big => Some((30, 270.0, &BIG_PALETTE[..])),
            WinTier::Huge => Some((50, 360.0, &HUGE_PALETTE[..])),
            WinTier::Jackpot => Some((60, 360.0, &JACKPOT_PALETTE[..])),
        }
    }

    /// Whether the landing also raises a jackpot banner
    pub fn announces_jackpot(&self) -> bool {
        *self >= WinTier::Huge
    }
}

/// A burst particle
#[derive(Debug, Clone)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// 0xRRGGBB
    pub color: u32,
    /// 0-1, decreases over time
    pub life: f32,
    pub size: f32,
}

/// Floating text
#[derive(Debug, Clone)]
pub struct Popup {
    pub text: String,
    pub pos: Vec2,
    /// Hue in degrees
    pub hue: f32,
    pub life: f32,
}

/// Particle and popup queues
#[derive(Debug, Clone)]
pub struct Effects {
    pub particles: Vec<Particle>,
    pub popups: Vec<Popup>,
    pub max_particles: usize,
    pub max_popups: usize,
}

impl Effects {
    pub fn new(settings: &Settings, max_popups: usize) -> Self {
        let max_popups = if settings.popups { max_popups } else { 0 };
        Self {
            particles: Vec::new(),
            popups: Vec::new(),
            max_particles: settings.max_particles(),
            max_popups,
        }
    }

    /// Queue the burst for a landing tier
    pub fn spawn_win_burst(&mut self, pos: Vec2, tier: WinTier, rng: &mut impl Rng) {
        let Some((count, spread_deg, palette)) = tier.burst() else {
            return;
        };
        let count = count.min(self.max_particles);
        if count == 0 {
            return;
        }
        make_room(&mut self.particles, count, self.max_particles);

        let spread = spread_deg.to_radians();
        for i in 0..count {
            let angle = (i as f32 / count as f32) * spread;
            // 2-5 px/frame
            let speed = (2.0 + rng.random::<f32>() * 3.0) * FRAME_RATE;
            let color = palette[rng.random_range(0..palette.len())];
            self.particles.push(Particle {
                pos,
                vel: Vec2::new(angle.cos(), angle.sin()) * speed,
                color,
                life: 1.0,
                size: 3.0 + rng.random::<f32>() * 3.0,
            });
        }
    }

    /// Queue a popup at `pos`
    pub fn popup(&mut self, text: impl Into<String>, pos: Vec2, rng: &mut impl Rng) {
        if self.max_popups == 0 {
            return;
        }
        make_room(&mut self.popups, 1, self.max_popups);
        self.popups.push(Popup {
            text: text.into(),
            pos,
            hue: rng.random::<f32>() * 360.0,
            life: 1.0,
        });
    }

    /// Popup for a resolved landing, floated above the ball
    pub fn payout_popup(&mut self, amount: u64, at: Vec2, rng: &mut impl Rng) {
        self.popup(format!("${}!", amount), at - Vec2::new(0.0, POPUP_LIFT), rng);
    }

    /// Advance motion and fade
    pub fn update(&mut self, dt: f32) {
        for particle in &mut self.particles {
            particle.pos += particle.vel * dt;
            particle.life -= FADE_RATE * dt;
        }
        for popup in &mut self.popups {
            popup.pos.y -= POPUP_RISE * dt;
            popup.life -= FADE_RATE * dt;
        }
    }

    /// Drop everything that has faded out
    pub fn cleanup(&mut self) {
        self.particles.retain(|p| p.life > 0.0);
        self.popups.retain(|p| p.life > 0.0);
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty() && self.popups.is_empty()
    }
}

/// Evict oldest entries so `incoming` more fit under `cap`
fn make_room<T>(queue: &mut Vec<T>, incoming: usize, cap: usize) {
    let overflow = (queue.len() + incoming).saturating_sub(cap);
    if overflow > 0 {
        queue.drain(..overflow.min(queue.len()));
    }
}
