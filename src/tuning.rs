//! Data-driven game balance
//!
//! Everything a designer might want to tweak without touching the physics:
//! board layout, the multiplier table, bet limits, reward amounts and
//! cooldowns. Loadable from JSON; missing fields fall back to defaults.

use serde::{Deserialize, Serialize};

/// Multiplier table, left to right. Symmetric, highest at the edges.
pub const DEFAULT_MULTIPLIERS: [f64; 19] = [
    100.0, 25.0, 10.0, 5.0, 2.0, 1.0, 0.5, 0.5, 0.5, 0.2, 0.5, 0.5, 0.5, 1.0, 2.0, 5.0, 10.0,
    25.0, 100.0,
];

/// Invalid or unparseable tuning
#[derive(Debug)]
pub enum TuningError {
    Parse(serde_json::Error),
    Invalid(String),
}

impl std::fmt::Display for TuningError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TuningError::Parse(e) => write!(f, "failed to parse tuning: {}", e),
            TuningError::Invalid(msg) => write!(f, "invalid tuning: {}", msg),
        }
    }
}

impl std::error::Error for TuningError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TuningError::Parse(e) => Some(e),
            TuningError::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for TuningError {
    fn from(e: serde_json::Error) -> Self {
        TuningError::Parse(e)
    }
}

/// Game balance parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Board ===
    /// Playfield width in pixels
    pub board_width: f32,
    /// Playfield height in pixels
    pub board_height: f32,
    /// Peg rows
    pub peg_rows: u32,
    /// Pegs on even rows (odd rows hold one fewer)
    pub peg_cols: u32,
    /// Slot multipliers, left to right
    pub multipliers: Vec<f64>,

    // === Betting ===
    /// Smallest accepted bet per ball
    pub min_bet: u64,
    /// Most balls a single drop may spawn
    pub max_balls_per_drop: u32,
    /// Delay between consecutive spawns of one drop
    pub spawn_stagger_ms: u64,

    // === Session ===
    /// Balance for a fresh session
    pub starting_balance: u64,
    /// Free reward amount
    pub free_reward_amount: u64,
    /// Time between free rewards
    pub free_reward_cooldown_ms: u64,
    /// Ad reward amount
    pub ad_reward_amount: u64,
    /// Time between ad rewards
    pub ad_cooldown_ms: u64,
    /// Simulated ad playback length
    pub ad_duration_ms: u64,
    /// Smallest balance that may be redeemed
    pub redeem_minimum: u64,
    /// Redemptions are rounded down to a multiple of this
    pub redeem_step: u64,
    /// Unconditional save interval
    pub autosave_interval_ms: u64,

    // === Effects ===
    /// Most popups kept alive at once
    pub max_popups: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            board_width: 1200.0,
            board_height: 900.0,
            peg_rows: 14,
            peg_cols: 18,
            multipliers: DEFAULT_MULTIPLIERS.to_vec(),

            min_bet: 20,
            max_balls_per_drop: 50,
            spawn_stagger_ms: 100,

            starting_balance: 1000,
            free_reward_amount: 1000,
            free_reward_cooldown_ms: 60 * 60 * 1000,
            ad_reward_amount: 500,
            ad_cooldown_ms: 5 * 60 * 1000,
            ad_duration_ms: 5000,
            redeem_minimum: 100,
            redeem_step: 100,
            autosave_interval_ms: 30_000,

            max_popups: 20,
        }
    }
}

impl Tuning {
    /// Parse and validate tuning from JSON
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a JSON file
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: &std::path::Path) -> Result<Self, Box<dyn std::error::Error>> {
        let json = std::fs::read_to_string(path)?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        if !(self.board_width > 0.0 && self.board_height > crate::consts::PEG_FIELD_BOTTOM_MARGIN)
        {
            return Err(TuningError::Invalid(format!(
                "board {}x{} is too small",
                self.board_width, self.board_height
            )));
        }
        if self.peg_cols < 2 {
            return Err(TuningError::Invalid("need at least 2 peg columns".into()));
        }
        if self.multipliers.is_empty() {
            return Err(TuningError::Invalid("multiplier table is empty".into()));
        }
        if let Some(m) = self.multipliers.iter().find(|m| !m.is_finite() || **m < 0.0) {
            return Err(TuningError::Invalid(format!("bad multiplier {}", m)));
        }
        if self.min_bet == 0 {
            return Err(TuningError::Invalid("minimum bet must be positive".into()));
        }
        if self.max_balls_per_drop == 0 {
            return Err(TuningError::Invalid("max balls per drop must be positive".into()));
        }
        if self.redeem_step == 0 {
            return Err(TuningError::Invalid("redeem step must be positive".into()));
        }
        if self.autosave_interval_ms == 0 {
            return Err(TuningError::Invalid("autosave interval must be positive".into()));
        }
        Ok(())
    }
}
