//! Session state store
//!
//! The one place the balance lives. Every mutation is flushed to storage
//! straight away; storage failures are logged and never surface to callers.

use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::persistence::{Storage, StorageError};
use crate::tuning::Tuning;

/// Persisted session record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub balance: u64,
    /// Epoch ms of the last free reward (or session creation)
    pub last_free_reward_time: u64,
    /// Epoch ms of the last ad reward (or session creation)
    pub last_ad_watch_time: u64,
}

impl SessionRecord {
    /// Fresh session: starting balance, both cooldowns starting now
    pub fn fresh(starting_balance: u64, now_ms: u64) -> Self {
        Self {
            balance: starting_balance,
            last_free_reward_time: now_ms,
            last_ad_watch_time: now_ms,
        }
    }
}

/// Reward and redemption rules, taken from [`Tuning`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionRules {
    pub starting_balance: u64,
    pub free_reward_amount: u64,
    pub free_reward_cooldown_ms: u64,
    pub ad_reward_amount: u64,
    pub ad_cooldown_ms: u64,
    pub redeem_minimum: u64,
    pub redeem_step: u64,
}

impl From<&Tuning> for SessionRules {
    fn from(t: &Tuning) -> Self {
        Self {
            starting_balance: t.starting_balance,
            free_reward_amount: t.free_reward_amount,
            free_reward_cooldown_ms: t.free_reward_cooldown_ms,
            ad_reward_amount: t.ad_reward_amount,
            ad_cooldown_ms: t.ad_cooldown_ms,
            redeem_minimum: t.redeem_minimum,
            redeem_step: t.redeem_step,
        }
    }
}

impl Default for SessionRules {
    fn default() -> Self {
        Self::from(&Tuning::default())
    }
}

/// Asks the player to confirm a redemption
pub trait ConfirmRedeem {
    fn confirm_redeem(&mut self, amount: u64) -> bool;
}

impl<F: FnMut(u64) -> bool> ConfirmRedeem for F {
    fn confirm_redeem(&mut self, amount: u64) -> bool {
        self(amount)
    }
}

/// Balance and cooldown timestamps bound to a storage backend
#[derive(Debug)]
pub struct Session<S: Storage> {
    record: SessionRecord,
    rules: SessionRules,
    storage: S,
}

impl<S: Storage> Session<S> {
    /// Storage key for the session record
    pub const STORAGE_KEY: &'static str = "plinko_session";

    /// Load the persisted session, or start a fresh one
    ///
    /// A missing, unreadable, or malformed record yields a fresh session
    /// which is written back immediately.
    pub fn load(storage: S, rules: SessionRules, now_ms: u64) -> Self {
        let loaded = match storage.get(Self::STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<SessionRecord>(&json) {
                Ok(record) => {
                    log::info!("Loaded session (balance {})", record.balance);
                    Some(record)
                }
                Err(e) => {
                    log::warn!("Discarding malformed session record: {}", e);
                    None
                }
            },
            Ok(None) => {
                log::info!("No saved session, starting fresh");
                None
            }
            Err(e) => {
                log::warn!("Could not read session: {}", e);
                None
            }
        };

        let mut session = Self {
            record: loaded.unwrap_or_else(|| SessionRecord::fresh(rules.starting_balance, now_ms)),
            rules,
            storage,
        };
        if loaded.is_none() {
            session.save();
        }
        session
    }

    pub fn balance(&self) -> u64 {
        self.record.balance
    }

    pub fn record(&self) -> &SessionRecord {
        &self.record
    }

    pub fn rules(&self) -> &SessionRules {
        &self.rules
    }

    /// Replace the reward and redemption rules
    pub fn set_rules(&mut self, rules: SessionRules) {
        self.rules = rules;
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Add to the balance; returns the new balance
    pub fn credit(&mut self, amount: u64) -> u64 {
        self.record.balance = self.record.balance.saturating_add(amount);
        self.save();
        self.record.balance
    }

    /// Take from the balance; refuses to go negative
    pub fn debit(&mut self, amount: u64) -> Result<u64, GameError> {
        if amount > self.record.balance {
            return Err(GameError::InsufficientBalance {
                required: amount,
                available: self.record.balance,
            });
        }
        self.record.balance -= amount;
        self.save();
        Ok(self.record.balance)
    }

    /// Milliseconds until the next free reward
    pub fn free_reward_remaining(&self, now_ms: u64) -> u64 {
        let elapsed = now_ms.saturating_sub(self.record.last_free_reward_time);
        self.rules.free_reward_cooldown_ms.saturating_sub(elapsed)
    }

    /// Once-per-second timer: grant the free reward when its cooldown is up
    ///
    /// Returns the amount granted, if any.
    pub fn tick(&mut self, now_ms: u64) -> Option<u64> {
        if self.free_reward_remaining(now_ms) > 0 {
            return None;
        }
        let amount = self.rules.free_reward_amount;
        self.record.last_free_reward_time = now_ms;
        self.credit(amount);
        log::info!("Free reward granted: {}", amount);
        Some(amount)
    }

    /// Amount a redemption would take right now (multiple of the redeem step)
    pub fn redeemable(&self) -> u64 {
        let step = self.rules.redeem_step;
        self.record.balance.checked_div(step).map_or(0, |n| n * step)
    }

    /// Redeem the largest whole step of the balance after confirmation
    ///
    /// Returns the amount debited.
    pub fn redeem(&mut self, confirm: &mut impl ConfirmRedeem) -> Result<u64, GameError> {
        let amount = self.redeemable();
        if self.record.balance < self.rules.redeem_minimum || amount == 0 {
            return Err(GameError::BelowRedeemThreshold {
                balance: self.record.balance,
                minimum: self.rules.redeem_minimum,
            });
        }
        if !confirm.confirm_redeem(amount) {
            log::info!("Redemption of {} declined", amount);
            return Err(GameError::RedeemDeclined);
        }
        self.debit(amount)?;
        log::info!("Redeemed {}", amount);
        Ok(amount)
    }

    /// Milliseconds until an ad may be watched again
    pub fn ad_remaining(&self, now_ms: u64) -> u64 {
        let elapsed = now_ms.saturating_sub(self.record.last_ad_watch_time);
        self.rules.ad_cooldown_ms.saturating_sub(elapsed)
    }

    /// Refuse with the remaining wait if the ad reward is cooling down
    pub fn check_ad_ready(&self, now_ms: u64) -> Result<(), GameError> {
        match self.ad_remaining(now_ms) {
            0 => Ok(()),
            remaining_ms => Err(GameError::AdCooldown { remaining_ms }),
        }
    }

    /// Pay the ad reward once playback has finished
    pub fn grant_ad_reward(&mut self, now_ms: u64) -> u64 {
        let amount = self.rules.ad_reward_amount;
        self.record.last_ad_watch_time = now_ms;
        self.credit(amount);
        log::info!("Ad reward granted: {}", amount);
        amount
    }

    /// Flush the record; returns whether the write succeeded
    pub fn save(&mut self) -> bool {
        match self.try_save() {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Could not save session: {}", e);
                false
            }
        }
    }

    fn try_save(&mut self) -> Result<(), StorageError> {
        let json = serde_json::to_string(&self.record)?;
        self.storage.set(Self::STORAGE_KEY, &json)
    }

    /// Final flush, handing the storage back
    pub fn close(mut self) -> S {
        self.save();
        log::info!("Session closed (balance {})", self.record.balance);
        self.storage
    }
}
