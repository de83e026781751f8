//! Game loop driver
//!
//! [`Game`] owns the simulation, the session and the deferred action queue.
//! Embedders call [`Game::frame`] once per animation frame (or hand a
//! [`TickSource`] to [`Game::run`]) and drain [`GameEvent`]s for display.

mod schedule;

use glam::Vec2;
use rand::Rng;

pub use schedule::{Schedule, ScheduledAction};

use crate::consts::*;
use crate::error::GameError;
use crate::format::{format_balance, format_countdown};
use crate::persistence::Storage;
use crate::platform::TickSource;
use crate::session::{ConfirmRedeem, Session, SessionRules};
use crate::settings::Settings;
use crate::sim::{Ball, LandingResolver, Payout, Resolution, SimState, WinTier, cleanup, tick};
use crate::tuning::Tuning;

/// Session timer period
const SESSION_TICK_MS: u64 = 1000;

/// Loop state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    #[default]
    Idle,
    Running,
}

/// Accepted drop request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropTicket {
    /// Balls that will spawn (after clamping)
    pub count: u32,
    /// Amount debited
    pub total_cost: u64,
}

/// Something the presentation layer may want to show
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    BallSpawned { ball_id: u32, bet: u64 },
    Landed(Payout),
    /// Ball fell between slots
    Missed { ball_id: u32 },
    Jackpot { amount: u64, tier: WinTier },
    FreeReward { amount: u64 },
    AdStarted { ready_at: u64 },
    AdReward { amount: u64 },
    Redeemed { amount: u64 },
    BalanceChanged { balance: u64 },
}

/// Game context: simulation, session and timers
#[derive(Debug)]
pub struct Game<S: Storage> {
    state: LoopState,
    sim: SimState,
    session: Session<S>,
    resolver: LandingResolver,
    schedule: Schedule,
    tuning: Tuning,
    events: Vec<GameEvent>,
    ad_playing: bool,
}

impl<S: Storage> Game<S> {
    /// Build a game around a loaded session; the loop starts idle
    ///
    /// Tuning that fails validation is replaced by the defaults. The
    /// session's rules are reset to match the tuning in effect.
    pub fn new(
        tuning: Tuning,
        settings: &Settings,
        mut session: Session<S>,
        seed: u64,
        now_ms: u64,
    ) -> Self {
        let tuning = match tuning.validate() {
            Ok(()) => tuning,
            Err(e) => {
                log::warn!("Rejected tuning ({}), using defaults", e);
                Tuning::default()
            }
        };
        session.set_rules(SessionRules::from(&tuning));

        let mut schedule = Schedule::new();
        schedule.push(now_ms + SESSION_TICK_MS, ScheduledAction::SessionTick);
        schedule.push(
            now_ms + tuning.autosave_interval_ms,
            ScheduledAction::Autosave,
        );

        log::info!("Game created (seed {})", seed);
        Self {
            state: LoopState::Idle,
            sim: SimState::new(seed, &tuning, settings),
            session,
            resolver: LandingResolver::new(),
            schedule,
            tuning,
            events: Vec::new(),
            ad_playing: false,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// Begin per-frame ticking (no-op if already running)
    pub fn start(&mut self) {
        if self.state == LoopState::Running {
            return;
        }
        self.state = LoopState::Running;
        log::info!("Game loop started");
    }

    /// Stop ticking (no-op if idle)
    pub fn stop(&mut self) {
        if self.state == LoopState::Idle {
            return;
        }
        self.state = LoopState::Idle;
        log::info!("Game loop stopped");
    }

    /// Validate and pay for a drop, then queue its balls
    ///
    /// Counts above the per-drop maximum are clamped. On error nothing has
    /// changed.
    pub fn drop_request(
        &mut self,
        bet: u64,
        count: u32,
        now_ms: u64,
    ) -> Result<DropTicket, GameError> {
        let ticket = self
            .price_drop(bet, count)
            .inspect_err(|e| log::info!("Drop rejected: {}", e))?;
        let balance = self.session.debit(ticket.total_cost)?;
        self.events.push(GameEvent::BalanceChanged { balance });

        for i in 0..u64::from(ticket.count) {
            self.schedule.push(
                now_ms + i * self.tuning.spawn_stagger_ms,
                ScheduledAction::SpawnBall { bet },
            );
        }
        log::info!(
            "Dropping {} ball(s) at {} each ({} total)",
            ticket.count,
            bet,
            ticket.total_cost
        );
        self.start();
        Ok(ticket)
    }

    fn price_drop(&self, bet: u64, count: u32) -> Result<DropTicket, GameError> {
        if count == 0 {
            return Err(GameError::NoBalls);
        }
        if bet < self.tuning.min_bet {
            return Err(GameError::BetBelowMinimum {
                bet,
                minimum: self.tuning.min_bet,
            });
        }
        let count = count.min(self.tuning.max_balls_per_drop);
        let available = self.session.balance();
        match bet.checked_mul(u64::from(count)) {
            Some(total_cost) if total_cost <= available => Ok(DropTicket { count, total_cost }),
            required => Err(GameError::InsufficientBalance {
                required: required.unwrap_or(u64::MAX),
                available,
            }),
        }
    }

    /// Start simulated ad playback; returns when the reward will be paid
    pub fn watch_ad(&mut self, now_ms: u64) -> Result<u64, GameError> {
        if self.ad_playing {
            return Err(GameError::AdInProgress);
        }
        self.session.check_ad_ready(now_ms)?;

        let ready_at = now_ms + self.tuning.ad_duration_ms;
        self.ad_playing = true;
        self.schedule.push(ready_at, ScheduledAction::AdReward);
        self.events.push(GameEvent::AdStarted { ready_at });
        log::info!("Ad playback started");
        Ok(ready_at)
    }

    pub fn is_ad_playing(&self) -> bool {
        self.ad_playing
    }

    /// Redeem the balance after confirmation; returns the amount taken
    pub fn redeem(&mut self, confirm: &mut impl ConfirmRedeem) -> Result<u64, GameError> {
        let amount = self.session.redeem(confirm)?;
        self.events.push(GameEvent::Redeemed { amount });
        self.events.push(GameEvent::BalanceChanged {
            balance: self.session.balance(),
        });
        Ok(amount)
    }

    /// Fire every deferred action due at `now_ms`
    ///
    /// Timers run whether or not the loop is running.
    pub fn pump_timers(&mut self, now_ms: u64) {
        while let Some((_, action)) = self.schedule.pop_due(now_ms) {
            match action {
                ScheduledAction::SpawnBall { bet } => self.spawn_ball(bet),
                ScheduledAction::AdReward => {
                    let amount = self.session.grant_ad_reward(now_ms);
                    self.ad_playing = false;
                    self.events.push(GameEvent::AdReward { amount });
                    self.push_balance();
                }
                ScheduledAction::SessionTick => {
                    if let Some(amount) = self.session.tick(now_ms) {
                        let center = Vec2::new(self.sim.board.width, self.sim.board.height) / 2.0;
                        self.sim.effects.popup(
                            format!("+${} FREE!", amount),
                            center,
                            &mut self.sim.rng,
                        );
                        self.events.push(GameEvent::FreeReward { amount });
                        self.push_balance();
                    }
                    self.schedule
                        .push(now_ms + SESSION_TICK_MS, ScheduledAction::SessionTick);
                }
                ScheduledAction::Autosave => {
                    log::debug!("Autosave");
                    self.session.save();
                    self.schedule.push(
                        now_ms + self.tuning.autosave_interval_ms,
                        ScheduledAction::Autosave,
                    );
                }
            }
        }
    }

    fn spawn_ball(&mut self, bet: u64) {
        let width = self.sim.board.width;
        let zone = (width * DROP_ZONE_FRACTION).min(DROP_ZONE_MAX);
        let x = width / 2.0 + (self.sim.rng.random::<f32>() - 0.5) * zone;
        let vx = (self.sim.rng.random::<f32>() - 0.5) * 2.0 * DROP_NUDGE;

        let id = self.sim.next_entity_id();
        self.sim
            .balls
            .push(Ball::new(id, Vec2::new(x, 0.0), Vec2::new(vx, 0.0), bet));
        self.events.push(GameEvent::BallSpawned { ball_id: id, bet });
    }

    /// Run one frame at `now_ms`
    ///
    /// Order: timers, cleanup, physics, landing resolution, effect motion.
    /// Returns false if the loop is idle (timers still fire).
    pub fn frame(&mut self, now_ms: u64) -> bool {
        self.pump_timers(now_ms);
        if self.state == LoopState::Idle {
            return false;
        }

        cleanup(&mut self.sim);
        // Only a guard left up by a re-entrant caller can be stale here
        if self.sim.balls.is_empty() {
            self.resolver.clear_guard();
        }

        let landings = tick(&mut self.sim, SIM_DT);
        self.resolver.enqueue(landings);
        self.resolve_landings();

        self.sim.effects.update(SIM_DT);
        true
    }

    fn resolve_landings(&mut self) {
        while let Some(resolution) = self.resolver.begin(&self.sim.board) {
            match resolution {
                Resolution::Paid(payout) => self.apply_payout(payout),
                Resolution::Missed(landing) => {
                    log::debug!("Ball {} missed every slot", landing.ball_id);
                    self.events.push(GameEvent::Missed {
                        ball_id: landing.ball_id,
                    });
                }
            }
            self.resolver.finish();
        }
    }

    fn apply_payout(&mut self, payout: Payout) {
        self.session.credit(payout.amount);

        let effects = &mut self.sim.effects;
        effects.spawn_win_burst(payout.pos, payout.tier, &mut self.sim.rng);
        effects.payout_popup(payout.amount, payout.pos, &mut self.sim.rng);

        if payout.tier.announces_jackpot() {
            log::info!("{:?} win: {} ({}x)", payout.tier, payout.amount, payout.multiplier);
            self.events.push(GameEvent::Jackpot {
                amount: payout.amount,
                tier: payout.tier,
            });
        }
        self.events.push(GameEvent::Landed(payout));
        self.push_balance();
    }

    fn push_balance(&mut self) {
        self.events.push(GameEvent::BalanceChanged {
            balance: self.session.balance(),
        });
    }

    /// Drive frames from `ticks` until it runs dry or the loop stops
    ///
    /// Returns the number of frames run.
    pub fn run(&mut self, ticks: &mut impl TickSource) -> u64 {
        let mut frames = 0;
        while self.is_running() {
            let Some(now_ms) = ticks.next_frame() else {
                break;
            };
            self.frame(now_ms);
            frames += 1;
        }
        frames
    }

    /// No balls in flight, queued or awaiting payout
    pub fn is_settled(&self) -> bool {
        self.sim.balls.is_empty()
            && self.resolver.pending() == 0
            && self
                .schedule
                .count(|a| matches!(a, ScheduledAction::SpawnBall { .. }))
                == 0
    }

    /// Rebuild the board for a new playfield size
    pub fn resize(&mut self, width: f32, height: f32) {
        self.sim.resize(width, height, &self.tuning);
    }

    /// Take the events queued since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn balance(&self) -> u64 {
        self.session.balance()
    }

    /// Abbreviated balance for display
    pub fn balance_text(&self) -> String {
        format_balance(self.session.balance())
    }

    /// Free reward countdown as `MM:SS`
    pub fn countdown_text(&self, now_ms: u64) -> String {
        format_countdown(self.session.free_reward_remaining(now_ms))
    }

    pub fn sim(&self) -> &SimState {
        &self.sim
    }

    pub fn sim_mut(&mut self) -> &mut SimState {
        &mut self.sim
    }

    pub fn session(&self) -> &Session<S> {
        &self.session
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Tear down: stop the loop and flush the session
    pub fn end_session(mut self) -> S {
        self.stop();
        if self.ad_playing {
            log::info!("Ad playback abandoned");
        }
        self.session.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;
    use crate::platform::FixedRateTicks;
    use crate::session::{SessionRecord, SessionRules};
    use proptest::prelude::*;

    const HOUR: u64 = 60 * 60 * 1000;

    fn game_with_balance(balance: u64) -> Game<MemoryStorage> {
        let mut storage = MemoryStorage::new();
        let record = SessionRecord::fresh(balance, 0);
        storage
            .set(
                Session::<MemoryStorage>::STORAGE_KEY,
                &serde_json::to_string(&record).unwrap(),
            )
            .unwrap();
        let session = Session::load(storage, SessionRules::default(), 0);
        Game::new(Tuning::default(), &Settings::default(), session, 42, 0)
    }

    #[test]
    fn test_start_stop_idempotent() {
        let mut game = game_with_balance(1000);
        assert_eq!(game.state(), LoopState::Idle);

        game.start();
        game.start();
        assert!(game.is_running());

        game.stop();
        game.stop();
        assert_eq!(game.state(), LoopState::Idle);

        // Idle frames do not step physics
        assert!(!game.frame(16));
        assert_eq!(game.sim().frame, 0);
    }

    #[test]
    fn test_drop_rejections_leave_state_alone() {
        let mut game = game_with_balance(100);
        assert_eq!(game.drop_request(20, 0, 0), Err(GameError::NoBalls));
        assert_eq!(
            game.drop_request(10, 1, 0),
            Err(GameError::BetBelowMinimum { bet: 10, minimum: 20 })
        );
        assert_eq!(
            game.drop_request(20, 6, 0),
            Err(GameError::InsufficientBalance {
                required: 120,
                available: 100
            })
        );
        assert_eq!(
            game.drop_request(u64::MAX, 2, 0),
            Err(GameError::InsufficientBalance {
                required: u64::MAX,
                available: 100
            })
        );
        assert_eq!(game.balance(), 100);
        assert!(!game.is_running());
        assert!(game.is_settled());
        assert!(game.drain_events().is_empty());
    }

    #[test]
    fn test_count_clamped_to_maximum() {
        let mut game = game_with_balance(100_000);
        let ticket = game.drop_request(20, 80, 0).unwrap();
        assert_eq!(ticket, DropTicket { count: 50, total_cost: 1000 });
        assert_eq!(game.balance(), 99_000);
    }

    #[test]
    fn test_spawns_are_staggered() {
        let mut game = game_with_balance(1000);
        game.drop_request(20, 3, 0).unwrap();
        assert!(game.is_running());

        game.frame(0);
        assert_eq!(game.sim().balls.len(), 1);
        game.frame(50);
        assert_eq!(game.sim().balls.len(), 1);
        game.frame(100);
        assert_eq!(game.sim().balls.len(), 2);
        game.frame(200);
        assert_eq!(game.sim().balls.len(), 3);
        assert!(!game.is_settled());

        let zone = (game.tuning().board_width * DROP_ZONE_FRACTION).min(DROP_ZONE_MAX);
        let centre = game.tuning().board_width / 2.0;
        for ball in &game.sim().balls {
            assert!((ball.pos.x - centre).abs() <= zone / 2.0 + DROP_NUDGE);
        }
    }

    #[test]
    fn test_half_multiplier_landing_pays_back_half() {
        let mut game = game_with_balance(1000);
        game.drop_request(20, 1, 0).unwrap();
        game.frame(0);
        assert_eq!(game.balance(), 980);

        // Park the ball just above the 0.5 slot
        let slot = game.sim().board.slots[6].clone();
        assert_eq!(slot.multiplier, 0.5);
        let floor = game.sim().board.floor_y(BALL_RADIUS);
        let ball = &mut game.sim_mut().balls[0];
        ball.pos = Vec2::new(slot.x, floor - 0.1);
        ball.vel = Vec2::ZERO;

        game.frame(16);
        assert_eq!(game.balance(), 990);
        assert!(game.is_settled());

        let events = game.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::Landed(Payout { amount: 10, .. })
        )));
        assert_eq!(
            events.last(),
            Some(&GameEvent::BalanceChanged { balance: 990 })
        );
        assert_eq!(game.sim().effects.popups.len(), 1);
    }

    fn park_over_slot(game: &mut Game<MemoryStorage>, slot: usize, bet: u64) {
        let floor = game.sim().board.floor_y(BALL_RADIUS);
        let x = game.sim().board.slots[slot].x;
        let id = game.sim_mut().next_entity_id();
        game.sim_mut()
            .balls
            .push(Ball::new(id, Vec2::new(x, floor - 0.1), Vec2::ZERO, bet));
    }

    #[test]
    fn test_big_win_bursts_without_banner() {
        let mut game = game_with_balance(1000);
        game.start();
        // Slot 1 holds 25x
        park_over_slot(&mut game, 1, 20);
        game.frame(16);

        assert_eq!(game.balance(), 1500);
        assert_eq!(game.sim().effects.particles.len(), 30);
        assert!(
            !game
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::Jackpot { .. }))
        );
    }

    #[test]
    fn test_edge_win_raises_jackpot_event() {
        let mut game = game_with_balance(1000);
        game.start();
        park_over_slot(&mut game, 0, 20);
        game.frame(16);

        assert_eq!(game.balance(), 3000);
        assert_eq!(game.sim().effects.particles.len(), 50);
        assert!(game.drain_events().contains(&GameEvent::Jackpot {
            amount: 2000,
            tier: WinTier::Huge
        }));
    }

    #[test]
    fn test_invalid_tuning_falls_back_to_defaults() {
        let tuning = Tuning {
            peg_cols: 0,
            redeem_step: 0,
            ..Tuning::default()
        };
        let session = Session::load(MemoryStorage::new(), SessionRules::from(&tuning), 0);
        let mut game = Game::new(tuning, &Settings::default(), session, 1, 0);

        assert_eq!(game.tuning(), &Tuning::default());
        assert_eq!(game.session().rules().redeem_step, 100);
        assert!(!game.sim().board.pegs.is_empty());
        assert_eq!(game.redeem(&mut |_: u64| -> bool { true }), Ok(1000));
    }

    #[test]
    fn test_simultaneous_landings_each_paid_once() {
        let mut game = game_with_balance(1000);
        game.start();
        let floor = game.sim().board.floor_y(BALL_RADIUS);
        let slots = game.sim().board.slots.clone();
        for slot in [&slots[6], &slots[12]] {
            let id = game.sim_mut().next_entity_id();
            game.sim_mut().balls.push(Ball::new(
                id,
                Vec2::new(slot.x, floor - 0.1),
                Vec2::ZERO,
                20,
            ));
        }

        game.frame(16);
        // 0.5 and 0.5 on a symmetric table
        assert_eq!(game.balance(), 1020);
        game.frame(32);
        assert_eq!(game.balance(), 1020);
        let landed = game
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::Landed(_)))
            .count();
        assert_eq!(landed, 2);
    }

    #[test]
    fn test_free_reward_fires_from_timer() {
        let mut game = game_with_balance(1000);
        game.pump_timers(HOUR - 500);
        assert_eq!(game.balance(), 1000);
        assert_eq!(game.countdown_text(HOUR - 500), "00:00");

        game.pump_timers(HOUR + 500);
        assert_eq!(game.balance(), 2000);
        assert!(
            game.drain_events()
                .contains(&GameEvent::FreeReward { amount: 1000 })
        );
        let popups = &game.sim().effects.popups;
        assert_eq!(popups.len(), 1);
        assert_eq!(popups[0].text, "+$1000 FREE!");
        assert_eq!(popups[0].pos, Vec2::new(600.0, 450.0));

        // Next tick does not pay again
        game.pump_timers(HOUR + 1500);
        assert_eq!(game.balance(), 2000);
        assert_eq!(game.countdown_text(HOUR + 1500), "59:59");
    }

    #[test]
    fn test_ad_flow() {
        let mut game = game_with_balance(1000);
        let cooldown = game.tuning().ad_cooldown_ms;

        assert_eq!(
            game.watch_ad(1000),
            Err(GameError::AdCooldown {
                remaining_ms: cooldown - 1000
            })
        );

        let ready_at = game.watch_ad(cooldown).unwrap();
        assert_eq!(ready_at, cooldown + 5000);
        assert_eq!(game.watch_ad(cooldown + 10), Err(GameError::AdInProgress));

        game.pump_timers(ready_at - 1);
        assert_eq!(game.balance(), 1000);
        assert!(game.is_ad_playing());

        game.pump_timers(ready_at);
        assert_eq!(game.balance(), 1500);
        assert!(!game.is_ad_playing());
        assert!(matches!(
            game.watch_ad(ready_at + 1),
            Err(GameError::AdCooldown { .. })
        ));
    }

    #[test]
    fn test_autosave_writes_periodically() {
        let mut game = game_with_balance(1000);
        let before = game.session().storage().writes;
        game.pump_timers(29_999);
        assert_eq!(game.session().storage().writes, before);
        game.pump_timers(30_000);
        assert_eq!(game.session().storage().writes, before + 1);
        game.pump_timers(60_000);
        assert_eq!(game.session().storage().writes, before + 2);
    }

    #[test]
    fn test_redeem_through_game() {
        let mut game = game_with_balance(250);
        let amount = game.redeem(&mut |_: u64| -> bool { true }).unwrap();
        assert_eq!(amount, 200);
        assert_eq!(game.balance(), 50);
        assert!(
            game.drain_events()
                .contains(&GameEvent::Redeemed { amount: 200 })
        );
    }

    #[test]
    fn test_run_until_ticks_exhausted() {
        let mut game = game_with_balance(1000);
        game.drop_request(20, 5, 0).unwrap();

        let mut ticks = FixedRateTicks::new(0, FRAME_MS, 3000);
        let frames = game.run(&mut ticks);
        assert_eq!(frames, 3000);
        assert!(game.is_settled());

        let storage = game.end_session();
        let json = storage
            .get(Session::<MemoryStorage>::STORAGE_KEY)
            .unwrap()
            .unwrap();
        let saved: SessionRecord = serde_json::from_str(&json).unwrap();
        assert!(saved.balance > 0);
    }

    #[test]
    fn test_resize_rebuilds_board() {
        let mut game = game_with_balance(1000);
        game.resize(1900.0, 900.0);
        assert_eq!(game.sim().board.width, 1900.0);
        assert!((game.sim().board.slots[0].x - 50.0).abs() < 1e-3);
    }

    proptest! {
        #[test]
        fn prop_drop_succeeds_iff_affordable(
            balance in 0u64..5000,
            bet in 20u64..500,
            count in 1u32..=50,
        ) {
            let mut game = game_with_balance(balance);
            let cost = bet * u64::from(count);
            match game.drop_request(bet, count, 0) {
                Ok(ticket) => {
                    prop_assert!(balance >= cost);
                    prop_assert_eq!(ticket.total_cost, cost);
                    prop_assert_eq!(game.balance(), balance - cost);
                }
                Err(_) => {
                    prop_assert!(balance < cost);
                    prop_assert_eq!(game.balance(), balance);
                }
            }
        }
    }
}
