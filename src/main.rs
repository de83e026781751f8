//! Plinko headless runner
//!
//! Usage: `plinko [bet] [count] [--tuning <path>] [--quality <low|medium|high>]`
//!
//! Loads the saved session, drops `count` balls at `bet` each, simulates
//! until every ball has been paid (or the frame budget runs out) and saves.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::path::PathBuf;

    use plinko::driver::GameEvent;
    use plinko::format::format_balance;
    use plinko::persistence::FileStorage;
    use plinko::platform::{Clock, FixedRateTicks, SystemClock, TickSource, init_logging};
    use plinko::session::SessionRules;
    use plinko::{Game, QualityPreset, Session, Settings, Tuning};

    /// Ten simulated minutes at 60 Hz
    const FRAME_BUDGET: u64 = 60 * 60 * 10;

    init_logging();
    log::info!("Plinko (native) starting...");

    let mut args = std::env::args().skip(1);
    let mut positional = Vec::new();
    let mut tuning_path = None;
    let mut quality = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--tuning" => tuning_path = args.next().map(PathBuf::from),
            "--quality" => quality = args.next(),
            _ => positional.push(arg),
        }
    }

    let tuning = match tuning_path {
        Some(path) => match Tuning::load(&path) {
            Ok(t) => t,
            Err(e) => {
                log::error!("Failed to load tuning from {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Tuning::default(),
    };
    let bet = positional
        .first()
        .and_then(|s| s.parse().ok())
        .unwrap_or(tuning.min_bet);
    let count = positional.get(1).and_then(|s| s.parse().ok()).unwrap_or(1);

    let save_dir = std::env::var_os("PLINKO_SAVE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("plinko-save"));
    let mut storage = match FileStorage::open(&save_dir) {
        Ok(s) => s,
        Err(e) => {
            log::error!("Cannot open save directory {}: {}", save_dir.display(), e);
            std::process::exit(1);
        }
    };

    let clock = SystemClock;
    let now = clock.now_ms();
    let mut settings = Settings::load(&storage);
    if let Some(name) = quality {
        match name.parse::<QualityPreset>() {
            Ok(preset) => {
                log::info!("Quality set to {}", preset);
                settings.quality = preset;
                settings.save(&mut storage);
            }
            Err(e) => {
                log::error!("{}", e);
                std::process::exit(1);
            }
        }
    }
    let session = Session::load(storage, SessionRules::from(&tuning), now);
    let seed: u64 = rand::random();
    let mut game = Game::new(tuning, &settings, session, seed, now);

    println!("Balance: ${}", game.balance_text());
    if let Err(e) = game.drop_request(bet, count, now) {
        println!("Drop refused: {}", e);
        game.end_session();
        return;
    }

    let mut ticks = FixedRateTicks::new(now, plinko::consts::FRAME_MS, FRAME_BUDGET);
    while let Some(frame_ms) = ticks.next_frame() {
        game.frame(frame_ms);
        for event in game.drain_events() {
            match event {
                GameEvent::Landed(p) => println!(
                    "Ball {} landed in {}x: ${}",
                    p.ball_id,
                    p.multiplier,
                    format_balance(p.amount)
                ),
                GameEvent::Missed { ball_id } => println!("Ball {} missed", ball_id),
                GameEvent::Jackpot { amount, tier } => {
                    println!("{:?} WIN! ${}", tier, format_balance(amount))
                }
                GameEvent::FreeReward { amount } => println!("Free reward: ${}", amount),
                _ => {}
            }
        }
        if game.is_settled() {
            break;
        }
    }

    let balance = game.balance_text();
    game.end_session();
    println!("Balance: ${}", balance);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Browser embedders drive `plinko::Game` directly
}
