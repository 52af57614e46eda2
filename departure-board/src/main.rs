use std::ops::ControlFlow;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use departure_board::config::{BoardConfig, ELAPSED_TICK_PERIOD};
use departure_board::display::{TextBoard, spawn_board};
use departure_board::domain::{Clock, SystemClock};
use departure_board::feed::{FeedClient, MockFeedClient, TripSource};
use departure_board::scheduler::{RefreshCycle, Scheduler, Ticker};
use departure_board::settings::JsonFileSettingsStore;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Frames go to stdout, logs to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = BoardConfig::from_env().unwrap_or_else(|e| {
        error!(error = %e, "invalid configuration");
        std::process::exit(2);
    });

    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(SystemClock);

    let feed: Box<dyn TripSource + Send> = match &config.mock_data {
        Some(dir) => {
            let mock = MockFeedClient::new(dir)
                .expect("Failed to load mock departures")
                .with_clock(clock.clone());
            info!(dir = %dir.display(), stations = ?mock.available_stations(), "serving mock departures");
            Box::new(mock)
        }
        None => {
            info!(base_url = %config.feed.base_url, "using live departures feed");
            Box::new(FeedClient::new(config.feed.clone()).expect("Failed to create feed client"))
        }
    };

    let settings = JsonFileSettingsStore::new(&config.settings_path);
    info!(path = %settings.path().display(), "reading settings");

    let (board, board_thread) =
        spawn_board(TextBoard::new(std::io::stdout())).expect("Failed to start board thread");

    let tick_board = board.clone();
    let tick_clock = clock.clone();
    let _elapsed_ticker = Ticker::spawn("elapsed-ticker", ELAPSED_TICK_PERIOD, move || {
        match tick_board.tick(tick_clock.now()) {
            Ok(()) => ControlFlow::Continue(()),
            Err(_) => ControlFlow::Break(()),
        }
    })
    .expect("Failed to start elapsed ticker");

    let cycle = RefreshCycle::new(feed, settings, clock, board);
    let scheduler =
        Scheduler::for_cycle(config.refresh_period, cycle).expect("Failed to start scheduler");

    info!(period = ?config.refresh_period, "departure board running");
    // Don't wait a full period for the first board
    scheduler.trigger_now();

    scheduler.join();
    if board_thread.join().is_err() {
        error!("board thread panicked");
    }
}
