//! The thread that owns the board.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::domain::Trip;
use crate::reconcile::{ReconcileOutcome, Reconciler};
use crate::settings::RefreshSettings;

use super::board::DepartureBoard;

/// Work for the board actor. Each command is applied in full, then presented.
#[derive(Debug, Clone)]
pub enum BoardCommand {
    /// Reconcile the rows against a freshly fetched trip list.
    Reconcile {
        trips: Vec<Trip>,
        settings: RefreshSettings,
        now: DateTime<Utc>,
    },
    /// Show the "no station configured" notice.
    ShowNotConfigured,
    /// Re-render time-dependent text.
    Tick(DateTime<Utc>),
}

/// The board actor has stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("board actor is no longer running")]
pub struct BoardClosed;

/// Sending side of the board actor. Cheap to clone.
#[derive(Debug, Clone)]
pub struct BoardHandle {
    tx: Sender<BoardCommand>,
}

impl BoardHandle {
    pub fn send(&self, command: BoardCommand) -> Result<(), BoardClosed> {
        self.tx.send(command).map_err(|_| BoardClosed)
    }

    pub fn reconcile(
        &self,
        trips: Vec<Trip>,
        settings: RefreshSettings,
        now: DateTime<Utc>,
    ) -> Result<(), BoardClosed> {
        self.send(BoardCommand::Reconcile {
            trips,
            settings,
            now,
        })
    }

    pub fn show_not_configured(&self) -> Result<(), BoardClosed> {
        self.send(BoardCommand::ShowNotConfigured)
    }

    pub fn tick(&self, now: DateTime<Utc>) -> Result<(), BoardClosed> {
        self.send(BoardCommand::Tick(now))
    }
}

/// Move `board` onto its own thread.
///
/// The thread runs until every [`BoardHandle`] has been dropped, then hands
/// the board back through the join handle.
pub fn spawn_board<B>(board: B) -> std::io::Result<(BoardHandle, JoinHandle<B>)>
where
    B: DepartureBoard + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let join = thread::Builder::new()
        .name("board".to_string())
        .spawn(move || run(board, rx))?;
    Ok((BoardHandle { tx }, join))
}

fn run<B: DepartureBoard>(mut board: B, rx: Receiver<BoardCommand>) -> B {
    debug!("board actor started");
    board.present();

    for command in rx {
        match command {
            BoardCommand::Reconcile {
                trips,
                settings,
                now,
            } => {
                if let ReconcileOutcome::Applied(summary) =
                    Reconciler::apply(&mut board, &trips, &settings, now)
                {
                    info!(
                        shown = summary.shown(),
                        created = summary.created,
                        removed = summary.removed,
                        "board refreshed"
                    );
                }
            }
            BoardCommand::ShowNotConfigured => board.show_not_configured(),
            BoardCommand::Tick(now) => board.refresh_elapsed(now),
        }
        board.present();
    }

    debug!("board actor stopped");
    board
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::TextBoard;
    use crate::domain::{Product, TripId, parse_wire_time};
    use crate::settings::StationChoice;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        parse_wire_time("2025-03-15T12:00:00Z").unwrap()
    }

    fn trip(id: &str, minutes: i64) -> Trip {
        let at = now() + Duration::minutes(minutes);
        Trip {
            trip_id: TripId::new(id),
            departure_time: Some(at),
            planned_time: at,
            direction: "S Hackescher Markt".to_string(),
            line_name: "M4".to_string(),
            product: Some(Product::Tram),
        }
    }

    fn configured() -> RefreshSettings {
        RefreshSettings {
            current_station: Some(StationChoice {
                id: "900100003".to_string(),
                name: String::new(),
                enabled_products: [Product::Tram].into_iter().collect(),
            }),
            ..RefreshSettings::default()
        }
    }

    #[test]
    fn applies_commands_in_order_and_returns_board() {
        let (handle, join) = spawn_board(TextBoard::new(Vec::new())).unwrap();

        handle
            .reconcile(vec![trip("b", 6), trip("a", 2)], configured(), now())
            .unwrap();
        handle.tick(now() + Duration::seconds(12)).unwrap();
        drop(handle);

        let board = join.join().unwrap();
        let order: Vec<&str> = board.row_order().iter().map(TripId::as_str).collect();
        assert_eq!(order, vec!["a", "b"]);
        assert_eq!(board.footer(), "Last updated: 12s ago");
    }

    #[test]
    fn not_configured_then_recovers() {
        let (handle, join) = spawn_board(TextBoard::new(Vec::new())).unwrap();

        handle.reconcile(vec![trip("a", 2)], configured(), now()).unwrap();
        handle.show_not_configured().unwrap();
        drop(handle);

        let board = join.join().unwrap();
        assert!(board.is_showing_not_configured());
        assert!(board.row_order().is_empty());

        let (handle, join) = spawn_board(board).unwrap();
        handle.reconcile(vec![trip("c", 4)], configured(), now()).unwrap();
        drop(handle);

        let board = join.join().unwrap();
        assert!(!board.is_showing_not_configured());
        assert_eq!(board.row_order(), &[TripId::new("c")]);
    }

    #[test]
    fn every_command_presents_a_frame() {
        let (handle, join) = spawn_board(TextBoard::new(Vec::new())).unwrap();
        handle.reconcile(vec![trip("a", 2)], configured(), now()).unwrap();
        drop(handle);

        let frame = String::from_utf8(join.join().unwrap().into_inner()).unwrap();
        assert!(frame.contains("M4"));
        assert!(frame.contains("Last updated: 0s ago"));
    }

    #[test]
    fn send_after_shutdown_fails() {
        let (handle, join) = spawn_board(TextBoard::new(Vec::new())).unwrap();
        let spare = handle.clone();
        drop(handle);
        // Still alive: one handle remains
        spare.tick(now()).unwrap();
        drop(spare);
        join.join().unwrap();

        let (tx, rx) = mpsc::channel();
        drop(rx);
        let dead = BoardHandle { tx };
        assert_eq!(dead.show_not_configured(), Err(BoardClosed));
    }
}
