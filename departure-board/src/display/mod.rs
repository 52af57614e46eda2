//! The departures display.
//!
//! [`DepartureBoard`] is the contract the reconciler drives. The board is
//! owned by a single actor thread ([`spawn_board`]); everyone else talks to
//! it through a [`BoardHandle`], so a frame is only ever presented between
//! two complete commands.

mod actor;
mod board;
mod text;

pub use actor::{BoardClosed, BoardCommand, BoardHandle, spawn_board};
pub use board::{DepartureBoard, DepartureRow, RowChange};
pub use text::{TextBoard, format_elapsed};
