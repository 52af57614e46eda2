//! A plain-text departure board.
//!
//! Renders frames to any [`Write`] sink, one line per departure. Used as the
//! terminal display and as the reference board in tests.

use std::collections::{HashMap, HashSet};
use std::io::Write;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::domain::{Rgb, TripId, badge_color};

use super::board::{DepartureBoard, DepartureRow, RowChange};

const LINE_WIDTH: usize = 6;
const DIRECTION_WIDTH: usize = 34;
const COUNTDOWN_WIDTH: usize = 5;

const NOT_CONFIGURED_TITLE: &str = "No station configured";
const NOT_CONFIGURED_HINT: &str = "Choose a station in the board settings to see departures.";

/// Format the "last updated" footer for a given age.
///
/// ```
/// use chrono::Duration;
/// use departure_board::display::format_elapsed;
///
/// assert_eq!(format_elapsed(Duration::seconds(42)), "Last updated: 42s ago");
/// assert_eq!(format_elapsed(Duration::seconds(150)), "Last updated: 2m ago");
/// assert_eq!(format_elapsed(Duration::hours(3)), "Last updated: 3h ago");
/// ```
pub fn format_elapsed(age: Duration) -> String {
    let secs = age.num_seconds().max(0);
    if secs < 60 {
        format!("Last updated: {secs}s ago")
    } else if secs < 3600 {
        format!("Last updated: {}m ago", secs / 60)
    } else {
        format!("Last updated: {}h ago", secs / 3600)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Departures,
    NotConfigured,
}

#[derive(Debug, Clone)]
struct RowView {
    row: DepartureRow,
    badge: Rgb,
}

/// Text board writing a full frame to `out` on every [`DepartureBoard::present`]
/// that follows a change.
pub struct TextBoard<W: Write> {
    rows: HashMap<TripId, RowView>,
    order: Vec<TripId>,
    mode: Mode,
    last_refreshed: Option<DateTime<Utc>>,
    footer: String,
    dirty: bool,
    out: W,
}

impl<W: Write> TextBoard<W> {
    pub fn new(out: W) -> Self {
        Self {
            rows: HashMap::new(),
            order: Vec::new(),
            mode: Mode::Departures,
            last_refreshed: None,
            footer: String::new(),
            dirty: true,
            out,
        }
    }

    /// Row ids, top to bottom.
    pub fn row_order(&self) -> &[TripId] {
        &self.order
    }

    /// The row currently shown for `trip_id`.
    pub fn row(&self, trip_id: &TripId) -> Option<&DepartureRow> {
        self.rows.get(trip_id).map(|v| &v.row)
    }

    /// Badge colour of the row for `trip_id`.
    pub fn badge(&self, trip_id: &TripId) -> Option<Rgb> {
        self.rows.get(trip_id).map(|v| v.badge)
    }

    pub fn is_showing_not_configured(&self) -> bool {
        self.mode == Mode::NotConfigured
    }

    pub fn footer(&self) -> &str {
        &self.footer
    }

    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.last_refreshed
    }

    /// Consume the board, returning the sink.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Render the current frame.
    pub fn render(&self) -> String {
        let mut frame = String::new();

        if self.mode == Mode::NotConfigured {
            frame.push_str(NOT_CONFIGURED_TITLE);
            frame.push('\n');
            frame.push_str(NOT_CONFIGURED_HINT);
            frame.push('\n');
            return frame;
        }

        frame.push_str(&format!(
            "{:<lw$} {:<dw$} {:>cw$}\n",
            "Line",
            "Direction",
            "Dep",
            lw = LINE_WIDTH,
            dw = DIRECTION_WIDTH,
            cw = COUNTDOWN_WIDTH,
        ));

        for id in &self.order {
            let Some(view) = self.rows.get(id) else {
                continue;
            };
            frame.push_str(&render_row(&view.row));
            frame.push('\n');
        }

        if !self.footer.is_empty() {
            frame.push_str(&self.footer);
            frame.push('\n');
        }
        frame
    }

    fn set_footer(&mut self, footer: String) {
        if footer != self.footer {
            self.footer = footer;
            self.dirty = true;
        }
    }
}

fn render_row(row: &DepartureRow) -> String {
    let direction = truncate(&row.direction, DIRECTION_WIDTH);
    let line = format!(
        "{:<lw$} {:<dw$} {:>cw$}",
        truncate(&row.line, LINE_WIDTH),
        direction,
        row.countdown,
        lw = LINE_WIDTH,
        dw = DIRECTION_WIDTH,
        cw = COUNTDOWN_WIDTH,
    );
    if row.cancelled { strike(&line) } else { line }
}

fn truncate(s: &str, width: usize) -> String {
    s.chars().take(width).collect()
}

/// Strike text through with U+0336 after every visible character.
fn strike(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 3);
    for c in s.chars() {
        out.push(c);
        if !c.is_whitespace() {
            out.push('\u{0336}');
        }
    }
    out
}

impl<W: Write> DepartureBoard for TextBoard<W> {
    fn upsert_row(&mut self, row: DepartureRow) -> RowChange {
        self.dirty = true;
        let badge = badge_color(row.product);

        if let Some(view) = self.rows.get_mut(&row.trip_id) {
            view.row = row;
            view.badge = badge;
            return RowChange::Updated;
        }

        debug!(trip_id = %row.trip_id, line = %row.line, badge = %badge.to_hex(), "row created");
        self.order.push(row.trip_id.clone());
        self.rows.insert(row.trip_id.clone(), RowView { row, badge });
        RowChange::Created
    }

    fn remove_row(&mut self, trip_id: &TripId) -> bool {
        if self.rows.remove(trip_id).is_none() {
            return false;
        }
        self.order.retain(|id| id != trip_id);
        self.dirty = true;
        debug!(%trip_id, "row removed");
        true
    }

    fn reorder(&mut self, order: &[TripId]) {
        let mut seen = HashSet::with_capacity(order.len());
        let mut next: Vec<TripId> = order
            .iter()
            .filter(|id| self.rows.contains_key(*id) && seen.insert((*id).clone()))
            .cloned()
            .collect();
        // Rows the caller didn't mention keep their relative order at the end
        next.extend(self.order.iter().filter(|id| !seen.contains(*id)).cloned());

        if next != self.order {
            self.order = next;
            self.dirty = true;
        }
    }

    fn set_last_refreshed(&mut self, at: DateTime<Utc>) {
        if self.mode == Mode::NotConfigured {
            self.mode = Mode::Departures;
            self.dirty = true;
        }
        self.last_refreshed = Some(at);
        self.set_footer(format_elapsed(Duration::zero()));
    }

    fn show_not_configured(&mut self) {
        if self.mode == Mode::NotConfigured {
            return;
        }
        self.rows.clear();
        self.order.clear();
        self.last_refreshed = None;
        self.footer.clear();
        self.mode = Mode::NotConfigured;
        self.dirty = true;
    }

    fn current_row_ids(&self) -> HashSet<TripId> {
        self.rows.keys().cloned().collect()
    }

    fn refresh_elapsed(&mut self, now: DateTime<Utc>) {
        if let Some(at) = self.last_refreshed {
            self.set_footer(format_elapsed(now - at));
        }
    }

    fn present(&mut self) {
        if !self.dirty {
            return;
        }
        let frame = self.render();
        if let Err(e) = self.out.write_all(frame.as_bytes()).and_then(|()| self.out.flush()) {
            warn!(error = %e, "failed to write board frame");
            return;
        }
        self.dirty = false;
    }
}
