//! The ledger aggregate.
//!
//! `LedgerState` is the single system of record. It serializes wholesale to
//! the snapshot document, so every field here is part of the on-disk format.

use crate::sequence::Sequences;
use crate::types::{
    Assignment, Expense, Locale, Person, Sale, Scan, Shift, Show, ShowId, Ticket, Venue,
};
use serde::{Deserialize, Serialize};

/// Every collection, the counter map and the active locale
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    /// Issued tickets, in issue order
    #[serde(default)]
    pub tickets: Vec<Ticket>,
    /// Scheduled shows
    #[serde(default)]
    pub shows: Vec<Show>,
    /// Venue reference data
    #[serde(default)]
    pub venues: Vec<Venue>,
    /// Performers, volunteers, staff and press
    #[serde(default)]
    pub persons: Vec<Person>,
    /// Staffing demand
    #[serde(default)]
    pub shifts: Vec<Shift>,
    /// Staffing supply
    #[serde(default)]
    pub assigns: Vec<Assignment>,
    /// Revenue records, paired 1:1 with tickets sold on site
    #[serde(default)]
    pub sales: Vec<Sale>,
    /// Costs
    #[serde(default)]
    pub expenses: Vec<Expense>,
    /// Door log
    #[serde(default)]
    pub scans: Vec<Scan>,
    /// Sequence counters
    #[serde(default)]
    pub seq: Sequences,
    /// Console language
    #[serde(default)]
    pub locale: Locale,
    /// Bumped on every accepted mutation
    #[serde(default)]
    pub revision: u64,
}

impl LedgerState {
    /// Looks up a show by exact identifier
    #[must_use]
    pub fn show(&self, show_id: &str) -> Option<&Show> {
        self.shows.iter().find(|s| s.show_id.as_str() == show_id)
    }

    /// Looks up a ticket ignoring case
    #[must_use]
    pub fn ticket(&self, code: &str) -> Option<&Ticket> {
        self.tickets.iter().find(|t| t.tid.matches(code))
    }

    /// Mutable ticket lookup ignoring case
    pub fn ticket_mut(&mut self, code: &str) -> Option<&mut Ticket> {
        self.tickets.iter_mut().find(|t| t.tid.matches(code))
    }

    /// Whether a venue exists
    #[must_use]
    pub fn has_venue(&self, venue_id: &str) -> bool {
        self.venues.iter().any(|v| v.venue_id.as_str() == venue_id)
    }

    /// Whether a person exists
    #[must_use]
    pub fn has_person(&self, pid: &str) -> bool {
        self.persons.iter().any(|p| p.pid.as_str() == pid)
    }

    /// Whether a shift exists
    #[must_use]
    pub fn has_shift(&self, shift_id: &str) -> bool {
        self.shifts.iter().any(|s| s.shift_id.as_str() == shift_id)
    }

    /// Number of tickets for `show_id` still holding a seat
    #[must_use]
    pub fn sold_count(&self, show_id: &ShowId) -> u32 {
        let sold = self
            .tickets
            .iter()
            .filter(|t| &t.show_id == show_id && t.status.holds_capacity())
            .count();
        u32::try_from(sold).unwrap_or(u32::MAX)
    }

    /// Seats left on a show; zero when oversold
    #[must_use]
    pub fn remaining(&self, show: &Show) -> u32 {
        show.capacity.saturating_sub(self.sold_count(&show.show_id))
    }

    /// Marks an accepted mutation
    pub fn bump_revision(&mut self) {
        self.revision += 1;
    }
}
