//! Identifier & sequence service.
//!
//! One monotonic counter per entity kind. The stored value is the next number
//! to hand out; a missing key starts at 1. Identifiers are built from a counter
//! value plus a readable prefix or partition key, so uniqueness never depends
//! on clock resolution.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Named counter
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SequenceKind {
    /// Ticket numbers (walk-up sales and generated presale ids)
    Ticket,
    /// Sale records
    Sale,
    /// Shows
    Show,
    /// Door scans
    Scan,
    /// Expenses
    #[serde(rename = "EXP")]
    Expense,
    /// Staffing shifts
    Shift,
    /// Volunteer assignments
    Assign,
    /// People
    Person,
}

impl fmt::Display for SequenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ticket => "TICKET",
            Self::Sale => "SALE",
            Self::Show => "SHOW",
            Self::Scan => "SCAN",
            Self::Expense => "EXP",
            Self::Shift => "SHIFT",
            Self::Assign => "ASSIGN",
            Self::Person => "PERSON",
        };
        f.write_str(name)
    }
}

/// A contiguous run of reserved counter values
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SequenceBlock {
    /// First reserved value
    pub first: u64,
    /// Number of values reserved
    pub len: u64,
}

impl SequenceBlock {
    /// Every value in the block, in order
    pub fn values(self) -> impl Iterator<Item = u64> {
        self.first..self.first + self.len
    }
}

/// Counter map persisted as `seq` in the snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sequences(BTreeMap<SequenceKind, u64>);

impl Sequences {
    /// Empty counter map; every kind starts at 1
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter map with explicit starting values
    #[must_use]
    pub fn with_values(values: impl IntoIterator<Item = (SequenceKind, u64)>) -> Self {
        Self(values.into_iter().collect())
    }

    /// The value `next` would hand out, without advancing
    #[must_use]
    pub fn peek(&self, kind: SequenceKind) -> u64 {
        self.0.get(&kind).copied().unwrap_or(1).max(1)
    }

    /// Returns the current value and advances the counter by one
    pub fn next(&mut self, kind: SequenceKind) -> u64 {
        self.reserve(kind, 1).first
    }

    /// Reserves `n` consecutive values in one step
    pub fn reserve(&mut self, kind: SequenceKind, n: u64) -> SequenceBlock {
        let first = self.peek(kind);
        self.0.insert(kind, first + n);
        SequenceBlock { first, len: n }
    }

    /// Draws values until `format` produces an identifier rejected by `taken`
    ///
    /// Skipped values stay consumed.
    pub fn next_free<F, T>(&mut self, kind: SequenceKind, format: F, taken: T) -> String
    where
        F: Fn(u64) -> String,
        T: Fn(&str) -> bool,
    {
        loop {
            let candidate = format(self.next(kind));
            if !taken(&candidate) {
                return candidate;
            }
        }
    }
}

/// Identifier formats
pub mod format {
    use chrono::{Datelike, NaiveDate};

    /// `{YY}-{P}-{seq:06}` where `P` is the last character of the show id
    #[must_use]
    pub fn ticket(sold_on: NaiveDate, show_id: &str, seq: u64) -> String {
        let partition = show_id
            .chars()
            .last()
            .map_or('X', |c| c.to_ascii_uppercase());
        format!("{:02}-{partition}-{seq:06}", sold_on.year().rem_euclid(100))
    }

    /// Presale ticket generated during import
    #[must_use]
    pub fn presale_ticket(seq: u64) -> String {
        format!("PRE-{seq:06}")
    }

    /// Sale record
    #[must_use]
    pub fn sale(seq: u64) -> String {
        format!("SID-{seq:06}")
    }

    /// Door scan
    #[must_use]
    pub fn scan(seq: u64) -> String {
        format!("SCAN-{seq:06}")
    }

    /// Expense
    #[must_use]
    pub fn expense(seq: u64) -> String {
        format!("EXP-{seq:04}")
    }

    /// Shift
    #[must_use]
    pub fn shift(seq: u64) -> String {
        format!("SH{seq:03}")
    }

    /// Volunteer assignment
    #[must_use]
    pub fn assignment(seq: u64) -> String {
        format!("AS-{seq:04}")
    }

    /// Person
    #[must_use]
    pub fn person(seq: u64) -> String {
        format!("P{seq:04}")
    }

    /// Show, partitioned by festival code
    #[must_use]
    pub fn show(festival_code: &str, seq: u64) -> String {
        format!("{festival_code}-S{seq:02}")
    }
}
