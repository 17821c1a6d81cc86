//! Domain types for the festival ledger.
//!
//! Value objects, identifiers and entity records. Entities refer to each other
//! only by identifier, never by reference, so the whole ledger can be written
//! out and read back as one JSON document.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps an existing identifier
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

string_id!(
    /// Identifier of a scheduled show, e.g. `IMP25-S01`
    ShowId
);
string_id!(
    /// Identifier of a venue, e.g. `VEN-CCB`
    VenueId
);
string_id!(
    /// Identifier printed on a ticket, e.g. `25-1-000042`
    TicketId
);
string_id!(
    /// Identifier of a sale record
    SaleId
);
string_id!(
    /// Identifier of a door scan
    ScanId
);
string_id!(
    /// Identifier of a staffing shift
    ShiftId
);
string_id!(
    /// Identifier of a volunteer assignment
    AssignmentId
);
string_id!(
    /// Identifier of an expense
    ExpenseId
);
string_id!(
    /// Identifier of a performer, volunteer, staff or press person
    PersonId
);

impl TicketId {
    /// Case-insensitive comparison against a presented code
    #[must_use]
    pub fn matches(&self, code: &str) -> bool {
        self.0.eq_ignore_ascii_case(code)
    }
}

/// Correlates a command with the outcome it produces
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new random `RequestId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Money
// ============================================================================

/// An amount in euro cents
///
/// Stored as integer cents so totals never drift; written to JSON as a plain
/// decimal number (`15.5`) to keep the snapshot readable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    /// Zero euros
    pub const ZERO: Self = Self(0);

    /// Largest unit price or expense the ledger accepts (10 million euros)
    ///
    /// Any batch of at most `u32::MAX` items at this price still fits in cents.
    pub const LIMIT: Self = Self(1_000_000_000);

    /// Creates an amount from cents
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Creates an amount from whole euros
    #[must_use]
    pub const fn from_euros(euros: i64) -> Self {
        Self(euros * 100)
    }

    /// The amount in cents
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Whether the amount is below zero
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    #[allow(clippy::cast_possible_truncation)] // bounded by the finite check
    fn from_decimal(value: f64) -> Option<Self> {
        let cents = (value * 100.0).round();
        if cents.is_finite() && cents.abs() < 9.0e15 {
            Some(Self(cents as i64))
        } else {
            None
        }
    }
}

impl std::ops::Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl std::ops::Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, m| acc + m)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl FromStr for Money {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|_| format!("'{s}' is not an amount"))?;
        Self::from_decimal(value).ok_or_else(|| format!("'{s}' is out of range"))
    }
}

impl Serialize for Money {
    #[allow(clippy::cast_precision_loss)] // cents well below 2^52
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % 100 == 0 {
            serializer.serialize_i64(self.0 / 100)
        } else {
            serializer.serialize_f64(self.0 as f64 / 100.0)
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Self::from_decimal(value)
            .ok_or_else(|| serde::de::Error::custom(format!("amount {value} out of range")))
    }
}

// ============================================================================
// Wall-clock time
// ============================================================================

/// Serde adapter writing `NaiveTime` as `HH:MM`
///
/// Times with a seconds part (imported rows) are written as `HH:MM:SS` so they
/// survive a reload. Sub-second precision is not kept.
pub mod hhmm {
    use chrono::{NaiveTime, Timelike};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize as `HH:MM`, or `HH:MM:SS` when seconds are set
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        let layout = if time.second() == 0 { "%H:%M" } else { "%H:%M:%S" };
        serializer.collect_str(&time.format(layout))
    }

    /// Deserialize from `HH:MM` (seconds are tolerated)
    ///
    /// # Errors
    ///
    /// Fails when the string is not a time of day.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_time(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid time '{raw}'")))
    }
}

/// Parses `HH:MM` or `HH:MM:SS`
#[must_use]
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

/// Parses `YYYY-MM-DD`
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

// ============================================================================
// Enumerations
// ============================================================================

macro_rules! labelled {
    ($name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The label used in snapshots, imports and reports
            #[must_use]
            pub const fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.label().eq_ignore_ascii_case(s))
                    .ok_or_else(|| format!("unknown {} '{s}'", stringify!($name)))
            }
        }
    };
}

/// Kind of admission a ticket grants
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TicketType {
    /// General admission
    Ga,
    /// VIP admission
    Vip,
    /// Crew
    Staff,
    /// Press accreditation
    Press,
}

labelled!(TicketType { Ga => "GA", Vip => "VIP", Staff => "STAFF", Press => "PRESS" });

/// Lifecycle state of a ticket
///
/// `Sold → Used` on check-in and `Sold → Void` on cancellation. `Used` and
/// `Void` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TicketStatus {
    /// Valid, not yet redeemed
    Sold,
    /// Redeemed at the door
    Used,
    /// Cancelled; frees its capacity slot
    Void,
}

labelled!(TicketStatus { Sold => "SOLD", Used => "USED", Void => "VOID" });

impl TicketStatus {
    /// Whether the ticket still occupies a capacity slot
    #[must_use]
    pub const fn holds_capacity(self) -> bool {
        !matches!(self, Self::Void)
    }
}

/// How a ticket was sold
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Channel {
    /// Walk-up sale at the box office
    Onsite,
    /// Imported presale
    Presale,
}

labelled!(Channel { Onsite => "ONSITE", Presale => "PRESALE" });

/// Payment method of a sale
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    /// Cash at the box office
    Cash,
    /// Card terminal
    Card,
}

labelled!(PaymentMethod { Cash => "CASH", Card => "CARD" });

/// Programme category of a show
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShowCategory {
    /// Evening performance
    #[default]
    Show,
    /// Daytime workshop
    Workshop,
}

labelled!(ShowCategory { Show => "Show", Workshop => "Workshop" });

/// Display language of the operator console
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Locale {
    /// English
    #[default]
    En,
    /// German
    De,
}

labelled!(Locale { En => "EN", De => "DE" });

/// Role of a person in the festival
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PersonRole {
    /// Performer
    Perf,
    /// Volunteer
    Vol,
    /// Staff
    Staff,
    /// Press
    Press,
}

labelled!(PersonRole { Perf => "PERF", Vol => "VOL", Staff => "STAFF", Press => "PRESS" });

/// Whether a volunteer is still expected on a shift
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AssignmentStatus {
    /// Confirmed
    Ok,
    /// Dropped out
    Drop,
}

labelled!(AssignmentStatus { Ok => "OK", Drop => "DROP" });

// ============================================================================
// Entities
// ============================================================================

/// A scheduled performance or workshop
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Show {
    /// Unique show identifier
    pub show_id: ShowId,
    /// Title on the programme
    pub title: String,
    /// Venue the show takes place in
    pub venue_id: VenueId,
    /// Calendar date
    pub date: NaiveDate,
    /// Doors / start time
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    /// End time (exclusive)
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
    /// Maximum number of non-void tickets
    pub capacity: u32,
    /// Programme category
    #[serde(default)]
    pub category: ShowCategory,
    /// Billed headliner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headliner: Option<String>,
    /// Notes for the tech crew
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tech_notes: Option<String>,
}

/// A festival venue (reference data)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    /// Unique venue identifier
    pub venue_id: VenueId,
    /// Display name
    pub name: String,
    /// Street address
    pub address: String,
    /// Physical room capacity
    pub capacity: u32,
    /// Contact person
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    /// Contact phone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Free-form notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// An admission ticket
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    /// Unique ticket identifier
    pub tid: TicketId,
    /// Show the ticket admits to
    pub show_id: ShowId,
    /// Admission type
    #[serde(rename = "type")]
    pub ticket_type: TicketType,
    /// Price paid
    pub price: Money,
    /// Lifecycle state
    pub status: TicketStatus,
    /// Sales channel
    pub channel: Channel,
    /// Date of sale
    pub sold_at: NaiveDate,
    /// Time of sale
    #[serde(with = "hhmm")]
    pub sold_time: NaiveTime,
    /// Buyer name
    #[serde(default)]
    pub buyer: String,
    /// Buyer email
    #[serde(default)]
    pub email: String,
    /// Free-form notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Revenue record paired 1:1 with a ticket at sale time
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    /// Unique sale identifier
    pub sid: SaleId,
    /// Date of sale
    pub date: NaiveDate,
    /// Time of sale
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    /// Show sold
    pub show_id: ShowId,
    /// Ticket issued
    pub tid: TicketId,
    /// Payment method
    pub method: PaymentMethod,
    /// Amount taken
    pub amount: Money,
}

/// One check-in attempt at a door
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scan {
    /// Unique scan identifier
    pub scan_id: ScanId,
    /// Ticket identifier as stored, or the normalized code if nothing matched
    pub tid: String,
    /// Date of the attempt
    pub when: NaiveDate,
    /// Time of the attempt
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    /// Door / scanner name
    #[serde(default)]
    pub gate: String,
    /// Whether entry was granted
    pub ok: bool,
    /// Operator-facing message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

/// A staffing slot
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    /// Unique shift identifier
    pub shift_id: ShiftId,
    /// Venue being staffed
    pub venue_id: VenueId,
    /// Calendar date
    pub date: NaiveDate,
    /// Start time
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    /// End time
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
    /// Door, Tech, FOH ...
    pub role: String,
    /// Headcount needed
    pub cap: u32,
}

/// A person bound to a shift
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    /// Unique assignment identifier
    pub assign_id: AssignmentId,
    /// Shift staffed
    pub shift_id: ShiftId,
    /// Person assigned
    pub pid: PersonId,
    /// Confirmed or dropped
    pub status: AssignmentStatus,
    /// Free-form notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A festival cost
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    /// Unique expense identifier
    pub eid: ExpenseId,
    /// Date incurred
    pub date: NaiveDate,
    /// Category
    pub cat: String,
    /// Who gets paid
    pub payee: String,
    /// Free-form memo
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    /// Amount owed
    pub amount: Money,
    /// Whether it has been settled
    pub paid: bool,
}

/// Performer, volunteer, staff or press contact
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    /// Unique person identifier
    pub pid: PersonId,
    /// Role in the festival
    pub role: PersonRole,
    /// First name
    pub first: String,
    /// Last name
    pub last: String,
    /// Email address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Phone number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Troupe or department
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    /// Preferred language
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<Locale>,
    /// Free-form notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_display_pads_cents() {
        assert_eq!(Money::from_cents(10_500).to_string(), "105.00");
        assert_eq!(Money::from_cents(1_505).to_string(), "15.05");
        assert_eq!(Money::from_cents(-350).to_string(), "-3.50");
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }

    #[test]
    fn money_parses_decimal_strings() {
        assert_eq!("15".parse::<Money>().unwrap(), Money::from_euros(15));
        assert_eq!("12.5".parse::<Money>().unwrap(), Money::from_cents(1_250));
        assert_eq!(" 0.1 ".parse::<Money>().unwrap(), Money::from_cents(10));
        assert!("abc".parse::<Money>().is_err());
    }

    #[test]
    fn money_json_is_a_plain_number() {
        assert_eq!(serde_json::to_string(&Money::from_euros(15)).unwrap(), "15");
        assert_eq!(serde_json::to_string(&Money::from_cents(1_550)).unwrap(), "15.5");
        let back: Money = serde_json::from_str("19.99").unwrap();
        assert_eq!(back, Money::from_cents(1_999));
    }

    #[test]
    fn money_arithmetic_saturates() {
        let top = Money::from_cents(i64::MAX - 1);
        assert_eq!(top + Money::from_cents(5), Money::from_cents(i64::MAX));
        let total: Money = [top, top, Money::from_euros(1)].into_iter().sum();
        assert_eq!(total.cents(), i64::MAX);
        assert_eq!(Money::from_cents(i64::MIN) - Money::from_cents(1), Money::from_cents(i64::MIN));
    }

    #[test]
    fn labels_parse_case_insensitively() {
        assert_eq!("vip".parse::<TicketType>().unwrap(), TicketType::Vip);
        assert_eq!("Card".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);
        assert_eq!("workshop".parse::<ShowCategory>().unwrap(), ShowCategory::Workshop);
        assert!("VIPP".parse::<TicketType>().is_err());
    }

    #[test]
    fn ticket_serializes_with_original_field_names() {
        let ticket = Ticket {
            tid: TicketId::new("25-1-000001"),
            show_id: ShowId::new("IMP25-S01"),
            ticket_type: TicketType::Ga,
            price: Money::from_euros(15),
            status: TicketStatus::Sold,
            channel: Channel::Onsite,
            sold_at: parse_date("2025-10-16").unwrap(),
            sold_time: parse_time("20:30").unwrap(),
            buyer: "Walk-up".into(),
            email: String::new(),
            notes: None,
        };

        let json = serde_json::to_value(&ticket).unwrap();

        assert_eq!(json["showId"], "IMP25-S01");
        assert_eq!(json["type"], "GA");
        assert_eq!(json["status"], "SOLD");
        assert_eq!(json["soldTime"], "20:30");
        assert!(json.get("notes").is_none());
    }

    #[test]
    fn times_keep_their_seconds_through_json() {
        #[derive(Serialize, Deserialize, PartialEq, Debug)]
        struct At(#[serde(with = "hhmm")] NaiveTime);

        let on_the_minute = At(parse_time("20:30").unwrap());
        assert_eq!(serde_json::to_string(&on_the_minute).unwrap(), "\"20:30\"");

        let with_seconds = At(parse_time("10:15:30").unwrap());
        let json = serde_json::to_string(&with_seconds).unwrap();
        assert_eq!(json, "\"10:15:30\"");
        assert_eq!(serde_json::from_str::<At>(&json).unwrap(), with_seconds);
    }

    #[test]
    fn ticket_id_matches_ignoring_case() {
        let tid = TicketId::new("IMP-T1");
        assert!(tid.matches("imp-t1"));
        assert!(!tid.matches("imp-t2"));
    }

    #[test]
    fn void_releases_capacity() {
        assert!(TicketStatus::Sold.holds_capacity());
        assert!(TicketStatus::Used.holds_capacity());
        assert!(!TicketStatus::Void.holds_capacity());
    }
}
