//! First-run reference data.

use crate::sequence::{SequenceKind, Sequences};
use crate::state::LedgerState;
use crate::types::{
    Locale, Person, PersonId, PersonRole, Shift, ShiftId, Show, ShowCategory, ShowId, Venue,
    VenueId,
};
use chrono::{NaiveDate, NaiveTime};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or_default()
}

fn venue(id: &str, name: &str, address: &str, capacity: u32, notes: &str) -> Venue {
    Venue {
        venue_id: VenueId::new(id),
        name: name.to_string(),
        address: address.to_string(),
        capacity,
        contact: None,
        phone: None,
        notes: Some(notes.to_string()),
    }
}

/// The ledger written on first run or after an unreadable snapshot
#[must_use]
pub fn seed_state() -> LedgerState {
    let venues = vec![
        venue("VEN-CCB", "Comedy Café Berlin", "Roseggerstr. 17, Berlin", 60, "Main venue"),
        venue("VEN-IDAN", "Ida Nowhere", "Donaustr. 79, Berlin", 30, "Partner venue"),
        venue("VEN-CCBS", "CCB Studios", "Hasenheide 12, Berlin", 50, "Workshop space"),
    ];

    let shows = vec![
        Show {
            show_id: ShowId::new("IMP25-S01"),
            title: "Opening Night Jam".into(),
            venue_id: VenueId::new("VEN-CCB"),
            date: date(2025, 10, 16),
            start: time(19, 0),
            end: time(20, 30),
            capacity: 180,
            category: ShowCategory::Show,
            headliner: Some("Berlin All-Stars".into()),
            tech_notes: None,
        },
        Show {
            show_id: ShowId::new("IMP25-S02"),
            title: "International Ensemble".into(),
            venue_id: VenueId::new("VEN-IDAN"),
            date: date(2025, 10, 17),
            start: time(20, 0),
            end: time(21, 30),
            capacity: 220,
            category: ShowCategory::Show,
            headliner: None,
            tech_notes: None,
        },
    ];

    let persons = vec![
        Person {
            pid: PersonId::new("P0001"),
            role: PersonRole::Staff,
            first: "Josh".into(),
            last: "Telson".into(),
            email: None,
            phone: None,
            team: Some("Smash Cut".into()),
            lang: Some(Locale::En),
            notes: None,
        },
        Person {
            pid: PersonId::new("P0002"),
            role: PersonRole::Vol,
            first: "Noah".into(),
            last: "Telson".into(),
            email: None,
            phone: Some("911".into()),
            team: Some("Toasty".into()),
            lang: Some(Locale::De),
            notes: None,
        },
    ];

    let shifts = vec![Shift {
        shift_id: ShiftId::new("SH001"),
        venue_id: VenueId::new("VEN-CCB"),
        date: date(2025, 10, 16),
        start: time(17, 30),
        end: time(22, 0),
        role: "FOH".into(),
        cap: 4,
    }];

    LedgerState {
        shows,
        venues,
        persons,
        shifts,
        seq: Sequences::with_values([
            (SequenceKind::Ticket, 1),
            (SequenceKind::Sale, 1),
            (SequenceKind::Expense, 1),
            (SequenceKind::Scan, 1),
            (SequenceKind::Show, 3),
            (SequenceKind::Shift, 2),
            (SequenceKind::Person, 3),
            (SequenceKind::Assign, 1),
        ]),
        locale: Locale::En,
        ..LedgerState::default()
    }
}
