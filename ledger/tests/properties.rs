//! Property tests for the engines.
//!
//! Run with: `cargo test --test properties`

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use chrono::{NaiveDate, NaiveTime};
use festival_ledger::persistence::{decode, encode};
use festival_ledger::sales::{self, SaleRequest};
use festival_ledger::schedule::{conflicts_of, overlaps};
use festival_ledger::seed::seed_state;
use festival_ledger::types::{Show, ShowCategory, ShowId, VenueId};
use festival_ledger::{LedgerState, Money, PaymentMethod, Rejection, TicketStatus, TicketType};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Step {
    Sell(u32),
    Void(usize),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (1u32..8).prop_map(Step::Sell),
        any::<usize>().prop_map(Step::Void),
    ]
}

fn at() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 10, 16)
        .unwrap()
        .and_hms_opt(20, 0, 17)
        .unwrap()
}

fn request(quantity: u32) -> SaleRequest {
    SaleRequest {
        show_id: ShowId::new("IMP25-S01"),
        ticket_type: TicketType::Ga,
        price: Money::from_euros(12),
        quantity,
        method: PaymentMethod::Card,
    }
}

fn live(state: &LedgerState) -> usize {
    state
        .tickets
        .iter()
        .filter(|t| t.status != TicketStatus::Void)
        .count()
}

fn show(id: usize, date: u32, start: u32, length: u32) -> Show {
    let start_time = NaiveTime::from_hms_opt(10, 0, 0).unwrap() + chrono::Duration::minutes(i64::from(start) * 15);
    Show {
        show_id: ShowId::new(format!("S{id}")),
        title: format!("Show {id}"),
        venue_id: VenueId::new("VEN-CCB"),
        date: NaiveDate::from_ymd_opt(2025, 10, 16 + date).unwrap(),
        start: start_time,
        end: start_time + chrono::Duration::minutes(i64::from(length) * 15),
        capacity: 50,
        category: ShowCategory::Show,
        headliner: None,
        tech_notes: None,
    }
}

fn shows() -> impl Strategy<Value = Vec<Show>> {
    prop::collection::vec((0u32..2, 0u32..40, 1u32..12), 1..10).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (date, start, length))| show(i, date, start, length))
            .collect()
    })
}

proptest! {
    #[test]
    fn capacity_holds_under_any_sell_void_sequence(
        capacity in 1u32..20,
        steps in prop::collection::vec(step(), 1..40),
    ) {
        let mut state = seed_state();
        state.shows[0].capacity = capacity;

        for step in steps {
            match step {
                Step::Sell(quantity) => {
                    let before = state.clone();
                    match sales::sell(&state, &request(quantity), at()) {
                        Ok(batch) => {
                            state.tickets.extend(batch.tickets);
                            state.sales.extend(batch.sales);
                            state.seq = batch.sequences;
                        },
                        Err(Rejection::CapacityExceeded { .. }) => {
                            prop_assert_eq!(&state, &before);
                        },
                        Err(other) => prop_assert!(false, "unexpected rejection {other}"),
                    }
                },
                Step::Void(pick) => {
                    if state.tickets.is_empty() {
                        continue;
                    }
                    let tid = state.tickets[pick % state.tickets.len()].tid.clone();
                    if let Ok(voided) = sales::void(&state, tid.as_str()) {
                        *state.ticket_mut(tid.as_str()).unwrap() = voided;
                    }
                },
            }
            prop_assert!(live(&state) <= capacity as usize);
        }
    }

    #[test]
    fn conflicts_are_symmetric_and_never_reflexive(all in shows()) {
        for a in &all {
            let of_a = conflicts_of(a, &all);
            prop_assert!(of_a.iter().all(|s| s.show_id != a.show_id));
            for b in &of_a {
                prop_assert_eq!(b.date, a.date);
                prop_assert!(conflicts_of(b, &all).iter().any(|s| s.show_id == a.show_id));
                prop_assert!(overlaps(a, b) && overlaps(b, a));
            }
        }
    }

    #[test]
    fn snapshot_round_trip_is_lossless(
        quantities in prop::collection::vec(1u32..5, 0..6),
        cents in 0i64..100_000,
    ) {
        let mut state = seed_state();
        for quantity in quantities {
            let mut req = request(quantity);
            req.price = Money::from_cents(cents);
            if let Ok(batch) = sales::sell(&state, &req, at()) {
                state.tickets.extend(batch.tickets);
                state.sales.extend(batch.sales);
                state.seq = batch.sequences;
                state.bump_revision();
            }
        }

        let restored = decode(&encode(&state).unwrap()).unwrap();

        prop_assert_eq!(restored, state);
    }
}
