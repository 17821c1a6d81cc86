//! Capacity & sale engine.
//!
//! A sale is all-or-nothing: either every requested ticket is issued with its
//! paired sale record, or nothing is. Voided tickets release their seat.

use crate::error::Rejection;
use crate::sequence::{format, SequenceKind, Sequences};
use crate::state::LedgerState;
use crate::types::{
    Channel, Money, PaymentMethod, Sale, SaleId, ShowId, Ticket, TicketId, TicketStatus,
    TicketType,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Buyer recorded on box-office tickets
pub const WALK_UP_BUYER: &str = "Walk-up";

/// A walk-up sale request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRequest {
    /// Show to sell
    pub show_id: ShowId,
    /// Admission type for every ticket in the batch
    pub ticket_type: TicketType,
    /// Unit price
    pub price: Money,
    /// Number of tickets
    pub quantity: u32,
    /// Payment method
    pub method: PaymentMethod,
}

/// Records produced by an authorized sale
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaleBatch {
    /// New tickets, one per unit
    pub tickets: Vec<Ticket>,
    /// Paired sale records
    pub sales: Vec<Sale>,
    /// Counters after the reservation
    pub sequences: Sequences,
}

/// Seats on one show
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    /// Show
    pub show_id: ShowId,
    /// Seats on sale
    pub capacity: u32,
    /// Tickets holding a seat
    pub sold: u32,
    /// Seats left
    pub remaining: u32,
}

/// Per-show seat counts in schedule order
#[must_use]
pub fn availability(state: &LedgerState) -> Vec<Availability> {
    state
        .shows
        .iter()
        .map(|show| {
            let sold = state.sold_count(&show.show_id);
            Availability {
                show_id: show.show_id.clone(),
                capacity: show.capacity,
                sold,
                remaining: show.capacity.saturating_sub(sold),
            }
        })
        .collect()
}

/// Authorizes a batch sale and synthesizes its tickets and sales
///
/// Ticket numbers come from one contiguous reservation on the `TICKET`
/// counter. A block that collides with an existing (imported) ticket is
/// burned and the next block is tried, so numbering never refuses a sale.
///
/// # Errors
///
/// - [`Rejection::NotFound`] for an unknown show
/// - [`Rejection::InvalidField`] for zero quantity or a price outside
///   `0..=Money::LIMIT`
/// - [`Rejection::CapacityExceeded`] when fewer seats remain than requested
pub fn sell(
    state: &LedgerState,
    request: &SaleRequest,
    at: NaiveDateTime,
) -> Result<SaleBatch, Rejection> {
    let show = state
        .show(request.show_id.as_str())
        .ok_or_else(|| Rejection::not_found("show", request.show_id.as_str()))?;

    if request.quantity == 0 {
        return Err(Rejection::invalid("quantity", "must be at least 1"));
    }
    if request.price.is_negative() {
        return Err(Rejection::invalid("price", "must not be negative"));
    }
    if request.price > Money::LIMIT {
        return Err(Rejection::invalid(
            "price",
            format!("must not exceed {}", Money::LIMIT),
        ));
    }

    let remaining = state.remaining(show);
    if remaining < request.quantity {
        return Err(Rejection::CapacityExceeded {
            show_id: show.show_id.to_string(),
            requested: request.quantity,
            remaining,
        });
    }

    let mut sequences = state.seq.clone();
    let sold_on = at.date();
    let sold_time = at.time();

    let tids: Vec<String> = loop {
        let block = sequences.reserve(SequenceKind::Ticket, u64::from(request.quantity));
        let candidates: Vec<String> = block
            .values()
            .map(|n| format::ticket(sold_on, show.show_id.as_str(), n))
            .collect();
        if candidates.iter().all(|tid| state.ticket(tid).is_none()) {
            break candidates;
        }
        tracing::debug!(first = block.first, "Ticket block collides with imported tickets, skipping");
    };

    let mut issued: HashSet<String> = HashSet::new();
    let mut tickets = Vec::with_capacity(tids.len());
    let mut sales = Vec::with_capacity(tids.len());
    for tid in tids {
        let sid = sequences.next_free(SequenceKind::Sale, format::sale, |candidate| {
            issued.contains(candidate) || state.sales.iter().any(|s| s.sid.as_str() == candidate)
        });
        issued.insert(sid.clone());

        tickets.push(Ticket {
            tid: TicketId::new(tid.clone()),
            show_id: show.show_id.clone(),
            ticket_type: request.ticket_type,
            price: request.price,
            status: TicketStatus::Sold,
            channel: Channel::Onsite,
            sold_at: sold_on,
            sold_time,
            buyer: WALK_UP_BUYER.to_string(),
            email: String::new(),
            notes: None,
        });
        sales.push(Sale {
            sid: SaleId::new(sid),
            date: sold_on,
            time: sold_time,
            show_id: show.show_id.clone(),
            tid: TicketId::new(tid),
            method: request.method,
            amount: request.price,
        });
    }

    Ok(SaleBatch {
        tickets,
        sales,
        sequences,
    })
}

/// Cancels a sold ticket
///
/// Returns the ticket as it will read after voiding. The paired sale record is
/// left in place.
///
/// # Errors
///
/// - [`Rejection::NotFound`] for an unknown ticket
/// - [`Rejection::TicketNotVoidable`] for used or already void tickets
pub fn void(state: &LedgerState, code: &str) -> Result<Ticket, Rejection> {
    let code = code.trim();
    let ticket = state
        .ticket(code)
        .ok_or_else(|| Rejection::not_found("ticket", code))?;

    if ticket.status != TicketStatus::Sold {
        return Err(Rejection::TicketNotVoidable {
            tid: ticket.tid.to_string(),
            status: ticket.status.to_string(),
        });
    }

    let mut voided = ticket.clone();
    voided.status = TicketStatus::Void;
    Ok(voided)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_state;
    use crate::types::{parse_date, parse_time, Show, ShowCategory, VenueId};
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 10, 16)
            .unwrap()
            .and_hms_opt(20, 30, 0)
            .unwrap()
    }

    fn request(show_id: &str, quantity: u32) -> SaleRequest {
        SaleRequest {
            show_id: ShowId::new(show_id),
            ticket_type: TicketType::Ga,
            price: Money::from_euros(15),
            quantity,
            method: PaymentMethod::Cash,
        }
    }

    fn state_with_small_show(capacity: u32) -> LedgerState {
        let mut state = seed_state();
        state.shows.push(Show {
            show_id: ShowId::new("IMP25-S09"),
            title: "Tiny Room".into(),
            venue_id: VenueId::new("VEN-IDAN"),
            date: parse_date("2025-10-18").unwrap(),
            start: parse_time("18:00").unwrap(),
            end: parse_time("19:00").unwrap(),
            capacity,
            category: ShowCategory::Workshop,
            headliner: None,
            tech_notes: None,
        });
        state
    }

    fn apply(state: &mut LedgerState, batch: SaleBatch) {
        state.tickets.extend(batch.tickets);
        state.sales.extend(batch.sales);
        state.seq = batch.sequences;
    }

    #[test]
    fn sell_issues_paired_tickets_and_sales() {
        let state = seed_state();

        let batch = sell(&state, &request("IMP25-S01", 3), at()).unwrap();

        let tids: Vec<_> = batch.tickets.iter().map(|t| t.tid.as_str()).collect();
        assert_eq!(tids, vec!["25-1-000001", "25-1-000002", "25-1-000003"]);
        assert_eq!(batch.sales.len(), 3);
        assert_eq!(batch.sales[0].sid.as_str(), "SID-000001");
        assert_eq!(batch.sales[2].tid.as_str(), "25-1-000003");
        assert!(batch.tickets.iter().all(|t| t.buyer == WALK_UP_BUYER));
        assert_eq!(batch.sequences.peek(SequenceKind::Ticket), 4);
        assert_eq!(batch.sequences.peek(SequenceKind::Sale), 4);
    }

    #[test]
    fn capacity_scenario_with_void_release() {
        let mut state = state_with_small_show(10);

        let first = sell(&state, &request("IMP25-S09", 7), at()).unwrap();
        apply(&mut state, first);
        let show = state.show("IMP25-S09").unwrap().clone();
        assert_eq!(state.remaining(&show), 3);

        let refused = sell(&state, &request("IMP25-S09", 5), at()).unwrap_err();
        assert_eq!(
            refused,
            Rejection::CapacityExceeded {
                show_id: "IMP25-S09".into(),
                requested: 5,
                remaining: 3,
            }
        );
        assert_eq!(state.tickets.len(), 7);

        for code in ["25-9-000001", "25-9-000002"] {
            let voided = void(&state, code).unwrap();
            *state.ticket_mut(code).unwrap() = voided;
        }
        assert_eq!(state.remaining(&show), 5);
        assert_eq!(state.sales.len(), 7);

        assert!(sell(&state, &request("IMP25-S09", 5), at()).is_ok());
    }

    #[test]
    fn sell_rejects_bad_requests() {
        let state = seed_state();

        assert!(matches!(
            sell(&state, &request("IMP25-S99", 1), at()),
            Err(Rejection::NotFound { .. })
        ));
        assert!(matches!(
            sell(&state, &request("IMP25-S01", 0), at()),
            Err(Rejection::InvalidField { .. })
        ));

        let mut negative = request("IMP25-S01", 1);
        negative.price = Money::from_cents(-1);
        assert!(matches!(
            sell(&state, &negative, at()),
            Err(Rejection::InvalidField { .. })
        ));
    }

    #[test]
    fn sell_skips_blocks_that_collide_with_imported_tickets() {
        let mut state = seed_state();
        let batch = sell(&state, &request("IMP25-S01", 1), at()).unwrap();
        state.tickets.extend(batch.tickets);

        let batch = sell(&state, &request("IMP25-S01", 2), at()).unwrap();

        let tids: Vec<_> = batch.tickets.iter().map(|t| t.tid.as_str()).collect();
        assert_eq!(tids, vec!["25-1-000003", "25-1-000004"]);
        assert_eq!(batch.sequences.peek(SequenceKind::Ticket), 5);
    }

    #[test]
    fn sell_refuses_prices_above_the_limit() {
        let state = seed_state();
        let mut request = request("IMP25-S01", 2);
        request.price = Money::from_cents(Money::LIMIT.cents() + 1);

        assert!(matches!(
            sell(&state, &request, at()),
            Err(Rejection::InvalidField { .. })
        ));

        request.price = Money::LIMIT;
        assert!(sell(&state, &request, at()).is_ok());
    }

    #[test]
    fn large_batch_at_the_limit_totals_without_overflow() {
        let mut state = seed_state();
        state.shows[0].capacity = 2_000;
        let mut request = request("IMP25-S01", 1_100);
        request.price = Money::from_euros(89_000_000_000_000);
        assert!(sell(&state, &request, at()).is_err());

        request.price = Money::LIMIT;
        let batch = sell(&state, &request, at()).unwrap();
        state.tickets.extend(batch.tickets);
        state.sales.extend(batch.sales);

        let totals = crate::reports::ledger_totals(&state);
        assert_eq!(totals.sales_total.cents(), Money::LIMIT.cents() * 1_100);
        assert_eq!(totals.net, totals.sales_total);
    }

    #[test]
    fn void_only_applies_to_sold_tickets() {
        let mut state = seed_state();
        let batch = sell(&state, &request("IMP25-S01", 2), at()).unwrap();
        apply(&mut state, batch);
        state.tickets[1].status = TicketStatus::Used;

        let voided = void(&state, "25-1-000001").unwrap();
        assert_eq!(voided.status, TicketStatus::Void);

        assert!(matches!(
            void(&state, "25-1-000002"),
            Err(Rejection::TicketNotVoidable { .. })
        ));
        assert!(matches!(void(&state, "nope"), Err(Rejection::NotFound { .. })));
    }

    #[test]
    fn availability_lists_every_show() {
        let state = seed_state();
        let rows = availability(&state);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].remaining, 220);
    }
}
