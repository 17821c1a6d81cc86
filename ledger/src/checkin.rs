//! Check-in engine.
//!
//! `SOLD --scan--> USED`. Any other state is refused without touching the
//! ticket. Every attempt lands in the door log.

use crate::sequence::{format, SequenceKind, Sequences};
use crate::state::LedgerState;
use crate::types::{Scan, ScanId, Ticket, TicketStatus};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of presenting a code at the door
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckinOutcome {
    /// Admitted; ticket is now used
    Ok,
    /// Ticket was already used
    Duplicate,
    /// Ticket was voided
    VoidInvalid,
    /// No such ticket
    NotFound,
}

impl CheckinOutcome {
    /// Message shown to door staff and stored on the scan
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Duplicate => "DUPLICATE ENTRY",
            Self::VoidInvalid => "VOID / INVALID",
            Self::NotFound => "NOT FOUND",
        }
    }

    /// Metric label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Duplicate => "duplicate",
            Self::VoidInvalid => "void_invalid",
            Self::NotFound => "not_found",
        }
    }

    /// Whether entry was granted
    #[must_use]
    pub const fn admitted(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for CheckinOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// What the door operator gets back
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CheckinResult {
    /// Door decision
    pub outcome: CheckinOutcome,
    /// The ticket as it reads after the attempt
    pub ticket: Option<Ticket>,
}

/// Everything a check-in attempt changes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckinDecision {
    /// What the door should do
    pub outcome: CheckinOutcome,
    /// The ticket as it reads after the attempt
    pub ticket: Option<Ticket>,
    /// Door log entry
    pub scan: Scan,
    /// Counters after allocating the scan id
    pub sequences: Sequences,
}

/// Normalizes a scanned code: trims whitespace and Code 39 `*` delimiters
#[must_use]
pub fn normalize_code(raw: &str) -> &str {
    raw.trim().trim_matches('*').trim()
}

/// Decides a check-in attempt
#[must_use]
pub fn check_in(state: &LedgerState, raw_code: &str, gate: &str, at: NaiveDateTime) -> CheckinDecision {
    let code = normalize_code(raw_code);
    let found = state.ticket(code);

    let outcome = match found.map(|t| t.status) {
        None => CheckinOutcome::NotFound,
        Some(TicketStatus::Used) => CheckinOutcome::Duplicate,
        Some(TicketStatus::Void) => CheckinOutcome::VoidInvalid,
        Some(TicketStatus::Sold) => CheckinOutcome::Ok,
    };

    let ticket = found.map(|t| {
        let mut after = t.clone();
        if outcome.admitted() {
            after.status = TicketStatus::Used;
        }
        after
    });

    let mut sequences = state.seq.clone();
    let scan_id = sequences.next_free(SequenceKind::Scan, format::scan, |candidate| {
        state.scans.iter().any(|s| s.scan_id.as_str() == candidate)
    });

    let scan = Scan {
        scan_id: ScanId::new(scan_id),
        tid: ticket
            .as_ref()
            .map_or_else(|| code.to_string(), |t| t.tid.to_string()),
        when: at.date(),
        time: at.time(),
        gate: gate.to_string(),
        ok: outcome.admitted(),
        msg: Some(outcome.message().to_string()),
    };

    CheckinDecision {
        outcome,
        ticket,
        scan,
        sequences,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_state;
    use crate::types::{parse_date, parse_time, Channel, Money, ShowId, TicketId, TicketType};
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 10, 16)
            .unwrap()
            .and_hms_opt(19, 5, 0)
            .unwrap()
    }

    fn ticket(tid: &str, status: TicketStatus) -> Ticket {
        Ticket {
            tid: TicketId::new(tid),
            show_id: ShowId::new("IMP25-S01"),
            ticket_type: TicketType::Ga,
            price: Money::from_euros(15),
            status,
            channel: Channel::Presale,
            sold_at: parse_date("2025-10-01").unwrap(),
            sold_time: parse_time("12:00").unwrap(),
            buyer: String::new(),
            email: String::new(),
            notes: None,
        }
    }

    fn apply(state: &mut LedgerState, decision: CheckinDecision) {
        if let Some(after) = decision.ticket {
            if let Some(t) = state.ticket_mut(after.tid.as_str()) {
                *t = after;
            }
        }
        state.scans.push(decision.scan);
        state.seq = decision.sequences;
    }

    #[test]
    fn lowercase_admits_then_duplicate() {
        let mut state = seed_state();
        state.tickets.push(ticket("T1", TicketStatus::Sold));

        let first = check_in(&state, "t1", "GateA", at());
        assert_eq!(first.outcome, CheckinOutcome::Ok);
        assert_eq!(first.scan.tid, "T1");
        apply(&mut state, first);
        assert_eq!(state.tickets[0].status, TicketStatus::Used);

        for _ in 0..3 {
            let again = check_in(&state, "T1", "GateA", at());
            assert_eq!(again.outcome, CheckinOutcome::Duplicate);
            assert!(!again.scan.ok);
            apply(&mut state, again);
        }
        assert_eq!(state.scans.len(), 4);
        assert_eq!(state.scans[3].scan_id.as_str(), "SCAN-000004");
    }

    #[test]
    fn void_ticket_is_refused_and_untouched() {
        let mut state = seed_state();
        state.tickets.push(ticket("T2", TicketStatus::Void));

        let decision = check_in(&state, "T2", "GateB", at());

        assert_eq!(decision.outcome, CheckinOutcome::VoidInvalid);
        assert_eq!(decision.ticket.unwrap().status, TicketStatus::Void);
        assert_eq!(decision.scan.msg.as_deref(), Some("VOID / INVALID"));
        assert_eq!(decision.scan.gate, "GateB");
    }

    #[test]
    fn unknown_code_is_logged_as_presented() {
        let state = seed_state();

        let decision = check_in(&state, "  *imp-404*  ", "GateA", at());

        assert_eq!(decision.outcome, CheckinOutcome::NotFound);
        assert!(decision.ticket.is_none());
        assert_eq!(decision.scan.tid, "imp-404");
    }

    #[test]
    fn barcode_delimiters_are_stripped() {
        assert_eq!(normalize_code("*25-1-000001*"), "25-1-000001");
        assert_eq!(normalize_code(" 25-1-000001\n"), "25-1-000001");
    }
}
