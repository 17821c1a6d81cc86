//! Free-text lookups over tickets and people.
//!
//! A record matches when the lowercased filter occurs anywhere in its joined
//! searchable fields. A blank filter matches everything.

use crate::state::LedgerState;
use crate::types::{Person, Ticket};

fn matches(haystack: &[&str], needle: &str) -> bool {
    haystack.join(" ").to_lowercase().contains(needle)
}

fn needle(filter: &str) -> String {
    filter.trim().to_lowercase()
}

/// Tickets whose id, show, buyer or email contain `filter`, in ledger order
#[must_use]
pub fn find_tickets<'a>(state: &'a LedgerState, filter: &str) -> Vec<&'a Ticket> {
    let needle = needle(filter);
    state
        .tickets
        .iter()
        .filter(|t| {
            matches(
                &[t.tid.as_str(), t.show_id.as_str(), &t.buyer, &t.email],
                &needle,
            )
        })
        .collect()
}

/// People whose name, team or role contain `filter`, in ledger order
#[must_use]
pub fn find_people<'a>(state: &'a LedgerState, filter: &str) -> Vec<&'a Person> {
    let needle = needle(filter);
    state
        .persons
        .iter()
        .filter(|p| {
            matches(
                &[
                    &p.first,
                    &p.last,
                    p.team.as_deref().unwrap_or_default(),
                    p.role.label(),
                ],
                &needle,
            )
        })
        .collect()
}
