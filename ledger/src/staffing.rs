//! People, shifts and volunteer assignments.
//!
//! Shift headcount is advisory: assignments beyond `cap` are accepted and the
//! gap is surfaced by [`staffing_coverage`] instead.

use crate::error::Rejection;
use crate::sequence::{format, SequenceKind, Sequences};
use crate::state::LedgerState;
use crate::types::{
    Assignment, AssignmentId, AssignmentStatus, Locale, Person, PersonId, PersonRole, Shift,
    ShiftId, VenueId,
};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Operator input for a new person
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonDraft {
    /// First name
    pub first: String,
    /// Last name
    pub last: String,
    /// Role in the festival
    pub role: Option<PersonRole>,
    /// Email
    #[serde(default)]
    pub email: Option<String>,
    /// Phone
    #[serde(default)]
    pub phone: Option<String>,
    /// Troupe or department
    #[serde(default)]
    pub team: Option<String>,
    /// Preferred language
    #[serde(default)]
    pub lang: Option<Locale>,
}

/// Operator input for a new shift
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftDraft {
    /// Venue being staffed
    pub venue_id: String,
    /// Date
    pub date: Option<NaiveDate>,
    /// Start
    pub start: Option<NaiveTime>,
    /// End
    pub end: Option<NaiveTime>,
    /// Door, Tech, FOH ...
    pub role: String,
    /// Headcount needed
    pub cap: Option<u32>,
}

/// How well a shift is covered
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Coverage {
    /// Fewer people than needed
    Under,
    /// Exactly as many as needed
    Filled,
    /// More people than needed
    Over,
}

/// Staffing line for one shift
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftCoverage {
    /// Shift
    pub shift_id: ShiftId,
    /// Headcount needed
    pub needed: u32,
    /// Active assignments
    pub assigned: u32,
    /// Assigned minus needed
    pub gap: i64,
    /// Classification of `gap`
    pub coverage: Coverage,
}

fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Validates a person and allocates a `P####` id
///
/// # Errors
///
/// [`Rejection::MissingField`] for a blank first name, last name or role.
pub fn add_person(
    state: &LedgerState,
    draft: &PersonDraft,
) -> Result<(Person, Sequences), Rejection> {
    let first = draft.first.trim();
    if first.is_empty() {
        return Err(Rejection::missing("first"));
    }
    let last = draft.last.trim();
    if last.is_empty() {
        return Err(Rejection::missing("last"));
    }
    let role = draft.role.ok_or_else(|| Rejection::missing("role"))?;

    let mut sequences = state.seq.clone();
    let pid = sequences.next_free(SequenceKind::Person, format::person, |c| state.has_person(c));

    let person = Person {
        pid: PersonId::new(pid),
        role,
        first: first.to_string(),
        last: last.to_string(),
        email: optional(draft.email.as_deref()),
        phone: optional(draft.phone.as_deref()),
        team: optional(draft.team.as_deref()),
        lang: draft.lang,
        notes: None,
    };
    Ok((person, sequences))
}

/// Validates a shift and allocates an `SH###` id
///
/// # Errors
///
/// - [`Rejection::MissingField`] for a blank venue, date, start, end, role or cap
/// - [`Rejection::InvalidField`] for `cap == 0` or `end <= start`
/// - [`Rejection::NotFound`] for an unknown venue
pub fn create_shift(
    state: &LedgerState,
    draft: &ShiftDraft,
) -> Result<(Shift, Sequences), Rejection> {
    let venue_id = draft.venue_id.trim();
    if venue_id.is_empty() {
        return Err(Rejection::missing("venueId"));
    }
    let date = draft.date.ok_or_else(|| Rejection::missing("date"))?;
    let start = draft.start.ok_or_else(|| Rejection::missing("start"))?;
    let end = draft.end.ok_or_else(|| Rejection::missing("end"))?;
    let role = draft.role.trim();
    if role.is_empty() {
        return Err(Rejection::missing("role"));
    }
    let cap = draft.cap.ok_or_else(|| Rejection::missing("cap"))?;
    if cap == 0 {
        return Err(Rejection::invalid("cap", "must be at least 1"));
    }
    if end <= start {
        return Err(Rejection::invalid("end", "must be after start"));
    }
    if !state.has_venue(venue_id) {
        return Err(Rejection::not_found("venue", venue_id));
    }

    let mut sequences = state.seq.clone();
    let shift_id = sequences.next_free(SequenceKind::Shift, format::shift, |c| state.has_shift(c));

    let shift = Shift {
        shift_id: ShiftId::new(shift_id),
        venue_id: VenueId::new(venue_id),
        date,
        start,
        end,
        role: role.to_string(),
        cap,
    };
    Ok((shift, sequences))
}

/// Binds a person to a shift
///
/// # Errors
///
/// - [`Rejection::NotFound`] for an unknown person or shift
/// - [`Rejection::DuplicateAssignment`] when the person already holds an
///   active assignment on the shift
pub fn assign_volunteer(
    state: &LedgerState,
    pid: &str,
    shift_id: &str,
) -> Result<(Assignment, Sequences), Rejection> {
    if !state.has_person(pid) {
        return Err(Rejection::not_found("person", pid));
    }
    if !state.has_shift(shift_id) {
        return Err(Rejection::not_found("shift", shift_id));
    }
    let already = state.assigns.iter().any(|a| {
        a.pid.as_str() == pid
            && a.shift_id.as_str() == shift_id
            && a.status == AssignmentStatus::Ok
    });
    if already {
        return Err(Rejection::DuplicateAssignment {
            pid: pid.to_string(),
            shift_id: shift_id.to_string(),
        });
    }

    let mut sequences = state.seq.clone();
    let assign_id = sequences.next_free(SequenceKind::Assign, format::assignment, |c| {
        state.assigns.iter().any(|a| a.assign_id.as_str() == c)
    });

    let assignment = Assignment {
        assign_id: AssignmentId::new(assign_id),
        shift_id: ShiftId::new(shift_id),
        pid: PersonId::new(pid),
        status: AssignmentStatus::Ok,
        notes: None,
    };
    Ok((assignment, sequences))
}

/// Marks an assignment as dropped
///
/// # Errors
///
/// [`Rejection::NotFound`] for an unknown assignment.
pub fn drop_assignment(state: &LedgerState, assign_id: &str) -> Result<Assignment, Rejection> {
    let mut assignment = state
        .assigns
        .iter()
        .find(|a| a.assign_id.as_str() == assign_id)
        .cloned()
        .ok_or_else(|| Rejection::not_found("assignment", assign_id))?;
    assignment.status = AssignmentStatus::Drop;
    Ok(assignment)
}

/// Needed versus assigned headcount for every shift
#[must_use]
pub fn staffing_coverage(state: &LedgerState) -> Vec<ShiftCoverage> {
    state
        .shifts
        .iter()
        .map(|shift| {
            let assigned = state
                .assigns
                .iter()
                .filter(|a| a.shift_id == shift.shift_id && a.status == AssignmentStatus::Ok)
                .count();
            let assigned = u32::try_from(assigned).unwrap_or(u32::MAX);
            let gap = i64::from(assigned) - i64::from(shift.cap);
            let coverage = match gap.cmp(&0) {
                std::cmp::Ordering::Less => Coverage::Under,
                std::cmp::Ordering::Equal => Coverage::Filled,
                std::cmp::Ordering::Greater => Coverage::Over,
            };
            ShiftCoverage {
                shift_id: shift.shift_id.clone(),
                needed: shift.cap,
                assigned,
                gap,
                coverage,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_state;
    use crate::types::{parse_date, parse_time};

    fn assign(state: &mut LedgerState, pid: &str, shift_id: &str) -> Assignment {
        let (assignment, seq) = assign_volunteer(state, pid, shift_id).unwrap();
        state.assigns.push(assignment.clone());
        state.seq = seq;
        assignment
    }

    #[test]
    fn add_person_continues_seeded_numbering() {
        let state = seed_state();
        let draft = PersonDraft {
            first: "Ada".into(),
            last: "Berg".into(),
            role: Some(PersonRole::Perf),
            ..PersonDraft::default()
        };

        let (person, _) = add_person(&state, &draft).unwrap();

        assert_eq!(person.pid.as_str(), "P0003");
        assert_eq!(person.role, PersonRole::Perf);
    }

    #[test]
    fn add_person_requires_role() {
        let state = seed_state();
        let draft = PersonDraft {
            first: "Ada".into(),
            last: "Berg".into(),
            ..PersonDraft::default()
        };
        assert_eq!(add_person(&state, &draft).unwrap_err(), Rejection::missing("role"));
    }

    #[test]
    fn create_shift_checks_venue() {
        let state = seed_state();
        let mut draft = ShiftDraft {
            venue_id: "VEN-IDAN".into(),
            date: parse_date("2025-10-17"),
            start: parse_time("19:00"),
            end: parse_time("23:00"),
            role: "Door".into(),
            cap: Some(2),
        };

        let (shift, _) = create_shift(&state, &draft).unwrap();
        assert_eq!(shift.shift_id.as_str(), "SH002");

        draft.venue_id = "VENUA".into();
        assert!(matches!(
            create_shift(&state, &draft),
            Err(Rejection::NotFound { .. })
        ));
    }

    #[test]
    fn duplicate_active_assignment_is_rejected() {
        let mut state = seed_state();
        let first = assign(&mut state, "P0002", "SH001");
        assert_eq!(first.assign_id.as_str(), "AS-0001");

        assert!(matches!(
            assign_volunteer(&state, "P0002", "SH001"),
            Err(Rejection::DuplicateAssignment { .. })
        ));

        let dropped = drop_assignment(&state, "AS-0001").unwrap();
        state.assigns[0] = dropped;
        assert!(assign_volunteer(&state, "P0002", "SH001").is_ok());
    }

    #[test]
    fn coverage_reports_gap_without_enforcing_cap() {
        let mut state = seed_state();
        assign(&mut state, "P0001", "SH001");
        assign(&mut state, "P0002", "SH001");

        let coverage = staffing_coverage(&state);
        assert_eq!(coverage[0].assigned, 2);
        assert_eq!(coverage[0].gap, -2);
        assert_eq!(coverage[0].coverage, Coverage::Under);

        for first in ["A", "B", "C"] {
            let (person, seq) = add_person(
                &state,
                &PersonDraft {
                    first: first.into(),
                    last: "Vol".into(),
                    role: Some(PersonRole::Vol),
                    ..PersonDraft::default()
                },
            )
            .unwrap();
            let pid = person.pid.to_string();
            state.persons.push(person);
            state.seq = seq;
            assign(&mut state, &pid, "SH001");
        }

        let coverage = staffing_coverage(&state);
        assert_eq!(coverage[0].assigned, 5);
        assert_eq!(coverage[0].coverage, Coverage::Over);
    }
}
