//! Schedule engine: show creation and venue/time conflict detection.

use crate::error::Rejection;
use crate::sequence::{format, SequenceKind, Sequences};
use crate::state::LedgerState;
use crate::types::{Show, ShowCategory, ShowId, VenueId};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Operator input for a new show; every field may still be blank
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowDraft {
    /// Programme title
    pub title: String,
    /// Venue identifier
    pub venue_id: String,
    /// Calendar date
    pub date: Option<NaiveDate>,
    /// Start time
    pub start: Option<NaiveTime>,
    /// End time
    pub end: Option<NaiveTime>,
    /// Seats on sale
    pub capacity: Option<u32>,
    /// Defaults to `Show`
    #[serde(default)]
    pub category: Option<ShowCategory>,
    /// Billed headliner
    #[serde(default)]
    pub headliner: Option<String>,
    /// Notes for the tech crew
    #[serde(default)]
    pub tech_notes: Option<String>,
}

/// Accepted schedule entry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduledShow {
    /// The new show
    pub show: Show,
    /// Shows it overlaps with (informational, not a rejection)
    pub conflicts: Vec<ShowId>,
    /// Counters after allocating the show id
    pub sequences: Sequences,
}

/// A show with the ids of every show it clashes with
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    /// The show
    pub show: Show,
    /// Overlapping shows at the same venue and date
    pub conflicts: Vec<ShowId>,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Validates a draft and allocates a fresh show id
///
/// # Errors
///
/// - [`Rejection::MissingField`] for a blank title, venue, date, start, end or capacity
/// - [`Rejection::InvalidField`] for zero capacity or `end <= start`
/// - [`Rejection::NotFound`] for an unknown venue
pub fn add_show(
    state: &LedgerState,
    draft: &ShowDraft,
    festival_code: &str,
) -> Result<ScheduledShow, Rejection> {
    let title = draft.title.trim();
    if title.is_empty() {
        return Err(Rejection::missing("title"));
    }
    let venue_id = draft.venue_id.trim();
    if venue_id.is_empty() {
        return Err(Rejection::missing("venueId"));
    }
    let date = draft.date.ok_or_else(|| Rejection::missing("date"))?;
    let start = draft.start.ok_or_else(|| Rejection::missing("start"))?;
    let end = draft.end.ok_or_else(|| Rejection::missing("end"))?;
    let capacity = draft.capacity.ok_or_else(|| Rejection::missing("capacity"))?;

    if capacity == 0 {
        return Err(Rejection::invalid("capacity", "must be greater than zero"));
    }
    if end <= start {
        return Err(Rejection::invalid("end", "must be after start"));
    }
    if !state.has_venue(venue_id) {
        return Err(Rejection::not_found("venue", venue_id));
    }

    let mut sequences = state.seq.clone();
    let show_id = sequences.next_free(
        SequenceKind::Show,
        |n| format::show(festival_code, n),
        |candidate| state.show(candidate).is_some(),
    );

    let show = Show {
        show_id: ShowId::new(show_id),
        title: title.to_string(),
        venue_id: VenueId::new(venue_id),
        date,
        start,
        end,
        capacity,
        category: draft.category.unwrap_or_default(),
        headliner: non_blank(draft.headliner.as_deref()),
        tech_notes: non_blank(draft.tech_notes.as_deref()),
    };
    let conflicts = conflicts_of(&show, &state.shows)
        .into_iter()
        .map(|s| s.show_id.clone())
        .collect();

    Ok(ScheduledShow {
        show,
        conflicts,
        sequences,
    })
}

/// Whether two shows share a venue and date with overlapping `[start, end)` windows
#[must_use]
pub fn overlaps(a: &Show, b: &Show) -> bool {
    a.venue_id == b.venue_id && a.date == b.date && !(b.end <= a.start || b.start >= a.end)
}

/// Every other show clashing with `show`
#[must_use]
pub fn conflicts_of<'a>(show: &Show, all_shows: &'a [Show]) -> Vec<&'a Show> {
    all_shows
        .iter()
        .filter(|other| other.show_id != show.show_id && overlaps(show, other))
        .collect()
}

/// All shows ordered by date and start time, each with its conflicts
///
/// Pairwise scan; a festival programme is small enough that indexing by venue
/// would not pay for itself.
#[must_use]
pub fn schedule_view(shows: &[Show]) -> Vec<ScheduleEntry> {
    let mut entries: Vec<ScheduleEntry> = shows
        .iter()
        .map(|show| ScheduleEntry {
            show: show.clone(),
            conflicts: conflicts_of(show, shows)
                .into_iter()
                .map(|s| s.show_id.clone())
                .collect(),
        })
        .collect();
    entries.sort_by(|a, b| (a.show.date, a.show.start).cmp(&(b.show.date, b.show.start)));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_state;
    use crate::types::{parse_date, parse_time};

    fn show(id: &str, venue: &str, date: &str, start: &str, end: &str) -> Show {
        Show {
            show_id: ShowId::new(id),
            title: id.to_string(),
            venue_id: VenueId::new(venue),
            date: parse_date(date).unwrap(),
            start: parse_time(start).unwrap(),
            end: parse_time(end).unwrap(),
            capacity: 50,
            category: ShowCategory::Show,
            headliner: None,
            tech_notes: None,
        }
    }

    fn draft() -> ShowDraft {
        ShowDraft {
            title: "Late Night Longform".into(),
            venue_id: "VEN-CCB".into(),
            date: parse_date("2025-10-16"),
            start: parse_time("21:00"),
            end: parse_time("22:30"),
            capacity: Some(60),
            ..ShowDraft::default()
        }
    }

    #[test]
    fn touching_windows_do_not_conflict() {
        let a = show("A", "V1", "2025-10-16", "19:00", "20:30");
        let b = show("B", "V1", "2025-10-16", "20:00", "21:30");
        let c = show("C", "V1", "2025-10-16", "20:30", "22:00");
        let all = vec![a.clone(), b.clone(), c.clone()];

        let of_a: Vec<_> = conflicts_of(&a, &all).iter().map(|s| s.show_id.clone()).collect();
        let of_b: Vec<_> = conflicts_of(&b, &all).iter().map(|s| s.show_id.clone()).collect();

        assert_eq!(of_a, vec![ShowId::new("B")]);
        assert_eq!(of_b, vec![ShowId::new("A"), ShowId::new("C")]);
    }

    #[test]
    fn different_venue_or_date_never_conflicts() {
        let a = show("A", "V1", "2025-10-16", "19:00", "20:30");
        let b = show("B", "V2", "2025-10-16", "19:00", "20:30");
        let c = show("C", "V1", "2025-10-17", "19:00", "20:30");

        assert!(!overlaps(&a, &b));
        assert!(!overlaps(&a, &c));
        assert!(conflicts_of(&a, &[a.clone()]).is_empty());
    }

    #[test]
    fn add_show_allocates_next_festival_id() {
        let state = seed_state();

        let scheduled = add_show(&state, &draft(), "IMP25").unwrap();

        assert_eq!(scheduled.show.show_id.as_str(), "IMP25-S03");
        assert_eq!(scheduled.show.category, ShowCategory::Show);
        assert!(scheduled.conflicts.is_empty());
        assert_eq!(scheduled.sequences.peek(SequenceKind::Show), 4);
    }

    #[test]
    fn add_show_reports_conflicts_without_rejecting() {
        let state = seed_state();
        let mut overlapping = draft();
        overlapping.start = parse_time("20:00");

        let scheduled = add_show(&state, &overlapping, "IMP25").unwrap();

        assert_eq!(scheduled.conflicts, vec![ShowId::new("IMP25-S01")]);
    }

    #[test]
    fn add_show_rejects_incomplete_drafts() {
        let state = seed_state();

        let mut blank_title = draft();
        blank_title.title = "   ".into();
        assert_eq!(
            add_show(&state, &blank_title, "IMP25").unwrap_err(),
            Rejection::missing("title")
        );

        let mut no_capacity = draft();
        no_capacity.capacity = Some(0);
        assert!(matches!(
            add_show(&state, &no_capacity, "IMP25"),
            Err(Rejection::InvalidField { .. })
        ));

        let mut backwards = draft();
        backwards.end = parse_time("20:00");
        assert!(matches!(
            add_show(&state, &backwards, "IMP25"),
            Err(Rejection::InvalidField { .. })
        ));

        let mut nowhere = draft();
        nowhere.venue_id = "VEN-NOPE".into();
        assert!(matches!(
            add_show(&state, &nowhere, "IMP25"),
            Err(Rejection::NotFound { .. })
        ));
    }

    #[test]
    fn schedule_view_orders_by_date_then_start() {
        let shows = vec![
            show("late", "V1", "2025-10-17", "18:00", "19:00"),
            show("b", "V1", "2025-10-16", "20:00", "21:00"),
            show("a", "V1", "2025-10-16", "19:00", "20:30"),
        ];

        let view = schedule_view(&shows);

        let order: Vec<_> = view.iter().map(|e| e.show.show_id.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "late"]);
        assert_eq!(view[0].conflicts, vec![ShowId::new("b")]);
    }
}
