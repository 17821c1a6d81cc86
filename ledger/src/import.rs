//! Bulk presale import from comma-separated text.
//!
//! Recognized columns: `tid, show_id, type, buyer, email, status, price,
//! sold_at, sold_time`. An absent or empty cell falls back to a default; a
//! present cell that cannot be understood turns the whole row into a
//! [`RowError`]. Imported tickets skip the capacity guard, so shows pushed
//! past capacity are reported instead.

use crate::error::Rejection;
use crate::sequence::{format, SequenceKind, Sequences};
use crate::state::LedgerState;
use crate::types::{
    parse_date, parse_time, Channel, Money, ShowId, Ticket, TicketId, TicketStatus, TicketType,
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

const COLUMNS: [&str; 9] = [
    "tid", "show_id", "type", "buyer", "email", "status", "price", "sold_at", "sold_time",
];

/// A row that passed validation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedTicketRow {
    /// 1-based line in the source text
    pub line: u64,
    /// Ticket id, when the row carried one
    pub tid: Option<String>,
    /// Show, defaulted to the first scheduled show
    pub show_id: ShowId,
    /// Defaults to GA
    pub ticket_type: TicketType,
    /// Defaults to SOLD
    pub status: TicketStatus,
    /// Defaults to zero
    pub price: Money,
    /// Defaults to today
    pub sold_at: NaiveDate,
    /// Defaults to now
    pub sold_time: NaiveTime,
    /// Buyer name
    pub buyer: String,
    /// Buyer email
    pub email: String,
}

/// A row that was skipped
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    /// 1-based line in the source text
    pub line: u64,
    /// What was wrong
    pub reason: String,
}

/// What an import did
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    /// Tickets added, in file order
    pub imported: Vec<TicketId>,
    /// Rows skipped
    pub errors: Vec<RowError>,
    /// Shows whose seat-holding tickets now exceed capacity
    pub oversold: Vec<ShowId>,
}

/// Tickets ready to append
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportBatch {
    /// New presale tickets
    pub tickets: Vec<Ticket>,
    /// Summary for the operator
    pub report: ImportReport,
    /// Counters after generating missing ids
    pub sequences: Sequences,
}

struct Header {
    index: HashMap<&'static str, usize>,
}

impl Header {
    fn parse(record: &csv::StringRecord) -> Self {
        let mut index = HashMap::new();
        for (i, name) in record.iter().enumerate() {
            let name = name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase();
            if let Some(column) = COLUMNS.iter().find(|c| **c == name) {
                index.entry(*column).or_insert(i);
            }
        }
        Self { index }
    }

    fn cell<'r>(&self, record: &'r csv::StringRecord, column: &str) -> Option<&'r str> {
        self.index
            .get(column)
            .and_then(|i| record.get(*i))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

fn parse_cell<T, F>(value: Option<&str>, column: &str, default: T, parse: F) -> Result<T, String>
where
    F: FnOnce(&str) -> Option<T>,
{
    match value {
        None => Ok(default),
        Some(raw) => parse(raw).ok_or_else(|| format!("invalid {column} '{raw}'")),
    }
}

/// Splits `text` into validated rows
///
/// `known_show` decides whether a `show_id` cell refers to a scheduled show.
///
/// # Errors
///
/// [`Rejection::ImportFailed`] when the text is empty, has no header row or
/// is not readable as comma-separated data.
pub fn parse_rows<K>(
    text: &str,
    default_show: Option<&ShowId>,
    known_show: K,
    now: NaiveDateTime,
) -> Result<Vec<Result<ParsedTicketRow, RowError>>, Rejection>
where
    K: Fn(&str) -> bool,
{
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let header = reader
        .headers()
        .map_err(|e| Rejection::ImportFailed {
            reason: e.to_string(),
        })?
        .clone();
    if header.iter().all(|h| h.trim().is_empty()) {
        return Err(Rejection::ImportFailed {
            reason: "missing header row".to_string(),
        });
    }
    let header = Header::parse(&header);
    if header.index.is_empty() {
        return Err(Rejection::ImportFailed {
            reason: format!("header has none of the columns {}", COLUMNS.join(", ")),
        });
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| Rejection::ImportFailed {
            reason: e.to_string(),
        })?;
        let line = record.position().map_or(0, csv::Position::line);
        rows.push(parse_record(&header, &record, line, default_show, &known_show, now));
    }
    Ok(rows)
}

fn parse_record<K>(
    header: &Header,
    record: &csv::StringRecord,
    line: u64,
    default_show: Option<&ShowId>,
    known_show: &K,
    now: NaiveDateTime,
) -> Result<ParsedTicketRow, RowError>
where
    K: Fn(&str) -> bool,
{
    let fail = |reason: String| RowError { line, reason };

    let show_id = match header.cell(record, "show_id") {
        Some(id) if known_show(id) => ShowId::new(id),
        Some(id) => return Err(fail(format!("unknown show '{id}'"))),
        None => default_show
            .cloned()
            .ok_or_else(|| fail("no show_id and no show scheduled".to_string()))?,
    };

    let ticket_type = parse_cell(header.cell(record, "type"), "type", TicketType::Ga, |v| {
        v.parse().ok()
    })
    .map_err(fail)?;
    let status = parse_cell(header.cell(record, "status"), "status", TicketStatus::Sold, |v| {
        v.parse().ok()
    })
    .map_err(fail)?;
    let price = parse_cell(header.cell(record, "price"), "price", Money::ZERO, |v| {
        v.parse().ok()
    })
    .map_err(fail)?;
    if price.is_negative() {
        return Err(fail(format!("negative price {price}")));
    }
    if price > Money::LIMIT {
        return Err(fail(format!("price {price} exceeds {}", Money::LIMIT)));
    }
    let sold_at =
        parse_cell(header.cell(record, "sold_at"), "sold_at", now.date(), parse_date).map_err(fail)?;
    let sold_time = parse_cell(
        header.cell(record, "sold_time"),
        "sold_time",
        now.time(),
        parse_time,
    )
    .map_err(fail)?;

    Ok(ParsedTicketRow {
        line,
        tid: header.cell(record, "tid").map(str::to_string),
        show_id,
        ticket_type,
        status,
        price,
        sold_at,
        sold_time,
        buyer: header.cell(record, "buyer").unwrap_or_default().to_string(),
        email: header.cell(record, "email").unwrap_or_default().to_string(),
    })
}

/// Parses `text` and builds presale tickets against the current ledger
///
/// Duplicate ticket ids (within the file or against existing tickets, case
/// ignored) become row errors. Rows without an id get `PRE-######` from the
/// `TICKET` counter.
///
/// # Errors
///
/// [`Rejection::ImportFailed`] when the text has no usable header.
pub fn import_tickets(
    state: &LedgerState,
    text: &str,
    now: NaiveDateTime,
) -> Result<ImportBatch, Rejection> {
    let default_show = state.shows.first().map(|s| s.show_id.clone());
    let rows = parse_rows(text, default_show.as_ref(), |id| state.show(id).is_some(), now)?;

    let mut sequences = state.seq.clone();
    let mut seen: HashSet<String> = HashSet::new();
    let mut tickets = Vec::new();
    let mut report = ImportReport::default();

    for row in rows {
        let row = match row {
            Ok(row) => row,
            Err(error) => {
                report.errors.push(error);
                continue;
            },
        };

        let tid = match row.tid {
            Some(tid) => {
                let key = tid.to_ascii_uppercase();
                if seen.contains(&key) || state.ticket(&tid).is_some() {
                    report.errors.push(RowError {
                        line: row.line,
                        reason: format!("duplicate tid '{tid}'"),
                    });
                    continue;
                }
                tid
            },
            None => sequences.next_free(SequenceKind::Ticket, format::presale_ticket, |c| {
                seen.contains(c) || state.ticket(c).is_some()
            }),
        };
        seen.insert(tid.to_ascii_uppercase());

        report.imported.push(TicketId::new(tid.clone()));
        tickets.push(Ticket {
            tid: TicketId::new(tid),
            show_id: row.show_id,
            ticket_type: row.ticket_type,
            price: row.price,
            status: row.status,
            channel: Channel::Presale,
            sold_at: row.sold_at,
            sold_time: row.sold_time,
            buyer: row.buyer,
            email: row.email,
            notes: None,
        });
    }

    report.oversold = oversold_after(state, &tickets);

    Ok(ImportBatch {
        tickets,
        report,
        sequences,
    })
}

fn oversold_after(state: &LedgerState, added: &[Ticket]) -> Vec<ShowId> {
    state
        .shows
        .iter()
        .filter(|show| added.iter().any(|t| t.show_id == show.show_id))
        .filter(|show| {
            let extra = added
                .iter()
                .filter(|t| t.show_id == show.show_id && t.status.holds_capacity())
                .count();
            let extra = u64::try_from(extra).unwrap_or(u64::MAX);
            let total = u64::from(state.sold_count(&show.show_id)).saturating_add(extra);
            total > u64::from(show.capacity)
        })
        .map(|show| show.show_id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_state;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 10, 16)
            .unwrap()
            .and_hms_opt(14, 45, 0)
            .unwrap()
    }

    #[test]
    fn full_rows_are_imported_as_presale() {
        let state = seed_state();
        let text = "tid,show_id,type,buyer,email,status,price,sold_at,sold_time\n\
                    PX-1,IMP25-S02,vip,Ana,ana@example.org,SOLD,25.50,2025-09-01,10:15\n";

        let batch = import_tickets(&state, text, now()).unwrap();

        assert!(batch.report.errors.is_empty());
        let t = &batch.tickets[0];
        assert_eq!(t.tid.as_str(), "PX-1");
        assert_eq!(t.show_id.as_str(), "IMP25-S02");
        assert_eq!(t.ticket_type, TicketType::Vip);
        assert_eq!(t.price, Money::from_cents(2_550));
        assert_eq!(t.channel, Channel::Presale);
        assert_eq!(t.buyer, "Ana");
    }

    #[test]
    fn missing_cells_fall_back_to_defaults() {
        let state = seed_state();
        let text = "Buyer,Email\nBo,bo@example.org\n";

        let batch = import_tickets(&state, text, now()).unwrap();

        let t = &batch.tickets[0];
        assert_eq!(t.tid.as_str(), "PRE-000001");
        assert_eq!(t.show_id.as_str(), "IMP25-S01");
        assert_eq!(t.ticket_type, TicketType::Ga);
        assert_eq!(t.status, TicketStatus::Sold);
        assert_eq!(t.price, Money::ZERO);
        assert_eq!(t.sold_at, now().date());
        assert_eq!(batch.sequences.peek(SequenceKind::Ticket), 2);
    }

    #[test]
    fn bad_rows_are_reported_with_line_numbers() {
        let mut state = seed_state();
        let existing = import_tickets(&state, "tid\nKEEP-1\n", now()).unwrap();
        state.tickets.extend(existing.tickets);

        let text = "tid,show_id,type,price\n\
                    A1,IMP25-S01,GA,10\n\
                    A2,IMP25-S77,GA,10\n\
                    A3,IMP25-S01,BALCONY,10\n\
                    a1,IMP25-S01,GA,10\n\
                    keep-1,IMP25-S01,GA,10\n\
                    A4,IMP25-S01,GA,-3\n\
                    A5,IMP25-S01,GA,ten\n\
                    A6,IMP25-S01,GA,89000000000000\n";

        let batch = import_tickets(&state, text, now()).unwrap();

        assert_eq!(batch.report.imported, vec![TicketId::new("A1")]);
        let lines: Vec<u64> = batch.report.errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![3, 4, 5, 6, 7, 8, 9]);
        assert!(batch.report.errors[6].reason.contains("exceeds"));
        assert!(batch.report.errors[0].reason.contains("unknown show"));
        assert!(batch.report.errors[2].reason.contains("duplicate"));
    }

    #[test]
    fn empty_input_fails_the_import() {
        let state = seed_state();
        assert!(matches!(
            import_tickets(&state, "", now()),
            Err(Rejection::ImportFailed { .. })
        ));
        assert!(matches!(
            import_tickets(&state, "foo,bar\n1,2\n", now()),
            Err(Rejection::ImportFailed { .. })
        ));
    }

    #[test]
    fn oversold_shows_are_listed() {
        let mut state = seed_state();
        state.shows[1].capacity = 1;
        let text = "show_id\nIMP25-S02\nIMP25-S02\n";

        let batch = import_tickets(&state, text, now()).unwrap();

        assert_eq!(batch.tickets.len(), 2);
        assert_eq!(batch.report.oversold, vec![ShowId::new("IMP25-S02")]);
    }
}
