//! Reducer for the festival ledger.
//!
//! Each command is validated by its engine against the current state. An
//! accepted command becomes an event that is applied right away, under the
//! store's write lock, so two sales can never both claim the last seat. The
//! reducer then asks for the snapshot to be written and the event to be
//! announced.

use crate::action::LedgerAction;
use crate::checkin;
use crate::error::Rejection;
use crate::finance;
use crate::import;
use crate::metrics as business;
use crate::persistence::{decode, encode, SnapshotWriter};
use crate::sales;
use crate::schedule;
use crate::sequence::Sequences;
use crate::staffing;
use crate::state::LedgerState;
use crate::types::{Money, RequestId, TicketStatus};
use chrono::{FixedOffset, NaiveDateTime, Timelike};
use festledger_core::{effect::Effect, environment::Clock, reducer::Reducer, smallvec, SmallVec};
use std::sync::Arc;

type Effects = SmallVec<[Effect<LedgerAction>; 4]>;

/// Environment dependencies for the ledger reducer
#[derive(Clone)]
pub struct LedgerEnvironment {
    /// Wall clock
    pub clock: Arc<dyn Clock>,
    /// Snapshot sink
    pub writer: SnapshotWriter,
    /// Prefix for show identifiers
    pub festival_code: String,
    /// Gate recorded when a scan names none
    pub default_gate: String,
    /// Festival site offset from UTC
    pub utc_offset: FixedOffset,
}

impl LedgerEnvironment {
    /// Creates a new `LedgerEnvironment`
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        writer: SnapshotWriter,
        festival_code: impl Into<String>,
        default_gate: impl Into<String>,
        utc_offset: FixedOffset,
    ) -> Self {
        Self {
            clock,
            writer,
            festival_code: festival_code.into(),
            default_gate: default_gate.into(),
            utc_offset,
        }
    }

    /// Festival-local time truncated to the minute, as stored on records
    fn local_now(&self) -> NaiveDateTime {
        let now = self.clock.local_now(self.utc_offset);
        now.with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(now)
    }
}

impl std::fmt::Debug for LedgerEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerEnvironment")
            .field("writer", &self.writer)
            .field("festival_code", &self.festival_code)
            .field("default_gate", &self.default_gate)
            .field("utc_offset", &self.utc_offset)
            .finish_non_exhaustive()
    }
}

/// Reducer for the festival ledger
#[derive(Clone, Debug, Default)]
pub struct LedgerReducer;

impl LedgerReducer {
    /// Creates a new `LedgerReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Applies an event to state
    fn apply_event(state: &mut LedgerState, action: &LedgerAction) {
        match action {
            LedgerAction::ShowScheduled { show, .. } => state.shows.push(show.clone()),
            LedgerAction::TicketsSold { tickets, sales, .. } => {
                state.tickets.extend(tickets.iter().cloned());
                state.sales.extend(sales.iter().cloned());
            },
            LedgerAction::TicketVoided { ticket, .. } => {
                if let Some(t) = state.ticket_mut(ticket.tid.as_str()) {
                    t.status = TicketStatus::Void;
                }
            },
            LedgerAction::CheckInRecorded {
                outcome,
                ticket,
                scan,
                ..
            } => {
                if let (true, Some(ticket)) = (outcome.admitted(), ticket) {
                    if let Some(t) = state.ticket_mut(ticket.tid.as_str()) {
                        t.status = TicketStatus::Used;
                    }
                }
                state.scans.push(scan.clone());
            },
            LedgerAction::TicketsImported { tickets, .. } => {
                state.tickets.extend(tickets.iter().cloned());
            },
            LedgerAction::ExpenseRecorded { expense, .. } => state.expenses.push(expense.clone()),
            LedgerAction::ExpensePaidChanged { expense, .. } => {
                if let Some(e) = state.expenses.iter_mut().find(|e| e.eid == expense.eid) {
                    e.paid = expense.paid;
                }
            },
            LedgerAction::PersonAdded { person, .. } => state.persons.push(person.clone()),
            LedgerAction::ShiftCreated { shift, .. } => state.shifts.push(shift.clone()),
            LedgerAction::VolunteerAssigned { assignment, .. } => {
                state.assigns.push(assignment.clone());
            },
            LedgerAction::AssignmentDropped { assignment, .. } => {
                if let Some(a) = state
                    .assigns
                    .iter_mut()
                    .find(|a| a.assign_id == assignment.assign_id)
                {
                    a.status = assignment.status;
                }
            },
            LedgerAction::LocaleChanged { locale, .. } => state.locale = *locale,
            // The restored document replaces the state before this is announced
            LedgerAction::SnapshotRestored { .. }
            | LedgerAction::CommandRejected { .. }
            | LedgerAction::SnapshotPersistFailed { .. } => {},
            // Commands are not applied to state
            LedgerAction::ScheduleShow { .. }
            | LedgerAction::SellTickets { .. }
            | LedgerAction::VoidTicket { .. }
            | LedgerAction::CheckIn { .. }
            | LedgerAction::ImportTickets { .. }
            | LedgerAction::RecordExpense { .. }
            | LedgerAction::SetExpensePaid { .. }
            | LedgerAction::AddPerson { .. }
            | LedgerAction::CreateShift { .. }
            | LedgerAction::AssignVolunteer { .. }
            | LedgerAction::DropAssignment { .. }
            | LedgerAction::RestoreSnapshot { .. }
            | LedgerAction::SetLocale { .. } => {},
        }
    }

    /// Commits an accepted event and asks for persistence plus announcement
    fn accept(
        state: &mut LedgerState,
        sequences: Option<Sequences>,
        event: LedgerAction,
        env: &LedgerEnvironment,
    ) -> Effects {
        if let Some(sequences) = sequences {
            state.seq = sequences;
        }
        Self::apply_event(state, &event);
        state.bump_revision();

        smallvec![Self::persist(state, env), Effect::announce(event)]
    }

    /// Announces a refusal; state is left untouched
    fn reject(request_id: RequestId, rejection: Rejection) -> Effects {
        tracing::info!(%request_id, %rejection, "Command rejected");
        smallvec![Effect::announce(LedgerAction::CommandRejected {
            request_id,
            rejection,
        })]
    }

    /// Fire-and-forget snapshot of the current state
    fn persist(state: &LedgerState, env: &LedgerEnvironment) -> Effect<LedgerAction> {
        let revision = state.revision;
        let document = match encode(state) {
            Ok(document) => document,
            Err(error) => {
                tracing::warn!(revision, %error, "Could not encode snapshot");
                business::record_snapshot_failure();
                return Effect::announce(LedgerAction::SnapshotPersistFailed {
                    revision,
                    error: error.to_string(),
                });
            },
        };

        let writer = env.writer.clone();
        Effect::future(async move {
            match writer.write(revision, document).await {
                Ok(_) => None,
                Err(error) => {
                    tracing::warn!(revision, %error, "Snapshot write failed");
                    business::record_snapshot_failure();
                    Some(LedgerAction::SnapshotPersistFailed {
                        revision,
                        error: error.to_string(),
                    })
                },
            }
        })
    }
}

impl Reducer for LedgerReducer {
    type State = LedgerState;
    type Action = LedgerAction;
    type Environment = LedgerEnvironment;

    #[allow(clippy::too_many_lines)] // one arm per command
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Commands ==========
            LedgerAction::ScheduleShow { request_id, draft } => {
                match schedule::add_show(state, &draft, &env.festival_code) {
                    Ok(scheduled) => {
                        if !scheduled.conflicts.is_empty() {
                            tracing::warn!(
                                show_id = %scheduled.show.show_id,
                                conflicts = ?scheduled.conflicts,
                                "Show overlaps existing programme"
                            );
                        }
                        let event = LedgerAction::ShowScheduled {
                            request_id,
                            show: scheduled.show,
                            conflicts: scheduled.conflicts,
                        };
                        Self::accept(state, Some(scheduled.sequences), event, env)
                    },
                    Err(rejection) => Self::reject(request_id, rejection),
                }
            },

            LedgerAction::SellTickets {
                request_id,
                request,
            } => match sales::sell(state, &request, env.local_now()) {
                Ok(batch) => {
                    let revenue: Money = batch.sales.iter().map(|s| s.amount).sum();
                    business::record_sale(batch.tickets.len(), revenue.cents());
                    tracing::info!(
                        show_id = %request.show_id,
                        quantity = request.quantity,
                        "Tickets sold"
                    );
                    let event = LedgerAction::TicketsSold {
                        request_id,
                        tickets: batch.tickets,
                        sales: batch.sales,
                    };
                    Self::accept(state, Some(batch.sequences), event, env)
                },
                Err(rejection) => {
                    business::record_sale_rejected(&rejection);
                    Self::reject(request_id, rejection)
                },
            },

            LedgerAction::VoidTicket { request_id, tid } => match sales::void(state, &tid) {
                Ok(ticket) => {
                    tracing::info!(tid = %ticket.tid, "Ticket voided");
                    let event = LedgerAction::TicketVoided { request_id, ticket };
                    Self::accept(state, None, event, env)
                },
                Err(rejection) => Self::reject(request_id, rejection),
            },

            LedgerAction::CheckIn {
                request_id,
                code,
                gate,
            } => {
                let gate = gate
                    .filter(|g| !g.trim().is_empty())
                    .unwrap_or_else(|| env.default_gate.clone());
                let decision = checkin::check_in(state, &code, &gate, env.local_now());
                business::record_checkin(decision.outcome);
                tracing::info!(
                    code = %decision.scan.tid,
                    %gate,
                    outcome = %decision.outcome,
                    "Check-in"
                );
                let event = LedgerAction::CheckInRecorded {
                    request_id,
                    outcome: decision.outcome,
                    ticket: decision.ticket,
                    scan: decision.scan,
                };
                Self::accept(state, Some(decision.sequences), event, env)
            },

            LedgerAction::ImportTickets { request_id, csv } => {
                match import::import_tickets(state, &csv, env.local_now()) {
                    Ok(batch) => {
                        business::record_import(batch.tickets.len());
                        tracing::info!(
                            imported = batch.report.imported.len(),
                            errors = batch.report.errors.len(),
                            "Presale import"
                        );
                        if !batch.report.oversold.is_empty() {
                            tracing::warn!(oversold = ?batch.report.oversold, "Import pushed shows past capacity");
                        }
                        let event = LedgerAction::TicketsImported {
                            request_id,
                            tickets: batch.tickets,
                            report: batch.report,
                        };
                        Self::accept(state, Some(batch.sequences), event, env)
                    },
                    Err(rejection) => Self::reject(request_id, rejection),
                }
            },

            LedgerAction::RecordExpense { request_id, draft } => {
                match finance::record_expense(state, &draft) {
                    Ok((expense, sequences)) => {
                        let event = LedgerAction::ExpenseRecorded {
                            request_id,
                            expense,
                        };
                        Self::accept(state, Some(sequences), event, env)
                    },
                    Err(rejection) => Self::reject(request_id, rejection),
                }
            },

            LedgerAction::SetExpensePaid {
                request_id,
                eid,
                paid,
            } => match finance::set_paid(state, &eid, paid) {
                Ok(expense) => {
                    let event = LedgerAction::ExpensePaidChanged {
                        request_id,
                        expense,
                    };
                    Self::accept(state, None, event, env)
                },
                Err(rejection) => Self::reject(request_id, rejection),
            },

            LedgerAction::AddPerson { request_id, draft } => {
                match staffing::add_person(state, &draft) {
                    Ok((person, sequences)) => {
                        let event = LedgerAction::PersonAdded { request_id, person };
                        Self::accept(state, Some(sequences), event, env)
                    },
                    Err(rejection) => Self::reject(request_id, rejection),
                }
            },

            LedgerAction::CreateShift { request_id, draft } => {
                match staffing::create_shift(state, &draft) {
                    Ok((shift, sequences)) => {
                        let event = LedgerAction::ShiftCreated { request_id, shift };
                        Self::accept(state, Some(sequences), event, env)
                    },
                    Err(rejection) => Self::reject(request_id, rejection),
                }
            },

            LedgerAction::AssignVolunteer {
                request_id,
                pid,
                shift_id,
            } => match staffing::assign_volunteer(state, &pid, &shift_id) {
                Ok((assignment, sequences)) => {
                    let event = LedgerAction::VolunteerAssigned {
                        request_id,
                        assignment,
                    };
                    Self::accept(state, Some(sequences), event, env)
                },
                Err(rejection) => Self::reject(request_id, rejection),
            },

            LedgerAction::DropAssignment {
                request_id,
                assign_id,
            } => match staffing::drop_assignment(state, &assign_id) {
                Ok(assignment) => {
                    let event = LedgerAction::AssignmentDropped {
                        request_id,
                        assignment,
                    };
                    Self::accept(state, None, event, env)
                },
                Err(rejection) => Self::reject(request_id, rejection),
            },

            LedgerAction::RestoreSnapshot {
                request_id,
                document,
            } => match decode(&document) {
                Ok(mut restored) => {
                    // Restored ledgers always supersede whatever was written before
                    restored.revision = restored.revision.max(state.revision);
                    *state = restored;
                    tracing::info!(tickets = state.tickets.len(), "Backup restored");
                    let event = LedgerAction::SnapshotRestored {
                        request_id,
                        revision: state.revision + 1,
                    };
                    Self::accept(state, None, event, env)
                },
                Err(error) => Self::reject(
                    request_id,
                    Rejection::CorruptSnapshot {
                        reason: error.to_string(),
                    },
                ),
            },

            LedgerAction::SetLocale { request_id, locale } => {
                let event = LedgerAction::LocaleChanged { request_id, locale };
                Self::accept(state, None, event, env)
            },

            // ========== Events ==========
            // Applied while handling the originating command; announcements only
            LedgerAction::ShowScheduled { .. }
            | LedgerAction::TicketsSold { .. }
            | LedgerAction::TicketVoided { .. }
            | LedgerAction::CheckInRecorded { .. }
            | LedgerAction::TicketsImported { .. }
            | LedgerAction::ExpenseRecorded { .. }
            | LedgerAction::ExpensePaidChanged { .. }
            | LedgerAction::PersonAdded { .. }
            | LedgerAction::ShiftCreated { .. }
            | LedgerAction::VolunteerAssigned { .. }
            | LedgerAction::AssignmentDropped { .. }
            | LedgerAction::SnapshotRestored { .. }
            | LedgerAction::LocaleChanged { .. }
            | LedgerAction::CommandRejected { .. }
            | LedgerAction::SnapshotPersistFailed { .. } => SmallVec::new(),
        }
    }
}
