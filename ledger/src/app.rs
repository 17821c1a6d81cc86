//! `FestivalLedger`: typed front door to the ledger store.
//!
//! Each operation sends one command tagged with a fresh [`RequestId`] and waits
//! for the matching outcome on the store's action stream.

use crate::action::LedgerAction;
use crate::checkin::CheckinResult;
use crate::config::Config;
use crate::error::{LedgerError, Result};
use crate::finance::ExpenseDraft;
use crate::import::ImportReport;
use crate::persistence::{encode, load_or_seed, FileSnapshotStore, LoadOutcome, SnapshotStore, SnapshotWriter};
use crate::reducer::{LedgerEnvironment, LedgerReducer};
use crate::reports::{self, DailyReport, Totals};
use crate::sales::{self, Availability, SaleRequest};
use crate::schedule::{self, ScheduleEntry, ShowDraft};
use crate::search;
use crate::staffing::{self, PersonDraft, ShiftCoverage, ShiftDraft};
use crate::state::LedgerState;
use crate::types::{Assignment, Expense, Locale, Person, RequestId, Sale, Shift, Show, ShowId, Ticket};
use chrono::NaiveDate;
use festledger_core::environment::Clock;
use festledger_runtime::Store;
use std::sync::Arc;
use std::time::Duration;

/// The store type behind the facade
pub type LedgerStore = Store<LedgerState, LedgerAction, LedgerEnvironment, LedgerReducer>;

/// Tickets and sales issued by one sale
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaleReceipt {
    /// New tickets
    pub tickets: Vec<Ticket>,
    /// Paired sales
    pub sales: Vec<Sale>,
}

/// A newly scheduled show and the shows it overlaps
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduleReceipt {
    /// The new show
    pub show: Show,
    /// Overlapping shows
    pub conflicts: Vec<ShowId>,
}

/// Festival ledger facade
#[derive(Clone)]
pub struct FestivalLedger {
    store: LedgerStore,
    request_timeout: Duration,
    shutdown_timeout: Duration,
}

impl FestivalLedger {
    /// Wraps an existing state and environment
    #[must_use]
    pub fn new(state: LedgerState, environment: LedgerEnvironment, config: &Config) -> Self {
        Self {
            store: Store::new(state, LedgerReducer::new(), environment),
            request_timeout: config.request_timeout(),
            shutdown_timeout: config.shutdown_timeout(),
        }
    }

    /// Opens the ledger stored in `config.data_file`, seeding it if needed
    ///
    /// # Errors
    ///
    /// [`LedgerError::Persistence`] when the file exists but cannot be read.
    pub async fn open(config: &Config, clock: Arc<dyn Clock>) -> Result<(Self, LoadOutcome)> {
        let store: Arc<dyn SnapshotStore> = Arc::new(FileSnapshotStore::new(&config.data_file));
        Self::open_with(store, config, clock).await
    }

    /// Opens the ledger held by an arbitrary snapshot store
    ///
    /// # Errors
    ///
    /// [`LedgerError::Persistence`] when the store cannot be read.
    pub async fn open_with(
        snapshots: Arc<dyn SnapshotStore>,
        config: &Config,
        clock: Arc<dyn Clock>,
    ) -> Result<(Self, LoadOutcome)> {
        let (state, outcome) = load_or_seed(snapshots.as_ref()).await?;
        let environment = LedgerEnvironment::new(
            clock,
            SnapshotWriter::new(snapshots, state.revision),
            config.festival_code.clone(),
            config.default_gate.clone(),
            config.utc_offset(),
        );
        Ok((Self::new(state, environment, config), outcome))
    }

    /// The underlying store
    #[must_use]
    pub const fn store(&self) -> &LedgerStore {
        &self.store
    }

    async fn execute<F>(&self, command: F) -> Result<LedgerAction>
    where
        F: FnOnce(RequestId) -> LedgerAction,
    {
        let request_id = RequestId::new();
        let outcome = self
            .store
            .send_and_wait_for(
                command(request_id),
                move |action| action.answers(request_id),
                self.request_timeout,
            )
            .await?;

        match outcome {
            LedgerAction::CommandRejected { rejection, .. } => Err(rejection.into()),
            other => Ok(other),
        }
    }

    fn unexpected(action: &LedgerAction) -> LedgerError {
        LedgerError::UnexpectedOutcome(format!("{action:?}"))
    }

    // ========== Commands ==========

    /// Adds a show to the programme
    ///
    /// # Errors
    ///
    /// [`LedgerError::Rejected`] for an incomplete draft or unknown venue.
    pub async fn schedule_show(&self, draft: ShowDraft) -> Result<ScheduleReceipt> {
        match self
            .execute(|request_id| LedgerAction::ScheduleShow { request_id, draft })
            .await?
        {
            LedgerAction::ShowScheduled {
                show, conflicts, ..
            } => Ok(ScheduleReceipt { show, conflicts }),
            other => Err(Self::unexpected(&other)),
        }
    }

    /// Sells a batch of walk-up tickets
    ///
    /// # Errors
    ///
    /// [`LedgerError::Rejected`] with `CapacityExceeded` when seats run out.
    pub async fn sell(&self, request: SaleRequest) -> Result<SaleReceipt> {
        match self
            .execute(|request_id| LedgerAction::SellTickets {
                request_id,
                request,
            })
            .await?
        {
            LedgerAction::TicketsSold { tickets, sales, .. } => Ok(SaleReceipt { tickets, sales }),
            other => Err(Self::unexpected(&other)),
        }
    }

    /// Voids a sold ticket
    ///
    /// # Errors
    ///
    /// [`LedgerError::Rejected`] for unknown, used or already void tickets.
    pub async fn void(&self, tid: &str) -> Result<Ticket> {
        let tid = tid.to_string();
        match self
            .execute(|request_id| LedgerAction::VoidTicket { request_id, tid })
            .await?
        {
            LedgerAction::TicketVoided { ticket, .. } => Ok(ticket),
            other => Err(Self::unexpected(&other)),
        }
    }

    /// Presents a code at the door
    ///
    /// Refusals (duplicate, void, not found) are outcomes, not errors.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Store`] when the store does not answer.
    pub async fn check_in(&self, code: &str, gate: Option<String>) -> Result<CheckinResult> {
        let code = code.to_string();
        match self
            .execute(|request_id| LedgerAction::CheckIn {
                request_id,
                code,
                gate,
            })
            .await?
        {
            LedgerAction::CheckInRecorded {
                outcome, ticket, ..
            } => Ok(CheckinResult { outcome, ticket }),
            other => Err(Self::unexpected(&other)),
        }
    }

    /// Imports presale tickets from comma-separated text
    ///
    /// # Errors
    ///
    /// [`LedgerError::Rejected`] with `ImportFailed` when the text has no header.
    pub async fn import_tickets(&self, csv: String) -> Result<ImportReport> {
        match self
            .execute(|request_id| LedgerAction::ImportTickets { request_id, csv })
            .await?
        {
            LedgerAction::TicketsImported { report, .. } => Ok(report),
            other => Err(Self::unexpected(&other)),
        }
    }

    /// Books an expense
    ///
    /// # Errors
    ///
    /// [`LedgerError::Rejected`] for missing fields or a non-positive amount.
    pub async fn record_expense(&self, draft: ExpenseDraft) -> Result<Expense> {
        match self
            .execute(|request_id| LedgerAction::RecordExpense { request_id, draft })
            .await?
        {
            LedgerAction::ExpenseRecorded { expense, .. } => Ok(expense),
            other => Err(Self::unexpected(&other)),
        }
    }

    /// Marks an expense paid or unpaid
    ///
    /// # Errors
    ///
    /// [`LedgerError::Rejected`] for an unknown expense.
    pub async fn set_expense_paid(&self, eid: &str, paid: bool) -> Result<Expense> {
        let eid = eid.to_string();
        match self
            .execute(|request_id| LedgerAction::SetExpensePaid {
                request_id,
                eid,
                paid,
            })
            .await?
        {
            LedgerAction::ExpensePaidChanged { expense, .. } => Ok(expense),
            other => Err(Self::unexpected(&other)),
        }
    }

    /// Registers a person
    ///
    /// # Errors
    ///
    /// [`LedgerError::Rejected`] for missing names or role.
    pub async fn add_person(&self, draft: PersonDraft) -> Result<Person> {
        match self
            .execute(|request_id| LedgerAction::AddPerson { request_id, draft })
            .await?
        {
            LedgerAction::PersonAdded { person, .. } => Ok(person),
            other => Err(Self::unexpected(&other)),
        }
    }

    /// Opens a staffing shift
    ///
    /// # Errors
    ///
    /// [`LedgerError::Rejected`] for missing fields or an unknown venue.
    pub async fn create_shift(&self, draft: ShiftDraft) -> Result<Shift> {
        match self
            .execute(|request_id| LedgerAction::CreateShift { request_id, draft })
            .await?
        {
            LedgerAction::ShiftCreated { shift, .. } => Ok(shift),
            other => Err(Self::unexpected(&other)),
        }
    }

    /// Puts a person on a shift
    ///
    /// # Errors
    ///
    /// [`LedgerError::Rejected`] for unknown ids or a duplicate assignment.
    pub async fn assign_volunteer(&self, pid: &str, shift_id: &str) -> Result<Assignment> {
        let (pid, shift_id) = (pid.to_string(), shift_id.to_string());
        match self
            .execute(|request_id| LedgerAction::AssignVolunteer {
                request_id,
                pid,
                shift_id,
            })
            .await?
        {
            LedgerAction::VolunteerAssigned { assignment, .. } => Ok(assignment),
            other => Err(Self::unexpected(&other)),
        }
    }

    /// Takes a person off a shift
    ///
    /// # Errors
    ///
    /// [`LedgerError::Rejected`] for an unknown assignment.
    pub async fn drop_assignment(&self, assign_id: &str) -> Result<Assignment> {
        let assign_id = assign_id.to_string();
        match self
            .execute(|request_id| LedgerAction::DropAssignment {
                request_id,
                assign_id,
            })
            .await?
        {
            LedgerAction::AssignmentDropped { assignment, .. } => Ok(assignment),
            other => Err(Self::unexpected(&other)),
        }
    }

    /// Replaces the whole ledger with a backup document
    ///
    /// # Errors
    ///
    /// [`LedgerError::Rejected`] with `CorruptSnapshot` for unreadable backups.
    pub async fn restore_backup(&self, document: String) -> Result<u64> {
        match self
            .execute(|request_id| LedgerAction::RestoreSnapshot {
                request_id,
                document,
            })
            .await?
        {
            LedgerAction::SnapshotRestored { revision, .. } => Ok(revision),
            other => Err(Self::unexpected(&other)),
        }
    }

    /// Switches the console language
    ///
    /// # Errors
    ///
    /// [`LedgerError::Store`] when the store does not answer.
    pub async fn set_locale(&self, locale: Locale) -> Result<Locale> {
        match self
            .execute(|request_id| LedgerAction::SetLocale { request_id, locale })
            .await?
        {
            LedgerAction::LocaleChanged { locale, .. } => Ok(locale),
            other => Err(Self::unexpected(&other)),
        }
    }

    // ========== Queries ==========

    /// Clone of the whole ledger
    pub async fn snapshot(&self) -> LedgerState {
        self.store.snapshot().await
    }

    /// Seats per show
    pub async fn availability(&self) -> Vec<Availability> {
        self.store.state(sales::availability).await
    }

    /// Programme ordered by date and start, with conflicts
    pub async fn schedule(&self) -> Vec<ScheduleEntry> {
        self.store.state(|s| schedule::schedule_view(&s.shows)).await
    }

    /// Financial position
    pub async fn totals(&self) -> Totals {
        self.store.state(reports::ledger_totals).await
    }

    /// One day's sales by show
    pub async fn daily_report(&self, date: NaiveDate) -> DailyReport {
        self.store
            .state(|s| reports::daily_report(&s.sales, date))
            .await
    }

    /// Staffing gaps per shift
    pub async fn staffing(&self) -> Vec<ShiftCoverage> {
        self.store.state(staffing::staffing_coverage).await
    }

    /// Tickets matching a free-text filter
    pub async fn tickets(&self, filter: &str) -> Vec<Ticket> {
        self.store
            .state(|s| search::find_tickets(s, filter).into_iter().cloned().collect())
            .await
    }

    /// People matching a free-text filter
    pub async fn people(&self, filter: &str) -> Vec<Person> {
        self.store
            .state(|s| search::find_people(s, filter).into_iter().cloned().collect())
            .await
    }

    /// The backup document for the current ledger
    ///
    /// # Errors
    ///
    /// [`LedgerError::Persistence`] if encoding fails.
    pub async fn export_backup(&self) -> Result<String> {
        let state = self.store.snapshot().await;
        Ok(encode(&state)?)
    }

    /// Stops accepting commands and waits for pending snapshot writes
    ///
    /// # Errors
    ///
    /// [`LedgerError::Store`] if writes are still running at the timeout.
    pub async fn shutdown(&self) -> Result<()> {
        self.store.shutdown(self.shutdown_timeout).await?;
        Ok(())
    }
}

impl std::fmt::Debug for FestivalLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FestivalLedger")
            .field("request_timeout", &self.request_timeout)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .finish_non_exhaustive()
    }
}
