//! Commands accepted by the ledger and the outcomes it announces.

use crate::checkin::CheckinOutcome;
use crate::error::Rejection;
use crate::finance::ExpenseDraft;
use crate::import::ImportReport;
use crate::sales::SaleRequest;
use crate::schedule::ShowDraft;
use crate::staffing::{PersonDraft, ShiftDraft};
use crate::types::{
    Assignment, Expense, Locale, Person, RequestId, Sale, Scan, Shift, Show, ShowId, Ticket,
};

/// Everything that flows through the ledger store
///
/// Commands carry a [`RequestId`]; the outcome announced for a command carries
/// the same id so the sender can pick it off the action stream.
#[derive(Clone, Debug, PartialEq)]
pub enum LedgerAction {
    // ========== Commands ==========
    /// Add a show to the programme
    ScheduleShow {
        /// Correlation id
        request_id: RequestId,
        /// Operator input
        draft: ShowDraft,
    },
    /// Sell a batch of walk-up tickets
    SellTickets {
        /// Correlation id
        request_id: RequestId,
        /// What to sell
        request: SaleRequest,
    },
    /// Cancel a sold ticket
    VoidTicket {
        /// Correlation id
        request_id: RequestId,
        /// Ticket code, any case
        tid: String,
    },
    /// Present a ticket at the door
    CheckIn {
        /// Correlation id
        request_id: RequestId,
        /// Scanned or typed code
        code: String,
        /// Door; configured default when `None`
        gate: Option<String>,
    },
    /// Append presale tickets from comma-separated text
    ImportTickets {
        /// Correlation id
        request_id: RequestId,
        /// File contents
        csv: String,
    },
    /// Book a cost
    RecordExpense {
        /// Correlation id
        request_id: RequestId,
        /// Operator input
        draft: ExpenseDraft,
    },
    /// Mark an expense settled or not
    SetExpensePaid {
        /// Correlation id
        request_id: RequestId,
        /// Expense id
        eid: String,
        /// New flag
        paid: bool,
    },
    /// Register a performer, volunteer, staff member or press contact
    AddPerson {
        /// Correlation id
        request_id: RequestId,
        /// Operator input
        draft: PersonDraft,
    },
    /// Open a staffing shift
    CreateShift {
        /// Correlation id
        request_id: RequestId,
        /// Operator input
        draft: ShiftDraft,
    },
    /// Put a person on a shift
    AssignVolunteer {
        /// Correlation id
        request_id: RequestId,
        /// Person
        pid: String,
        /// Shift
        shift_id: String,
    },
    /// Take a person off a shift
    DropAssignment {
        /// Correlation id
        request_id: RequestId,
        /// Assignment
        assign_id: String,
    },
    /// Replace the whole ledger with a backup document
    RestoreSnapshot {
        /// Correlation id
        request_id: RequestId,
        /// Backup contents
        document: String,
    },
    /// Switch the console language
    SetLocale {
        /// Correlation id
        request_id: RequestId,
        /// New language
        locale: Locale,
    },

    // ========== Events ==========
    /// A show was added
    ShowScheduled {
        /// Correlation id
        request_id: RequestId,
        /// The new show
        show: Show,
        /// Shows it overlaps with
        conflicts: Vec<ShowId>,
    },
    /// Tickets and their sales were issued
    TicketsSold {
        /// Correlation id
        request_id: RequestId,
        /// New tickets
        tickets: Vec<Ticket>,
        /// Paired sales
        sales: Vec<Sale>,
    },
    /// A ticket was voided
    TicketVoided {
        /// Correlation id
        request_id: RequestId,
        /// Ticket after voiding
        ticket: Ticket,
    },
    /// A check-in attempt was logged
    CheckInRecorded {
        /// Correlation id
        request_id: RequestId,
        /// Door decision
        outcome: CheckinOutcome,
        /// Ticket after the attempt, if it exists
        ticket: Option<Ticket>,
        /// Door log entry
        scan: Scan,
    },
    /// Presale tickets were appended
    TicketsImported {
        /// Correlation id
        request_id: RequestId,
        /// New tickets
        tickets: Vec<Ticket>,
        /// Row-level summary
        report: ImportReport,
    },
    /// An expense was booked
    ExpenseRecorded {
        /// Correlation id
        request_id: RequestId,
        /// The expense
        expense: Expense,
    },
    /// An expense's paid flag changed
    ExpensePaidChanged {
        /// Correlation id
        request_id: RequestId,
        /// Expense after the change
        expense: Expense,
    },
    /// A person was registered
    PersonAdded {
        /// Correlation id
        request_id: RequestId,
        /// The person
        person: Person,
    },
    /// A shift was opened
    ShiftCreated {
        /// Correlation id
        request_id: RequestId,
        /// The shift
        shift: Shift,
    },
    /// A person was put on a shift
    VolunteerAssigned {
        /// Correlation id
        request_id: RequestId,
        /// The assignment
        assignment: Assignment,
    },
    /// A person was taken off a shift
    AssignmentDropped {
        /// Correlation id
        request_id: RequestId,
        /// Assignment after dropping
        assignment: Assignment,
    },
    /// The ledger was replaced by a backup
    SnapshotRestored {
        /// Correlation id
        request_id: RequestId,
        /// Revision of the restored ledger
        revision: u64,
    },
    /// The console language changed
    LocaleChanged {
        /// Correlation id
        request_id: RequestId,
        /// New language
        locale: Locale,
    },
    /// A command was refused; the ledger is unchanged
    CommandRejected {
        /// Correlation id
        request_id: RequestId,
        /// Why
        rejection: Rejection,
    },
    /// Writing a snapshot failed
    SnapshotPersistFailed {
        /// Revision that was not written
        revision: u64,
        /// Failure
        error: String,
    },
}

impl LedgerAction {
    /// Correlation id of a command or its outcome
    #[must_use]
    pub const fn request_id(&self) -> Option<RequestId> {
        match self {
            Self::ScheduleShow { request_id, .. }
            | Self::SellTickets { request_id, .. }
            | Self::VoidTicket { request_id, .. }
            | Self::CheckIn { request_id, .. }
            | Self::ImportTickets { request_id, .. }
            | Self::RecordExpense { request_id, .. }
            | Self::SetExpensePaid { request_id, .. }
            | Self::AddPerson { request_id, .. }
            | Self::CreateShift { request_id, .. }
            | Self::AssignVolunteer { request_id, .. }
            | Self::DropAssignment { request_id, .. }
            | Self::RestoreSnapshot { request_id, .. }
            | Self::SetLocale { request_id, .. }
            | Self::ShowScheduled { request_id, .. }
            | Self::TicketsSold { request_id, .. }
            | Self::TicketVoided { request_id, .. }
            | Self::CheckInRecorded { request_id, .. }
            | Self::TicketsImported { request_id, .. }
            | Self::ExpenseRecorded { request_id, .. }
            | Self::ExpensePaidChanged { request_id, .. }
            | Self::PersonAdded { request_id, .. }
            | Self::ShiftCreated { request_id, .. }
            | Self::VolunteerAssigned { request_id, .. }
            | Self::AssignmentDropped { request_id, .. }
            | Self::SnapshotRestored { request_id, .. }
            | Self::LocaleChanged { request_id, .. }
            | Self::CommandRejected { request_id, .. } => Some(*request_id),
            Self::SnapshotPersistFailed { .. } => None,
        }
    }

    /// Whether this is an announced outcome rather than a command
    #[must_use]
    pub const fn is_outcome(&self) -> bool {
        matches!(
            self,
            Self::ShowScheduled { .. }
                | Self::TicketsSold { .. }
                | Self::TicketVoided { .. }
                | Self::CheckInRecorded { .. }
                | Self::TicketsImported { .. }
                | Self::ExpenseRecorded { .. }
                | Self::ExpensePaidChanged { .. }
                | Self::PersonAdded { .. }
                | Self::ShiftCreated { .. }
                | Self::VolunteerAssigned { .. }
                | Self::AssignmentDropped { .. }
                | Self::SnapshotRestored { .. }
                | Self::LocaleChanged { .. }
                | Self::CommandRejected { .. }
                | Self::SnapshotPersistFailed { .. }
        )
    }

    /// Whether this is the outcome of the command tagged `request_id`
    #[must_use]
    pub fn answers(&self, request_id: RequestId) -> bool {
        self.is_outcome() && self.request_id() == Some(request_id)
    }
}
