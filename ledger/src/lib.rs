//! Event-operations ledger for a live festival.
//!
//! Tracks ticket issuance, the show schedule, volunteer staffing and cash-up
//! against one persisted store that acts as the system of record.
//!
//! - **Sequences**: monotonic per-kind counters behind every identifier
//! - **Schedule**: show creation and venue/time conflict detection
//! - **Sales**: capacity-guarded, all-or-nothing ticket batches
//! - **Check-in**: exactly-once redemption with a full door log
//! - **Reports**: totals, daily sales and the Z-report
//! - **Search**: free-text lookup of tickets and people
//! - **Store**: `LedgerState` behind a `festledger_runtime::Store`, replaced
//!   wholesale per command and snapshotted after every change
//!
//! # Quick Start
//!
//! ```no_run
//! use festival_ledger::{Config, FestivalLedger, SaleRequest, ShowId, TicketType, PaymentMethod, Money};
//! use festledger_core::environment::SystemClock;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_env();
//! let (ledger, _) = FestivalLedger::open(&config, Arc::new(SystemClock)).await?;
//!
//! let receipt = ledger
//!     .sell(SaleRequest {
//!         show_id: ShowId::new("IMP25-S01"),
//!         ticket_type: TicketType::Ga,
//!         price: Money::from_euros(15),
//!         quantity: 2,
//!         method: PaymentMethod::Cash,
//!     })
//!     .await?;
//!
//! let result = ledger.check_in(receipt.tickets[0].tid.as_str(), None).await?;
//! println!("{}", result.outcome);
//!
//! ledger.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod app;
pub mod checkin;
pub mod config;
pub mod error;
pub mod finance;
pub mod import;
pub mod metrics;
pub mod persistence;
pub mod reducer;
pub mod reports;
pub mod sales;
pub mod schedule;
pub mod search;
pub mod seed;
pub mod sequence;
pub mod staffing;
pub mod state;
pub mod types;

// Re-export commonly used types
pub use action::LedgerAction;
pub use app::{FestivalLedger, LedgerStore, SaleReceipt, ScheduleReceipt};
pub use checkin::{CheckinOutcome, CheckinResult};
pub use config::Config;
pub use error::{LedgerError, PersistenceError, Rejection};
pub use finance::ExpenseDraft;
pub use import::{ImportReport, RowError};
pub use persistence::{FileSnapshotStore, InMemorySnapshotStore, LoadOutcome, SnapshotStore};
pub use reducer::{LedgerEnvironment, LedgerReducer};
pub use sales::SaleRequest;
pub use schedule::ShowDraft;
pub use staffing::{PersonDraft, ShiftDraft};
pub use state::LedgerState;
pub use types::{
    Locale, Money, PaymentMethod, PersonRole, RequestId, ShowCategory, ShowId, TicketId,
    TicketStatus, TicketType,
};
