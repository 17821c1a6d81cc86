//! Festival ledger operator console.
//!
//! Every subcommand opens the snapshot, runs one operation through the ledger
//! store and waits for the snapshot write before exiting.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use festival_ledger::{
    metrics::register_business_metrics,
    reports::{render_z_report, z_report_file_name},
    types::parse_time,
    CheckinOutcome, Config, ExpenseDraft, FestivalLedger, LoadOutcome, Locale, Money,
    PaymentMethod, PersonDraft, PersonRole, SaleRequest, ShiftDraft, ShowCategory, ShowDraft,
    ShowId, TicketType,
};
use festledger_core::environment::{Clock, SystemClock};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Festival ledger: tickets, schedule, staffing and cash-up
#[derive(Parser)]
#[command(name = "festival-ledger")]
#[command(about = "Event-operations ledger for a live festival")]
struct Cli {
    /// Snapshot file (overrides LEDGER_DATA_FILE)
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Overview of shows, seats and money
    Summary,
    /// Programme with venue conflicts
    Schedule,
    /// Add a show
    AddShow {
        /// Title
        #[arg(long)]
        title: String,
        /// Venue id
        #[arg(long)]
        venue: String,
        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        /// Start (HH:MM)
        #[arg(long, value_parser = hhmm)]
        start: NaiveTime,
        /// End (HH:MM)
        #[arg(long, value_parser = hhmm)]
        end: NaiveTime,
        /// Seats on sale
        #[arg(long)]
        capacity: u32,
        /// Show or Workshop
        #[arg(long)]
        category: Option<ShowCategory>,
        /// Billed headliner
        #[arg(long)]
        headliner: Option<String>,
        /// Notes for the tech crew
        #[arg(long)]
        tech_notes: Option<String>,
    },
    /// Sell walk-up tickets
    Sell {
        /// Show id
        #[arg(long)]
        show: String,
        /// Number of tickets
        #[arg(long, default_value_t = 1)]
        qty: u32,
        /// Unit price in EUR
        #[arg(long, default_value = "15")]
        price: Money,
        /// GA, VIP, STAFF or PRESS
        #[arg(long = "type", default_value = "GA")]
        ticket_type: TicketType,
        /// CASH or CARD
        #[arg(long, default_value = "CASH")]
        method: PaymentMethod,
    },
    /// Void a sold ticket
    Void {
        /// Ticket id
        tid: String,
    },
    /// Check a ticket in at the door
    CheckIn {
        /// Scanned code
        code: String,
        /// Door name
        #[arg(long)]
        gate: Option<String>,
    },
    /// List tickets, optionally filtered by id, show, buyer or email
    Tickets {
        /// Case-insensitive text to look for
        #[arg(long)]
        search: Option<String>,
    },
    /// Import presale tickets from a CSV file
    Import {
        /// CSV file with a header row
        file: PathBuf,
    },
    /// Daily Z-report
    Report {
        /// Day to report (defaults to today at the festival site)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Write the report to this file (or the default name in this directory)
        #[arg(long)]
        out: Option<Option<PathBuf>>,
    },
    /// Sales, expenses and net position
    Totals,
    /// Record an expense
    Expense {
        /// Category
        #[arg(long)]
        cat: String,
        /// Payee
        #[arg(long)]
        payee: String,
        /// Amount in EUR
        #[arg(long)]
        amount: Money,
        /// Date (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Memo
        #[arg(long)]
        memo: Option<String>,
        /// Already paid
        #[arg(long)]
        paid: bool,
    },
    /// Mark an expense paid (or unpaid with --unpaid)
    MarkPaid {
        /// Expense id
        eid: String,
        /// Clear the paid flag instead
        #[arg(long)]
        unpaid: bool,
    },
    /// Register a person
    AddPerson {
        /// First name
        #[arg(long)]
        first: String,
        /// Last name
        #[arg(long)]
        last: String,
        /// PERF, VOL, STAFF or PRESS
        #[arg(long)]
        role: PersonRole,
        /// Email
        #[arg(long)]
        email: Option<String>,
        /// Phone
        #[arg(long)]
        phone: Option<String>,
        /// Troupe or department
        #[arg(long)]
        team: Option<String>,
    },
    /// Open a staffing shift
    AddShift {
        /// Venue id
        #[arg(long)]
        venue: String,
        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        /// Start (HH:MM)
        #[arg(long, value_parser = hhmm)]
        start: NaiveTime,
        /// End (HH:MM)
        #[arg(long, value_parser = hhmm)]
        end: NaiveTime,
        /// Door, Tech, FOH ...
        #[arg(long)]
        role: String,
        /// Headcount needed
        #[arg(long, default_value_t = 1)]
        cap: u32,
    },
    /// Put a person on a shift
    Assign {
        /// Person id
        pid: String,
        /// Shift id
        shift_id: String,
    },
    /// Take a person off a shift
    Unassign {
        /// Assignment id
        assign_id: String,
    },
    /// List people, optionally filtered by name, team or role
    People {
        /// Case-insensitive text to look for
        #[arg(long)]
        search: Option<String>,
    },
    /// Staffing coverage per shift
    Staffing,
    /// Write a JSON backup
    Backup {
        /// Backup file
        #[arg(long)]
        out: PathBuf,
    },
    /// Replace the ledger with a JSON backup
    Restore {
        /// Backup file
        file: PathBuf,
    },
    /// Set the console language
    Locale {
        /// EN or DE
        locale: Locale,
    },
}

fn hhmm(raw: &str) -> Result<NaiveTime, String> {
    parse_time(raw).ok_or_else(|| format!("'{raw}' is not HH:MM"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "festival_ledger=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    register_business_metrics();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(path) = cli.data_file {
        config.data_file = path;
    }
    info!(data_file = %config.data_file.display(), festival = %config.festival_code, "Configuration loaded");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let (ledger, outcome) = FestivalLedger::open(&config, Arc::clone(&clock)).await?;
    match &outcome {
        LoadOutcome::Loaded => {},
        LoadOutcome::Seeded => info!("No snapshot found, seeded reference data"),
        LoadOutcome::Recovered { reason } => warn!(%reason, "Snapshot was unreadable and has been reseeded"),
    }

    let today = clock.local_now(config.utc_offset()).date();
    let result = run(&ledger, cli.command, today).await;

    if let Err(error) = ledger.shutdown().await {
        warn!(%error, "Pending snapshot writes did not finish");
    }
    result
}

#[allow(clippy::too_many_lines)] // one arm per subcommand
async fn run(ledger: &FestivalLedger, command: Commands, today: NaiveDate) -> Result<()> {
    match command {
        Commands::Summary => {
            let state = ledger.snapshot().await;
            println!(
                "{} shows, {} tickets, {} scans, locale {}",
                state.shows.len(),
                state.tickets.len(),
                state.scans.len(),
                state.locale
            );
            for row in ledger.availability().await {
                println!(
                    "{:<12} sold {:>4} / {:<4} remaining {}",
                    row.show_id, row.sold, row.capacity, row.remaining
                );
            }
            let totals = ledger.totals().await;
            println!("Sales EUR {}  Net EUR {}", totals.sales_total, totals.net);
        },

        Commands::Schedule => {
            for entry in ledger.schedule().await {
                let show = &entry.show;
                let mark = if entry.conflicts.is_empty() { " " } else { "✖" };
                println!(
                    "{mark} {} {} {}-{} {:<10} {:<30} cap {}",
                    show.show_id,
                    show.date,
                    show.start.format("%H:%M"),
                    show.end.format("%H:%M"),
                    show.venue_id,
                    show.title,
                    show.capacity
                );
                if !entry.conflicts.is_empty() {
                    let ids: Vec<String> = entry.conflicts.iter().map(ToString::to_string).collect();
                    println!("    conflicts with {}", ids.join(", "));
                }
            }
        },

        Commands::AddShow {
            title,
            venue,
            date,
            start,
            end,
            capacity,
            category,
            headliner,
            tech_notes,
        } => {
            let receipt = ledger
                .schedule_show(ShowDraft {
                    title,
                    venue_id: venue,
                    date: Some(date),
                    start: Some(start),
                    end: Some(end),
                    capacity: Some(capacity),
                    category,
                    headliner,
                    tech_notes,
                })
                .await?;
            println!("Show added: {}", receipt.show.show_id);
            if !receipt.conflicts.is_empty() {
                let ids: Vec<String> = receipt.conflicts.iter().map(ToString::to_string).collect();
                println!("Warning: overlaps {}", ids.join(", "));
            }
        },

        Commands::Sell {
            show,
            qty,
            price,
            ticket_type,
            method,
        } => {
            let receipt = ledger
                .sell(SaleRequest {
                    show_id: ShowId::new(show),
                    ticket_type,
                    price,
                    quantity: qty,
                    method,
                })
                .await?;
            println!("{} ticket(s) sold", receipt.tickets.len());
            for ticket in &receipt.tickets {
                println!("*{}*", ticket.tid);
            }
        },

        Commands::Void { tid } => {
            let ticket = ledger.void(&tid).await?;
            println!("{} is now {}", ticket.tid, ticket.status);
        },

        Commands::CheckIn { code, gate } => {
            let result = ledger.check_in(&code, gate).await?;
            match result.outcome {
                CheckinOutcome::Ok => println!("OK - WELCOME"),
                other => println!("{other}"),
            }
        },

        Commands::Tickets { search } => {
            for ticket in ledger.tickets(search.as_deref().unwrap_or_default()).await {
                println!(
                    "{:<12} {:<10} {:<5} {:<4} {} {} {}",
                    ticket.tid.as_str(),
                    ticket.show_id.as_str(),
                    ticket.ticket_type.label(),
                    ticket.status.label(),
                    ticket.price,
                    ticket.buyer,
                    ticket.email
                );
            }
        },

        Commands::Import { file } => {
            let text = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            let report = ledger.import_tickets(text).await?;
            println!("Imported {} tickets", report.imported.len());
            for error in &report.errors {
                println!("  line {}: {}", error.line, error.reason);
            }
            for show in &report.oversold {
                println!("Warning: {show} is now over capacity");
            }
        },

        Commands::Report { date, out } => {
            let date = date.unwrap_or(today);
            let text = render_z_report(&ledger.daily_report(date).await);
            println!("{text}");
            if let Some(out) = out {
                let path = out.unwrap_or_else(|| PathBuf::from(z_report_file_name(date)));
                tokio::fs::write(&path, text.as_bytes())
                    .await
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("Report written to {}", path.display());
            }
        },

        Commands::Totals => {
            let totals = ledger.totals().await;
            println!("Sales Total: EUR {}", totals.sales_total);
            println!("By Method:");
            for (method, amount) in &totals.by_method {
                println!("  {method}: EUR {amount}");
            }
            println!("Expenses: EUR {}", totals.expenses_total);
            println!("NET: EUR {}", totals.net);
        },

        Commands::Expense {
            cat,
            payee,
            amount,
            date,
            memo,
            paid,
        } => {
            let expense = ledger
                .record_expense(ExpenseDraft {
                    date: Some(date.unwrap_or(today)),
                    cat,
                    payee,
                    memo,
                    amount: Some(amount),
                    paid,
                })
                .await?;
            println!("Expense recorded: {}", expense.eid);
        },

        Commands::MarkPaid { eid, unpaid } => {
            let expense = ledger.set_expense_paid(&eid, !unpaid).await?;
            println!("{} paid: {}", expense.eid, expense.paid);
        },

        Commands::AddPerson {
            first,
            last,
            role,
            email,
            phone,
            team,
        } => {
            let person = ledger
                .add_person(PersonDraft {
                    first,
                    last,
                    role: Some(role),
                    email,
                    phone,
                    team,
                    lang: None,
                })
                .await?;
            println!("Person added: {}", person.pid);
        },

        Commands::AddShift {
            venue,
            date,
            start,
            end,
            role,
            cap,
        } => {
            let shift = ledger
                .create_shift(ShiftDraft {
                    venue_id: venue,
                    date: Some(date),
                    start: Some(start),
                    end: Some(end),
                    role,
                    cap: Some(cap),
                })
                .await?;
            println!("Shift added: {}", shift.shift_id);
        },

        Commands::Assign { pid, shift_id } => {
            let assignment = ledger.assign_volunteer(&pid, &shift_id).await?;
            println!("Assigned: {}", assignment.assign_id);
        },

        Commands::Unassign { assign_id } => {
            let assignment = ledger.drop_assignment(&assign_id).await?;
            println!("{} is now {}", assignment.assign_id, assignment.status);
        },

        Commands::People { search } => {
            for person in ledger.people(search.as_deref().unwrap_or_default()).await {
                println!(
                    "{:<6} {:<5} {:<24} {}",
                    person.pid.as_str(),
                    person.role.label(),
                    format!("{} {}", person.first, person.last),
                    person.team.as_deref().unwrap_or("-")
                );
            }
        },

        Commands::Staffing => {
            for line in ledger.staffing().await {
                println!(
                    "{:<6} needed {:>2} assigned {:>2} {:?}",
                    line.shift_id, line.needed, line.assigned, line.coverage
                );
            }
        },

        Commands::Backup { out } => {
            let document = ledger.export_backup().await?;
            tokio::fs::write(&out, document.as_bytes())
                .await
                .with_context(|| format!("writing {}", out.display()))?;
            println!("Backup created: {}", out.display());
        },

        Commands::Restore { file } => {
            let document = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            ledger.restore_backup(document).await?;
            println!("Backup restored");
        },

        Commands::Locale { locale } => {
            let locale = ledger.set_locale(locale).await?;
            println!("Language: {locale}");
        },
    }

    Ok(())
}
