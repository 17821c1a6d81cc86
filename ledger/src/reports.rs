//! Ledger aggregator: read-side projections over sales and expenses.
//!
//! Nothing here mutates the ledger. Every function is a pure function of the
//! collections it is handed, so reports can be re-derived at any time.

use crate::state::LedgerState;
use crate::types::{Expense, Money, PaymentMethod, Sale, ShowId};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Financial position
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    /// Sum of every sale, including sales of later-voided tickets
    pub sales_total: Money,
    /// Sales grouped by payment method
    pub by_method: BTreeMap<PaymentMethod, Money>,
    /// Sum of every expense, paid or not
    pub expenses_total: Money,
    /// Sales minus expenses
    pub net: Money,
}

/// One show's line on the daily report
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRow {
    /// Show
    pub show_id: ShowId,
    /// Tickets sold that day
    pub count: u32,
    /// Amount taken that day
    pub amount: Money,
}

/// Sales for a single day grouped by show
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReport {
    /// Report date
    pub date: NaiveDate,
    /// Rows in order of each show's first sale that day
    pub rows: Vec<DailyRow>,
    /// Sum over all rows
    pub total: Money,
}

/// Sales and expense totals
#[must_use]
pub fn totals(sales: &[Sale], expenses: &[Expense]) -> Totals {
    let sales_total: Money = sales.iter().map(|s| s.amount).sum();
    let mut by_method = BTreeMap::new();
    for sale in sales {
        *by_method.entry(sale.method).or_insert(Money::ZERO) += sale.amount;
    }
    let expenses_total: Money = expenses.iter().map(|e| e.amount).sum();

    Totals {
        sales_total,
        by_method,
        expenses_total,
        net: sales_total - expenses_total,
    }
}

/// Totals over the whole ledger
#[must_use]
pub fn ledger_totals(state: &LedgerState) -> Totals {
    totals(&state.sales, &state.expenses)
}

/// Groups one day's sales by show
#[must_use]
pub fn daily_report(sales: &[Sale], date: NaiveDate) -> DailyReport {
    let mut rows: Vec<DailyRow> = Vec::new();
    let mut total = Money::ZERO;

    for sale in sales.iter().filter(|s| s.date == date) {
        total += sale.amount;
        if let Some(row) = rows.iter_mut().find(|r| r.show_id == sale.show_id) {
            row.count += 1;
            row.amount += sale.amount;
        } else {
            rows.push(DailyRow {
                show_id: sale.show_id.clone(),
                count: 1,
                amount: sale.amount,
            });
        }
    }

    DailyReport { date, rows, total }
}

/// Plain-text Z-report
#[must_use]
pub fn render_z_report(report: &DailyReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Z-REPORT - {}", report.date.format("%Y-%m-%d"));
    out.push('\n');
    out.push_str("By Show:\n");
    for row in &report.rows {
        let _ = writeln!(out, "{}  {:03}  EUR {}", row.show_id, row.count, row.amount);
    }
    out.push('\n');
    let _ = write!(out, "TOTAL: EUR {}", report.total);
    out
}

/// Default export file name for a Z-report
#[must_use]
pub fn z_report_file_name(date: NaiveDate) -> String {
    format!("ZREPORT_{}.txt", date.format("%Y-%m-%d"))
}
