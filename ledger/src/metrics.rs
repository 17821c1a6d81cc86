//! Business metrics for the festival ledger.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `festival_tickets_sold_total` - Walk-up tickets issued
//! - `festival_revenue_cents_total` - Walk-up revenue in cents
//! - `festival_sale_rejections_total{reason}` - Refused sales
//! - `festival_checkins_total{outcome}` - Door scans by outcome
//! - `festival_tickets_imported_total` - Presale tickets imported
//! - `festival_snapshot_failures_total` - Snapshot writes that failed

use crate::checkin::CheckinOutcome;
use crate::error::Rejection;
use metrics::describe_counter;

/// Initialize and register all business metrics descriptions.
///
/// Call once at startup, before any metric is recorded.
pub fn register_business_metrics() {
    describe_counter!(
        "festival_tickets_sold_total",
        "Total number of tickets sold at the box office"
    );
    describe_counter!(
        "festival_revenue_cents_total",
        "Total box-office revenue in cents"
    );
    describe_counter!(
        "festival_sale_rejections_total",
        "Total number of refused sales by reason"
    );
    describe_counter!(
        "festival_checkins_total",
        "Total number of check-in attempts by outcome (ok, duplicate, void_invalid, not_found)"
    );
    describe_counter!(
        "festival_tickets_imported_total",
        "Total number of presale tickets imported"
    );
    describe_counter!(
        "festival_snapshot_failures_total",
        "Total number of snapshot writes that failed"
    );

    tracing::info!("Business metrics registered");
}

// ============================================================================
// Metric Recording Functions
// ============================================================================

/// Record an accepted sale.
pub fn record_sale(quantity: usize, revenue_cents: i64) {
    metrics::counter!("festival_tickets_sold_total").increment(quantity as u64);
    metrics::counter!("festival_revenue_cents_total")
        .increment(u64::try_from(revenue_cents).unwrap_or(0));
    tracing::debug!(quantity, revenue_cents, "Recorded sale metric");
}

/// Record a refused sale.
pub fn record_sale_rejected(rejection: &Rejection) {
    let reason = match rejection {
        Rejection::CapacityExceeded { .. } => "capacity_exceeded",
        Rejection::NotFound { .. } => "not_found",
        _ => "invalid",
    };
    metrics::counter!("festival_sale_rejections_total", "reason" => reason).increment(1);
}

/// Record a check-in attempt.
pub fn record_checkin(outcome: CheckinOutcome) {
    metrics::counter!("festival_checkins_total", "outcome" => outcome.label()).increment(1);
}

/// Record imported presale tickets.
pub fn record_import(count: usize) {
    metrics::counter!("festival_tickets_imported_total").increment(count as u64);
}

/// Record a failed snapshot write.
pub fn record_snapshot_failure() {
    metrics::counter!("festival_snapshot_failures_total").increment(1);
}
