//! Expense bookkeeping.

use crate::error::Rejection;
use crate::sequence::{format, SequenceKind, Sequences};
use crate::state::LedgerState;
use crate::types::{Expense, ExpenseId, Money};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Operator input for a new expense
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseDraft {
    /// Date incurred
    pub date: Option<NaiveDate>,
    /// Category
    pub cat: String,
    /// Payee
    pub payee: String,
    /// Optional memo
    #[serde(default)]
    pub memo: Option<String>,
    /// Amount owed
    pub amount: Option<Money>,
    /// Already settled
    #[serde(default)]
    pub paid: bool,
}

/// Validates an expense and allocates its id
///
/// # Errors
///
/// [`Rejection::MissingField`] for a blank date, category, payee or amount;
/// [`Rejection::InvalidField`] when the amount is not positive or above
/// [`Money::LIMIT`].
pub fn record_expense(
    state: &LedgerState,
    draft: &ExpenseDraft,
) -> Result<(Expense, Sequences), Rejection> {
    let date = draft.date.ok_or_else(|| Rejection::missing("date"))?;
    let cat = draft.cat.trim();
    if cat.is_empty() {
        return Err(Rejection::missing("cat"));
    }
    let payee = draft.payee.trim();
    if payee.is_empty() {
        return Err(Rejection::missing("payee"));
    }
    let amount = draft.amount.ok_or_else(|| Rejection::missing("amount"))?;
    if amount <= Money::ZERO {
        return Err(Rejection::invalid("amount", "must be greater than zero"));
    }
    if amount > Money::LIMIT {
        return Err(Rejection::invalid("amount", format!("must not exceed {}", Money::LIMIT)));
    }

    let mut sequences = state.seq.clone();
    let eid = sequences.next_free(SequenceKind::Expense, format::expense, |candidate| {
        state.expenses.iter().any(|e| e.eid.as_str() == candidate)
    });

    let expense = Expense {
        eid: ExpenseId::new(eid),
        date,
        cat: cat.to_string(),
        payee: payee.to_string(),
        memo: draft
            .memo
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string),
        amount,
        paid: draft.paid,
    };
    Ok((expense, sequences))
}

/// Marks an expense paid or unpaid
///
/// # Errors
///
/// [`Rejection::NotFound`] for an unknown expense.
pub fn set_paid(state: &LedgerState, eid: &str, paid: bool) -> Result<Expense, Rejection> {
    let mut expense = state
        .expenses
        .iter()
        .find(|e| e.eid.as_str() == eid)
        .cloned()
        .ok_or_else(|| Rejection::not_found("expense", eid))?;
    expense.paid = paid;
    Ok(expense)
}
