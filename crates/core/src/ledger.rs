use serde::{Deserialize, Serialize};

use super::money::Money;

/// One line of the bookkeeping import. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub reference: String,
    pub kind: String,
    pub source_ref: String,
    pub booking_date: String,
    pub value_date: String,
    pub counterparty: String,
    pub description: String,
    pub amount: Money,
    pub debit_amount: Option<Money>,
    pub credit_amount: Option<Money>,
}

/// Identifying columns that only the raw report layout shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowOrigin {
    pub reference: String,
    pub kind: String,
    pub source_ref: String,
}

impl RowOrigin {
    pub fn new(reference: impl Into<String>, kind: impl Into<String>, source_ref: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            kind: kind.into(),
            source_ref: source_ref.into(),
        }
    }
}

impl LedgerRow {
    /// Rounds `amount` to cents and splits it into the debit/credit columns:
    /// negative amounts land in debit as absolute value, everything else in
    /// credit.
    pub fn new(
        origin: RowOrigin,
        booking_date: impl Into<String>,
        value_date: impl Into<String>,
        counterparty: impl Into<String>,
        description: impl Into<String>,
        amount: Money,
    ) -> Self {
        let amount = amount.rounded();
        let (debit_amount, credit_amount) = if amount.is_negative() {
            (Some(amount.abs()), None)
        } else {
            (None, Some(amount))
        };
        LedgerRow {
            reference: origin.reference,
            kind: origin.kind,
            source_ref: origin.source_ref,
            booking_date: booking_date.into(),
            value_date: value_date.into(),
            counterparty: counterparty.into(),
            description: description.into(),
            amount,
            debit_amount,
            credit_amount,
        }
    }
}
