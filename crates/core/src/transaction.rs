use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Layout of the `created` / `available_on` columns in processor exports.
pub const SOURCE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Processor balance-transaction type. Unknown tags are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionType {
    Charge,
    Payment,
    Refund,
    PaymentFailureRefund,
    Payout,
    StripeFee,
    ApplicationFee,
    Other(String),
}

impl TransactionType {
    pub fn parse(tag: &str) -> Self {
        match tag.trim() {
            "charge" => TransactionType::Charge,
            "payment" => TransactionType::Payment,
            "refund" => TransactionType::Refund,
            "payment_failure_refund" => TransactionType::PaymentFailureRefund,
            "payout" => TransactionType::Payout,
            "stripe_fee" => TransactionType::StripeFee,
            "application_fee" => TransactionType::ApplicationFee,
            other => TransactionType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TransactionType::Charge => "charge",
            TransactionType::Payment => "payment",
            TransactionType::Refund => "refund",
            TransactionType::PaymentFailureRefund => "payment_failure_refund",
            TransactionType::Payout => "payout",
            TransactionType::StripeFee => "stripe_fee",
            TransactionType::ApplicationFee => "application_fee",
            TransactionType::Other(tag) => tag,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for TransactionType {
    fn from(tag: String) -> Self {
        TransactionType::parse(&tag)
    }
}

impl From<TransactionType> for String {
    fn from(kind: TransactionType) -> Self {
        kind.as_str().to_string()
    }
}

/// One record of the processor's balance history, amounts still in their
/// localized text form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub id: String,
    pub kind: TransactionType,
    pub source_ref: String,
    pub amount: String,
    pub fee: String,
    pub currency: String,
    pub accounting_date: String,
    pub value_date: String,
    pub description: String,
}

impl RawTransaction {
    /// The fee column value meaning "no fee".
    pub const NO_FEE: &'static str = "0,00";

    pub fn has_fee(&self) -> bool {
        self.fee.trim() != Self::NO_FEE
    }

    /// Upper-cased currency code, `EUR` when the source left it blank.
    pub fn currency_code(&self) -> String {
        let code = self.currency.trim();
        if code.is_empty() {
            "EUR".to_string()
        } else {
            code.to_uppercase()
        }
    }
}

/// Parses a source timestamp. Seconds and date-only values are tolerated.
pub fn parse_source_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for fmt in [SOURCE_DATE_FORMAT, "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
