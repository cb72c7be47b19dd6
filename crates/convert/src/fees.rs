use chrono::NaiveDateTime;
use lexbridge_core::{ConvertError, FeeScheme, LedgerRow, Money, RowOrigin, TransactionType, YearMonth, SOURCE_DATE_FORMAT};
use std::collections::BTreeMap;

/// Row kind used for every generated fee line.
pub const FEE_KIND: &str = "Kontoführungsgebühr";

/// Bucket key. Variant order is the flush order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FeeCategory {
    Pooled,
    Month(YearMonth),
    Charge,
    Payment,
    Billing,
}

impl FeeCategory {
    /// Key for a fee under `scheme`. With [`FeeScheme::ByType`] every type
    /// other than `charge` and `stripe_fee` lands in the payment bucket.
    pub fn for_record(scheme: FeeScheme, kind: &TransactionType, accounting_date: NaiveDateTime) -> Self {
        match scheme {
            FeeScheme::Pooled => FeeCategory::Pooled,
            FeeScheme::Monthly => FeeCategory::Month(YearMonth::of(accounting_date)),
            FeeScheme::ByType => match kind {
                TransactionType::Charge => FeeCategory::Charge,
                TransactionType::StripeFee => FeeCategory::Billing,
                _ => FeeCategory::Payment,
            },
        }
    }

    pub fn label(&self) -> String {
        match self {
            FeeCategory::Pooled => "Stripe Gebühren gesamt".to_string(),
            FeeCategory::Month(ym) => format!("Stripe Gebühren {ym}"),
            FeeCategory::Charge => "Stripe Gebühren für Kartenzahlungen".to_string(),
            FeeCategory::Payment => "Stripe Gebühren für Zahlungen".to_string(),
            FeeCategory::Billing => "Stripe Gebühren für Billing / Usage".to_string(),
        }
    }

    fn reference(&self) -> String {
        match self {
            FeeCategory::Pooled => "fees_pooled".to_string(),
            FeeCategory::Month(ym) => format!("fees_{}_{:02}", ym.year, ym.month),
            FeeCategory::Charge => "fees_charge".to_string(),
            FeeCategory::Payment => "fees_payment".to_string(),
            FeeCategory::Billing => "fees_billing".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeeBucket {
    /// Sum of absolute contributions, not rounded.
    pub total: Money,
    pub descriptions: Vec<String>,
    /// Dates of the first contribution.
    pub accounting_date: String,
    pub value_date: String,
}

/// Pools per-transaction fees into summary rows.
#[derive(Debug, Clone)]
pub struct FeeAggregator {
    buckets: BTreeMap<FeeCategory, FeeBucket>,
    counterparty: String,
}

impl FeeAggregator {
    pub fn new(counterparty: impl Into<String>) -> Self {
        Self {
            buckets: BTreeMap::new(),
            counterparty: counterparty.into(),
        }
    }

    /// Adds `|amount|` contributed by `record`. Fails when the bucket total
    /// would overflow.
    pub fn add_fee(
        &mut self,
        category: FeeCategory,
        record: &str,
        amount: Money,
        description: impl Into<String>,
        accounting_date: &str,
        value_date: &str,
    ) -> Result<(), ConvertError> {
        let bucket = self.buckets.entry(category).or_insert_with(|| FeeBucket {
            total: Money::zero(),
            descriptions: Vec::new(),
            accounting_date: accounting_date.to_string(),
            value_date: value_date.to_string(),
        });
        bucket.total = bucket
            .total
            .checked_add(amount.abs())
            .ok_or_else(|| ConvertError::MalformedAmount {
                record: record.to_string(),
                value: amount.to_canonical(),
            })?;
        bucket.descriptions.push(description.into());
        Ok(())
    }

    pub fn bucket(&self, category: &FeeCategory) -> Option<&FeeBucket> {
        self.buckets.get(category)
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// One debit row per bucket with a positive total, in category order.
    pub fn flush(self) -> Vec<LedgerRow> {
        let counterparty = self.counterparty;
        self.buckets
            .into_iter()
            .filter(|(_, bucket)| bucket.total.is_positive())
            .map(|(category, bucket)| {
                tracing::debug!(
                    category = %category.label(),
                    total = %bucket.total,
                    contributions = bucket.descriptions.len(),
                    "flushing fee bucket"
                );
                let (booking_date, value_date) = match category {
                    FeeCategory::Month(ym) => {
                        let first = ym
                            .first_day()
                            .and_then(|d| d.and_hms_opt(0, 0, 0))
                            .map(|dt| dt.format(SOURCE_DATE_FORMAT).to_string())
                            .unwrap_or_else(|| bucket.accounting_date.clone());
                        (first.clone(), first)
                    }
                    _ => (bucket.accounting_date.clone(), bucket.value_date.clone()),
                };
                LedgerRow::new(
                    RowOrigin::new(category.reference(), FEE_KIND, ""),
                    booking_date,
                    value_date,
                    counterparty.clone(),
                    format!("{} ({})", category.label(), count_label(bucket.descriptions.len())),
                    -bucket.total,
                )
            })
            .collect()
    }
}

fn count_label(n: usize) -> String {
    if n == 1 {
        "1 Buchung".to_string()
    } else {
        format!("{n} Buchungen")
    }
}
