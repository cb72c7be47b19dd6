use lexbridge_core::{
    parse_source_date, ConvertError, CounterpartyResolver, FeeScheme, LedgerRow, Money, RawTransaction, RowOrigin,
    SourceLookup, TransactionType,
};

use crate::description::{DescriptionContext, DescriptionSynthesizer};
use crate::fees::{FeeAggregator, FeeCategory, FEE_KIND};

/// Terminal state of one record.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// A visible row, optionally followed by its immediate fee row.
    Emitted {
        row: LedgerRow,
        fee_row: Option<LedgerRow>,
        fee_aggregated: bool,
    },
    /// Routed into a fee bucket without a row of its own.
    Suppressed,
}

/// Decides, record by record, what ends up in the ledger.
pub struct RowClassifier<'a, L: SourceLookup> {
    resolver: &'a CounterpartyResolver<L>,
    synthesizer: DescriptionSynthesizer,
    /// `Some` when aggregation mode is active.
    aggregation: Option<FeeScheme>,
}

impl<'a, L: SourceLookup> RowClassifier<'a, L> {
    pub fn new(
        resolver: &'a CounterpartyResolver<L>,
        synthesizer: DescriptionSynthesizer,
        aggregation: Option<FeeScheme>,
    ) -> Self {
        Self {
            resolver,
            synthesizer,
            aggregation,
        }
    }

    pub fn classify(&self, tx: &RawTransaction, fees: &mut FeeAggregator) -> Result<Classification, ConvertError> {
        let amount = parse_amount(&tx.id, &tx.amount)?;
        let accounting = parse_source_date(&tx.accounting_date).ok_or_else(|| ConvertError::MalformedDate {
            record: tx.id.clone(),
            value: tx.accounting_date.clone(),
        })?;

        let counterparty = self.resolver.resolve(&tx.source_ref);

        if let (Some(scheme), TransactionType::StripeFee) = (self.aggregation, &tx.kind) {
            let category = FeeCategory::for_record(scheme, &tx.kind, accounting);
            let note = if tx.description.trim().is_empty() {
                tx.id.clone()
            } else {
                tx.description.clone()
            };
            tracing::debug!(id = %tx.id, category = %category.label(), "stripe fee suppressed into bucket");
            fees.add_fee(category, &tx.id, amount, note, &tx.accounting_date, &tx.value_date)?;
            return Ok(Classification::Suppressed);
        }

        let currency = tx.currency_code();
        let description = self.synthesizer.describe(
            &DescriptionContext {
                kind: &tx.kind,
                amount,
                currency: &currency,
                counterparty: &counterparty,
                accounting_date: accounting,
                raw_description: &tx.description,
                source_ref: &tx.source_ref,
            },
            self.resolver,
        );

        let row = LedgerRow::new(
            RowOrigin::new(tx.id.clone(), tx.kind.as_str(), tx.source_ref.clone()),
            tx.accounting_date.clone(),
            tx.value_date.clone(),
            counterparty,
            description.clone(),
            amount,
        );

        if !tx.has_fee() {
            return Ok(Classification::Emitted {
                row,
                fee_row: None,
                fee_aggregated: false,
            });
        }

        let fee = parse_amount(&tx.id, &tx.fee)?;
        let fee_text = format!("Gebühren für Zahlung {} -- {}", tx.id, description);

        match self.aggregation {
            Some(scheme) => {
                let category = FeeCategory::for_record(scheme, &tx.kind, accounting);
                tracing::debug!(id = %tx.id, fee = %fee, category = %category.label(), "fee aggregated");
                fees.add_fee(category, &tx.id, fee, fee_text, &tx.accounting_date, &tx.value_date)?;
                Ok(Classification::Emitted {
                    row,
                    fee_row: None,
                    fee_aggregated: true,
                })
            }
            None => {
                let fee_row = LedgerRow::new(
                    RowOrigin::new(
                        format!("{}_fee", tx.id),
                        FEE_KIND,
                        format!("{}_fee", tx.source_ref),
                    ),
                    tx.accounting_date.clone(),
                    tx.value_date.clone(),
                    self.resolver.fallback_name(),
                    fee_text,
                    -fee,
                );
                Ok(Classification::Emitted {
                    row,
                    fee_row: Some(fee_row),
                    fee_aggregated: false,
                })
            }
        }
    }
}

fn parse_amount(record: &str, text: &str) -> Result<Money, ConvertError> {
    Money::parse_localized(text).map_err(|_| ConvertError::MalformedAmount {
        record: record.to_string(),
        value: text.to_string(),
    })
}
