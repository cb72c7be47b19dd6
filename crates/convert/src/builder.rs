use lexbridge_core::{ConvertError, CounterpartyResolver, LedgerRow, Profile, RawTransaction, SourceLookup};

use crate::classifier::{Classification, RowClassifier};
use crate::description::DescriptionSynthesizer;
use crate::fees::FeeAggregator;

/// Counters of one conversion pass. `emitted + suppressed == records`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub records: usize,
    pub emitted: usize,
    pub suppressed: usize,
    pub fee_rows: usize,
    pub aggregated_fees: usize,
    pub summary_rows: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    pub rows: Vec<LedgerRow>,
    pub summary: BatchSummary,
}

/// Runs the one-pass conversion for a profile: transaction rows with their
/// fee rows in input order, then the fee summaries.
pub struct LedgerRowBuilder<L: SourceLookup> {
    resolver: CounterpartyResolver<L>,
    profile: Profile,
}

impl<L: SourceLookup> LedgerRowBuilder<L> {
    pub fn new(resolver: CounterpartyResolver<L>, profile: Profile) -> Self {
        Self { resolver, profile }
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn build<'r, I>(&self, records: I) -> Result<Ledger, ConvertError>
    where
        I: IntoIterator<Item = &'r RawTransaction>,
    {
        let aggregation = self.profile.aggregate_fees.then_some(self.profile.fee_scheme);
        let classifier = RowClassifier::new(
            &self.resolver,
            DescriptionSynthesizer::new(self.profile.descriptions),
            aggregation,
        );
        let mut fees = FeeAggregator::new(self.resolver.fallback_name());
        let mut rows = Vec::new();
        let mut summary = BatchSummary::default();

        for tx in records {
            summary.records += 1;
            match classifier.classify(tx, &mut fees)? {
                Classification::Emitted {
                    row,
                    fee_row,
                    fee_aggregated,
                } => {
                    summary.emitted += 1;
                    rows.push(row);
                    if let Some(fee_row) = fee_row {
                        summary.fee_rows += 1;
                        rows.push(fee_row);
                    }
                    if fee_aggregated {
                        summary.aggregated_fees += 1;
                    }
                }
                Classification::Suppressed => summary.suppressed += 1,
            }
        }

        let summary_rows = fees.flush();
        summary.summary_rows = summary_rows.len();
        rows.extend(summary_rows);

        tracing::info!(
            profile = %self.profile.name,
            records = summary.records,
            emitted = summary.emitted,
            suppressed = summary.suppressed,
            fee_rows = summary.fee_rows,
            aggregated_fees = summary.aggregated_fees,
            summary_rows = summary.summary_rows,
            "conversion finished"
        );

        Ok(Ledger { rows, summary })
    }
}
