use anyhow::{Context, Result};
use lexbridge_convert::{write_file, BatchSummary, LedgerRowBuilder};
use lexbridge_core::{CounterpartyResolver, NoLookup, RawTransaction, SourceLookup};
use lexbridge_import::StripeClient;

use crate::config::{Settings, Source};

/// Load, convert and write one export. Nothing is written unless the whole
/// batch converted.
pub fn run(settings: &Settings) -> Result<BatchSummary> {
    let client = settings
        .stripe_key
        .as_deref()
        .map(|key| StripeClient::new(key, settings.timeout))
        .transpose()
        .context("setting up the Stripe client")?;

    let records: Vec<RawTransaction> = match &settings.source {
        Source::Csv { input } => lexbridge_import::read_file(input)
            .with_context(|| format!("reading {}", input.display()))?,
        Source::Api { range } => client
            .as_ref()
            .context("the API source method needs STRIPE_KEY")?
            .list_balance_transactions(*range)?,
    };

    let lookup: Box<dyn SourceLookup> = match client {
        Some(client) => Box::new(client),
        None => {
            tracing::warn!("no STRIPE_KEY set; counterparties fall back to {}", settings.fallback_name);
            Box::new(NoLookup)
        }
    };

    let builder = LedgerRowBuilder::new(
        CounterpartyResolver::new(lookup, settings.fallback_name.clone()),
        settings.profile.clone(),
    );
    let ledger = builder.build(&records).context("converting balance history")?;

    write_file(&settings.output, &ledger.rows, builder.profile())
        .with_context(|| format!("writing {}", settings.output.display()))?;

    Ok(ledger.summary)
}
