use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("HTTP request failed: {0}")]
    Http(String),
    #[error("Unexpected status {status} for {object}")]
    Status { status: u16, object: String },
    #[error("Could not decode response for {object}: {reason}")]
    Decode { object: String, reason: String },
    #[error("No such object: {0}")]
    NotFound(String),
}

/// Best-effort enrichment of a balance transaction's source object.
///
/// `Ok(None)` means "nothing known"; errors are absorbed by
/// [`CounterpartyResolver`] and never reach the conversion.
pub trait SourceLookup {
    fn counterparty_name(&self, _source_ref: &str) -> Result<Option<String>, LookupError> {
        Ok(None)
    }

    fn description(&self, _source_ref: &str) -> Result<Option<String>, LookupError> {
        Ok(None)
    }

    /// Raw refund reason code (`duplicate`, `fraudulent`, ...).
    fn refund_reason(&self, _source_ref: &str) -> Result<Option<String>, LookupError> {
        Ok(None)
    }

    fn product_label(&self, _source_ref: &str) -> Result<Option<String>, LookupError> {
        Ok(None)
    }
}

impl<T: SourceLookup + ?Sized> SourceLookup for Box<T> {
    fn counterparty_name(&self, source_ref: &str) -> Result<Option<String>, LookupError> {
        (**self).counterparty_name(source_ref)
    }

    fn description(&self, source_ref: &str) -> Result<Option<String>, LookupError> {
        (**self).description(source_ref)
    }

    fn refund_reason(&self, source_ref: &str) -> Result<Option<String>, LookupError> {
        (**self).refund_reason(source_ref)
    }

    fn product_label(&self, source_ref: &str) -> Result<Option<String>, LookupError> {
        (**self).product_label(source_ref)
    }
}

/// Offline lookup: knows nothing, so every name resolves to the fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLookup;

impl SourceLookup for NoLookup {}

// ── Mock lookup (tests) ───────────────────────────────────────────────────────

/// Table-driven lookup for tests. References listed in `failing` return an
/// error from every method.
#[derive(Debug, Default)]
pub struct MockLookup {
    pub names: HashMap<String, String>,
    pub descriptions: HashMap<String, String>,
    pub refund_reasons: HashMap<String, String>,
    pub product_labels: HashMap<String, String>,
    pub failing: HashSet<String>,
    calls: Cell<usize>,
}

impl MockLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, source_ref: &str, name: &str) -> Self {
        self.names.insert(source_ref.into(), name.into());
        self
    }

    pub fn with_description(mut self, source_ref: &str, text: &str) -> Self {
        self.descriptions.insert(source_ref.into(), text.into());
        self
    }

    pub fn with_refund_reason(mut self, source_ref: &str, code: &str) -> Self {
        self.refund_reasons.insert(source_ref.into(), code.into());
        self
    }

    pub fn with_product_label(mut self, source_ref: &str, label: &str) -> Self {
        self.product_labels.insert(source_ref.into(), label.into());
        self
    }

    pub fn failing_on(mut self, source_ref: &str) -> Self {
        self.failing.insert(source_ref.into());
        self
    }

    /// Number of lookups performed so far.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    fn get(&self, table: &HashMap<String, String>, source_ref: &str) -> Result<Option<String>, LookupError> {
        self.calls.set(self.calls.get() + 1);
        if self.failing.contains(source_ref) {
            return Err(LookupError::Http(format!("mock failure for {source_ref}")));
        }
        Ok(table.get(source_ref).cloned())
    }
}

impl SourceLookup for MockLookup {
    fn counterparty_name(&self, source_ref: &str) -> Result<Option<String>, LookupError> {
        self.get(&self.names, source_ref)
    }

    fn description(&self, source_ref: &str) -> Result<Option<String>, LookupError> {
        self.get(&self.descriptions, source_ref)
    }

    fn refund_reason(&self, source_ref: &str) -> Result<Option<String>, LookupError> {
        self.get(&self.refund_reasons, source_ref)
    }

    fn product_label(&self, source_ref: &str) -> Result<Option<String>, LookupError> {
        self.get(&self.product_labels, source_ref)
    }
}

// ── Resolver ──────────────────────────────────────────────────────────────────

/// Infallible front of a [`SourceLookup`]. Empty references skip the lookup,
/// failures are logged and replaced by the fallback (or `None`).
pub struct CounterpartyResolver<L: SourceLookup> {
    lookup: L,
    fallback_name: String,
}

impl<L: SourceLookup> CounterpartyResolver<L> {
    pub fn new(lookup: L, fallback_name: impl Into<String>) -> Self {
        Self {
            lookup,
            fallback_name: fallback_name.into(),
        }
    }

    /// The processor's legal name.
    pub fn fallback_name(&self) -> &str {
        &self.fallback_name
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    pub fn resolve(&self, source_ref: &str) -> String {
        self.absorb("counterparty", source_ref, |l, r| l.counterparty_name(r))
            .unwrap_or_else(|| self.fallback_name.clone())
    }

    pub fn description(&self, source_ref: &str) -> Option<String> {
        self.absorb("description", source_ref, |l, r| l.description(r))
    }

    pub fn refund_reason(&self, source_ref: &str) -> Option<String> {
        self.absorb("refund reason", source_ref, |l, r| l.refund_reason(r))
    }

    pub fn product_label(&self, source_ref: &str) -> Option<String> {
        self.absorb("product label", source_ref, |l, r| l.product_label(r))
    }

    fn absorb<F>(&self, what: &str, source_ref: &str, call: F) -> Option<String>
    where
        F: FnOnce(&L, &str) -> Result<Option<String>, LookupError>,
    {
        let source_ref = source_ref.trim();
        if source_ref.is_empty() {
            return None;
        }
        match call(&self.lookup, source_ref) {
            Ok(value) => value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            Err(e) => {
                tracing::warn!(source_ref, "{what} lookup failed: {e}");
                None
            }
        }
    }
}
