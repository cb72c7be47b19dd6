//! Blocking client for the processor's REST API.
//!
//! Lists balance transactions for a date window and implements
//! [`SourceLookup`] against the charge, customer, refund and invoice
//! endpoints.

use chrono::DateTime;
use lexbridge_core::{DateRange, LookupError, Money, RawTransaction, SourceLookup, SOURCE_DATE_FORMAT};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::ImportError;

pub const API_BASE: &str = "https://api.stripe.com";

/// Maximum page size the listing endpoint accepts.
pub const PAGE_LIMIT: u32 = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct ListPage<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BalanceTransaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub source: Option<String>,
    pub amount: i64,
    pub fee: i64,
    pub currency: String,
    pub created: i64,
    pub available_on: i64,
    pub description: Option<String>,
}

impl BalanceTransaction {
    pub fn into_raw(self) -> RawTransaction {
        RawTransaction {
            id: self.id,
            kind: self.kind.into(),
            source_ref: self.source.unwrap_or_default(),
            amount: Money::format_minor(self.amount),
            fee: Money::format_minor(self.fee),
            currency: self.currency,
            accounting_date: format_timestamp(self.created),
            value_date: format_timestamp(self.available_on),
            description: self.description.unwrap_or_default(),
        }
    }
}

/// Unix seconds rendered as UTC in the export's date layout.
pub fn format_timestamp(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.naive_utc().format(SOURCE_DATE_FORMAT).to_string())
        .unwrap_or_default()
}

/// Either a bare id or the expanded object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Expandable<T> {
    Object(T),
    Id(IgnoredAny),
}

impl<T> Expandable<T> {
    fn object(&self) -> Option<&T> {
        match self {
            Expandable::Object(obj) => Some(obj),
            Expandable::Id(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct BillingDetails {
    name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Customer {
    name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct InvoiceLine {
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Invoice {
    lines: Option<ListPage<InvoiceLine>>,
}

#[derive(Debug, Clone, Deserialize)]
struct Charge {
    description: Option<String>,
    #[serde(default)]
    billing_details: BillingDetails,
    customer: Option<Expandable<Customer>>,
    invoice: Option<Expandable<Invoice>>,
}

impl Charge {
    fn payer_name(&self) -> Option<String> {
        self.billing_details
            .name
            .clone()
            .or_else(|| self.customer.as_ref()?.object()?.name.clone())
    }

    fn product_label(&self) -> Option<String> {
        let invoice = self.invoice.as_ref()?.object()?;
        invoice.lines.as_ref()?.data.first()?.description.clone()
    }
}

#[derive(Debug, Clone, Deserialize)]
struct Refund {
    reason: Option<String>,
    charge: Option<String>,
}

/// Object family of a source reference, by id prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceKind {
    Charge,
    Refund,
    Other,
}

impl SourceKind {
    fn of(source_ref: &str) -> Self {
        match source_ref.split('_').next() {
            Some("ch" | "py") => SourceKind::Charge,
            Some("re" | "pyr") => SourceKind::Refund,
            _ => SourceKind::Other,
        }
    }
}

/// Drains a cursor-paginated listing, preserving delivery order.
fn paginate<F>(mut fetch: F) -> Result<Vec<BalanceTransaction>, LookupError>
where
    F: FnMut(Option<&str>) -> Result<ListPage<BalanceTransaction>, LookupError>,
{
    let mut all: Vec<BalanceTransaction> = Vec::new();
    loop {
        let cursor = all.last().map(|tx| tx.id.clone());
        let page = fetch(cursor.as_deref())?;
        let has_more = page.has_more && !page.data.is_empty();
        all.extend(page.data);
        if !has_more {
            return Ok(all);
        }
    }
}

/// Charges and refunds are fetched once per id; several lookups for the same
/// record share one request.
pub struct StripeClient {
    http: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    charges: RefCell<HashMap<String, Charge>>,
    refunds: RefCell<HashMap<String, Refund>>,
}

impl StripeClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, ImportError> {
        let http = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: API_BASE.to_string(),
            api_key: api_key.into(),
            charges: RefCell::default(),
            refunds: RefCell::default(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, LookupError> {
        let url = format!("{}/v1/{}", self.base_url.trim_end_matches('/'), path);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .query(query)
            .send()
            .map_err(|e| LookupError::Http(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LookupError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            return Err(LookupError::Status {
                status: status.as_u16(),
                object: path.to_string(),
            });
        }

        response.json::<T>().map_err(|e| LookupError::Decode {
            object: path.to_string(),
            reason: e.to_string(),
        })
    }

    /// Every balance transaction created inside `range`, in delivery order.
    pub fn list_balance_transactions(&self, range: DateRange) -> Result<Vec<RawTransaction>, ImportError> {
        tracing::info!(%range, "listing balance transactions");
        let base_query = [
            ("created[gte]", range.start_timestamp().to_string()),
            ("created[lte]", range.end_timestamp().to_string()),
            ("limit", PAGE_LIMIT.to_string()),
        ];

        let listed = paginate(|cursor| {
            let mut query = base_query.to_vec();
            if let Some(after) = cursor {
                query.push(("starting_after", after.to_string()));
            }
            let page: ListPage<BalanceTransaction> = self.get("balance_transactions", &query)?;
            tracing::debug!(count = page.data.len(), has_more = page.has_more, "fetched page");
            Ok(page)
        })?;

        tracing::info!(records = listed.len(), "balance transactions listed");
        Ok(listed.into_iter().map(BalanceTransaction::into_raw).collect())
    }

    fn charge(&self, id: &str) -> Result<Charge, LookupError> {
        if let Some(hit) = self.charges.borrow().get(id) {
            return Ok(hit.clone());
        }
        let charge: Charge = self.get(
            &format!("charges/{id}"),
            &[
                ("expand[]", "customer".to_string()),
                ("expand[]", "invoice".to_string()),
            ],
        )?;
        self.charges.borrow_mut().insert(id.to_string(), charge.clone());
        Ok(charge)
    }

    fn refund(&self, id: &str) -> Result<Refund, LookupError> {
        if let Some(hit) = self.refunds.borrow().get(id) {
            return Ok(hit.clone());
        }
        let refund: Refund = self.get(&format!("refunds/{id}"), &[])?;
        self.refunds.borrow_mut().insert(id.to_string(), refund.clone());
        Ok(refund)
    }
}

impl SourceLookup for StripeClient {
    fn counterparty_name(&self, source_ref: &str) -> Result<Option<String>, LookupError> {
        match SourceKind::of(source_ref) {
            SourceKind::Charge => Ok(self.charge(source_ref)?.payer_name()),
            SourceKind::Refund => match self.refund(source_ref)?.charge {
                Some(charge) => Ok(self.charge(&charge)?.payer_name()),
                None => Ok(None),
            },
            SourceKind::Other => Ok(None),
        }
    }

    fn description(&self, source_ref: &str) -> Result<Option<String>, LookupError> {
        match SourceKind::of(source_ref) {
            SourceKind::Charge => Ok(self.charge(source_ref)?.description),
            _ => Ok(None),
        }
    }

    fn refund_reason(&self, source_ref: &str) -> Result<Option<String>, LookupError> {
        match SourceKind::of(source_ref) {
            SourceKind::Refund => Ok(self.refund(source_ref)?.reason),
            _ => Ok(None),
        }
    }

    fn product_label(&self, source_ref: &str) -> Result<Option<String>, LookupError> {
        match SourceKind::of(source_ref) {
            SourceKind::Charge => Ok(self.charge(source_ref)?.product_label()),
            _ => Ok(None),
        }
    }
}
