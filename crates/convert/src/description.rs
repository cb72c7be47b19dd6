//! Booking texts for ledger rows.
//!
//! Regenerated types always get a canonical text built from date, amount and
//! counterparty. Other types keep the source text when there is one, then try
//! the source object's own description, and only then fall back to the
//! template.

use chrono::NaiveDateTime;
use lexbridge_core::{CounterpartyResolver, DescriptionMode, Money, SourceLookup, TransactionType};

/// Fixed label for untitled incoming amounts in the legacy reports.
pub const REVENUE_LABEL: &str = "Umsatz";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefundReason {
    Duplicate,
    Fraudulent,
    RequestedByCustomer,
    ExpiredUncapturedCharge,
    Unspecified,
}

impl RefundReason {
    pub fn from_code(code: Option<&str>) -> Self {
        match code.map(str::trim) {
            Some("duplicate") => RefundReason::Duplicate,
            Some("fraudulent") => RefundReason::Fraudulent,
            Some("requested_by_customer") => RefundReason::RequestedByCustomer,
            Some("expired_uncaptured_charge") => RefundReason::ExpiredUncapturedCharge,
            _ => RefundReason::Unspecified,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RefundReason::Duplicate => "doppelte Zahlung",
            RefundReason::Fraudulent => "betrügerische Zahlung",
            RefundReason::RequestedByCustomer => "auf Kundenwunsch",
            RefundReason::ExpiredUncapturedCharge => "abgelaufene, nicht erfasste Zahlung",
            RefundReason::Unspecified => "Rückerstattung",
        }
    }
}

/// Per-type template entry.
struct TypeTemplate {
    /// Ignore the source text and always use the template.
    regenerate: bool,
    phrase: String,
    preposition: &'static str,
}

fn template_for(kind: &TransactionType) -> TypeTemplate {
    let t = |regenerate, phrase: &str, preposition| TypeTemplate {
        regenerate,
        phrase: phrase.to_string(),
        preposition,
    };
    match kind {
        TransactionType::Charge => t(false, "Kartenzahlung", "von"),
        TransactionType::Payment => t(false, "Zahlung", "von"),
        TransactionType::Refund => t(true, "Rückerstattung", "an"),
        TransactionType::PaymentFailureRefund => t(true, "Rückbuchung fehlgeschlagener Zahlung", "von"),
        TransactionType::Payout => t(true, "Auszahlung", "an"),
        TransactionType::StripeFee => t(true, "Stripe Gebühren", "an"),
        TransactionType::ApplicationFee => t(true, "Plattformgebühr", "von"),
        TransactionType::Other(tag) => t(false, &format!("Buchung ({tag})"), "mit"),
    }
}

/// Everything the synthesizer may draw on for one record.
#[derive(Debug, Clone, Copy)]
pub struct DescriptionContext<'a> {
    pub kind: &'a TransactionType,
    pub amount: Money,
    pub currency: &'a str,
    pub counterparty: &'a str,
    pub accounting_date: NaiveDateTime,
    pub raw_description: &'a str,
    pub source_ref: &'a str,
}

#[derive(Debug, Clone, Copy)]
pub struct DescriptionSynthesizer {
    mode: DescriptionMode,
}

impl DescriptionSynthesizer {
    pub fn new(mode: DescriptionMode) -> Self {
        Self { mode }
    }

    pub fn describe<L: SourceLookup>(
        &self,
        ctx: &DescriptionContext<'_>,
        resolver: &CounterpartyResolver<L>,
    ) -> String {
        match self.mode {
            DescriptionMode::LegacySimple => legacy(ctx),
            DescriptionMode::Templated => templated(ctx, resolver),
        }
    }
}

fn legacy(ctx: &DescriptionContext<'_>) -> String {
    if ctx.raw_description.trim().is_empty() && ctx.amount.is_positive() {
        REVENUE_LABEL.to_string()
    } else {
        ctx.raw_description.to_string()
    }
}

fn templated<L: SourceLookup>(ctx: &DescriptionContext<'_>, resolver: &CounterpartyResolver<L>) -> String {
    let template = template_for(ctx.kind);

    if !template.regenerate {
        if !ctx.raw_description.trim().is_empty() {
            return ctx.raw_description.to_string();
        }
        if let Some(text) = resolver.description(ctx.source_ref) {
            return text;
        }
    }

    let mut text = format!(
        "{} {} {} am {} über {} {}",
        template.phrase,
        template.preposition,
        ctx.counterparty,
        ctx.accounting_date.format("%d.%m.%Y"),
        ctx.amount.abs().to_localized(),
        ctx.currency,
    );

    match ctx.kind {
        TransactionType::Refund => {
            let reason = RefundReason::from_code(resolver.refund_reason(ctx.source_ref).as_deref());
            text.push_str(&format!(" ({})", reason.label()));
        }
        _ if !template.regenerate => {
            if let Some(label) = resolver.product_label(ctx.source_ref) {
                text.push_str(" - ");
                text.push_str(&label);
            }
        }
        _ => {}
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexbridge_core::{parse_source_date, MockLookup, NoLookup};

    const STRIPE: &str = "Stripe Technology Europe, Limited";

    fn ctx<'a>(kind: &'a TransactionType, amount: &str, raw: &'a str) -> DescriptionContext<'a> {
        DescriptionContext {
            kind,
            amount: Money::parse_localized(amount).unwrap(),
            currency: "EUR",
            counterparty: "Jane Doe",
            accounting_date: parse_source_date("2024-01-05 10:00").unwrap(),
            raw_description: raw,
            source_ref: "src_1",
        }
    }

    fn templated_with(lookup: MockLookup) -> (DescriptionSynthesizer, CounterpartyResolver<MockLookup>) {
        (
            DescriptionSynthesizer::new(DescriptionMode::Templated),
            CounterpartyResolver::new(lookup, STRIPE),
        )
    }

    #[test]
    fn charge_keeps_source_text() {
        let (s, r) = templated_with(MockLookup::new());
        let kind = TransactionType::Charge;
        assert_eq!(s.describe(&ctx(&kind, "50,00", "Invoice 42"), &r), "Invoice 42");
        assert_eq!(r.lookup().calls(), 0);
    }

    #[test]
    fn charge_without_text_uses_source_object_description() {
        let (s, r) = templated_with(MockLookup::new().with_description("src_1", "Pro plan"));
        let kind = TransactionType::Charge;
        assert_eq!(s.describe(&ctx(&kind, "50,00", ""), &r), "Pro plan");
    }

    #[test]
    fn charge_without_any_text_is_synthesized() {
        let (s, r) = templated_with(MockLookup::new());
        let kind = TransactionType::Charge;
        assert_eq!(
            s.describe(&ctx(&kind, "50,00", ""), &r),
            "Kartenzahlung von Jane Doe am 05.01.2024 über 50,00 EUR"
        );
    }

    #[test]
    fn synthesized_text_appends_product_label() {
        let (s, r) = templated_with(MockLookup::new().with_product_label("src_1", "Team license"));
        let kind = TransactionType::Payment;
        assert_eq!(
            s.describe(&ctx(&kind, "19,99", "  "), &r),
            "Zahlung von Jane Doe am 05.01.2024 über 19,99 EUR - Team license"
        );
    }

    #[test]
    fn refund_is_always_regenerated_with_reason() {
        let (s, r) = templated_with(MockLookup::new().with_refund_reason("src_1", "requested_by_customer"));
        let kind = TransactionType::Refund;
        assert_eq!(
            s.describe(&ctx(&kind, "-20,00", "REFUND FOR CHARGE"), &r),
            "Rückerstattung an Jane Doe am 05.01.2024 über 20,00 EUR (auf Kundenwunsch)"
        );
    }

    #[test]
    fn refund_with_unknown_reason_uses_generic_phrase() {
        let (s, r) = templated_with(MockLookup::new().with_refund_reason("src_1", "something_new"));
        let kind = TransactionType::Refund;
        assert!(s.describe(&ctx(&kind, "-20,00", ""), &r).ends_with("(Rückerstattung)"));
    }

    #[test]
    fn payout_ignores_source_text() {
        let (s, r) = templated_with(MockLookup::new());
        let kind = TransactionType::Payout;
        assert_eq!(
            s.describe(&ctx(&kind, "-1.234,50", "STRIPE PAYOUT"), &r),
            "Auszahlung an Jane Doe am 05.01.2024 über 1234,50 EUR"
        );
    }

    #[test]
    fn regenerated_types_never_append_product_label() {
        let (s, r) = templated_with(MockLookup::new().with_product_label("src_1", "Team license"));
        let kind = TransactionType::ApplicationFee;
        let text = s.describe(&ctx(&kind, "3,00", ""), &r);
        assert!(text.starts_with("Plattformgebühr von Jane Doe"));
        assert!(!text.contains("Team license"));
    }

    #[test]
    fn unknown_type_uses_generic_template() {
        let (s, r) = templated_with(MockLookup::new());
        let kind = TransactionType::parse("adjustment");
        assert_eq!(
            s.describe(&ctx(&kind, "-1,00", ""), &r),
            "Buchung (adjustment) mit Jane Doe am 05.01.2024 über 1,00 EUR"
        );
    }

    #[test]
    fn lookup_failures_degrade_to_template() {
        let (s, r) = templated_with(
            MockLookup::new()
                .with_description("src_1", "never seen")
                .failing_on("src_1"),
        );
        let kind = TransactionType::Charge;
        assert_eq!(
            s.describe(&ctx(&kind, "50,00", ""), &r),
            "Kartenzahlung von Jane Doe am 05.01.2024 über 50,00 EUR"
        );
    }

    #[test]
    fn legacy_mode_labels_untitled_revenue() {
        let s = DescriptionSynthesizer::new(DescriptionMode::LegacySimple);
        let r = CounterpartyResolver::new(NoLookup, STRIPE);
        let kind = TransactionType::Charge;
        assert_eq!(s.describe(&ctx(&kind, "10,00", ""), &r), REVENUE_LABEL);
        assert_eq!(s.describe(&ctx(&kind, "10,00", "Kept"), &r), "Kept");
        assert_eq!(s.describe(&ctx(&kind, "-10,00", ""), &r), "");
        let payout = TransactionType::Payout;
        assert_eq!(s.describe(&ctx(&payout, "-10,00", "STRIPE PAYOUT"), &r), "STRIPE PAYOUT");
    }

    #[test]
    fn refund_reason_codes() {
        assert_eq!(RefundReason::from_code(Some("duplicate")), RefundReason::Duplicate);
        assert_eq!(RefundReason::from_code(Some("fraudulent")), RefundReason::Fraudulent);
        assert_eq!(RefundReason::from_code(None), RefundReason::Unspecified);
        assert_eq!(RefundReason::Unspecified.label(), "Rückerstattung");
    }
}
