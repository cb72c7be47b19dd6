use lexbridge_core::{ColumnSet, LedgerRow, Money, NumberStyle, Profile};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

pub const LEXOFFICE_HEADER: [&str; 7] = [
    "Buchungsdatum",
    "Auftraggeber / Empfänger",
    "Verwendungszweck",
    "Betrag",
    "Soll Betrag (Ausgabe)",
    "Haben Betrag (Einnahme)",
    "Wertstellungsdatum",
];

pub const RAW_HEADER: [&str; 8] = [
    "id",
    "type",
    "source",
    "amount",
    "customer",
    "accounting_date",
    "value_date",
    "description",
];

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Could not move finished export into place: {0}")]
    Persist(#[from] tempfile::PersistError),
}

fn number(value: Money, style: NumberStyle) -> String {
    match style {
        NumberStyle::Canonical => value.to_canonical(),
        NumberStyle::Localized => value.to_localized(),
    }
}

fn optional_number(value: Option<Money>, style: NumberStyle) -> String {
    value.map(|m| number(m, style)).unwrap_or_default()
}

/// Writes header and rows as `;`-separated UTF-8.
pub fn write_rows<W: Write>(out: W, rows: &[LedgerRow], profile: &Profile) -> Result<(), ExportError> {
    let mut writer = csv::WriterBuilder::new().delimiter(b';').from_writer(out);
    let style = profile.numbers;

    match profile.columns {
        ColumnSet::Lexoffice => {
            writer.write_record(LEXOFFICE_HEADER)?;
            for row in rows {
                writer.write_record([
                    row.booking_date.as_str(),
                    row.counterparty.as_str(),
                    row.description.as_str(),
                    number(row.amount, style).as_str(),
                    optional_number(row.debit_amount, style).as_str(),
                    optional_number(row.credit_amount, style).as_str(),
                    row.value_date.as_str(),
                ])?;
            }
        }
        ColumnSet::Raw => {
            writer.write_record(RAW_HEADER)?;
            for row in rows {
                writer.write_record([
                    row.reference.as_str(),
                    row.kind.as_str(),
                    row.source_ref.as_str(),
                    number(row.amount, style).as_str(),
                    row.counterparty.as_str(),
                    row.booking_date.as_str(),
                    row.value_date.as_str(),
                    row.description.as_str(),
                ])?;
            }
        }
    }

    writer.flush()?;
    Ok(())
}

/// Writes into a temporary file next to `path` and renames it on success,
/// so a failed run never leaves a partial export behind.
pub fn write_file(path: &Path, rows: &[LedgerRow], profile: &Profile) -> Result<(), ExportError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    write_rows(tmp.as_file_mut(), rows, profile)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    tracing::info!(path = %path.display(), rows = rows.len(), "export written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexbridge_core::RowOrigin;

    fn rows() -> Vec<LedgerRow> {
        vec![
            LedgerRow::new(
                RowOrigin::new("ch_1", "charge", "src_1"),
                "2024-01-05 10:00",
                "2024-01-05 12:00",
                "Jane Doe",
                "Kartenzahlung; Pro",
                Money::from_cents(5000),
            ),
            LedgerRow::new(
                RowOrigin::new("ch_1_fee", "Kontoführungsgebühr", "src_1_fee"),
                "2024-01-05 10:00",
                "2024-01-05 12:00",
                "Stripe Technology Europe, Limited",
                "Gebühren für Zahlung ch_1 -- Pro",
                Money::from_cents(-250),
            ),
        ]
    }

    fn render(profile: &Profile) -> String {
        let mut buf = Vec::new();
        write_rows(&mut buf, &rows(), profile).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn lexoffice_layout_with_canonical_numbers() {
        let out = render(&Profile::default());
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(
            lines[0],
            "Buchungsdatum;Auftraggeber / Empfänger;Verwendungszweck;Betrag;Soll Betrag (Ausgabe);Haben Betrag (Einnahme);Wertstellungsdatum"
        );
        assert_eq!(
            lines[1],
            "2024-01-05 10:00;Jane Doe;\"Kartenzahlung; Pro\";50.00;;50.00;2024-01-05 12:00"
        );
        assert_eq!(
            lines[2],
            "2024-01-05 10:00;Stripe Technology Europe, Limited;Gebühren für Zahlung ch_1 -- Pro;-2.50;2.50;;2024-01-05 12:00"
        );
    }

    #[test]
    fn legacy_layout_uses_localized_numbers() {
        let out = render(&Profile::preset("lexoffice-legacy").unwrap());
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(
            lines[2],
            "2024-01-05 10:00;Stripe Technology Europe, Limited;Gebühren für Zahlung ch_1 -- Pro;-2,50;2,50;;2024-01-05 12:00"
        );
    }

    #[test]
    fn raw_layout_has_eight_columns() {
        let out = render(&Profile::preset("raw").unwrap());
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines[0], "id;type;source;amount;customer;accounting_date;value_date;description");
        assert_eq!(
            lines[2],
            "ch_1_fee;Kontoführungsgebühr;src_1_fee;-2.50;Stripe Technology Europe, Limited;2024-01-05 10:00;2024-01-05 12:00;Gebühren für Zahlung ch_1 -- Pro"
        );
    }

    #[test]
    fn write_file_replaces_target_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");
        std::fs::write(&path, "stale").unwrap();
        write_file(&path, &rows(), &Profile::default()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("Buchungsdatum;"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn identical_rows_render_identical_bytes() {
        let p = Profile::default();
        assert_eq!(render(&p), render(&p));
    }
}
