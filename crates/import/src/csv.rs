use lexbridge_core::RawTransaction;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::ImportError;

/// Rows shorter than this cannot carry a description and are rejected.
pub const MIN_COLUMNS: usize = 12;

/// Column positions in the balance-history export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeColumnMapping {
    pub id_column: usize,
    pub type_column: usize,
    pub source_column: usize,
    pub amount_column: usize,
    pub fee_column: usize,
    pub currency_column: usize,
    pub created_column: usize,
    pub available_on_column: usize,
    pub description_column: usize,
}

impl Default for StripeColumnMapping {
    fn default() -> Self {
        Self {
            id_column: 0,
            type_column: 1,
            source_column: 2,
            amount_column: 3,
            fee_column: 4,
            currency_column: 8,
            created_column: 9,
            available_on_column: 10,
            description_column: 11,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeCsvFormat {
    pub mapping: StripeColumnMapping,
    pub has_header: bool,
    pub delimiter: u8,
}

impl Default for StripeCsvFormat {
    fn default() -> Self {
        Self {
            mapping: StripeColumnMapping::default(),
            has_header: true,
            delimiter: b',',
        }
    }
}

pub struct StripeCsvReader;

impl StripeCsvReader {
    pub fn parse<R: Read>(
        reader: &mut csv::Reader<R>,
        format: &StripeCsvFormat,
    ) -> Result<Vec<RawTransaction>, ImportError> {
        let mut transactions = Vec::new();
        let m = &format.mapping;

        for result in reader.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();

            if record.iter().all(|field| field.trim().is_empty()) {
                tracing::warn!(line, columns = record.len(), "skipping blank row in balance history");
                continue;
            }

            if record.len() < MIN_COLUMNS {
                return Err(ImportError::MalformedRecord {
                    line,
                    columns: record.len(),
                });
            }

            let field = |col: usize| record.get(col).unwrap_or_default().trim().to_string();

            transactions.push(RawTransaction {
                id: field(m.id_column),
                kind: field(m.type_column).into(),
                source_ref: field(m.source_column),
                amount: field(m.amount_column),
                fee: field(m.fee_column),
                currency: field(m.currency_column),
                accounting_date: field(m.created_column),
                value_date: field(m.available_on_column),
                description: field(m.description_column),
            });
        }

        tracing::debug!(records = transactions.len(), "parsed balance history");
        Ok(transactions)
    }
}

pub fn import_csv<R: Read>(data: R, format: &StripeCsvFormat) -> Result<Vec<RawTransaction>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(format.has_header)
        .delimiter(format.delimiter)
        .flexible(true)
        .from_reader(data);

    StripeCsvReader::parse(&mut reader, format)
}

/// Reads a balance-history export from disk.
pub fn read_file(path: &Path) -> Result<Vec<RawTransaction>, ImportError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ImportError::MissingInputFile(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };
    let records = import_csv(BufReader::new(file), &StripeCsvFormat::default())?;
    tracing::info!(path = %path.display(), records = records.len(), "loaded balance history");
    Ok(records)
}
