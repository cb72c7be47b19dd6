use thiserror::Error;

/// Fatal input problems. Any of these aborts the whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    #[error("Malformed amount '{value}' in record {record}")]
    MalformedAmount { record: String, value: String },
    #[error("Malformed date '{value}' in record {record} (expected YYYY-MM-DD HH:MM)")]
    MalformedDate { record: String, value: String },
}
