pub mod csv;
pub mod error;
pub mod stripe;

pub use csv::{import_csv, read_file, StripeColumnMapping, StripeCsvFormat, StripeCsvReader, MIN_COLUMNS};
pub use error::ImportError;
pub use stripe::{format_timestamp, BalanceTransaction, ListPage, StripeClient, API_BASE, PAGE_LIMIT};
