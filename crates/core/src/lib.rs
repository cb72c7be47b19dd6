pub mod error;
pub mod ledger;
pub mod lookup;
pub mod money;
pub mod period;
pub mod profile;
pub mod transaction;

pub use error::ConvertError;
pub use ledger::{LedgerRow, RowOrigin};
pub use lookup::{CounterpartyResolver, LookupError, MockLookup, NoLookup, SourceLookup};
pub use money::{Money, MoneyError};
pub use period::{DateRange, YearMonth};
pub use profile::{ColumnSet, DescriptionMode, FeeScheme, NumberStyle, Profile, ProfileError};
pub use transaction::{parse_source_date, RawTransaction, TransactionType, SOURCE_DATE_FORMAT};

/// Legal name of the payment processor, used whenever a counterparty cannot
/// be resolved.
pub const DEFAULT_PROCESSOR_NAME: &str = "Stripe Technology Europe, Limited";
