pub mod builder;
pub mod classifier;
pub mod description;
pub mod export;
pub mod fees;

pub use builder::{BatchSummary, Ledger, LedgerRowBuilder};
pub use classifier::{Classification, RowClassifier};
pub use description::{DescriptionContext, DescriptionSynthesizer, RefundReason, REVENUE_LABEL};
pub use export::{write_file, write_rows, ExportError};
pub use fees::{FeeAggregator, FeeBucket, FeeCategory};
