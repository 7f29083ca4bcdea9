pub mod date;
pub mod error;
pub mod label;
pub mod message;
pub mod transaction;

pub use date::{DateLocale, DateValue, INVALID_DATE};
pub use error::ExtractionError;
pub use label::{LabelParts, LabelRepresentations, LABEL_PREFIX};
pub use message::{RawMessage, ThreadBatch};
pub use transaction::{Currency, TransactionDate, TransactionRecord, TransactionType};
