//! Extractors Crate
//!
//! Pattern based parsers that turn bank notification bodies into
//! [`TransactionRecord`](shared_types::TransactionRecord) values, plus the
//! static registries describing which entity owns which parser.
//!
//! # Architecture
//!
//! - **Types**: records, labels and dates live in the `shared-types` crate
//! - **Contract**: [`TransactionParser`] is implemented by every rule set
//! - **Implementations**: one module per entity, one parser per message kind
//!
//! # Example
//!
//! ```rust,ignore
//! use extractors::{banco_estado::PurchaseParser, ParseContext, TransactionParser};
//!
//! let parser = PurchaseParser::new();
//! let record = parser.parse(&message, &ParseContext::default())?;
//! ```

pub mod banco_estado;
pub mod formatters;
pub mod parser;
pub mod registry;

pub use parser::{ParseContext, ParserIdentity, TransactionParser};
pub use registry::{default_countries, Country, Entity, EntityInfo};
