pub mod actions;
pub mod config;
pub mod helpers;
pub mod integrations;
pub mod jobs;

pub use helpers::query_builder::{ParserBinding, QueryBuilder, RoutingError, SearchQuery};
pub use jobs::ingestion::{Email, IngestionEngine, IngestionReport};
