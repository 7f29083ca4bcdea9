/// Failures raised while extracting a record from a message body.
///
/// Any of these turns the message into a rejected one; they never abort an
/// ingestion pass.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExtractionError {
    #[error("Invalid number for {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
}
