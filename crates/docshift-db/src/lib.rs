pub mod applied_log;
pub mod document_store;

pub use applied_log::{AppliedLog, AppliedRecord, CollectionLog};
pub use document_store::{DocumentStore, UpdateOutcome, validate_collection_name};
