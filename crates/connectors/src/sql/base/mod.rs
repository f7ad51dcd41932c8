pub mod destination;
pub mod dialect;
pub mod error;
pub mod metadata;
pub mod query;
pub mod source;
