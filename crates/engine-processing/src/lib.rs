pub mod channel;
pub mod convert;
pub mod error;
pub mod extractor;
pub mod loader;
pub mod metrics;
pub mod splitter;
pub mod transformer;
