pub mod executor;
pub mod job;
pub mod report;
pub mod workers;
