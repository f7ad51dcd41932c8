#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod sql;
