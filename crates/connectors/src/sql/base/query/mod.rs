pub mod loader;
pub mod select;
