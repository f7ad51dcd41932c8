pub mod adapter;
pub mod data_type;
pub mod loader;
pub mod metadata;
pub mod params;
pub mod utils;
