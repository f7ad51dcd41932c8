pub mod adapter;
pub mod data_type;
pub mod metadata;
pub mod params;
pub mod probe;
pub mod source;
