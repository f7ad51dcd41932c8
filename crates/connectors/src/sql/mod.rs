pub mod base;
pub mod mysql;
pub mod postgres;
