pub mod options;
pub mod resolve;
pub mod validated;
