//! In-process endpoints backed by vectors. They implement the same traits
//! as the SQL connectors and count open handles so callers can check that
//! every handle was closed.

pub mod destination;
pub mod source;
