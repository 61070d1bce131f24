//! Pipeline services wiring the components together.

pub mod deploy;
pub mod webhook;
