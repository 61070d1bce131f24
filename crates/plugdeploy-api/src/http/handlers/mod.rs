//! Route handlers.

pub mod health;
pub mod plugin;
pub mod webhook;
