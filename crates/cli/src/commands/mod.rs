//! Subcommand implementations.

pub mod chat;
pub mod list;
pub mod onboard;
