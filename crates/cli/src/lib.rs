//! Command-line dashboard for a filedash storage backend.
//!
//! The binary is a thin shell over [`filedash`]: it resolves a profile,
//! restores the stored session and prints one result envelope per command.

pub mod cli;
pub mod commands;
pub mod context_store;
pub mod error;
pub mod logging;
pub mod output;
pub mod styles;
pub mod terminal;
