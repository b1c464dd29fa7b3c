//! Command-line host for the SOOT client.
//!
//! Persists the session in a JSON file, reads clipboard snapshots from disk,
//! and prints every result as a structured envelope (see [`output`]).

pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod output;
pub mod snapshot;
