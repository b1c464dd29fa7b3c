//! Wire types for the SOOT client.
//!
//! This crate contains the serde-serializable shapes exchanged with the auth
//! backend, carried on the clipboard by the SOOT desktop app, and submitted to
//! the mash backend. These types represent the "protocol layer" - the shapes of
//! data as they appear on the wire.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! - **Pure data**: No behavior beyond serialization and flattening
//! - **1:1 with the wire**: Field names match the JSON the services emit
//! - **Transport-free**: No HTTP, clipboard, or storage access
//!
//! Session handling and correlation are built on top of these types in `soot`.

pub mod auth_exchange;
pub mod clipboard;
pub mod mash;

pub use auth_exchange::*;
pub use clipboard::*;
pub use mash::*;
