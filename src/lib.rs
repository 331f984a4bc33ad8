//! Library crate for user-panel.
//!
//! This crate exposes the building blocks of the TUI:
//! - Application state, screen operations and update loop (`app`)
//! - Command line, file locations and logging (`config`)
//! - Error and result types (`error`)
//! - Cached access to the user list (`query`)
//! - The local user table (`store`)
//! - Form rules (`validation`)
//! - UI rendering and widgets (`ui`)
//!
//! It is used by the `user-panel` binary and by tests.
#![doc = include_str!("../README.md")]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod app;
pub mod config;
pub mod error;
pub mod query;
pub mod store;
pub mod ui;
pub mod validation;

// Re-export commonly used items at the crate root for convenience
/// Convenient error and result types shared across the crate.
pub use error::{DynError, Result};
