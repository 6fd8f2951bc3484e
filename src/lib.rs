#![forbid(unsafe_code)]

//! cleevio-tempo-cli: an interactive terminal list of Tempo trackers with
//! Jira issue lookup.
//!
//! The crate is layered leaves first:
//! 1. **Tracking** ([`tracking`]): elapsed-time arithmetic, the hidden offset
//!    tag stored in descriptions, and the pull reconciliation state machine
//! 2. **Interactive list** ([`tui`]): key decoding, focus locks, widgets and a
//!    pure `update` function, driven by a crossterm event loop
//! 3. **Collaborators** ([`api`]): Tempo and Jira behind narrow traits
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use cleevio_tempo_cli::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use cleevio_tempo_cli::core::config::Config;
//! use cleevio_tempo_cli::tracking::timecode::{decode_offset, encode_offset};
//! ```

pub mod prelude;

pub mod api;
pub mod core;
pub mod logger;
pub mod tracking;
pub mod tui;
