//! Interactive tracker list.
//!
//! The pure layers (`keys`, `focus`, `widgets`, `picker`, `model`, `input`,
//! `update`) have no terminal dependency and are always built. Rendering and
//! the event loop need the `tui` feature.

#![allow(missing_docs)]

pub mod focus;
pub mod input;
pub mod keys;
pub mod model;
pub mod picker;
pub mod update;
pub mod widgets;

#[cfg(feature = "tui")]
pub mod render;
#[cfg(feature = "tui")]
pub mod runtime;
#[cfg(feature = "tui")]
pub mod signals;
#[cfg(feature = "tui")]
pub mod terminal_guard;

#[cfg(test)]
mod test_properties;
#[cfg(all(test, feature = "tui"))]
mod test_scenarios;

#[cfg(feature = "tui")]
pub use runtime::{RuntimeConfig, Services, run};
