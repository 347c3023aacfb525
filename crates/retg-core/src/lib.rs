//! Core of the reTGanslator bot: the chat hierarchy, tag routing and tag
//! suggestions.
//!
//! This crate is framework-agnostic. Telegram lives behind the
//! [`messaging::port::MessagingSink`] port, implemented in the adapter crate.

pub mod config;
pub mod domain;
pub mod errors;
pub mod handler;
pub mod logging;
pub mod membership;
pub mod messaging;
pub mod routing;
pub mod suggest;
pub mod tags;
pub mod tree;

pub use errors::{Error, Result};
