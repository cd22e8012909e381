//! tunebot library crate.
//!
//! The coordinator core of a chat-platform music bot: lifecycle, shutdown,
//! presence and provider credentials. The platform connection itself is
//! supplied by the host through the traits in [`gateway`].

pub mod audio;
pub mod bot;
pub mod config;
pub mod credentials;
pub mod error;
pub mod gateway;
pub mod listener;
pub mod logging;
pub mod panic_hook;
pub mod playlist;
pub mod scheduler;
pub mod utils;
pub mod waiter;

pub use bot::{Bot, LifecycleState, ShutdownOutcome};
pub use error::{Error, Result};
