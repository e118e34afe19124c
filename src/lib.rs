//! signwatch: turns monitoring-bot sign lines into typed events and relays
//! them to webhook destinations.
//!
//! Flow: raw line → [`classifier`] → [`event::Event`] → [`filters`] (per
//! route) → [`transports`] → [`formats`] → sink.
//!
//! See `DESIGN.md` for architecture notes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod diagnostics;
pub mod event;
pub mod logging;

pub mod classifier;
pub mod filters;
pub mod formats;
pub mod transports;

pub mod dispatch;
pub mod relay;
