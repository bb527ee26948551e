//! Driver core for the SPI topcase controller of MacBooks
//!
//! The controller multiplexes keyboard, trackpad and device information
//! over one SPI link. This crate contains everything above the bus:
//!
//! - Collaborator traits (transport, keyboard and trackpad sinks)
//! - Outbound write queue with a single write in flight
//! - Keyboard and trackpad decoders
//! - Message dispatch and the interrupt driven driver instance
//! - Configuration and the static key and calibration tables
//!
//! The wire format lives in `topcase-protocol`.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod config;
pub mod dispatch;
pub mod driver;
pub mod keyboard;
pub mod queue;
pub mod trackpad;
pub mod traits;

#[cfg(test)]
mod testing;

pub use config::TopcaseConfig;
pub use driver::{BacklightInfo, BacklightKind, DriverStatus, Topcase};
pub use queue::{OutboundQueue, QueueState, WriteError, QUEUE_CAPACITY};
pub use trackpad::TrackpadStatus;
