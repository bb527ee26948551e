//! Apple SPI Topcase Protocol
//!
//! This crate defines the wire format spoken by the combined keyboard,
//! trackpad and backlight controller found behind one SPI chip select on
//! 2015-2017 MacBooks. Three logical devices share the bus; every
//! exchange moves one fixed-size packet carrying one message.
//!
//! # Packet Layout
//!
//! ```text
//! ┌─────┬────────┬────────┬───────────┬────────┬──────────────────────┬──────────┐
//! │ DIR │ DEVICE │ OFFSET │ REMAINING │ LENGTH │ DATA                 │ CHECKSUM │
//! │ 1B  │ 1B     │ 2B     │ 2B        │ 2B     │ 246B                 │ 2B       │
//! └─────┴────────┴────────┴───────────┴────────┴──────────────────────┴──────────┘
//!                                               │
//!                      ┌────────────────────────┘
//!                      ▼
//!              ┌────────┬─────────────┬─────────┐
//!              │ HEADER │ PAYLOAD     │ MSG CRC │
//!              │ 8B     │ 0–236B      │ 2B      │
//!              └────────┴─────────────┴─────────┘
//! ```
//!
//! Both checksums are CRC-16 (poly 0x8005, reflected). All integers are
//! little-endian.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod crc;
pub mod message;
pub mod packet;
pub mod payload;

pub use crc::crc16;
pub use message::{HostCommand, Message};
pub use packet::{raw_direction, DeviceId, Direction, FrameError, MessageHeader, Packet, PACKET_SIZE};
pub use payload::{BacklightCommand, Finger, InfoReport, KeyboardReport, TouchReport};
