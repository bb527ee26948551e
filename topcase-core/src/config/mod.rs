//! Configuration types
//!
//! Driver settings plus the static tables the decoders consult.

pub mod keymap;
pub mod models;

use heapless::String;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use keymap::{hid_to_key, KeyCode};
pub use models::{find_model, Bounds, TrackpadModel, TRACKPAD_MODELS};

/// Maximum input device name length
pub const MAX_NAME_LEN: usize = 48;

/// USB vendor id reported for both input devices
pub const APPLE_VENDOR_ID: u16 = 0x05AC;

/// Model assumed when the info channel reports an unknown one
pub const DEFAULT_FALLBACK_MODEL: u8 = 4;

/// Driver configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TopcaseConfig {
    /// Keyboard input device name
    pub keyboard_name: String<MAX_NAME_LEN>,
    /// Trackpad input device name
    pub trackpad_name: String<MAX_NAME_LEN>,
    /// Vendor id reported with both input devices
    pub vendor_id: u16,
    /// Model used for calibration when the reported one is unknown
    pub fallback_model: u8,
    /// Log every received packet at trace level
    pub trace_packets: bool,
}

impl Default for TopcaseConfig {
    fn default() -> Self {
        Self {
            keyboard_name: name("Apple MacBook SPI Topcase Keyboard"),
            trackpad_name: name("Apple MacBook SPI Topcase Trackpad"),
            vendor_id: APPLE_VENDOR_ID,
            fallback_model: DEFAULT_FALLBACK_MODEL,
            trace_packets: false,
        }
    }
}

impl TopcaseConfig {
    /// Calibration for `id`, or the fallback model when `id` is unknown
    ///
    /// Returns `None` only if the fallback itself is not in the table.
    pub fn model_or_fallback(&self, id: u8) -> Option<&'static TrackpadModel> {
        find_model(id).or_else(|| find_model(self.fallback_model))
    }
}

fn name(s: &str) -> String<MAX_NAME_LEN> {
    let mut out = String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
