//! Typed message payloads
//!
//! Each payload is decoded field by field from its little-endian wire
//! layout into an owned struct.

use heapless::Vec;

use crate::packet::{read_i16, read_u16, MAX_PAYLOAD_SIZE};

/// Number of key slots in a keyboard report
pub const KEY_SLOTS: usize = 6;

/// Key slot value reported for every slot when too many keys are held
pub const KEY_ROLLOVER: u8 = 0x01;

/// Wire size of a keyboard report
pub const KEYBOARD_REPORT_SIZE: usize = 10;

/// Bytes preceding the finger records in a touch report
pub const TOUCH_PREAMBLE_SIZE: usize = 48;

/// Wire size of one finger record
pub const FINGER_SIZE: usize = 30;

/// Most finger records a single-packet touch report can carry
pub const MAX_FINGERS: usize = (MAX_PAYLOAD_SIZE - TOUCH_PREAMBLE_SIZE) / FINGER_SIZE;

/// Smallest info payload that still carries the model byte
pub const INFO_MIN_SIZE: usize = 107;

const INFO_FLAGS_OFFSET: usize = 105;
const INFO_MODEL_OFFSET: usize = 106;

const TOUCH_CLICKED_OFFSET: usize = 1;
const TOUCH_FINGER_COUNT_OFFSET: usize = 30;

/// Wire size of a backlight command
pub const BACKLIGHT_PAYLOAD_SIZE: usize = 6;

const BACKLIGHT_CONST: u16 = 0x01B0;
const BACKLIGHT_STATUS_ON: u16 = 0x01F4;
const BACKLIGHT_STATUS_OFF: u16 = 0x0001;

/// Payload of the multi-touch enable command
pub const MT_ENABLE_COMMAND: u16 = 0x0102;

/// Keyboard state report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardReport {
    /// Modifier bitmask
    pub modifiers: u8,
    /// HID usage codes of held keys, zero for an empty slot
    pub keys: [u8; KEY_SLOTS],
    /// Fn key held
    pub fn_key: bool,
}

impl KeyboardReport {
    /// Parse a report; `None` unless `bytes` is exactly one report long
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != KEYBOARD_REPORT_SIZE {
            return None;
        }
        let mut keys = [0u8; KEY_SLOTS];
        keys.copy_from_slice(&bytes[3..3 + KEY_SLOTS]);
        Some(Self {
            modifiers: bytes[1],
            keys,
            fn_key: bytes[9] != 0,
        })
    }

    /// Serialize to wire format (for testing or simulation)
    pub fn to_bytes(&self) -> [u8; KEYBOARD_REPORT_SIZE] {
        let mut out = [0u8; KEYBOARD_REPORT_SIZE];
        out[1] = self.modifiers;
        out[3..3 + KEY_SLOTS].copy_from_slice(&self.keys);
        out[9] = self.fn_key as u8;
        out
    }

    /// Every slot carries the rollover code, so held keys are unknown
    pub fn is_rollover(&self) -> bool {
        self.keys.iter().all(|&key| key == KEY_ROLLOVER)
    }
}

/// One finger record of a touch report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Finger {
    pub origin: i16,
    pub abs_x: i16,
    pub abs_y: i16,
    pub rel_x: i16,
    pub rel_y: i16,
    pub tool_major: i16,
    pub tool_minor: i16,
    pub orientation: i16,
    pub touch_major: i16,
    pub touch_minor: i16,
    pub pressure: i16,
    pub multi: i16,
}

impl Finger {
    fn parse(bytes: &[u8]) -> Self {
        Self {
            origin: read_i16(bytes, 0),
            abs_x: read_i16(bytes, 2),
            abs_y: read_i16(bytes, 4),
            rel_x: read_i16(bytes, 6),
            rel_y: read_i16(bytes, 8),
            tool_major: read_i16(bytes, 10),
            tool_minor: read_i16(bytes, 12),
            orientation: read_i16(bytes, 14),
            touch_major: read_i16(bytes, 16),
            touch_minor: read_i16(bytes, 18),
            // 20..24 reserved
            pressure: read_i16(bytes, 24),
            multi: read_i16(bytes, 26),
        }
    }

    fn write(&self, out: &mut [u8]) {
        let fields = [
            (0, self.origin),
            (2, self.abs_x),
            (4, self.abs_y),
            (6, self.rel_x),
            (8, self.rel_y),
            (10, self.tool_major),
            (12, self.tool_minor),
            (14, self.orientation),
            (16, self.touch_major),
            (18, self.touch_minor),
            (24, self.pressure),
            (26, self.multi),
        ];
        for (at, value) in fields {
            out[at..at + 2].copy_from_slice(&value.to_le_bytes());
        }
    }

    /// The finger is in contact with the surface
    pub fn is_touching(&self) -> bool {
        self.touch_major != 0
    }
}

/// Multi-touch report
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TouchReport {
    /// Physical click of the pad
    pub clicked: bool,
    /// Finger count as announced by the device
    pub announced: u8,
    /// Finger records present in the payload
    pub fingers: Vec<Finger, MAX_FINGERS>,
}

impl TouchReport {
    /// Parse a report
    ///
    /// The announced finger count is not trusted: only records actually
    /// present in `bytes` are decoded. Returns `None` without the preamble.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < TOUCH_PREAMBLE_SIZE {
            return None;
        }
        let announced = bytes[TOUCH_FINGER_COUNT_OFFSET];
        let present = (bytes.len() - TOUCH_PREAMBLE_SIZE) / FINGER_SIZE;
        let count = (announced as usize).min(present).min(MAX_FINGERS);

        let mut fingers = Vec::new();
        for record in bytes[TOUCH_PREAMBLE_SIZE..]
            .chunks_exact(FINGER_SIZE)
            .take(count)
        {
            // count <= MAX_FINGERS
            let _ = fingers.push(Finger::parse(record));
        }

        Some(Self {
            clicked: bytes[TOUCH_CLICKED_OFFSET] != 0,
            announced,
            fingers,
        })
    }

    /// The device announced more fingers than the payload holds
    pub fn truncated(&self) -> bool {
        self.announced as usize > self.fingers.len()
    }

    /// Serialize to wire format (for testing or simulation)
    pub fn to_bytes(&self) -> Vec<u8, MAX_PAYLOAD_SIZE> {
        let mut out = Vec::new();
        let _ = out.resize(TOUCH_PREAMBLE_SIZE + self.fingers.len() * FINGER_SIZE, 0);
        out[TOUCH_CLICKED_OFFSET] = self.clicked as u8;
        out[TOUCH_FINGER_COUNT_OFFSET] = self.announced;
        for (finger, record) in self
            .fingers
            .iter()
            .zip(out[TOUCH_PREAMBLE_SIZE..].chunks_exact_mut(FINGER_SIZE))
        {
            finger.write(record);
        }
        out
    }
}

/// Device information reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InfoReport {
    pub flags: u8,
    /// Trackpad model id
    pub model: u8,
}

impl InfoReport {
    /// Parse a report; `None` when too short to carry the model byte
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < INFO_MIN_SIZE {
            return None;
        }
        Some(Self {
            flags: bytes[INFO_FLAGS_OFFSET],
            model: bytes[INFO_MODEL_OFFSET],
        })
    }
}

/// Keyboard backlight command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BacklightCommand {
    /// Native level, 0 (off) or 32..=255
    pub level: u16,
}

impl BacklightCommand {
    /// Lowest native level that is visibly lit
    pub const MIN_VISIBLE: u16 = 32;
    /// Brightest native level
    pub const MAX_LEVEL: u16 = 255;

    /// Map a percentage (clamped to 100) onto the native range
    pub fn from_percent(percent: u8) -> Self {
        let percent = percent.min(100) as u16;
        let level = if percent == 0 {
            0
        } else {
            Self::MIN_VISIBLE + (Self::MAX_LEVEL - Self::MIN_VISIBLE) * percent / 100
        };
        Self { level }
    }

    pub fn to_bytes(&self) -> [u8; BACKLIGHT_PAYLOAD_SIZE] {
        let status = if self.level > 0 {
            BACKLIGHT_STATUS_ON
        } else {
            BACKLIGHT_STATUS_OFF
        };
        let mut out = [0u8; BACKLIGHT_PAYLOAD_SIZE];
        out[0..2].copy_from_slice(&BACKLIGHT_CONST.to_le_bytes());
        out[2..4].copy_from_slice(&self.level.to_le_bytes());
        out[4..6].copy_from_slice(&status.to_le_bytes());
        out
    }

    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != BACKLIGHT_PAYLOAD_SIZE {
            return None;
        }
        Some(Self {
            level: read_u16(bytes, 2),
        })
    }
}
