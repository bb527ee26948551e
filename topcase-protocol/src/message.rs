//! Message types for the topcase protocol
//!
//! A validated [`Packet`] is turned into a closed [`Message`] enum before
//! anything acts on it. Messages are keyed by the logical device and the
//! header type:
//! - Keyboard: key reports, backlight acknowledgements
//! - Trackpad: touch reports, multi-touch enable acknowledgements
//! - Info: device information (trackpad model)

use crate::packet::{DeviceId, Packet};
use crate::payload::{BacklightCommand, InfoReport, KeyboardReport, TouchReport, MT_ENABLE_COMMAND};

// Message type IDs
pub const MSG_KEYBOARD: u16 = 0x0110;
pub const MSG_BACKLIGHT: u16 = 0xB051;
pub const MSG_TOUCH: u16 = 0x0210;
pub const MSG_MT_ENABLE: u16 = 0x0252;
pub const MSG_INFO: u16 = 0x1020;

/// Reply buffer size requested with an info query
pub const INFO_RESPONSE_LEN: u16 = 0x200;

/// Inbound message after routing by device and type
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Message {
    /// Key state report
    Keyboard(KeyboardReport),
    /// Device echoed a backlight write; `level` is absent when the echo
    /// is not a well-formed backlight payload
    BacklightAck { len: u16, level: Option<u16> },
    /// Multi-touch report
    Touch(TouchReport),
    /// Device confirmed multi-touch mode
    MultiTouchEnabled,
    /// Device information
    Info(InfoReport),
    /// Known device, but a type or length no handler accepts
    Unexpected {
        device: DeviceId,
        msg_type: u16,
        len: u16,
    },
    /// Device id with no handler
    Unrouted { device: u8 },
}

impl Message {
    /// Classify a validated packet
    pub fn from_packet(packet: &Packet) -> Self {
        let msg_type = packet.header.msg_type;
        let payload = &packet.payload[..];
        let unexpected = Message::Unexpected {
            device: packet.device,
            msg_type,
            len: packet.header.len,
        };

        match (packet.device, msg_type) {
            (DeviceId::Keyboard, MSG_KEYBOARD) => KeyboardReport::parse(payload)
                .map(Message::Keyboard)
                .unwrap_or(unexpected),
            (DeviceId::Keyboard, MSG_BACKLIGHT) => Message::BacklightAck {
                len: packet.header.len,
                level: BacklightCommand::parse(payload).map(|cmd| cmd.level),
            },
            (DeviceId::Trackpad, MSG_TOUCH) => TouchReport::parse(payload)
                .map(Message::Touch)
                .unwrap_or(unexpected),
            (DeviceId::Trackpad, MSG_MT_ENABLE) => Message::MultiTouchEnabled,
            (DeviceId::Info, MSG_INFO) => InfoReport::parse(payload)
                .map(Message::Info)
                .unwrap_or(unexpected),
            (DeviceId::Unknown(device), _) => Message::Unrouted { device },
            _ => unexpected,
        }
    }
}

/// Host-initiated writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostCommand {
    /// Ask the info channel for device information
    RequestInfo,
    /// Switch the trackpad into multi-touch reporting
    EnableMultiTouch,
    /// Set the keyboard backlight
    Backlight(BacklightCommand),
}

impl HostCommand {
    /// Target device
    pub fn device(&self) -> DeviceId {
        match self {
            HostCommand::RequestInfo => DeviceId::Info,
            HostCommand::EnableMultiTouch => DeviceId::Trackpad,
            HostCommand::Backlight(_) => DeviceId::Keyboard,
        }
    }

    /// Header message type
    pub fn msg_type(&self) -> u16 {
        match self {
            HostCommand::RequestInfo => MSG_INFO,
            HostCommand::EnableMultiTouch => MSG_MT_ENABLE,
            HostCommand::Backlight(_) => MSG_BACKLIGHT,
        }
    }

    /// Reply buffer size, zero to mirror the payload length
    pub fn resp_len(&self) -> u16 {
        match self {
            HostCommand::RequestInfo => INFO_RESPONSE_LEN,
            _ => 0,
        }
    }

    /// Write the payload into `buf`, returning its length
    pub fn write_payload(&self, buf: &mut [u8]) -> usize {
        match self {
            HostCommand::RequestInfo => 0,
            HostCommand::EnableMultiTouch => {
                buf[..2].copy_from_slice(&MT_ENABLE_COMMAND.to_le_bytes());
                2
            }
            HostCommand::Backlight(cmd) => {
                let bytes = cmd.to_bytes();
                buf[..bytes.len()].copy_from_slice(&bytes);
                bytes.len()
            }
        }
    }
}
