//! Test doubles for the bus and the input sinks

use std::collections::VecDeque;

use embedded_hal::spi::{ErrorType, Operation, SpiDevice};
use topcase_protocol::{DeviceId, Direction, Packet, PACKET_SIZE};

use crate::config::KeyCode;
use crate::traits::{
    KeyboardCapabilities, KeyboardSink, RegistrationError, SlotState, TrackpadCapabilities,
    TrackpadSink, Transport,
};

/// Transport that replays canned replies and records what was sent
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    /// Buffers of every successful exchange
    pub sent: Vec<[u8; PACKET_SIZE]>,
    /// Replies handed out in order; an idle buffer once exhausted
    pub replies: VecDeque<[u8; PACKET_SIZE]>,
    /// Number of upcoming exchanges that fail
    pub fail_next: usize,
}

impl Transport for ScriptedTransport {
    type Error = ();

    fn exchange(&mut self, rx: &mut [u8; PACKET_SIZE], tx: &[u8; PACKET_SIZE]) -> Result<(), ()> {
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(());
        }
        *rx = self.replies.pop_front().unwrap_or([0; PACKET_SIZE]);
        self.sent.push(*tx);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Key(KeyCode, bool),
    Sync,
}

#[derive(Debug, Default)]
pub struct RecordingKeyboard {
    pub registrations: Vec<KeyboardCapabilities>,
    pub events: Vec<KeyEvent>,
    /// Reject registration
    pub refuse: bool,
}

impl RecordingKeyboard {
    /// Events recorded since the last call
    pub fn take(&mut self) -> Vec<KeyEvent> {
        core::mem::take(&mut self.events)
    }
}

impl KeyboardSink for RecordingKeyboard {
    fn register(&mut self, caps: &KeyboardCapabilities) -> Result<(), RegistrationError> {
        if self.refuse {
            return Err(RegistrationError);
        }
        self.registrations.push(caps.clone());
        Ok(())
    }

    fn key(&mut self, key: KeyCode, pressed: bool) {
        self.events.push(KeyEvent::Key(key, pressed));
    }

    fn sync(&mut self) {
        self.events.push(KeyEvent::Sync);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadEvent {
    Slot(u8, SlotState),
    Button(KeyCode, bool),
    Sync,
}

#[derive(Debug, Default)]
pub struct RecordingTrackpad {
    pub registrations: Vec<TrackpadCapabilities>,
    pub events: Vec<PadEvent>,
    pub refuse: bool,
}

impl TrackpadSink for RecordingTrackpad {
    fn register(&mut self, caps: &TrackpadCapabilities) -> Result<(), RegistrationError> {
        if self.refuse {
            return Err(RegistrationError);
        }
        self.registrations.push(caps.clone());
        Ok(())
    }

    fn slot(&mut self, slot: u8, state: &SlotState) {
        self.events.push(PadEvent::Slot(slot, *state));
    }

    fn button(&mut self, button: KeyCode, pressed: bool) {
        self.events.push(PadEvent::Button(button, pressed));
    }

    fn sync(&mut self) {
        self.events.push(PadEvent::Sync);
    }
}

/// SPI device answering every transfer with `reply`
pub struct MockSpi {
    pub reply: [u8; PACKET_SIZE],
    pub delays_ns: Vec<u32>,
    pub transactions: usize,
    pub last_tx: [u8; PACKET_SIZE],
}

impl Default for MockSpi {
    fn default() -> Self {
        Self {
            reply: [0; PACKET_SIZE],
            delays_ns: Vec::new(),
            transactions: 0,
            last_tx: [0; PACKET_SIZE],
        }
    }
}

impl ErrorType for MockSpi {
    type Error = core::convert::Infallible;
}

impl SpiDevice for MockSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        self.transactions += 1;
        for op in operations {
            match op {
                Operation::DelayNs(ns) => self.delays_ns.push(*ns),
                Operation::Transfer(read, write) => {
                    self.last_tx[..write.len()].copy_from_slice(write);
                    read.copy_from_slice(&self.reply[..read.len()]);
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Raw packet as the controller would send it
pub fn packet_bytes(direction: Direction, device: DeviceId, msg_type: u16, payload: &[u8]) -> [u8; PACKET_SIZE] {
    let mut packet = Packet::encode(device, msg_type, payload, 0, 0);
    packet.direction = direction;
    packet.to_bytes()
}
