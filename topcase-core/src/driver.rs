//! Topcase driver instance
//!
//! Owns everything one attached controller needs and serializes all of it
//! behind one lock: the interrupt cycle (bus exchange, validation,
//! dispatch, queue progress, negotiation) and writes requested from other
//! contexts such as a backlight change.
//!
//! # Interrupt cycle
//!
//! 1. Exchange one packet, sending an idle buffer
//! 2. Validate; frame errors are logged and the packet is dropped
//! 3. Dispatch the message to its device decoder
//! 4. If the packet answers a host write, send the next queued write
//! 5. Until it succeeds once, request device info and multi-touch mode

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use topcase_protocol::payload::BacklightCommand;
use topcase_protocol::{raw_direction, Direction, HostCommand, Message, Packet, PACKET_SIZE};

use crate::config::TopcaseConfig;
use crate::dispatch::Devices;
use crate::queue::{OutboundQueue, WriteError, QUEUE_CAPACITY};
use crate::trackpad::TrackpadStatus;
use crate::traits::{KeyboardSink, TrackpadSink, Transport};

/// Kind of backlight the driver exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BacklightKind {
    Keyboard,
}

/// Backlight description for registration with the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BacklightInfo {
    pub name: &'static str,
    pub kind: BacklightKind,
}

/// Largest host command payload
const MAX_COMMAND_PAYLOAD: usize = topcase_protocol::payload::BACKLIGHT_PAYLOAD_SIZE;

const BACKLIGHT_INFO: BacklightInfo = BacklightInfo {
    name: "Apple MacBook Topcase Keyboard",
    kind: BacklightKind::Keyboard,
};

/// Snapshot of driver state, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DriverStatus {
    pub keyboard_enabled: bool,
    pub trackpad: TrackpadStatus,
    pub negotiated: bool,
    pub write_in_flight: bool,
    pub writes_pending: usize,
    pub writes_sent: u32,
    pub writes_dropped: u32,
    pub frame_errors: u32,
    pub transport_errors: u32,
}

struct Inner<T, K, P> {
    transport: T,
    queue: OutboundQueue<QUEUE_CAPACITY>,
    devices: Devices<K, P>,
    /// Info request and multi-touch enable have been queued
    mt_requested: bool,
    brightness: u8,
    frame_errors: u32,
    transport_errors: u32,
}

impl<T: Transport, K: KeyboardSink, P: TrackpadSink> Inner<T, K, P> {
    fn interrupt(&mut self) {
        let tx = [0u8; PACKET_SIZE];
        let mut rx = [0u8; PACKET_SIZE];

        match self.transport.exchange(&mut rx, &tx) {
            Ok(()) => self.receive(&rx),
            Err(_) => {
                self.transport_errors = self.transport_errors.wrapping_add(1);
                warn!("bus exchange failed");
            }
        }

        if !self.mt_requested {
            // The info reply usually arrives unprompted, ask anyway
            for cmd in [HostCommand::RequestInfo, HostCommand::EnableMultiTouch] {
                if let Err(e) = self.send(cmd) {
                    warn!("negotiation write {:?} lost: {:?}, not retried until resume", cmd, e);
                }
            }
            self.mt_requested = true;
        }
    }

    fn receive(&mut self, rx: &[u8; PACKET_SIZE]) {
        if self.devices.config.trace_packets {
            trace!("rx {=[u8]:x}", &rx[..]);
        }

        match Packet::decode(rx) {
            Ok(packet) => self.devices.dispatch(Message::from_packet(&packet)),
            Err(e) => {
                self.frame_errors = self.frame_errors.wrapping_add(1);
                warn!("dropping packet: {:?}", e);
            }
        }

        // The direction byte is read raw so a corrupted reply still frees
        // the bus for the next write
        if raw_direction(rx) == Direction::Write {
            self.queue.complete(&mut self.transport);
        }
    }

    fn send(&mut self, cmd: HostCommand) -> Result<u8, WriteError> {
        let mut payload = [0u8; MAX_COMMAND_PAYLOAD];
        let len = cmd.write_payload(&mut payload);
        self.queue.enqueue(
            &mut self.transport,
            cmd.device(),
            cmd.msg_type(),
            &payload[..len],
            cmd.resp_len(),
        )
    }

    fn status(&self) -> DriverStatus {
        DriverStatus {
            keyboard_enabled: self.devices.keyboard_enabled(),
            trackpad: self.devices.trackpad().status(),
            negotiated: self.mt_requested,
            write_in_flight: self.queue.is_in_flight(),
            writes_pending: self.queue.len(),
            writes_sent: self.queue.sent(),
            writes_dropped: self.queue.dropped(),
            frame_errors: self.frame_errors,
            transport_errors: self.transport_errors,
        }
    }
}

/// One attached topcase controller
///
/// `M` selects the raw mutex guarding the instance: a critical-section
/// mutex when the interrupt handler and other callers run in different
/// contexts, a no-op mutex when everything runs in one.
pub struct Topcase<M: RawMutex, T, K, P> {
    inner: Mutex<M, RefCell<Inner<T, K, P>>>,
}

impl<M: RawMutex, T: Transport, K: KeyboardSink, P: TrackpadSink> Topcase<M, T, K, P> {
    /// Attach to a controller
    ///
    /// Registers the keyboard right away. The trackpad registers itself
    /// when the first info report names its model.
    pub fn attach(config: TopcaseConfig, transport: T, keyboard_sink: K, trackpad_sink: P) -> Self {
        let devices = Devices::new(config, keyboard_sink, trackpad_sink);
        Self {
            inner: Mutex::new(RefCell::new(Inner {
                transport,
                queue: OutboundQueue::new(),
                devices,
                mt_requested: false,
                brightness: 0,
                frame_errors: 0,
                transport_errors: 0,
            })),
        }
    }

    /// Service one interrupt or notification from the controller
    pub fn handle_interrupt(&self) {
        self.with(|inner| inner.interrupt());
    }

    /// Re-run negotiation on the next interrupt
    ///
    /// The controller forgets multi-touch mode across suspend.
    pub fn resume(&self) {
        self.with(|inner| inner.mt_requested = false);
    }

    /// Set the keyboard backlight, `percent` clamped to 100
    ///
    /// The brightness is only recorded if the write was queued or sent.
    pub fn set_brightness(&self, percent: u8) -> Result<(), WriteError> {
        let percent = percent.min(100);
        let cmd = BacklightCommand::from_percent(percent);
        debug!("backlight {=u8}% -> level {=u16}", percent, cmd.level);
        self.with(|inner| {
            inner.send(HostCommand::Backlight(cmd))?;
            inner.brightness = percent;
            Ok(())
        })
    }

    /// Last brightness accepted by [`Self::set_brightness`]
    pub fn brightness(&self) -> u8 {
        self.with(|inner| inner.brightness)
    }

    pub fn backlight_info(&self) -> BacklightInfo {
        BACKLIGHT_INFO
    }

    pub fn status(&self) -> DriverStatus {
        self.with(|inner| inner.status())
    }

    /// Tear down, returning the transport and sinks
    pub fn detach(self) -> (T, K, P) {
        let inner = self.inner.into_inner().into_inner();
        let (keyboard, trackpad) = inner.devices.into_sinks();
        (inner.transport, keyboard, trackpad)
    }

    fn with<R>(&self, f: impl FnOnce(&mut Inner<T, K, P>) -> R) -> R {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }
}
