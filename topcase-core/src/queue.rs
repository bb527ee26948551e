//! Outbound write queue
//!
//! The controller accepts one host write at a time and reports completion
//! through the next interrupt. Writes issued in between wait here, already
//! encoded, and go out one per completion.
//!
//! ```text
//!   enqueue            try_drain             complete
//! Idle ───────► Queued ──────────► InFlight ──────────► Queued / Idle
//! ```

use heapless::Deque;
use topcase_protocol::{DeviceId, Packet, PACKET_SIZE};

use crate::traits::Transport;

/// Capacity of the driver's queue
pub const QUEUE_CAPACITY: usize = 8;

/// Queue observed from outside
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QueueState {
    /// Nothing pending, nothing in flight
    Idle,
    /// Writes pending, nothing in flight
    Queued,
    /// A write awaits its completion interrupt
    InFlight,
}

/// Why a write never reached the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WriteError {
    /// The queue was full and the write was discarded
    QueueFull,
    /// The write went straight to the bus and its transfer failed
    Transfer,
}

/// An encoded write awaiting the bus
#[derive(Debug, Clone)]
struct QueuedWrite {
    seq_no: u8,
    raw: [u8; PACKET_SIZE],
}

/// Bounded queue of host writes with at most one in flight
#[derive(Debug)]
pub struct OutboundQueue<const N: usize> {
    pending: Deque<QueuedWrite, N>,
    next_seq: u8,
    in_flight: bool,
    sent: u32,
    dropped: u32,
}

impl<const N: usize> Default for OutboundQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> OutboundQueue<N> {
    pub const fn new() -> Self {
        Self {
            pending: Deque::new(),
            next_seq: 0,
            in_flight: false,
            sent: 0,
            dropped: 0,
        }
    }

    /// Encode a write and queue it, then try to send
    ///
    /// Returns the sequence number assigned to the write. When the queue
    /// is full the write is dropped and logged; the sequence counter only
    /// advances for writes that entered the queue. A write that was sent
    /// at once and whose transfer failed is reported as
    /// [`WriteError::Transfer`].
    pub fn enqueue<T: Transport>(
        &mut self,
        transport: &mut T,
        device: DeviceId,
        msg_type: u16,
        payload: &[u8],
        resp_len: u16,
    ) -> Result<u8, WriteError> {
        if self.pending.is_full() {
            self.dropped = self.dropped.wrapping_add(1);
            warn!("outgoing message queue overflow, dropping type {=u16:#x}", msg_type);
            return Err(WriteError::QueueFull);
        }

        let seq_no = self.next_seq;
        let raw = Packet::encode(device, msg_type, payload, resp_len, seq_no).to_bytes();
        // Fullness checked above
        let _ = self.pending.push_back(QueuedWrite { seq_no, raw });
        self.next_seq = self.next_seq.wrapping_add(1);

        if self.drain(transport) == Some(seq_no) {
            return Err(WriteError::Transfer);
        }
        Ok(seq_no)
    }

    /// Send the head write unless one is already in flight
    ///
    /// A write whose transfer fails can never be acknowledged, so it is
    /// dropped and the next one is tried.
    pub fn try_drain<T: Transport>(&mut self, transport: &mut T) {
        self.drain(transport);
    }

    /// Returns the sequence number of the last write dropped on the way
    fn drain<T: Transport>(&mut self, transport: &mut T) -> Option<u8> {
        let mut last_dropped = None;
        if self.in_flight {
            return last_dropped;
        }

        while let Some(write) = self.pending.pop_front() {
            let mut rx = [0u8; PACKET_SIZE];
            match transport.exchange(&mut rx, &write.raw) {
                Ok(()) => {
                    trace!("sent write seq {=u8}", write.seq_no);
                    self.sent = self.sent.wrapping_add(1);
                    self.in_flight = true;
                    break;
                }
                Err(_) => {
                    self.dropped = self.dropped.wrapping_add(1);
                    warn!("transfer of write seq {=u8} failed, dropping", write.seq_no);
                    last_dropped = Some(write.seq_no);
                }
            }
        }
        last_dropped
    }

    /// The in-flight write completed; send the next one
    pub fn complete<T: Transport>(&mut self, transport: &mut T) {
        self.in_flight = false;
        self.try_drain(transport);
    }

    pub fn state(&self) -> QueueState {
        if self.in_flight {
            QueueState::InFlight
        } else if self.pending.is_empty() {
            QueueState::Idle
        } else {
            QueueState::Queued
        }
    }

    /// Writes waiting behind the in-flight one
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Writes handed to the transport so far
    pub fn sent(&self) -> u32 {
        self.sent
    }

    /// Writes discarded on overflow or transfer failure
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}
