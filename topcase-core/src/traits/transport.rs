//! Bus transport trait
//!
//! The driver needs exactly one bus primitive: a blocking full-duplex
//! exchange of one packet in each direction.

use embedded_hal::spi::{Operation, SpiDevice};
use topcase_protocol::PACKET_SIZE;

/// Chip-select setup delay the controller needs before clocking starts
pub const DEFAULT_CS_DELAY_NS: u32 = 10_000;

/// Full-duplex packet transport
pub trait Transport {
    /// Error type for bus operations
    type Error;

    /// Clock out `tx` while clocking in `rx`
    fn exchange(&mut self, rx: &mut [u8; PACKET_SIZE], tx: &[u8; PACKET_SIZE]) -> Result<(), Self::Error>;
}

/// [`Transport`] over an `embedded-hal` SPI device
///
/// Each exchange is one chip-select transaction: a setup delay followed by
/// a single full-duplex transfer.
#[derive(Debug)]
pub struct SpiTransport<D> {
    device: D,
    cs_delay_ns: u32,
}

impl<D: SpiDevice> SpiTransport<D> {
    pub fn new(device: D) -> Self {
        Self::with_cs_delay(device, DEFAULT_CS_DELAY_NS)
    }

    pub fn with_cs_delay(device: D, cs_delay_ns: u32) -> Self {
        Self { device, cs_delay_ns }
    }

    /// Release the underlying SPI device
    pub fn release(self) -> D {
        self.device
    }
}

impl<D: SpiDevice> Transport for SpiTransport<D> {
    type Error = D::Error;

    fn exchange(&mut self, rx: &mut [u8; PACKET_SIZE], tx: &[u8; PACKET_SIZE]) -> Result<(), Self::Error> {
        self.device.transaction(&mut [
            Operation::DelayNs(self.cs_delay_ns),
            Operation::Transfer(rx, tx),
        ])
    }
}
