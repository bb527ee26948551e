//! Packet encoding and decoding for the topcase SPI protocol.
//!
//! Every bus exchange moves exactly one 256-byte packet in each direction:
//! - DIRECTION (1 byte): 0x20 device-initiated, 0x40 host write or its reply
//! - DEVICE (1 byte): logical device id
//! - OFFSET (2 bytes): fragment offset
//! - REMAINING (2 bytes): bytes left after this fragment, must be zero
//! - LENGTH (2 bytes): bytes of `data` in use
//! - DATA (246 bytes): nested message
//! - CHECKSUM (2 bytes): CRC-16 of the 254 bytes above
//!
//! The nested message is an 8-byte header, `len` payload bytes and a
//! CRC-16 over header and payload. All integers are little-endian.

use heapless::Vec;

use crate::crc::crc16;

/// Size of one bus packet
pub const PACKET_SIZE: usize = 256;

/// Size of the data area carrying the nested message
pub const DATA_SIZE: usize = 246;

/// Size of the message header
pub const HEADER_SIZE: usize = 8;

/// Size of a CRC-16 trailer
pub const CHECKSUM_SIZE: usize = 2;

/// Largest payload that fits one packet
pub const MAX_PAYLOAD_SIZE: usize = DATA_SIZE - HEADER_SIZE - CHECKSUM_SIZE;

/// Offset of the data area within the packet
const DATA_OFFSET: usize = 8;

/// Offset of the packet checksum
const CHECKSUM_OFFSET: usize = PACKET_SIZE - CHECKSUM_SIZE;

/// Header `zero` value the firmware expects on info requests
const INFO_REQUEST_MARKER: u8 = 2;

/// Device-initiated packet
pub const DIR_READ: u8 = 0x20;
/// Host-initiated packet, or the device's reply to one
pub const DIR_WRITE: u8 = 0x40;

/// Keyboard device id
pub const DEV_KEYBOARD: u8 = 0x01;
/// Trackpad device id
pub const DEV_TRACKPAD: u8 = 0x02;
/// Device-info channel id
pub const DEV_INFO: u8 = 0xD0;

/// Errors that reject a received packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Packet trailer does not match the packet contents
    PacketChecksum,
    /// Message is split across several packets
    Fragmented,
    /// Message header claims more bytes than the data area holds
    Oversized,
    /// Message trailer does not match header and payload
    MessageChecksum,
}

/// Transfer direction tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Device-initiated traffic
    Read,
    /// Host write, or the device's reply to a host write
    Write,
    /// Any other tag value
    Unknown(u8),
}

impl Direction {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            DIR_READ => Direction::Read,
            DIR_WRITE => Direction::Write,
            other => Direction::Unknown(other),
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Direction::Read => DIR_READ,
            Direction::Write => DIR_WRITE,
            Direction::Unknown(byte) => byte,
        }
    }
}

/// Logical device sharing the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceId {
    Keyboard,
    Trackpad,
    Info,
    Unknown(u8),
}

impl DeviceId {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            DEV_KEYBOARD => DeviceId::Keyboard,
            DEV_TRACKPAD => DeviceId::Trackpad,
            DEV_INFO => DeviceId::Info,
            other => DeviceId::Unknown(other),
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            DeviceId::Keyboard => DEV_KEYBOARD,
            DeviceId::Trackpad => DEV_TRACKPAD,
            DeviceId::Info => DEV_INFO,
            DeviceId::Unknown(byte) => byte,
        }
    }
}

/// Message header nested at the start of the data area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MessageHeader {
    /// Message type
    pub msg_type: u16,
    /// Reserved byte, 2 on info requests
    pub zero: u8,
    /// Host write sequence number
    pub seq_no: u8,
    /// Size of the reply buffer the host expects
    pub resp_len: u16,
    /// Payload length
    pub len: u16,
}

impl MessageHeader {
    fn read(bytes: &[u8]) -> Self {
        Self {
            msg_type: read_u16(bytes, 0),
            zero: bytes[2],
            seq_no: bytes[3],
            resp_len: read_u16(bytes, 4),
            len: read_u16(bytes, 6),
        }
    }

    fn write(&self, bytes: &mut [u8]) {
        write_u16(bytes, 0, self.msg_type);
        bytes[2] = self.zero;
        bytes[3] = self.seq_no;
        write_u16(bytes, 4, self.resp_len);
        write_u16(bytes, 6, self.len);
    }
}

/// A validated or constructed packet carrying one complete message
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Packet {
    pub direction: Direction,
    pub device: DeviceId,
    pub offset: u16,
    pub remaining: u16,
    pub length: u16,
    pub header: MessageHeader,
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Packet {
    /// Build a host write packet
    ///
    /// # Panics
    ///
    /// Panics if `payload` does not fit a single packet. Every caller builds
    /// its payload from a fixed-size struct, so this is a programming error.
    pub fn encode(device: DeviceId, msg_type: u16, payload: &[u8], resp_len: u16, seq_no: u8) -> Self {
        assert!(
            payload.len() + HEADER_SIZE + CHECKSUM_SIZE <= DATA_SIZE,
            "outgoing message must fit one packet"
        );

        let len = payload.len() as u16;
        let zero = if msg_type == crate::message::MSG_INFO {
            INFO_REQUEST_MARKER
        } else {
            0
        };

        let mut payload_vec = Vec::new();
        // Length checked above
        let _ = payload_vec.extend_from_slice(payload);

        Self {
            direction: Direction::Write,
            device,
            offset: 0,
            remaining: 0,
            length: (HEADER_SIZE + payload.len() + CHECKSUM_SIZE) as u16,
            header: MessageHeader {
                msg_type,
                zero,
                seq_no,
                resp_len: if resp_len != 0 { resp_len } else { len },
                len,
            },
            payload: payload_vec,
        }
    }

    /// Parse and validate a received packet
    pub fn decode(raw: &[u8; PACKET_SIZE]) -> Result<Self, FrameError> {
        if read_u16(raw, CHECKSUM_OFFSET) != crc16(0, &raw[..CHECKSUM_OFFSET]) {
            return Err(FrameError::PacketChecksum);
        }

        let remaining = read_u16(raw, 4);
        if remaining != 0 {
            return Err(FrameError::Fragmented);
        }

        let data = &raw[DATA_OFFSET..CHECKSUM_OFFSET];
        let header = MessageHeader::read(data);
        let msg_end = HEADER_SIZE + header.len as usize;
        if msg_end + CHECKSUM_SIZE > DATA_SIZE {
            return Err(FrameError::Oversized);
        }

        if read_u16(data, msg_end) != crc16(0, &data[..msg_end]) {
            return Err(FrameError::MessageChecksum);
        }

        let mut payload = Vec::new();
        payload
            .extend_from_slice(&data[HEADER_SIZE..msg_end])
            .map_err(|_| FrameError::Oversized)?;

        Ok(Self {
            direction: Direction::from_byte(raw[0]),
            device: DeviceId::from_byte(raw[1]),
            offset: read_u16(raw, 2),
            remaining,
            length: read_u16(raw, 6),
            header,
            payload,
        })
    }

    /// Serialize into a bus buffer, filling in both checksums
    pub fn to_bytes(&self) -> [u8; PACKET_SIZE] {
        let mut raw = [0u8; PACKET_SIZE];
        raw[0] = self.direction.to_byte();
        raw[1] = self.device.to_byte();
        write_u16(&mut raw, 2, self.offset);
        write_u16(&mut raw, 4, self.remaining);
        write_u16(&mut raw, 6, self.length);

        let data = &mut raw[DATA_OFFSET..CHECKSUM_OFFSET];
        self.header.write(data);
        let msg_end = HEADER_SIZE + self.payload.len();
        data[HEADER_SIZE..msg_end].copy_from_slice(&self.payload);
        let msg_crc = crc16(0, &data[..msg_end]);
        write_u16(data, msg_end, msg_crc);

        let pkt_crc = crc16(0, &raw[..CHECKSUM_OFFSET]);
        write_u16(&mut raw, CHECKSUM_OFFSET, pkt_crc);
        raw
    }
}

/// Direction tag of a raw buffer, readable even when validation fails
pub fn raw_direction(raw: &[u8; PACKET_SIZE]) -> Direction {
    Direction::from_byte(raw[0])
}

pub(crate) fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

pub(crate) fn read_i16(bytes: &[u8], at: usize) -> i16 {
    i16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn write_u16(bytes: &mut [u8], at: usize, value: u16) {
    bytes[at..at + 2].copy_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Hand-assemble a read packet around an arbitrary message
    fn raw_read_packet(device: u8, msg_type: u16, payload: &[u8]) -> [u8; PACKET_SIZE] {
        let mut raw = [0u8; PACKET_SIZE];
        raw[0] = DIR_READ;
        raw[1] = device;
        let len = payload.len();
        write_u16(&mut raw, 6, (HEADER_SIZE + len + CHECKSUM_SIZE) as u16);
        write_u16(&mut raw, 8, msg_type);
        write_u16(&mut raw, 14, len as u16);
        raw[16..16 + len].copy_from_slice(payload);
        let msg_crc = crc16(0, &raw[8..16 + len]);
        write_u16(&mut raw, 16 + len, msg_crc);
        let pkt_crc = crc16(0, &raw[..254]);
        write_u16(&mut raw, 254, pkt_crc);
        raw
    }

    fn reseal(raw: &mut [u8; PACKET_SIZE]) {
        let pkt_crc = crc16(0, &raw[..254]);
        write_u16(raw, 254, pkt_crc);
    }

    #[test]
    fn test_encode_layout() {
        let packet = Packet::encode(DeviceId::Trackpad, 0x0252, &[0x02, 0x01], 0, 7);
        let raw = packet.to_bytes();

        assert_eq!(raw[0], DIR_WRITE);
        assert_eq!(raw[1], DEV_TRACKPAD);
        assert_eq!(read_u16(&raw, 2), 0); // offset
        assert_eq!(read_u16(&raw, 4), 0); // remaining
        assert_eq!(read_u16(&raw, 6), 12); // header + payload + crc
        assert_eq!(read_u16(&raw, 8), 0x0252); // type
        assert_eq!(raw[10], 0); // zero
        assert_eq!(raw[11], 7); // seq_no
        assert_eq!(read_u16(&raw, 12), 2); // resp_len defaults to len
        assert_eq!(read_u16(&raw, 14), 2); // len
        assert_eq!(&raw[16..18], &[0x02, 0x01]);
        assert_eq!(read_u16(&raw, 18), crc16(0, &raw[8..18]));
        assert_eq!(read_u16(&raw, 254), crc16(0, &raw[..254]));
    }

    #[test]
    fn test_encode_info_request() {
        let packet = Packet::encode(DeviceId::Info, crate::message::MSG_INFO, &[], 0x200, 0);
        assert_eq!(packet.header.zero, 2);
        assert_eq!(packet.header.resp_len, 0x200);
        assert_eq!(packet.header.len, 0);
        assert_eq!(packet.length, 10);
    }

    #[test]
    #[should_panic(expected = "outgoing message must fit one packet")]
    fn test_encode_oversized_payload_panics() {
        let payload = [0u8; MAX_PAYLOAD_SIZE + 1];
        let _ = Packet::encode(DeviceId::Keyboard, 0x0110, &payload, 0, 0);
    }

    #[test]
    fn test_encode_max_payload() {
        let payload = [0x5Au8; MAX_PAYLOAD_SIZE];
        let packet = Packet::encode(DeviceId::Keyboard, 0x0110, &payload, 0, 0);
        let decoded = Packet::decode(&packet.to_bytes()).unwrap();
        assert_eq!(decoded.payload.len(), MAX_PAYLOAD_SIZE);
    }

    #[test]
    fn test_decode_read_packet() {
        let raw = raw_read_packet(DEV_KEYBOARD, 0x0110, &[0, 2, 0, 4, 0, 0, 0, 0, 0, 0]);
        let packet = Packet::decode(&raw).unwrap();

        assert_eq!(packet.direction, Direction::Read);
        assert_eq!(packet.device, DeviceId::Keyboard);
        assert_eq!(packet.header.msg_type, 0x0110);
        assert_eq!(packet.header.len, 10);
        assert_eq!(packet.payload[1], 2);
        assert_eq!(packet.payload[3], 4);
    }

    #[test]
    fn test_decode_rejects_packet_checksum() {
        let mut raw = raw_read_packet(DEV_KEYBOARD, 0x0110, &[0; 10]);
        raw[255] ^= 0xFF;
        assert_eq!(Packet::decode(&raw), Err(FrameError::PacketChecksum));
    }

    #[test]
    fn test_decode_all_zero_buffer() {
        // Idle bus: every checksum of zeros is zero, so this is a valid empty
        // message addressed to no known device
        let raw = [0u8; PACKET_SIZE];
        let packet = Packet::decode(&raw).unwrap();
        assert_eq!(packet.direction, Direction::Unknown(0));
        assert_eq!(packet.device, DeviceId::Unknown(0));
        assert!(packet.payload.is_empty());
    }

    #[test]
    fn test_decode_rejects_fragment() {
        let mut raw = raw_read_packet(DEV_TRACKPAD, 0x0210, &[0; 48]);
        write_u16(&mut raw, 4, 100);
        reseal(&mut raw);
        assert_eq!(Packet::decode(&raw), Err(FrameError::Fragmented));
    }

    #[test]
    fn test_decode_rejects_oversized() {
        let mut raw = raw_read_packet(DEV_TRACKPAD, 0x0210, &[0; 4]);
        write_u16(&mut raw, 14, (MAX_PAYLOAD_SIZE + 1) as u16);
        reseal(&mut raw);
        assert_eq!(Packet::decode(&raw), Err(FrameError::Oversized));
    }

    #[test]
    fn test_decode_rejects_message_checksum() {
        let mut raw = raw_read_packet(DEV_INFO, 0x1020, &[1, 2, 3]);
        raw[16] ^= 0x01;
        reseal(&mut raw);
        assert_eq!(Packet::decode(&raw), Err(FrameError::MessageChecksum));
    }

    #[test]
    fn test_raw_direction_survives_bad_checksum() {
        let mut raw = Packet::encode(DeviceId::Keyboard, 0xB051, &[0; 6], 0, 0).to_bytes();
        raw[200] ^= 0xFF;
        assert!(Packet::decode(&raw).is_err());
        assert_eq!(raw_direction(&raw), Direction::Write);
    }

    #[test]
    fn test_unknown_tags_preserved() {
        assert_eq!(Direction::from_byte(0x99), Direction::Unknown(0x99));
        assert_eq!(Direction::Unknown(0x99).to_byte(), 0x99);
        assert_eq!(DeviceId::from_byte(0x42), DeviceId::Unknown(0x42));
        assert_eq!(DeviceId::Unknown(0x42).to_byte(), 0x42);
    }

    proptest! {
        #[test]
        fn prop_encode_decode_recovers_fields(
            device in any::<u8>(),
            msg_type in any::<u16>(),
            payload in proptest::collection::vec(any::<u8>(), 0..=MAX_PAYLOAD_SIZE),
            resp_len in any::<u16>(),
            seq_no in any::<u8>(),
        ) {
            let device = DeviceId::from_byte(device);
            let packet = Packet::encode(device, msg_type, &payload, resp_len, seq_no);
            let decoded = Packet::decode(&packet.to_bytes()).unwrap();

            prop_assert_eq!(decoded.device, device);
            prop_assert_eq!(decoded.direction, Direction::Write);
            prop_assert_eq!(decoded.header.msg_type, msg_type);
            prop_assert_eq!(decoded.header.seq_no, seq_no);
            prop_assert_eq!(&decoded.payload[..], &payload[..]);
            prop_assert_eq!(decoded, packet);
        }

        #[test]
        fn prop_decode_accepts_iff_checksums_and_unfragmented(raw in proptest::collection::vec(any::<u8>(), PACKET_SIZE), seal_packet in any::<bool>(), seal_message in any::<bool>()) {
            let mut raw: [u8; PACKET_SIZE] = raw.try_into().unwrap();
            let len = read_u16(&raw, 14) as usize;
            let fits = HEADER_SIZE + len + CHECKSUM_SIZE <= DATA_SIZE;
            if seal_message && fits {
                let msg_crc = crc16(0, &raw[8..16 + len]);
                write_u16(&mut raw, 16 + len, msg_crc);
            }
            if seal_packet {
                reseal(&mut raw);
            }

            let packet_ok = read_u16(&raw, 254) == crc16(0, &raw[..254]);
            let unfragmented = read_u16(&raw, 4) == 0;
            let message_ok = fits && read_u16(&raw, 16 + len) == crc16(0, &raw[8..16 + len]);

            prop_assert_eq!(Packet::decode(&raw).is_ok(), packet_ok && unfragmented && message_ok);
        }
    }
}
