//! Packet framing
//!
//! Every packet starts with an 8 byte little-endian header:
//!
//! | Offset | Size | Field                                            |
//! |--------|------|--------------------------------------------------|
//! | 0      | 4    | UID                                              |
//! | 4      | 1    | total length including header                    |
//! | 5      | 1    | function id                                      |
//! | 6      | 1    | sequence number (bits 4-7), response expected (3)|
//! | 7      | 1    | error code (bits 6-7)                            |

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};

/// Size of the packet header in bytes
pub const HEADER_SIZE: usize = 8;

/// Largest packet the bridge will ever send
pub const MAX_PACKET_SIZE: usize = 80;

/// Sequence number reserved for callbacks
pub const CALLBACK_SEQUENCE: u8 = 0;

/// Broadcast UID used for enumeration and the keepalive request
pub const BROADCAST_UID: u32 = 0;

/// Function ids handled by the connection itself rather than a device
pub mod function {
    pub const KEEPALIVE: u8 = 128;
    pub const CALLBACK_ENUMERATE: u8 = 253;
    pub const ENUMERATE: u8 = 254;
}

/// Decoded packet header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub uid: u32,
    pub length: u8,
    pub function_id: u8,
    pub sequence: u8,
    pub response_expected: bool,
    pub error_code: u8,
}

impl Header {
    /// Header for an outgoing request
    pub fn request(
        uid: u32,
        function_id: u8,
        sequence: u8,
        response_expected: bool,
        payload_len: usize,
    ) -> Self {
        Self {
            uid,
            length: (HEADER_SIZE + payload_len) as u8,
            function_id,
            sequence,
            response_expected,
            error_code: 0,
        }
    }

    /// Whether this packet is a callback rather than a response
    pub fn is_callback(&self) -> bool {
        self.sequence == CALLBACK_SEQUENCE
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32_le(self.uid);
        buf.put_u8(self.length);
        buf.put_u8(self.function_id);

        let mut options = (self.sequence & 0x0F) << 4;
        if self.response_expected {
            options |= 1 << 3;
        }
        buf.put_u8(options);
        buf.put_u8((self.error_code & 0x03) << 6);
    }

    pub fn decode(mut buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(Error::MalformedPacket(format!(
                "header needs {} bytes, got {}",
                HEADER_SIZE,
                buf.len()
            )));
        }

        let uid = buf.get_u32_le();
        let length = buf.get_u8();
        let function_id = buf.get_u8();
        let options = buf.get_u8();
        let flags = buf.get_u8();

        Ok(Self {
            uid,
            length,
            function_id,
            sequence: options >> 4,
            response_expected: options & (1 << 3) != 0,
            error_code: flags >> 6,
        })
    }
}

/// A complete packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub header: Header,
    pub payload: Bytes,
}

impl Packet {
    pub fn request(
        uid: u32,
        function_id: u8,
        sequence: u8,
        response_expected: bool,
        payload: &[u8],
    ) -> Self {
        Self {
            header: Header::request(uid, function_id, sequence, response_expected, payload.len()),
            payload: Bytes::copy_from_slice(payload),
        }
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HEADER_SIZE + self.payload.len());
        self.header.encode(&mut buf);
        buf.put_slice(&self.payload);
        buf.freeze()
    }

    /// Split the next complete packet off the front of a receive buffer.
    ///
    /// Returns `Ok(None)` until enough bytes have arrived. A length field
    /// smaller than the header means the stream is out of sync.
    pub fn take_from(buf: &mut BytesMut) -> Result<Option<Self>> {
        if buf.len() < HEADER_SIZE {
            return Ok(None);
        }

        let length = buf[4] as usize;
        if length < HEADER_SIZE {
            return Err(Error::MalformedPacket(format!(
                "length field {} is shorter than header",
                length
            )));
        }
        if buf.len() < length {
            return Ok(None);
        }

        let frame = buf.split_to(length).freeze();
        let header = Header::decode(&frame)?;
        Ok(Some(Self {
            header,
            payload: frame.slice(HEADER_SIZE..),
        }))
    }
}

/// Read a fixed-size, zero-padded string field.
pub fn get_string(buf: &mut impl Buf, len: usize) -> String {
    let mut raw = vec![0u8; len];
    buf.copy_to_slice(&mut raw);
    let end = raw.iter().position(|&b| b == 0).unwrap_or(len);
    raw[..end].iter().map(|&b| char::from(b)).collect()
}

/// Write bytes into a fixed-size field, truncating or zero-padding to `len`.
pub fn put_fixed(buf: &mut BytesMut, bytes: &[u8], len: usize) {
    let n = bytes.len().min(len);
    buf.put_slice(&bytes[..n]);
    buf.put_bytes(0, len - n);
}

/// Ensure a payload has at least `len` bytes before decoding it.
pub fn expect_len(payload: &[u8], len: usize) -> Result<()> {
    if payload.len() < len {
        return Err(Error::MalformedPacket(format!(
            "payload needs {} bytes, got {}",
            len,
            payload.len()
        )));
    }
    Ok(())
}
