//! Connection-level event types

use bytes::Buf;

use crate::error::Result;
use crate::packet::{expect_len, get_string};

/// Why an enumerate callback was sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumerationType {
    /// Device is already attached (answer to an enumerate request)
    Available,
    /// Device was newly attached or restarted
    Connected,
    /// Device was detached
    Disconnected,
    /// Value not known to this client
    Unknown(u8),
}

impl From<u8> for EnumerationType {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Available,
            1 => Self::Connected,
            2 => Self::Disconnected,
            other => Self::Unknown(other),
        }
    }
}

/// Payload of an enumerate callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerateEvent {
    /// Base58 UID of the device
    pub uid: String,
    /// UID of the brick the device is attached to
    pub connected_uid: String,
    /// Port or stack position
    pub position: char,
    pub hardware_version: [u8; 3],
    pub firmware_version: [u8; 3],
    /// Device type code
    pub device_identifier: u16,
    pub enumeration_type: EnumerationType,
}

impl EnumerateEvent {
    /// Size of the callback payload on the wire
    pub const PAYLOAD_SIZE: usize = 26;

    pub fn decode(mut payload: &[u8]) -> Result<Self> {
        expect_len(payload, Self::PAYLOAD_SIZE)?;

        let uid = get_string(&mut payload, 8);
        let connected_uid = get_string(&mut payload, 8);
        let position = char::from(payload.get_u8());

        let mut hardware_version = [0u8; 3];
        payload.copy_to_slice(&mut hardware_version);
        let mut firmware_version = [0u8; 3];
        payload.copy_to_slice(&mut firmware_version);

        let device_identifier = payload.get_u16_le();
        let enumeration_type = EnumerationType::from(payload.get_u8());

        Ok(Self {
            uid,
            connected_uid,
            position,
            hardware_version,
            firmware_version,
            device_identifier,
            enumeration_type,
        })
    }
}

/// Why a connection was (re-)established
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectReason {
    /// `connect()` was called
    Request,
    /// The client reconnected on its own after losing the connection
    AutoReconnect,
}

/// Why a connection was lost
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// `disconnect()` was called
    Request,
    /// The socket failed
    Error,
    /// The bridge closed the socket
    Shutdown,
}
