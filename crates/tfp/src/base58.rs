//! Base58 device UIDs
//!
//! Devices report their UID as a base58 string. Packets carry the numeric
//! 32-bit form; 64-bit UIDs are folded into 32 bits the same way the bridge
//! daemon does it.

use crate::error::{Error, Result};

const ALPHABET: &[u8; 58] = b"123456789abcdefghijkmnopqrstuvwxyzABCDEFGHJKLMNPQRSTUVWXYZ";

/// Decode a base58 string into its full 64-bit value.
pub fn decode(encoded: &str) -> Result<u64> {
    if encoded.is_empty() {
        return Err(Error::InvalidUid(encoded.to_string()));
    }

    let mut value: u64 = 0;
    for c in encoded.bytes() {
        let digit = ALPHABET
            .iter()
            .position(|&a| a == c)
            .ok_or_else(|| Error::InvalidUid(encoded.to_string()))?;

        value = value
            .checked_mul(58)
            .and_then(|v| v.checked_add(digit as u64))
            .ok_or_else(|| Error::InvalidUid(encoded.to_string()))?;
    }

    Ok(value)
}

/// Encode a numeric UID as base58.
pub fn encode(mut value: u64) -> String {
    if value == 0 {
        return "1".to_string();
    }

    let mut out = Vec::new();
    while value > 0 {
        out.push(ALPHABET[(value % 58) as usize]);
        value /= 58;
    }
    out.reverse();

    // Every byte comes from the ASCII alphabet
    out.into_iter().map(char::from).collect()
}

/// Fold a 64-bit UID into the 32-bit form used on the wire.
pub fn uid64_to_uid32(uid64: u64) -> u32 {
    let value1 = (uid64 & 0xFFFF_FFFF) as u32;
    let value2 = ((uid64 >> 32) & 0xFFFF_FFFF) as u32;

    let mut uid32 = value1 & 0x0000_0FFF;
    uid32 |= (value1 & 0x0F00_0000) >> 12;
    uid32 |= (value2 & 0x0000_003F) << 16;
    uid32 |= (value2 & 0x000F_0000) << 6;
    uid32 |= (value2 & 0x3F00_0000) << 2;
    uid32
}

/// Parse a base58 UID string into the numeric wire UID.
pub fn parse_uid(uid: &str) -> Result<u32> {
    let value = decode(uid)?;

    let value = if value > u32::MAX as u64 {
        uid64_to_uid32(value)
    } else {
        value as u32
    };

    if value == 0 {
        return Err(Error::InvalidUid(uid.to_string()));
    }

    Ok(value)
}
