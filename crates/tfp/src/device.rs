//! Common device plumbing shared by all bindings

use bytes::{Buf, Bytes};
use tokio::sync::mpsc;

use crate::base58;
use crate::connection::IpConnection;
use crate::error::Result;
use crate::packet::expect_len;

/// A device reachable through a connection, addressed by its UID
#[derive(Clone)]
pub struct Device {
    uid: u32,
    uid_str: String,
    connection: IpConnection,
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("uid", &self.uid_str)
            .finish()
    }
}

impl Device {
    /// Create a device handle. Fails only if the UID is not valid base58.
    pub fn new(uid: &str, connection: &IpConnection) -> Result<Self> {
        Ok(Self {
            uid: base58::parse_uid(uid)?,
            uid_str: uid.to_string(),
            connection: connection.clone(),
        })
    }

    /// Numeric UID used on the wire
    pub fn uid(&self) -> u32 {
        self.uid
    }

    /// Base58 UID as reported by enumeration
    pub fn uid_str(&self) -> &str {
        &self.uid_str
    }

    pub async fn request(&self, function_id: u8, payload: &[u8]) -> Result<Bytes> {
        self.connection.request(self.uid, function_id, payload).await
    }

    /// Subscribe to a callback, decoding each payload with `decode`.
    ///
    /// Subscribing again to the same callback ends the previous stream.
    pub fn subscribe<T, D>(&self, function_id: u8, decode: D) -> mpsc::UnboundedReceiver<T>
    where
        T: Send + 'static,
        D: Fn(&[u8]) -> Result<T> + Send + Sync + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let uid = self.uid_str.clone();

        self.connection
            .register_callback(self.uid, function_id, move |payload| match decode(payload) {
                Ok(value) => {
                    let _ = tx.send(value);
                }
                Err(e) => tracing::warn!("Bad callback {} from {}: {}", function_id, uid, e),
            });

        rx
    }
}

pub(crate) fn read_bool(payload: &[u8]) -> Result<bool> {
    read_u8(payload).map(|v| v != 0)
}

pub(crate) fn read_u8(mut payload: &[u8]) -> Result<u8> {
    expect_len(payload, 1)?;
    Ok(payload.get_u8())
}

pub(crate) fn read_u16(mut payload: &[u8]) -> Result<u16> {
    expect_len(payload, 2)?;
    Ok(payload.get_u16_le())
}

pub(crate) fn read_i16(mut payload: &[u8]) -> Result<i16> {
    expect_len(payload, 2)?;
    Ok(payload.get_i16_le())
}

pub(crate) fn read_u32(mut payload: &[u8]) -> Result<u32> {
    expect_len(payload, 4)?;
    Ok(payload.get_u32_le())
}

pub(crate) fn read_i32(mut payload: &[u8]) -> Result<i32> {
    expect_len(payload, 4)?;
    Ok(payload.get_i32_le())
}
