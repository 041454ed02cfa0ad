//! Bridge protocol client
//!
//! Talks the binary protocol of the hardware bridge daemon over TCP:
//! - [`packet`] - header layout and stream framing
//! - [`base58`] - device UID encoding
//! - [`IpConnection`] - socket, request/response matching, callbacks,
//!   auto-reconnect
//! - [`devices`] - typed bindings for the supported devices

pub mod base58;
pub mod devices;
pub mod packet;

mod connection;
mod device;
mod error;
mod types;

pub use connection::{ConnectionConfig, IpConnection};
pub use device::Device;
pub use error::{Error, Result};
pub use types::{ConnectReason, DisconnectReason, EnumerateEvent, EnumerationType};
