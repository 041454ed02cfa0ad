//! Weather Station
//!
//! Shows ambient light, humidity, air pressure and temperature readings from
//! a hardware bridge on a 20x4 character display.
//!
//! - [`station`] - device lifecycle and event handling
//! - [`display`] - reading to display row formatting
//! - [`roles`] - device role traits the station is written against
//! - [`hardware`] - role implementations over the bridge protocol client
//! - [`retry`] - fixed-delay retry policy
//! - [`config`] - layered configuration

pub mod config;
pub mod display;
pub mod hardware;
pub mod retry;
pub mod roles;
pub mod station;

pub use config::{ConfigError, StationConfig};
pub use hardware::TinkerforgeBridge;
pub use retry::{RetryError, RetryPolicy};
pub use roles::{DeviceModel, DeviceRole};
pub use station::Station;
