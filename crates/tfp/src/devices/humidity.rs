//! Humidity Bricklet

use tokio::sync::mpsc;

use crate::connection::IpConnection;
use crate::device::{Device, read_u16};
use crate::error::Result;

mod function {
    pub const GET_HUMIDITY: u8 = 1;
    pub const SET_HUMIDITY_CALLBACK_PERIOD: u8 = 3;
    pub const CALLBACK_HUMIDITY: u8 = 13;
}

/// First generation humidity sensor reporting 1/10 %RH. Has no thermometer.
#[derive(Debug, Clone)]
pub struct Humidity {
    device: Device,
}

impl Humidity {
    pub const DEVICE_IDENTIFIER: u16 = 27;
    pub const DEVICE_DISPLAY_NAME: &'static str = "Humidity Bricklet";

    pub fn new(uid: &str, connection: &IpConnection) -> Result<Self> {
        Ok(Self {
            device: Device::new(uid, connection)?,
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub async fn get_humidity(&self) -> Result<u16> {
        let response = self.device.request(function::GET_HUMIDITY, &[]).await?;
        read_u16(&response)
    }

    /// Period of the humidity callback in ms; 0 turns it off
    pub async fn set_humidity_callback_period(&self, period_ms: u32) -> Result<()> {
        self.device
            .request(
                function::SET_HUMIDITY_CALLBACK_PERIOD,
                &period_ms.to_le_bytes(),
            )
            .await?;
        Ok(())
    }

    /// Humidity readings in 1/10 %RH
    pub fn humidity_events(&self) -> mpsc::UnboundedReceiver<u16> {
        self.device
            .subscribe(function::CALLBACK_HUMIDITY, read_u16)
    }
}
