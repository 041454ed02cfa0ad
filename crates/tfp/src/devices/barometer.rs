//! Barometer Bricklet

use tokio::sync::mpsc;

use crate::connection::IpConnection;
use crate::device::{Device, read_i16, read_i32};
use crate::error::Result;

mod function {
    pub const GET_AIR_PRESSURE: u8 = 1;
    pub const SET_AIR_PRESSURE_CALLBACK_PERIOD: u8 = 3;
    pub const GET_CHIP_TEMPERATURE: u8 = 14;
    pub const CALLBACK_AIR_PRESSURE: u8 = 15;
}

/// Air pressure sensor reporting 1/1000 mbar
#[derive(Debug, Clone)]
pub struct Barometer {
    device: Device,
}

impl Barometer {
    pub const DEVICE_IDENTIFIER: u16 = 221;
    pub const DEVICE_DISPLAY_NAME: &'static str = "Barometer Bricklet";

    pub fn new(uid: &str, connection: &IpConnection) -> Result<Self> {
        Ok(Self {
            device: Device::new(uid, connection)?,
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub async fn get_air_pressure(&self) -> Result<i32> {
        let response = self.device.request(function::GET_AIR_PRESSURE, &[]).await?;
        read_i32(&response)
    }

    /// Chip temperature in 1/100 °C
    pub async fn get_chip_temperature(&self) -> Result<i16> {
        let response = self
            .device
            .request(function::GET_CHIP_TEMPERATURE, &[])
            .await?;
        read_i16(&response)
    }

    /// Period of the air pressure callback in ms; 0 turns it off
    pub async fn set_air_pressure_callback_period(&self, period_ms: u32) -> Result<()> {
        self.device
            .request(
                function::SET_AIR_PRESSURE_CALLBACK_PERIOD,
                &period_ms.to_le_bytes(),
            )
            .await?;
        Ok(())
    }

    /// Air pressure readings in 1/1000 mbar
    pub fn air_pressure_events(&self) -> mpsc::UnboundedReceiver<i32> {
        self.device
            .subscribe(function::CALLBACK_AIR_PRESSURE, read_i32)
    }
}
