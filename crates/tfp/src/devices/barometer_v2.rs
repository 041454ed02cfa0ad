//! Barometer Bricklet 2.0

use bytes::{BufMut, BytesMut};
use tokio::sync::mpsc;

use crate::connection::IpConnection;
use crate::device::{Device, read_i32};
use crate::error::Result;

use super::ThresholdOption;

mod function {
    pub const GET_AIR_PRESSURE: u8 = 1;
    pub const SET_AIR_PRESSURE_CALLBACK_CONFIGURATION: u8 = 2;
    pub const CALLBACK_AIR_PRESSURE: u8 = 4;
    pub const GET_TEMPERATURE: u8 = 9;
}

/// Air pressure sensor reporting 1/1000 mbar, with threshold callbacks
#[derive(Debug, Clone)]
pub struct BarometerV2 {
    device: Device,
}

impl BarometerV2 {
    pub const DEVICE_IDENTIFIER: u16 = 2117;
    pub const DEVICE_DISPLAY_NAME: &'static str = "Barometer Bricklet 2.0";

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

    /// Sensor temperature in 1/100 °C
    pub async fn get_temperature(&self) -> Result<i32> {
        let response = self.device.request(function::GET_TEMPERATURE, &[]).await?;
        read_i32(&response)
    }

    pub async fn set_air_pressure_callback_configuration(
        &self,
        period_ms: u32,
        value_has_to_change: bool,
        option: ThresholdOption,
        min: i32,
        max: i32,
    ) -> Result<()> {
        let mut payload = BytesMut::with_capacity(14);
        payload.put_u32_le(period_ms);
        payload.put_u8(value_has_to_change as u8);
        payload.put_u8(option.as_char());
        payload.put_i32_le(min);
        payload.put_i32_le(max);

        self.device
            .request(function::SET_AIR_PRESSURE_CALLBACK_CONFIGURATION, &payload)
            .await?;
        Ok(())
    }

    /// Air pressure readings in 1/1000 mbar
    pub fn air_pressure_events(&self) -> mpsc::UnboundedReceiver<i32> {
        self.device
            .subscribe(function::CALLBACK_AIR_PRESSURE, read_i32)
    }
}
