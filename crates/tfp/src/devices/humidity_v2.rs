//! Humidity Bricklet 2.0

use bytes::{BufMut, BytesMut};
use tokio::sync::mpsc;

use crate::connection::IpConnection;
use crate::device::{Device, read_i16, read_u16};
use crate::error::Result;

use super::ThresholdOption;

mod function {
    pub const GET_HUMIDITY: u8 = 1;
    pub const SET_HUMIDITY_CALLBACK_CONFIGURATION: u8 = 2;
    pub const CALLBACK_HUMIDITY: u8 = 4;
    pub const GET_TEMPERATURE: u8 = 5;
}

/// Humidity sensor with a built-in temperature sensor
#[derive(Debug, Clone)]
pub struct HumidityV2 {
    device: Device,
}

impl HumidityV2 {
    pub const DEVICE_IDENTIFIER: u16 = 283;
    pub const DEVICE_DISPLAY_NAME: &'static str = "Humidity Bricklet 2.0";

    pub fn new(uid: &str, connection: &IpConnection) -> Result<Self> {
        Ok(Self {
            device: Device::new(uid, connection)?,
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Relative humidity in 1/100 %RH
    pub async fn get_humidity(&self) -> Result<u16> {
        let response = self.device.request(function::GET_HUMIDITY, &[]).await?;
        read_u16(&response)
    }

    /// Temperature in 1/100 °C
    pub async fn get_temperature(&self) -> Result<i16> {
        let response = self.device.request(function::GET_TEMPERATURE, &[]).await?;
        read_i16(&response)
    }

    pub async fn set_humidity_callback_configuration(
        &self,
        period_ms: u32,
        value_has_to_change: bool,
        option: ThresholdOption,
        min: u16,
        max: u16,
    ) -> Result<()> {
        let mut payload = BytesMut::with_capacity(10);
        payload.put_u32_le(period_ms);
        payload.put_u8(value_has_to_change as u8);
        payload.put_u8(option.as_char());
        payload.put_u16_le(min);
        payload.put_u16_le(max);

        self.device
            .request(function::SET_HUMIDITY_CALLBACK_CONFIGURATION, &payload)
            .await?;
        Ok(())
    }

    /// Humidity readings in 1/100 %RH
    pub fn humidity_events(&self) -> mpsc::UnboundedReceiver<u16> {
        self.device
            .subscribe(function::CALLBACK_HUMIDITY, read_u16)
    }
}
