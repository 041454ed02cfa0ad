//! Ambient Light Bricklet 3.0

use bytes::{BufMut, BytesMut};
use tokio::sync::mpsc;

use crate::connection::IpConnection;
use crate::device::{Device, read_u32};
use crate::error::Result;

use super::{IlluminanceRange, IntegrationTime, ThresholdOption};

mod function {
    pub const GET_ILLUMINANCE: u8 = 1;
    pub const SET_ILLUMINANCE_CALLBACK_CONFIGURATION: u8 = 2;
    pub const CALLBACK_ILLUMINANCE: u8 = 4;
    pub const SET_CONFIGURATION: u8 = 5;
}

/// Light sensor reporting illuminance in 1/100 lux, with threshold callbacks
#[derive(Debug, Clone)]
pub struct AmbientLightV3 {
    device: Device,
}

impl AmbientLightV3 {
    pub const DEVICE_IDENTIFIER: u16 = 2131;
    pub const DEVICE_DISPLAY_NAME: &'static str = "Ambient Light Bricklet 3.0";

    pub fn new(uid: &str, connection: &IpConnection) -> Result<Self> {
        Ok(Self {
            device: Device::new(uid, connection)?,
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub async fn get_illuminance(&self) -> Result<u32> {
        let response = self.device.request(function::GET_ILLUMINANCE, &[]).await?;
        read_u32(&response)
    }

    pub async fn set_illuminance_callback_configuration(
        &self,
        period_ms: u32,
        value_has_to_change: bool,
        option: ThresholdOption,
        min: u32,
        max: u32,
    ) -> Result<()> {
        let mut payload = BytesMut::with_capacity(14);
        payload.put_u32_le(period_ms);
        payload.put_u8(value_has_to_change as u8);
        payload.put_u8(option.as_char());
        payload.put_u32_le(min);
        payload.put_u32_le(max);

        self.device
            .request(function::SET_ILLUMINANCE_CALLBACK_CONFIGURATION, &payload)
            .await?;
        Ok(())
    }

    pub async fn set_configuration(
        &self,
        range: IlluminanceRange,
        integration_time: IntegrationTime,
    ) -> Result<()> {
        self.device
            .request(
                function::SET_CONFIGURATION,
                &[range as u8, integration_time as u8],
            )
            .await?;
        Ok(())
    }

    /// Illuminance readings in 1/100 lux
    pub fn illuminance_events(&self) -> mpsc::UnboundedReceiver<u32> {
        self.device
            .subscribe(function::CALLBACK_ILLUMINANCE, read_u32)
    }
}
