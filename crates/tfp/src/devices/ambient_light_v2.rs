//! Ambient Light Bricklet 2.0

use bytes::{BufMut, BytesMut};
use tokio::sync::mpsc;

use crate::connection::IpConnection;
use crate::device::{Device, read_u32};
use crate::error::Result;

mod function {
    pub const GET_ILLUMINANCE: u8 = 1;
    pub const SET_ILLUMINANCE_CALLBACK_PERIOD: u8 = 2;
    pub const SET_CONFIGURATION: u8 = 8;
    pub const CALLBACK_ILLUMINANCE: u8 = 10;
}

/// Measurement range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IlluminanceRange {
    Lux64000 = 0,
    Lux32000 = 1,
    Lux16000 = 2,
    Lux8000 = 3,
    Lux1300 = 4,
    Lux600 = 5,
    Unlimited = 6,
}

/// Integration time of the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IntegrationTime {
    Ms50 = 0,
    Ms100 = 1,
    Ms150 = 2,
    Ms200 = 3,
    Ms250 = 4,
    Ms300 = 5,
    Ms350 = 6,
    Ms400 = 7,
}

/// Light sensor reporting illuminance in 1/100 lux
#[derive(Debug, Clone)]
pub struct AmbientLightV2 {
    device: Device,
}

impl AmbientLightV2 {
    pub const DEVICE_IDENTIFIER: u16 = 259;
    pub const DEVICE_DISPLAY_NAME: &'static str = "Ambient Light Bricklet 2.0";

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

    /// Period of the illuminance callback in ms; 0 turns it off
    pub async fn set_illuminance_callback_period(&self, period_ms: u32) -> Result<()> {
        self.device
            .request(
                function::SET_ILLUMINANCE_CALLBACK_PERIOD,
                &period_ms.to_le_bytes(),
            )
            .await?;
        Ok(())
    }

    pub async fn set_configuration(
        &self,
        range: IlluminanceRange,
        integration_time: IntegrationTime,
    ) -> Result<()> {
        let mut payload = BytesMut::with_capacity(2);
        payload.put_u8(range as u8);
        payload.put_u8(integration_time as u8);

        self.device
            .request(function::SET_CONFIGURATION, &payload)
            .await?;
        Ok(())
    }

    /// Illuminance readings in 1/100 lux
    pub fn illuminance_events(&self) -> mpsc::UnboundedReceiver<u32> {
        self.device
            .subscribe(function::CALLBACK_ILLUMINANCE, read_u32)
    }
}
