//! Master Brick

use crate::connection::IpConnection;
use crate::device::{Device, read_bool};
use crate::error::Result;

mod function {
    pub const ENABLE_STATUS_LED: u8 = 238;
    pub const DISABLE_STATUS_LED: u8 = 239;
    pub const IS_STATUS_LED_ENABLED: u8 = 240;
}

#[derive(Debug, Clone)]
pub struct Master {
    device: Device,
}

impl Master {
    pub const DEVICE_IDENTIFIER: u16 = 13;
    pub const DEVICE_DISPLAY_NAME: &'static str = "Master Brick";

    pub fn new(uid: &str, connection: &IpConnection) -> Result<Self> {
        Ok(Self {
            device: Device::new(uid, connection)?,
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub async fn enable_status_led(&self) -> Result<()> {
        self.device.request(function::ENABLE_STATUS_LED, &[]).await?;
        Ok(())
    }

    pub async fn disable_status_led(&self) -> Result<()> {
        self.device.request(function::DISABLE_STATUS_LED, &[]).await?;
        Ok(())
    }

    pub async fn is_status_led_enabled(&self) -> Result<bool> {
        let response = self
            .device
            .request(function::IS_STATUS_LED_ENABLED, &[])
            .await?;
        read_bool(&response)
    }
}
