//! Ambient Light Bricklet

use tokio::sync::mpsc;

use crate::connection::IpConnection;
use crate::device::{Device, read_u16};
use crate::error::Result;

mod function {
    pub const GET_ILLUMINANCE: u8 = 1;
    pub const SET_ILLUMINANCE_CALLBACK_PERIOD: u8 = 3;
    pub const CALLBACK_ILLUMINANCE: u8 = 13;
}

/// First generation light sensor reporting illuminance in 1/10 lux
#[derive(Debug, Clone)]
pub struct AmbientLight {
    device: Device,
}

impl AmbientLight {
    pub const DEVICE_IDENTIFIER: u16 = 21;
    pub const DEVICE_DISPLAY_NAME: &'static str = "Ambient Light Bricklet";

    pub fn new(uid: &str, connection: &IpConnection) -> Result<Self> {
        Ok(Self {
            device: Device::new(uid, connection)?,
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub async fn get_illuminance(&self) -> Result<u16> {
        let response = self.device.request(function::GET_ILLUMINANCE, &[]).await?;
        read_u16(&response)
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

    /// Illuminance readings in 1/10 lux
    pub fn illuminance_events(&self) -> mpsc::UnboundedReceiver<u16> {
        self.device
            .subscribe(function::CALLBACK_ILLUMINANCE, read_u16)
    }
}
