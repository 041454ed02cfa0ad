//! LCD 20x4 Bricklet

use bytes::{BufMut, BytesMut};
use tokio::sync::mpsc;

use crate::connection::IpConnection;
use crate::device::{Device, read_bool, read_u8};
use crate::error::Result;
use crate::packet::put_fixed;

mod function {
    pub const WRITE_LINE: u8 = 1;
    pub const CLEAR_DISPLAY: u8 = 2;
    pub const BACKLIGHT_ON: u8 = 3;
    pub const BACKLIGHT_OFF: u8 = 4;
    pub const IS_BACKLIGHT_ON: u8 = 5;
    pub const IS_BUTTON_PRESSED: u8 = 8;
    pub const CALLBACK_BUTTON_PRESSED: u8 = 9;
}

/// 20x4 character display with four buttons
#[derive(Debug, Clone)]
pub struct Lcd20x4 {
    device: Device,
}

impl Lcd20x4 {
    pub const DEVICE_IDENTIFIER: u16 = 212;
    pub const DEVICE_DISPLAY_NAME: &'static str = "LCD 20x4 Bricklet";

    /// Characters per line
    pub const COLUMNS: usize = 20;

    pub fn new(uid: &str, connection: &IpConnection) -> Result<Self> {
        Ok(Self {
            device: Device::new(uid, connection)?,
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Write raw display-charset bytes to `line` starting at `position`.
    ///
    /// Text longer than a line is cut off.
    pub async fn write_line(&self, line: u8, position: u8, text: &[u8]) -> Result<()> {
        let mut payload = BytesMut::with_capacity(2 + Self::COLUMNS);
        payload.put_u8(line);
        payload.put_u8(position);
        put_fixed(&mut payload, text, Self::COLUMNS);

        self.device.request(function::WRITE_LINE, &payload).await?;
        Ok(())
    }

    pub async fn clear_display(&self) -> Result<()> {
        self.device.request(function::CLEAR_DISPLAY, &[]).await?;
        Ok(())
    }

    pub async fn backlight_on(&self) -> Result<()> {
        self.device.request(function::BACKLIGHT_ON, &[]).await?;
        Ok(())
    }

    pub async fn backlight_off(&self) -> Result<()> {
        self.device.request(function::BACKLIGHT_OFF, &[]).await?;
        Ok(())
    }

    pub async fn is_backlight_on(&self) -> Result<bool> {
        let response = self.device.request(function::IS_BACKLIGHT_ON, &[]).await?;
        read_bool(&response)
    }

    pub async fn is_button_pressed(&self, button: u8) -> Result<bool> {
        let response = self
            .device
            .request(function::IS_BUTTON_PRESSED, &[button])
            .await?;
        read_bool(&response)
    }

    /// Index of each button that gets pressed
    pub fn button_pressed_events(&self) -> mpsc::UnboundedReceiver<u8> {
        self.device
            .subscribe(function::CALLBACK_BUTTON_PRESSED, read_u8)
    }
}
