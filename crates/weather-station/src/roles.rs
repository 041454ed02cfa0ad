//! Device roles
//!
//! The station only ever talks to its devices through these traits. The
//! hardware implementations live in [`crate::hardware`]; tests plug in
//! recording mocks.
//!
//! Several device models can fill the same role. Every model of a role
//! reports readings in the same units, so the station never needs to know
//! which one it got.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use tfp::devices::{
    AmbientLight, AmbientLightV2, AmbientLightV3, Barometer, BarometerV2, Humidity, HumidityV2,
    Lcd20x4, Master,
};
use tfp::{ConnectReason, EnumerateEvent};

/// Typed stream of one kind of device event
pub type Events<T> = mpsc::UnboundedReceiver<T>;

/// Functional category of an attached device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceRole {
    Display,
    LightSensor,
    HumiditySensor,
    Barometer,
    MasterUnit,
}

impl DeviceRole {
    pub const ALL: [DeviceRole; 5] = [
        DeviceRole::Display,
        DeviceRole::LightSensor,
        DeviceRole::HumiditySensor,
        DeviceRole::Barometer,
        DeviceRole::MasterUnit,
    ];

    /// Map an enumerated device type code to the role it fills
    pub fn from_identifier(device_identifier: u16) -> Option<Self> {
        DeviceModel::from_identifier(device_identifier).map(|model| model.role())
    }

    /// Model the station is primarily built for
    pub fn default_model(&self) -> DeviceModel {
        match self {
            DeviceRole::Display => DeviceModel::Display,
            DeviceRole::LightSensor => DeviceModel::LightSensor(LightSensorModel::AmbientLightV2),
            DeviceRole::HumiditySensor => {
                DeviceModel::HumiditySensor(HumiditySensorModel::HumidityV2)
            }
            DeviceRole::Barometer => DeviceModel::Barometer(PressureSensorModel::Barometer),
            DeviceRole::MasterUnit => DeviceModel::MasterUnit,
        }
    }

    /// Identifier of the default model
    pub fn device_identifier(&self) -> u16 {
        self.default_model().device_identifier()
    }
}

impl std::fmt::Display for DeviceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceRole::Display => write!(f, "display"),
            DeviceRole::LightSensor => write!(f, "light sensor"),
            DeviceRole::HumiditySensor => write!(f, "humidity sensor"),
            DeviceRole::Barometer => write!(f, "barometer"),
            DeviceRole::MasterUnit => write!(f, "master unit"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightSensorModel {
    /// Reports 1/10 lux
    AmbientLight,
    AmbientLightV2,
    AmbientLightV3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HumiditySensorModel {
    /// Reports 1/10 %RH and has no thermometer
    Humidity,
    HumidityV2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PressureSensorModel {
    Barometer,
    BarometerV2,
}

/// Concrete device type behind an enumerated identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceModel {
    Display,
    LightSensor(LightSensorModel),
    HumiditySensor(HumiditySensorModel),
    Barometer(PressureSensorModel),
    MasterUnit,
}

impl DeviceModel {
    pub const ALL: [DeviceModel; 9] = [
        DeviceModel::Display,
        DeviceModel::LightSensor(LightSensorModel::AmbientLight),
        DeviceModel::LightSensor(LightSensorModel::AmbientLightV2),
        DeviceModel::LightSensor(LightSensorModel::AmbientLightV3),
        DeviceModel::HumiditySensor(HumiditySensorModel::Humidity),
        DeviceModel::HumiditySensor(HumiditySensorModel::HumidityV2),
        DeviceModel::Barometer(PressureSensorModel::Barometer),
        DeviceModel::Barometer(PressureSensorModel::BarometerV2),
        DeviceModel::MasterUnit,
    ];

    pub fn from_identifier(device_identifier: u16) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|model| model.device_identifier() == device_identifier)
    }

    pub fn device_identifier(&self) -> u16 {
        match self {
            DeviceModel::Display => Lcd20x4::DEVICE_IDENTIFIER,
            DeviceModel::LightSensor(LightSensorModel::AmbientLight) => {
                AmbientLight::DEVICE_IDENTIFIER
            }
            DeviceModel::LightSensor(LightSensorModel::AmbientLightV2) => {
                AmbientLightV2::DEVICE_IDENTIFIER
            }
            DeviceModel::LightSensor(LightSensorModel::AmbientLightV3) => {
                AmbientLightV3::DEVICE_IDENTIFIER
            }
            DeviceModel::HumiditySensor(HumiditySensorModel::Humidity) => {
                Humidity::DEVICE_IDENTIFIER
            }
            DeviceModel::HumiditySensor(HumiditySensorModel::HumidityV2) => {
                HumidityV2::DEVICE_IDENTIFIER
            }
            DeviceModel::Barometer(PressureSensorModel::Barometer) => Barometer::DEVICE_IDENTIFIER,
            DeviceModel::Barometer(PressureSensorModel::BarometerV2) => {
                BarometerV2::DEVICE_IDENTIFIER
            }
            DeviceModel::MasterUnit => Master::DEVICE_IDENTIFIER,
        }
    }

    pub fn role(&self) -> DeviceRole {
        match self {
            DeviceModel::Display => DeviceRole::Display,
            DeviceModel::LightSensor(_) => DeviceRole::LightSensor,
            DeviceModel::HumiditySensor(_) => DeviceRole::HumiditySensor,
            DeviceModel::Barometer(_) => DeviceRole::Barometer,
            DeviceModel::MasterUnit => DeviceRole::MasterUnit,
        }
    }
}

/// Name used in init log lines
impl std::fmt::Display for DeviceModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DeviceModel::Display => "LCD 20x4",
            DeviceModel::LightSensor(LightSensorModel::AmbientLight) => "Ambient Light",
            DeviceModel::LightSensor(LightSensorModel::AmbientLightV2) => "Ambient Light 2.0",
            DeviceModel::LightSensor(LightSensorModel::AmbientLightV3) => "Ambient Light 3.0",
            DeviceModel::HumiditySensor(HumiditySensorModel::Humidity) => "Humidity",
            DeviceModel::HumiditySensor(HumiditySensorModel::HumidityV2) => "Humidity 2.0",
            DeviceModel::Barometer(PressureSensorModel::Barometer) => "Barometer",
            DeviceModel::Barometer(PressureSensorModel::BarometerV2) => "Barometer 2.0",
            DeviceModel::MasterUnit => "MasterBrick",
        };
        f.write_str(name)
    }
}

/// Character display with a backlight and buttons
#[async_trait]
pub trait CharacterDisplay: Send + Sync {
    async fn clear_display(&self) -> tfp::Result<()>;
    async fn backlight_on(&self) -> tfp::Result<()>;
    async fn backlight_off(&self) -> tfp::Result<()>;
    async fn is_backlight_on(&self) -> tfp::Result<bool>;
    async fn is_button_pressed(&self, button: u8) -> tfp::Result<bool>;
    async fn write_line(&self, line: u8, position: u8, text: &[u8]) -> tfp::Result<()>;
    fn button_pressed_events(&self) -> Events<u8>;
}

#[async_trait]
pub trait LightSensor: Send + Sync {
    /// Apply the measurement setup and start periodic illuminance callbacks
    async fn enable_illuminance_callback(&self, period_ms: u32) -> tfp::Result<()>;
    /// Illuminance in 1/100 lux
    fn illuminance_events(&self) -> Events<u32>;
}

#[async_trait]
pub trait HumiditySensor: Send + Sync {
    /// Start humidity callbacks that fire every period
    async fn enable_humidity_callback(&self, period_ms: u32) -> tfp::Result<()>;
    /// Temperature in 1/100 °C, `None` if the sensor has no thermometer
    async fn get_temperature(&self) -> tfp::Result<Option<i16>>;
    /// Relative humidity in 1/100 %RH
    fn humidity_events(&self) -> Events<u16>;
}

#[async_trait]
pub trait PressureSensor: Send + Sync {
    /// Start air pressure callbacks that fire every period
    async fn enable_air_pressure_callback(&self, period_ms: u32) -> tfp::Result<()>;
    /// Air pressure in 1/1000 mbar
    fn air_pressure_events(&self) -> Events<i32>;
}

#[async_trait]
pub trait MasterUnit: Send + Sync {
    async fn disable_status_led(&self) -> tfp::Result<()>;
}

/// Connection to the bridge daemon plus a factory for device handles
#[async_trait]
pub trait Bridge: Send + Sync + 'static {
    async fn connect(&self, host: &str, port: u16) -> tfp::Result<()>;
    async fn disconnect(&self) -> tfp::Result<()>;
    async fn enumerate(&self) -> tfp::Result<()>;

    fn enumerate_events(&self) -> Events<EnumerateEvent>;
    fn connected_events(&self) -> Events<ConnectReason>;

    fn display(&self, uid: &str) -> tfp::Result<Arc<dyn CharacterDisplay>>;
    fn light_sensor(
        &self,
        model: LightSensorModel,
        uid: &str,
    ) -> tfp::Result<Arc<dyn LightSensor>>;
    fn humidity_sensor(
        &self,
        model: HumiditySensorModel,
        uid: &str,
    ) -> tfp::Result<Arc<dyn HumiditySensor>>;
    fn barometer(
        &self,
        model: PressureSensorModel,
        uid: &str,
    ) -> tfp::Result<Arc<dyn PressureSensor>>;
    fn master_unit(&self, uid: &str) -> tfp::Result<Arc<dyn MasterUnit>>;
}
