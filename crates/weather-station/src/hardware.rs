//! Device roles backed by the bridge protocol client
//!
//! Each supported model implements its role trait. Models that report in
//! coarser units are scaled up to the role's units here.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use tfp::devices::{
    AmbientLight, AmbientLightV2, AmbientLightV3, Barometer, BarometerV2, Humidity, HumidityV2,
    IlluminanceRange, IntegrationTime, Lcd20x4, Master, ThresholdOption,
};
use tfp::{ConnectReason, ConnectionConfig, EnumerateEvent, IpConnection};

use crate::roles::{
    Bridge, CharacterDisplay, Events, HumiditySensor, HumiditySensorModel, LightSensor,
    LightSensorModel, MasterUnit, PressureSensor, PressureSensorModel,
};

/// Bridge over a real TCP connection to the daemon
#[derive(Clone)]
pub struct TinkerforgeBridge {
    connection: IpConnection,
}

impl TinkerforgeBridge {
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            connection: IpConnection::with_config(config),
        }
    }

    pub fn connection(&self) -> &IpConnection {
        &self.connection
    }
}

#[async_trait]
impl Bridge for TinkerforgeBridge {
    async fn connect(&self, host: &str, port: u16) -> tfp::Result<()> {
        self.connection.connect(host, port).await
    }

    async fn disconnect(&self) -> tfp::Result<()> {
        self.connection.disconnect().await
    }

    async fn enumerate(&self) -> tfp::Result<()> {
        self.connection.enumerate().await
    }

    fn enumerate_events(&self) -> Events<EnumerateEvent> {
        self.connection.enumerate_events()
    }

    fn connected_events(&self) -> Events<ConnectReason> {
        self.connection.connected_events()
    }

    fn display(&self, uid: &str) -> tfp::Result<Arc<dyn CharacterDisplay>> {
        Ok(Arc::new(Lcd20x4::new(uid, &self.connection)?))
    }

    fn light_sensor(
        &self,
        model: LightSensorModel,
        uid: &str,
    ) -> tfp::Result<Arc<dyn LightSensor>> {
        let connection = &self.connection;
        Ok(match model {
            LightSensorModel::AmbientLight => Arc::new(AmbientLight::new(uid, connection)?),
            LightSensorModel::AmbientLightV2 => Arc::new(AmbientLightV2::new(uid, connection)?),
            LightSensorModel::AmbientLightV3 => Arc::new(AmbientLightV3::new(uid, connection)?),
        })
    }

    fn humidity_sensor(
        &self,
        model: HumiditySensorModel,
        uid: &str,
    ) -> tfp::Result<Arc<dyn HumiditySensor>> {
        let connection = &self.connection;
        Ok(match model {
            HumiditySensorModel::Humidity => Arc::new(Humidity::new(uid, connection)?),
            HumiditySensorModel::HumidityV2 => Arc::new(HumidityV2::new(uid, connection)?),
        })
    }

    fn barometer(
        &self,
        model: PressureSensorModel,
        uid: &str,
    ) -> tfp::Result<Arc<dyn PressureSensor>> {
        let connection = &self.connection;
        Ok(match model {
            PressureSensorModel::Barometer => Arc::new(Barometer::new(uid, connection)?),
            PressureSensorModel::BarometerV2 => Arc::new(BarometerV2::new(uid, connection)?),
        })
    }

    fn master_unit(&self, uid: &str) -> tfp::Result<Arc<dyn MasterUnit>> {
        Ok(Arc::new(Master::new(uid, &self.connection)?))
    }
}

/// 1/10 lux to 1/100 lux
fn deci_to_centi_lux(raw: u16) -> u32 {
    u32::from(raw) * 10
}

/// 1/10 %RH to 1/100 %RH
fn deci_to_centi_percent(raw: u16) -> u16 {
    raw.saturating_mul(10)
}

/// Forward `events` through `convert` until either end is dropped
fn scaled<T, U>(mut events: Events<T>, convert: fn(T) -> U) -> Events<U>
where
    T: Send + 'static,
    U: Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                value = events.recv() => match value {
                    Some(value) => {
                        if tx.send(convert(value)).is_err() {
                            break;
                        }
                    }
                    None => break,
                },
                _ = tx.closed() => break,
            }
        }
    });

    rx
}

#[async_trait]
impl CharacterDisplay for Lcd20x4 {
    async fn clear_display(&self) -> tfp::Result<()> {
        Lcd20x4::clear_display(self).await
    }

    async fn backlight_on(&self) -> tfp::Result<()> {
        Lcd20x4::backlight_on(self).await
    }

    async fn backlight_off(&self) -> tfp::Result<()> {
        Lcd20x4::backlight_off(self).await
    }

    async fn is_backlight_on(&self) -> tfp::Result<bool> {
        Lcd20x4::is_backlight_on(self).await
    }

    async fn is_button_pressed(&self, button: u8) -> tfp::Result<bool> {
        Lcd20x4::is_button_pressed(self, button).await
    }

    async fn write_line(&self, line: u8, position: u8, text: &[u8]) -> tfp::Result<()> {
        Lcd20x4::write_line(self, line, position, text).await
    }

    fn button_pressed_events(&self) -> Events<u8> {
        Lcd20x4::button_pressed_events(self)
    }
}

#[async_trait]
impl LightSensor for AmbientLight {
    async fn enable_illuminance_callback(&self, period_ms: u32) -> tfp::Result<()> {
        self.set_illuminance_callback_period(period_ms).await
    }

    fn illuminance_events(&self) -> Events<u32> {
        scaled(AmbientLight::illuminance_events(self), deci_to_centi_lux)
    }
}

#[async_trait]
impl LightSensor for AmbientLightV2 {
    async fn enable_illuminance_callback(&self, period_ms: u32) -> tfp::Result<()> {
        self.set_configuration(IlluminanceRange::Lux64000, IntegrationTime::Ms200)
            .await?;
        self.set_illuminance_callback_period(period_ms).await
    }

    fn illuminance_events(&self) -> Events<u32> {
        AmbientLightV2::illuminance_events(self)
    }
}

#[async_trait]
impl LightSensor for AmbientLightV3 {
    async fn enable_illuminance_callback(&self, period_ms: u32) -> tfp::Result<()> {
        self.set_configuration(IlluminanceRange::Lux64000, IntegrationTime::Ms200)
            .await?;
        self.set_illuminance_callback_configuration(period_ms, false, ThresholdOption::Off, 0, 0)
            .await
    }

    fn illuminance_events(&self) -> Events<u32> {
        AmbientLightV3::illuminance_events(self)
    }
}

#[async_trait]
impl HumiditySensor for Humidity {
    async fn enable_humidity_callback(&self, period_ms: u32) -> tfp::Result<()> {
        self.set_humidity_callback_period(period_ms).await
    }

    async fn get_temperature(&self) -> tfp::Result<Option<i16>> {
        Ok(None)
    }

    fn humidity_events(&self) -> Events<u16> {
        scaled(Humidity::humidity_events(self), deci_to_centi_percent)
    }
}

#[async_trait]
impl HumiditySensor for HumidityV2 {
    async fn enable_humidity_callback(&self, period_ms: u32) -> tfp::Result<()> {
        self.set_humidity_callback_configuration(period_ms, false, ThresholdOption::Off, 0, 0)
            .await
    }

    async fn get_temperature(&self) -> tfp::Result<Option<i16>> {
        HumidityV2::get_temperature(self).await.map(Some)
    }

    fn humidity_events(&self) -> Events<u16> {
        HumidityV2::humidity_events(self)
    }
}

#[async_trait]
impl PressureSensor for Barometer {
    async fn enable_air_pressure_callback(&self, period_ms: u32) -> tfp::Result<()> {
        self.set_air_pressure_callback_period(period_ms).await
    }

    fn air_pressure_events(&self) -> Events<i32> {
        Barometer::air_pressure_events(self)
    }
}

#[async_trait]
impl PressureSensor for BarometerV2 {
    async fn enable_air_pressure_callback(&self, period_ms: u32) -> tfp::Result<()> {
        self.set_air_pressure_callback_configuration(period_ms, false, ThresholdOption::Off, 0, 0)
            .await
    }

    fn air_pressure_events(&self) -> Events<i32> {
        BarometerV2::air_pressure_events(self)
    }
}

#[async_trait]
impl MasterUnit for Master {
    async fn disable_status_led(&self) -> tfp::Result<()> {
        Master::disable_status_led(self).await
    }
}
