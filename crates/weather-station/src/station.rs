//! Station context
//!
//! Holds the bridge plus one optional handle per device role and reacts to
//! everything the bridge reports: enumeration, reconnects and sensor
//! readings. Every handler receives the station explicitly.

use std::future::Future;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, error, info};

use tfp::{ConnectReason, EnumerateEvent, EnumerationType};

use crate::config::StationConfig;
use crate::display::{self, DisplayLine};
use crate::retry::{RetryError, RetryPolicy};
use crate::roles::{
    Bridge, CharacterDisplay, DeviceModel, DeviceRole, Events, HumiditySensor,
    HumiditySensorModel, LightSensor, LightSensorModel, MasterUnit, PressureSensor,
    PressureSensorModel,
};

/// Button that toggles the backlight
pub const BACKLIGHT_BUTTON: u8 = 0;

#[derive(Default)]
struct Devices {
    display: Option<Arc<dyn CharacterDisplay>>,
    light_sensor: Option<Arc<dyn LightSensor>>,
    humidity_sensor: Option<Arc<dyn HumiditySensor>>,
    barometer: Option<Arc<dyn PressureSensor>>,
    master_unit: Option<Arc<dyn MasterUnit>>,
}

impl Devices {
    fn is_active(&self, role: DeviceRole) -> bool {
        match role {
            DeviceRole::Display => self.display.is_some(),
            DeviceRole::LightSensor => self.light_sensor.is_some(),
            DeviceRole::HumiditySensor => self.humidity_sensor.is_some(),
            DeviceRole::Barometer => self.barometer.is_some(),
            DeviceRole::MasterUnit => self.master_unit.is_some(),
        }
    }

    fn clear(&mut self, role: DeviceRole) {
        match role {
            DeviceRole::Display => self.display = None,
            DeviceRole::LightSensor => self.light_sensor = None,
            DeviceRole::HumiditySensor => self.humidity_sensor = None,
            DeviceRole::Barometer => self.barometer = None,
            DeviceRole::MasterUnit => self.master_unit = None,
        }
    }
}

pub struct Station {
    bridge: Arc<dyn Bridge>,
    host: String,
    port: u16,
    retry: RetryPolicy,
    callback_period_ms: u32,
    devices: RwLock<Devices>,
}

impl Station {
    pub fn new(bridge: Arc<dyn Bridge>, config: &StationConfig) -> Arc<Self> {
        Arc::new(Self {
            bridge,
            host: config.host.clone(),
            port: config.port,
            retry: config.retry_policy(),
            callback_period_ms: config.callback_period_ms,
            devices: RwLock::new(Devices::default()),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Subscribe to bridge events, then connect and enumerate.
    ///
    /// With the default policy this only returns once both succeeded.
    pub async fn start(self: &Arc<Self>) -> Result<(), RetryError<tfp::Error>> {
        self.spawn_listener(self.bridge.enumerate_events(), |station, event| async move {
            station.on_enumerate(&event).await;
        });
        self.spawn_listener(self.bridge.connected_events(), |station, reason| async move {
            station.on_connected(reason).await;
        });

        self.connect().await?;
        self.enumerate().await
    }

    /// Connect to the bridge, retrying with the station's policy
    pub async fn connect(&self) -> Result<(), RetryError<tfp::Error>> {
        self.retry
            .run("Connection", || self.bridge.connect(&self.host, self.port))
            .await?;
        info!("Connected to {}:{}", self.host, self.port);
        Ok(())
    }

    /// Ask every device to announce itself, retrying with the station's policy
    pub async fn enumerate(&self) -> Result<(), RetryError<tfp::Error>> {
        self.retry.run("Enumerate", || self.bridge.enumerate()).await
    }

    pub async fn shutdown(&self) -> tfp::Result<()> {
        self.bridge.disconnect().await
    }

    pub fn is_active(&self, role: DeviceRole) -> bool {
        self.devices.read().is_active(role)
    }

    pub fn active_roles(&self) -> Vec<DeviceRole> {
        let devices = self.devices.read();
        DeviceRole::ALL.into_iter().filter(|role| devices.is_active(*role)).collect()
    }

    pub async fn on_connected(&self, reason: ConnectReason) {
        if reason != ConnectReason::AutoReconnect {
            return;
        }

        info!("Auto Reconnect");
        if let Err(e) = self.enumerate().await {
            error!("Re-enumeration after reconnect failed: {}", e);
        }
    }

    pub async fn on_enumerate(self: &Arc<Self>, event: &EnumerateEvent) {
        match event.enumeration_type {
            EnumerationType::Available | EnumerationType::Connected => {}
            other => {
                debug!("Ignoring {:?} enumeration of {}", other, event.uid);
                return;
            }
        }

        let Some(model) = DeviceModel::from_identifier(event.device_identifier) else {
            debug!("Ignoring device {} with identifier {}", event.uid, event.device_identifier);
            return;
        };

        let uid = &event.uid;
        let result = match model {
            DeviceModel::Display => self.init_display(uid).await,
            DeviceModel::LightSensor(model) => self.init_light_sensor(model, uid).await,
            DeviceModel::HumiditySensor(model) => self.init_humidity_sensor(model, uid).await,
            DeviceModel::Barometer(model) => self.init_barometer(model, uid).await,
            DeviceModel::MasterUnit => self.init_master_unit(uid).await,
        };

        match result {
            Ok(()) => info!("{} initialized", model),
            Err(e) => {
                error!("{} init failed: {}", model, e);
                self.devices.write().clear(model.role());
            }
        }
    }

    async fn init_display(self: &Arc<Self>, uid: &str) -> tfp::Result<()> {
        let lcd = self.bridge.display(uid)?;
        lcd.clear_display().await?;
        lcd.backlight_on().await?;

        let events = lcd.button_pressed_events();
        self.devices.write().display = Some(lcd);
        self.spawn_listener(events, |station, button| async move {
            station.on_button_pressed(button).await;
        });
        Ok(())
    }

    async fn init_light_sensor(
        self: &Arc<Self>,
        model: LightSensorModel,
        uid: &str,
    ) -> tfp::Result<()> {
        let sensor = self.bridge.light_sensor(model, uid)?;
        sensor.enable_illuminance_callback(self.callback_period_ms).await?;

        let events = sensor.illuminance_events();
        self.devices.write().light_sensor = Some(sensor);
        self.spawn_listener(events, |station, illuminance| async move {
            station.on_illuminance(illuminance).await;
        });
        Ok(())
    }

    async fn init_humidity_sensor(
        self: &Arc<Self>,
        model: HumiditySensorModel,
        uid: &str,
    ) -> tfp::Result<()> {
        let sensor = self.bridge.humidity_sensor(model, uid)?;
        sensor.enable_humidity_callback(self.callback_period_ms).await?;

        let events = sensor.humidity_events();
        self.devices.write().humidity_sensor = Some(sensor);
        self.spawn_listener(events, |station, humidity| async move {
            station.on_humidity(humidity).await;
        });
        Ok(())
    }

    async fn init_barometer(
        self: &Arc<Self>,
        model: PressureSensorModel,
        uid: &str,
    ) -> tfp::Result<()> {
        let sensor = self.bridge.barometer(model, uid)?;
        sensor.enable_air_pressure_callback(self.callback_period_ms).await?;

        let events = sensor.air_pressure_events();
        self.devices.write().barometer = Some(sensor);
        self.spawn_listener(events, |station, air_pressure| async move {
            station.on_air_pressure(air_pressure).await;
        });
        Ok(())
    }

    async fn init_master_unit(&self, uid: &str) -> tfp::Result<()> {
        let master = self.bridge.master_unit(uid)?;
        master.disable_status_led().await?;
        self.devices.write().master_unit = Some(master);
        Ok(())
    }

    pub async fn on_button_pressed(&self, button: u8) {
        let Some(lcd) = self.display() else {
            return;
        };

        if let Ok(pressed) = lcd.is_button_pressed(button).await {
            debug!("Button pressed {}", pressed);
        }
        debug!("It was button {}", button);

        if button != BACKLIGHT_BUTTON {
            return;
        }

        let toggled = match lcd.is_backlight_on().await {
            Ok(true) => lcd.backlight_off().await,
            Ok(false) => lcd.backlight_on().await,
            Err(e) => Err(e),
        };
        if let Err(e) = toggled {
            error!("Could not toggle backlight: {}", e);
        }
    }

    pub async fn on_illuminance(&self, illuminance: u32) {
        if let Some(lcd) = self.display() {
            write_line(lcd.as_ref(), display::illuminance(illuminance)).await;
        }
    }

    /// Write humidity, then fetch the temperature from the same sensor for row 3.
    ///
    /// Sensors without a thermometer leave row 3 untouched.
    pub async fn on_humidity(&self, humidity: u16) {
        let Some(lcd) = self.display() else {
            return;
        };
        write_line(lcd.as_ref(), display::humidity(humidity)).await;

        let sensor = self.devices.read().humidity_sensor.clone();
        let Some(sensor) = sensor else {
            error!("Could not get temperature: {} not available", DeviceRole::HumiditySensor);
            return;
        };

        match sensor.get_temperature().await {
            Ok(Some(temperature)) => {
                write_line(lcd.as_ref(), display::temperature(temperature)).await
            }
            Ok(None) => debug!("No temperature reading on this humidity sensor"),
            Err(e) => error!("Could not get temperature: {}", e),
        }
    }

    pub async fn on_air_pressure(&self, air_pressure: i32) {
        if let Some(lcd) = self.display() {
            write_line(lcd.as_ref(), display::air_pressure(air_pressure)).await;
        }
    }

    fn display(&self) -> Option<Arc<dyn CharacterDisplay>> {
        self.devices.read().display.clone()
    }

    /// Run `handler` for every value on `events` until the stream ends or the
    /// station is dropped.
    fn spawn_listener<T, F, Fut>(self: &Arc<Self>, mut events: Events<T>, handler: F)
    where
        T: Send + 'static,
        F: Fn(Arc<Station>, T) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let station: Weak<Station> = Arc::downgrade(self);

        tokio::spawn(async move {
            while let Some(value) = events.recv().await {
                let Some(station) = station.upgrade() else {
                    break;
                };
                handler(station, value).await;
            }
        });
    }
}

async fn write_line(lcd: &dyn CharacterDisplay, line: DisplayLine) {
    match lcd.write_line(line.row, 0, &line.text).await {
        Ok(()) => debug!("Write to line {}: {}", line.row, line.printable()),
        Err(e) => error!("Could not write to line {}: {}", line.row, e),
    }
}
