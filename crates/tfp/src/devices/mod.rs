//! Typed bindings for the devices the station uses
//!
//! Each binding wraps a [`Device`](crate::Device) and exposes the calls and
//! callbacks of one device type. Callbacks are delivered as typed streams,
//! one per event kind.

mod ambient_light;
mod ambient_light_v2;
mod ambient_light_v3;
mod barometer;
mod barometer_v2;
mod humidity;
mod humidity_v2;
mod lcd_20x4;
mod master;
mod threshold;

pub use ambient_light::AmbientLight;
pub use ambient_light_v2::{AmbientLightV2, IlluminanceRange, IntegrationTime};
pub use ambient_light_v3::AmbientLightV3;
pub use barometer::Barometer;
pub use barometer_v2::BarometerV2;
pub use humidity::Humidity;
pub use humidity_v2::HumidityV2;
pub use lcd_20x4::Lcd20x4;
pub use master::Master;
pub use threshold::ThresholdOption;
