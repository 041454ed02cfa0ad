//! Display lines
//!
//! Each reading owns one row of the 20x4 display and rewrites it from column
//! 0. Text is produced as bytes in the display's own character set.

/// Degree sign in the LCD 20x4 character set
pub const DEGREE: u8 = 0xDF;

/// Row assignment
pub mod row {
    pub const ILLUMINANCE: u8 = 0;
    pub const HUMIDITY: u8 = 1;
    pub const AIR_PRESSURE: u8 = 2;
    pub const TEMPERATURE: u8 = 3;
}

/// A formatted row ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayLine {
    pub row: u8,
    pub text: Vec<u8>,
}

impl DisplayLine {
    /// Text with the display charset mapped back to readable characters, for logs
    pub fn printable(&self) -> String {
        self.text
            .iter()
            .map(|&b| if b == DEGREE { '°' } else { char::from(b) })
            .collect()
    }
}

/// Illuminance in 1/100 lux
pub fn illuminance(raw: u32) -> DisplayLine {
    DisplayLine {
        row: row::ILLUMINANCE,
        text: format!("Illuminanz {:6.2} lx", raw as f64 / 100.0).into_bytes(),
    }
}

/// Relative humidity in 1/100 %
pub fn humidity(raw: u16) -> DisplayLine {
    DisplayLine {
        row: row::HUMIDITY,
        text: format!("Luftfeuchte {:5.2} %", raw as f64 / 100.0).into_bytes(),
    }
}

/// Air pressure in 1/1000 mbar
pub fn air_pressure(raw: i32) -> DisplayLine {
    DisplayLine {
        row: row::AIR_PRESSURE,
        text: format!("Luftdruck {:7.2} mb", raw as f64 / 1000.0).into_bytes(),
    }
}

/// Temperature in 1/100 °C
pub fn temperature(raw: i16) -> DisplayLine {
    let mut text = format!("Temperatur {:6.2} ", raw as f64 / 100.0).into_bytes();
    text.push(DEGREE);
    text.push(b'C');

    DisplayLine {
        row: row::TEMPERATURE,
        text,
    }
}
