/// One sensor sample, degrees Celsius and percent relative humidity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    pub temperature: f32,
    pub humidity: f32,
}

impl Reading {
    /// Stand-in values until a real sensor is wired: 25.0..=34.9 C and 50.0..=59.9 %.
    pub fn placeholder(temperature_entropy: u32, humidity_entropy: u32) -> Self {
        Self {
            temperature: 25.0 + (temperature_entropy % 100) as f32 / 10.0,
            humidity: 50.0 + (humidity_entropy % 100) as f32 / 10.0,
        }
    }
}

/// Produces a reading on demand. Never fails and never blocks.
pub trait SensorSource {
    fn sample(&mut self) -> Reading;
}
