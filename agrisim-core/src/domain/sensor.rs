//! Sensor readings: one timestamped sample of all eight field channels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The eight environmental channels a field station reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SensorChannel {
    Temperature,
    Humidity,
    SoilMoisture,
    LightIntensity,
    BatteryLevel,
    Rainfall,
    WindSpeed,
    AirQuality,
}

impl SensorChannel {
    pub const ALL: [SensorChannel; 8] = [
        SensorChannel::Temperature,
        SensorChannel::Humidity,
        SensorChannel::SoilMoisture,
        SensorChannel::LightIntensity,
        SensorChannel::BatteryLevel,
        SensorChannel::Rainfall,
        SensorChannel::WindSpeed,
        SensorChannel::AirQuality,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SensorChannel::Temperature => "temperature",
            SensorChannel::Humidity => "humidity",
            SensorChannel::SoilMoisture => "soilMoisture",
            SensorChannel::LightIntensity => "lightIntensity",
            SensorChannel::BatteryLevel => "batteryLevel",
            SensorChannel::Rainfall => "rainfall",
            SensorChannel::WindSpeed => "windSpeed",
            SensorChannel::AirQuality => "airQuality",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            SensorChannel::Temperature => "°C",
            SensorChannel::Humidity | SensorChannel::SoilMoisture | SensorChannel::BatteryLevel => {
                "%"
            }
            SensorChannel::LightIntensity => "lux",
            SensorChannel::Rainfall => "mm",
            SensorChannel::WindSpeed => "km/h",
            SensorChannel::AirQuality => "AQI",
        }
    }
}

impl fmt::Display for SensorChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Current value of every channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorValues {
    pub temperature: f64,
    pub humidity: f64,
    pub soil_moisture: f64,
    pub light_intensity: f64,
    pub battery_level: f64,
    pub rainfall: f64,
    pub wind_speed: f64,
    pub air_quality: f64,
}

impl SensorValues {
    pub fn get(&self, channel: SensorChannel) -> f64 {
        match channel {
            SensorChannel::Temperature => self.temperature,
            SensorChannel::Humidity => self.humidity,
            SensorChannel::SoilMoisture => self.soil_moisture,
            SensorChannel::LightIntensity => self.light_intensity,
            SensorChannel::BatteryLevel => self.battery_level,
            SensorChannel::Rainfall => self.rainfall,
            SensorChannel::WindSpeed => self.wind_speed,
            SensorChannel::AirQuality => self.air_quality,
        }
    }

    pub fn set(&mut self, channel: SensorChannel, value: f64) {
        let slot = match channel {
            SensorChannel::Temperature => &mut self.temperature,
            SensorChannel::Humidity => &mut self.humidity,
            SensorChannel::SoilMoisture => &mut self.soil_moisture,
            SensorChannel::LightIntensity => &mut self.light_intensity,
            SensorChannel::BatteryLevel => &mut self.battery_level,
            SensorChannel::Rainfall => &mut self.rainfall,
            SensorChannel::WindSpeed => &mut self.wind_speed,
            SensorChannel::AirQuality => &mut self.air_quality,
        };
        *slot = value;
    }

    /// Iterate `(channel, value)` pairs in canonical channel order.
    pub fn iter(&self) -> impl Iterator<Item = (SensorChannel, f64)> + '_ {
        SensorChannel::ALL.into_iter().map(|c| (c, self.get(c)))
    }
}

/// One timestamped sample. Serializes flat, the way the dashboard charts expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub values: SensorValues,
}

impl SensorReading {
    pub fn value(&self, channel: SensorChannel) -> f64 {
        self.values.get(channel)
    }
}
