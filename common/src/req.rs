//! Request and response bodies exchanged with the weather backend.

/// Firmware and network details reported by a device when it checks in.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct DeviceConfig {
    pub version: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct DeviceSummary {
    pub id: i32,
    pub name: String,
    pub config: DeviceConfig,
    pub room: Option<i32>,
    pub location: Option<String>, // room name
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Room {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct DevicesResponse {
    pub devices: Vec<DeviceSummary>,
    pub rooms: Vec<Room>,
}

/// Check-in body. `uuid` is only honoured when it names an already
/// registered device.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct RegisterDevice {
    #[serde(default)]
    pub uuid: Option<String>,
    pub name: String,
    pub version: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Registered {
    pub uuid: String,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct UpdateDevice {
    pub id: i32,
    pub name: String,
    #[serde(default, alias = "location")]
    pub room: Option<i32>,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct WeatherSubmission {
    pub uuid: String,
    pub temperature: f64, // °C
    pub humidity: f64,    // percent
    pub pressure: f64,    // hPa
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Reading {
    pub id: i32,
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct NewRoom {
    pub name: String,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct UpdateRoom {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Ack {
    pub status: String,
}

impl Ack {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Health {
    pub version: String,
    pub uptime: i64, // s
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct ErrorBody {
    pub error: String,
}
