use common::req;
use diesel::prelude::*;

use crate::schema::*;

#[derive(Debug, Clone, Queryable)]
#[allow(unused)]
pub struct Device {
    pub id: i32,
    pub uuid: String,
    pub name: String,
    pub version: String,
    pub address: String,
    pub room_id: Option<i32>,
    pub created_at: i64, // ms
}

impl Device {
    pub fn config(&self) -> req::DeviceConfig {
        req::DeviceConfig {
            version: self.version.clone(),
            address: self.address.clone(),
        }
    }

    /// Listing view of the device; `location` is the name of its room.
    pub fn summary(&self, location: Option<String>) -> req::DeviceSummary {
        req::DeviceSummary {
            id: self.id,
            name: self.name.clone(),
            config: self.config(),
            room: self.room_id,
            location,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name=devices)]
pub struct NewDevice<'a> {
    pub uuid: &'a str,
    pub name: &'a str,
    pub version: &'a str,
    pub address: &'a str,
    pub created_at: i64,
}

#[derive(Debug, Clone, Queryable)]
pub struct Room {
    pub id: i32,
    pub name: String,
}

impl From<Room> for req::Room {
    fn from(room: Room) -> Self {
        Self {
            id: room.id,
            name: room.name,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name=rooms)]
pub struct NewRoom<'a> {
    pub name: &'a str,
}

#[derive(Debug, Clone, Queryable)]
#[allow(unused)]
pub struct WeatherReading {
    pub id: i32,
    pub device_uuid: String,
    pub temperature: f64, // °C
    pub humidity: f64,    // percent
    pub pressure: f64,    // hPa
    pub created_at: i64,  // ms
}

impl From<WeatherReading> for req::Reading {
    fn from(mes: WeatherReading) -> Self {
        Self {
            id: mes.id,
            temperature: mes.temperature,
            humidity: mes.humidity,
            pressure: mes.pressure,
        }
    }
}

#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name=weather)]
pub struct NewReading<'a> {
    pub device_uuid: &'a str,
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub created_at: i64,
}
