use crate::schema::*;
use anyhow::Result;
use diesel::connection::SimpleConnection;
use diesel::dsl::max;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use log::debug;

pub mod models;

use models::{Device, NewDevice, NewReading, NewRoom, Room, WeatherReading};

const SCHEMA: &str = r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS rooms (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS devices (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        uuid TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        version TEXT NOT NULL,
        address TEXT NOT NULL UNIQUE,
        room_id INTEGER REFERENCES rooms (id) ON DELETE SET NULL,
        created_at BIGINT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS weather (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        device_uuid TEXT NOT NULL,
        temperature REAL NOT NULL,
        humidity REAL NOT NULL,
        pressure REAL NOT NULL,
        created_at BIGINT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS weather_created_at ON weather (created_at DESC, id DESC);
"#;

/// The relational store shared by every request handler.
pub struct Db {
    conn: SqliteConnection,
    /// Newest `created_at` handed out, keeps the reading log ordered when the
    /// wall clock steps backwards.
    last_reading_at: i64,
}

impl Db {
    /// Opens (or creates) the database and makes sure the schema exists.
    pub fn connect(database_url: &str) -> Result<Self> {
        let mut conn = SqliteConnection::establish(database_url)?;
        conn.batch_execute(SCHEMA)?;

        let last_reading_at = weather::table
            .select(max(weather::created_at))
            .get_result::<Option<i64>>(&mut conn)?
            .unwrap_or(0);

        Ok(Self {
            conn,
            last_reading_at,
        })
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        Self::connect(":memory:")
    }

    pub fn device_by_uuid(&mut self, token: &str) -> Result<Option<Device>> {
        let res = devices::table
            .filter(devices::uuid.eq(token))
            .first::<Device>(&mut self.conn)
            .optional()?;

        Ok(res)
    }

    pub fn device_by_address(&mut self, addr: &str) -> Result<Option<Device>> {
        let res = devices::table
            .filter(devices::address.eq(addr))
            .first::<Device>(&mut self.conn)
            .optional()?;

        Ok(res)
    }

    pub fn insert_device(&mut self, dev: &NewDevice) -> Result<()> {
        debug!("insert device {} ({})", dev.name, dev.address);

        diesel::insert_into(devices::table)
            .values(dev)
            .execute(&mut self.conn)?;

        Ok(())
    }

    /// All devices with the name of the room they are assigned to.
    pub fn devices(&mut self) -> Result<Vec<(Device, Option<String>)>> {
        let res = devices::table
            .left_join(rooms::table)
            .select((devices::all_columns, rooms::name.nullable()))
            .order(devices::id.asc())
            .load::<(Device, Option<String>)>(&mut self.conn)?;

        Ok(res)
    }

    /// Returns the number of rows touched, zero when `device_id` is unknown.
    pub fn update_device(
        &mut self,
        device_id: i32,
        new_name: &str,
        room: Option<i32>,
    ) -> Result<usize> {
        use crate::schema::devices::dsl::*;

        let n = diesel::update(devices.find(device_id))
            .set((name.eq(new_name), room_id.eq(room)))
            .execute(&mut self.conn)?;

        Ok(n)
    }

    pub fn delete_device(&mut self, device_id: i32) -> Result<usize> {
        let n = diesel::delete(devices::table.find(device_id)).execute(&mut self.conn)?;
        Ok(n)
    }

    pub fn rooms(&mut self) -> Result<Vec<Room>> {
        let res = rooms::table
            .order(rooms::id.asc())
            .load::<Room>(&mut self.conn)?;

        Ok(res)
    }

    pub fn room(&mut self, room_id: i32) -> Result<Option<Room>> {
        let res = rooms::table
            .find(room_id)
            .first::<Room>(&mut self.conn)
            .optional()?;

        Ok(res)
    }

    pub fn insert_room(&mut self, room_name: &str) -> Result<Room> {
        let room = diesel::insert_into(rooms::table)
            .values(&NewRoom { name: room_name })
            .get_result::<Room>(&mut self.conn)?;

        Ok(room)
    }

    pub fn update_room(&mut self, room_id: i32, room_name: &str) -> Result<usize> {
        let n = diesel::update(rooms::table.find(room_id))
            .set(rooms::name.eq(room_name))
            .execute(&mut self.conn)?;

        Ok(n)
    }

    /// Member devices lose their room through `ON DELETE SET NULL`.
    pub fn delete_room(&mut self, room_id: i32) -> Result<usize> {
        let n = diesel::delete(rooms::table.find(room_id)).execute(&mut self.conn)?;
        Ok(n)
    }

    pub fn insert_reading(&mut self, mes: &NewReading) -> Result<WeatherReading> {
        let mes = NewReading {
            created_at: mes.created_at.max(self.last_reading_at),
            ..*mes
        };

        let res = diesel::insert_into(weather::table)
            .values(&mes)
            .get_result::<WeatherReading>(&mut self.conn)?;
        self.last_reading_at = mes.created_at;

        Ok(res)
    }

    /// Readings, newest first.
    pub fn readings(&mut self, limit: Option<i64>) -> Result<Vec<WeatherReading>> {
        use crate::schema::weather::dsl::*;

        let res = weather
            .order((created_at.desc(), id.desc()))
            .limit(limit.unwrap_or(i64::MAX))
            .load::<WeatherReading>(&mut self.conn)?;

        Ok(res)
    }
}
