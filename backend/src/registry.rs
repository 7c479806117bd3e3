//! Device registry: check-in, listing and room grouping.
//!
//! Devices are identified by a server-issued UUID token. The token is handed
//! out once per network address and later presented when submitting
//! readings.

use chrono::Utc;
use common::req::{self, DeviceSummary, DevicesResponse, RegisterDevice, UpdateDevice};
use log::{info, warn};
use uuid::Uuid;

use crate::db::{models::NewDevice, Db};
use crate::error::ApiError;

fn non_empty<'a>(field: &str, value: &'a str) -> Result<&'a str, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::validation(format!("{field} must not be empty")));
    }
    Ok(value)
}

/// Returns the identifier of the device, registering it on first check-in.
pub fn register(db: &mut Db, dev: &RegisterDevice) -> Result<String, ApiError> {
    let name = non_empty("name", &dev.name)?;
    let version = non_empty("version", &dev.version)?;
    let address = non_empty("address", &dev.address)?;

    if let Some(token) = dev.uuid.as_deref().filter(|t| !t.is_empty()) {
        if let Some(known) = db.device_by_uuid(token)? {
            return Ok(known.uuid);
        }
    }

    if let Some(known) = db.device_by_address(address)? {
        return Ok(known.uuid);
    }

    let mut token = Uuid::new_v4().to_string();
    while db.device_by_uuid(&token)?.is_some() {
        token = Uuid::new_v4().to_string();
    }

    db.insert_device(&NewDevice {
        uuid: &token,
        name,
        version,
        address,
        created_at: Utc::now().timestamp_millis(),
    })?;
    info!("registered device {name} at {address}");

    Ok(token)
}

pub fn list(db: &mut Db) -> Result<DevicesResponse, ApiError> {
    let devices: Vec<DeviceSummary> = db
        .devices()?
        .into_iter()
        .map(|(dev, location)| dev.summary(location))
        .collect();
    let rooms = db.rooms()?.into_iter().map(req::Room::from).collect();

    Ok(DevicesResponse { devices, rooms })
}

/// Renames a device and (re)assigns its room. Unknown ids are ignored.
pub fn rename(db: &mut Db, upd: &UpdateDevice) -> Result<(), ApiError> {
    let name = non_empty("name", &upd.name)?;

    if let Some(room) = upd.room {
        if db.room(room)?.is_none() {
            return Err(ApiError::validation(format!("room {room} does not exist")));
        }
    }

    if db.update_device(upd.id, name, upd.room)? == 0 {
        warn!("rename of unknown device {}", upd.id);
    }
    Ok(())
}

pub fn remove(db: &mut Db, id: i32) -> Result<(), ApiError> {
    if db.delete_device(id)? == 0 {
        warn!("delete of unknown device {id}");
    }
    Ok(())
}

pub fn list_rooms(db: &mut Db) -> Result<Vec<req::Room>, ApiError> {
    Ok(db.rooms()?.into_iter().map(req::Room::from).collect())
}

pub fn create_room(db: &mut Db, room: &req::NewRoom) -> Result<req::Room, ApiError> {
    let name = non_empty("name", &room.name)?;
    Ok(db.insert_room(name)?.into())
}

pub fn rename_room(db: &mut Db, room: &req::UpdateRoom) -> Result<(), ApiError> {
    let name = non_empty("name", &room.name)?;
    if db.update_room(room.id, name)? == 0 {
        warn!("rename of unknown room {}", room.id);
    }
    Ok(())
}

/// Devices assigned to the room stay registered, unassigned.
pub fn remove_room(db: &mut Db, id: i32) -> Result<(), ApiError> {
    if db.delete_room(id)? == 0 {
        warn!("delete of unknown room {id}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_in(name: &str, address: &str) -> RegisterDevice {
        RegisterDevice {
            uuid: None,
            name: name.to_string(),
            version: "1.0".to_string(),
            address: address.to_string(),
        }
    }

    #[test]
    fn same_address_gets_same_identifier() {
        let mut db = Db::in_memory().unwrap();
        let first = register(&mut db, &check_in("A", "10.0.0.1")).unwrap();
        let second = register(&mut db, &check_in("B", "10.0.0.1")).unwrap();
        assert_eq!(first, second);
        assert_eq!(list(&mut db).unwrap().devices.len(), 1);
    }

    #[test]
    fn different_addresses_get_distinct_identifiers() {
        let mut db = Db::in_memory().unwrap();
        let a = register(&mut db, &check_in("A", "10.0.0.1")).unwrap();
        let b = register(&mut db, &check_in("B", "10.0.0.2")).unwrap();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
    }

    #[test]
    fn known_token_checks_in_from_new_address() {
        let mut db = Db::in_memory().unwrap();
        let token = register(&mut db, &check_in("A", "10.0.0.1")).unwrap();

        let mut moved = check_in("A", "10.0.0.9");
        moved.uuid = Some(token.clone());
        assert_eq!(register(&mut db, &moved).unwrap(), token);
    }

    #[test]
    fn unknown_token_is_not_adopted() {
        let mut db = Db::in_memory().unwrap();
        let mut dev = check_in("A", "10.0.0.1");
        dev.uuid = Some("chosen-by-client".to_string());

        let token = register(&mut db, &dev).unwrap();
        assert_ne!(token, "chosen-by-client");
    }

    #[test]
    fn empty_fields_are_rejected() {
        let mut db = Db::in_memory().unwrap();
        let err = register(&mut db, &check_in(" ", "10.0.0.1")).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn rename_unknown_device_is_noop() {
        let mut db = Db::in_memory().unwrap();
        let upd = UpdateDevice {
            id: 7,
            name: "ghost".to_string(),
            room: None,
        };
        assert!(rename(&mut db, &upd).is_ok());
        assert!(list(&mut db).unwrap().devices.is_empty());
    }

    #[test]
    fn rename_into_missing_room_is_rejected() {
        let mut db = Db::in_memory().unwrap();
        register(&mut db, &check_in("A", "10.0.0.1")).unwrap();
        let id = list(&mut db).unwrap().devices[0].id;

        let upd = UpdateDevice {
            id,
            name: "A".to_string(),
            room: Some(99),
        };
        assert!(matches!(
            rename(&mut db, &upd).unwrap_err(),
            ApiError::Validation(_)
        ));
    }

    #[test]
    fn removing_room_keeps_devices() {
        let mut db = Db::in_memory().unwrap();
        register(&mut db, &check_in("A", "10.0.0.1")).unwrap();
        register(&mut db, &check_in("B", "10.0.0.2")).unwrap();
        let room = create_room(
            &mut db,
            &req::NewRoom {
                name: "Living room".to_string(),
            },
        )
        .unwrap();

        for dev in list(&mut db).unwrap().devices {
            rename(
                &mut db,
                &UpdateDevice {
                    id: dev.id,
                    name: dev.name,
                    room: Some(room.id),
                },
            )
            .unwrap();
        }
        let listed = list(&mut db).unwrap();
        assert!(listed
            .devices
            .iter()
            .all(|d| d.location.as_deref() == Some("Living room")));

        remove_room(&mut db, room.id).unwrap();

        let listed = list(&mut db).unwrap();
        assert_eq!(listed.devices.len(), 2);
        assert!(listed.devices.iter().all(|d| d.room.is_none()));
        assert!(listed.rooms.is_empty());
    }

    #[test]
    fn removed_device_token_is_not_reissued() {
        let mut db = Db::in_memory().unwrap();
        let old = register(&mut db, &check_in("A", "10.0.0.1")).unwrap();
        let id = list(&mut db).unwrap().devices[0].id;
        remove(&mut db, id).unwrap();

        let new = register(&mut db, &check_in("A", "10.0.0.1")).unwrap();
        assert_ne!(old, new);
    }
}
