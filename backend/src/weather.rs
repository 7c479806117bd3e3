//! Weather ingestion. Only registered devices may append to the log.

use chrono::Utc;
use common::req::{Reading, WeatherSubmission};
use log::{debug, warn};

use crate::db::{models::NewReading, Db};
use crate::error::ApiError;

pub fn submit(db: &mut Db, mes: &WeatherSubmission) -> Result<Reading, ApiError> {
    if mes.uuid.trim().is_empty() {
        return Err(ApiError::validation("uuid must not be empty"));
    }
    for (field, value) in [
        ("temperature", mes.temperature),
        ("humidity", mes.humidity),
        ("pressure", mes.pressure),
    ] {
        if !value.is_finite() {
            return Err(ApiError::validation(format!("{field} must be a finite number")));
        }
    }

    if db.device_by_uuid(&mes.uuid)?.is_none() {
        warn!("reading from unknown device {}", mes.uuid);
        return Err(ApiError::Unauthorized(
            "Device does not exist, check in first".to_string(),
        ));
    }

    let stored = db.insert_reading(&NewReading {
        device_uuid: &mes.uuid,
        temperature: mes.temperature,
        humidity: mes.humidity,
        pressure: mes.pressure,
        created_at: Utc::now().timestamp_millis(),
    })?;
    debug!("stored reading {} from {}", stored.id, mes.uuid);

    Ok(stored.into())
}

pub fn list(db: &mut Db, limit: Option<i64>) -> Result<Vec<Reading>, ApiError> {
    if matches!(limit, Some(n) if n < 0) {
        return Err(ApiError::validation("limit must not be negative"));
    }
    Ok(db.readings(limit)?.into_iter().map(Reading::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry;
    use common::req::RegisterDevice;

    fn registered(db: &mut Db) -> String {
        registry::register(
            db,
            &RegisterDevice {
                uuid: None,
                name: "balcony".to_string(),
                version: "0.3.1".to_string(),
                address: "192.168.1.20".to_string(),
            },
        )
        .unwrap()
    }

    fn sample(uuid: &str, temperature: f64) -> WeatherSubmission {
        WeatherSubmission {
            uuid: uuid.to_string(),
            temperature,
            humidity: 55.0,
            pressure: 1009.5,
        }
    }

    #[test]
    fn unregistered_device_is_refused_without_writing() {
        let mut db = Db::in_memory().unwrap();
        let err = submit(&mut db, &sample("not-a-device", 20.0)).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
        assert!(list(&mut db, None).unwrap().is_empty());
    }

    #[test]
    fn accepted_reading_is_echoed() {
        let mut db = Db::in_memory().unwrap();
        let token = registered(&mut db);

        let res = submit(&mut db, &sample(&token, 0.0)).unwrap();
        assert_eq!(res.temperature, 0.0);
        assert_eq!(res.humidity, 55.0);
        assert_eq!(res.pressure, 1009.5);
        assert!(res.id > 0);
    }

    #[test]
    fn list_returns_every_reading_newest_first() {
        let mut db = Db::in_memory().unwrap();
        let token = registered(&mut db);

        for t in 0..5 {
            submit(&mut db, &sample(&token, t as f64)).unwrap();
        }

        let temps: Vec<f64> = list(&mut db, None)
            .unwrap()
            .iter()
            .map(|r| r.temperature)
            .collect();
        assert_eq!(temps, vec![4.0, 3.0, 2.0, 1.0, 0.0]);

        let newest = list(&mut db, Some(2)).unwrap();
        assert_eq!(newest.len(), 2);
        assert_eq!(newest[0].temperature, 4.0);
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let mut db = Db::in_memory().unwrap();
        let token = registered(&mut db);

        let err = submit(&mut db, &sample(&token, f64::NAN)).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(list(&mut db, None).unwrap().is_empty());
    }

    #[test]
    fn negative_limit_is_rejected() {
        let mut db = Db::in_memory().unwrap();
        assert!(matches!(
            list(&mut db, Some(-1)).unwrap_err(),
            ApiError::Validation(_)
        ));
    }
}
