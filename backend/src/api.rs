use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard},
};

use actix_cors::Cors;
use actix_web::{
    delete,
    dev::Payload,
    get,
    middleware::Logger,
    post, put,
    web::{self, Data},
    App, FromRequest, HttpMessage, HttpRequest, HttpServer, Responder,
};
use anyhow::anyhow;
use chrono::{DateTime, Utc};
use common::req::{
    Ack, Health, NewRoom, RegisterDevice, Registered, UpdateDevice, UpdateRoom,
    WeatherSubmission,
};
use log::info;

use crate::config::Config;
use crate::db::Db;
use crate::error::ApiError;
use crate::{registry, weather};

pub type SharedDb = Arc<Mutex<Db>>;

/// Request body accepted either as JSON or as a url-encoded form, chosen by
/// the `Content-Type` header so parse errors come from the matching decoder.
struct Body<T>(T);

impl<T: serde::de::DeserializeOwned + 'static> FromRequest for Body<T> {
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        if req.content_type() == FORM_CONTENT_TYPE {
            let fut = web::Form::<T>::from_request(req, payload);
            Box::pin(async move { fut.await.map(|web::Form(v)| Body(v)) })
        } else {
            let fut = web::Json::<T>::from_request(req, payload);
            Box::pin(async move { fut.await.map(|web::Json(v)| Body(v)) })
        }
    }
}

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone, Copy)]
struct Started(DateTime<Utc>);

fn lock(db: &SharedDb) -> Result<MutexGuard<'_, Db>, ApiError> {
    db.lock()
        .map_err(|_| ApiError::Internal(anyhow!("database lock poisoned")))
}

#[derive(serde::Deserialize, Debug)]
struct WeatherQuery {
    limit: Option<i64>,
}

#[derive(serde::Deserialize, Debug)]
struct IdQuery {
    id: i32,
}

#[get("/weather")]
async fn api_weather(
    query: web::Query<WeatherQuery>,
    db: web::Data<SharedDb>,
) -> Result<impl Responder, ApiError> {
    let res = weather::list(&mut *lock(&db)?, query.limit)?;
    Ok(web::Json(res))
}

#[post("/weather")]
async fn api_submit_weather(
    Body(mes): Body<WeatherSubmission>,
    db: web::Data<SharedDb>,
) -> Result<impl Responder, ApiError> {
    let res = weather::submit(&mut *lock(&db)?, &mes)?;
    Ok(web::Json(res))
}

#[get("/devices")]
async fn api_devices(db: web::Data<SharedDb>) -> Result<impl Responder, ApiError> {
    let res = registry::list(&mut *lock(&db)?)?;
    Ok(web::Json(res))
}

#[post("/devices")]
async fn api_register_device(
    Body(dev): Body<RegisterDevice>,
    db: web::Data<SharedDb>,
) -> Result<impl Responder, ApiError> {
    let uuid = registry::register(&mut *lock(&db)?, &dev)?;
    Ok(web::Json(Registered { uuid }))
}

#[put("/devices")]
async fn api_update_device(
    Body(upd): Body<UpdateDevice>,
    db: web::Data<SharedDb>,
) -> Result<impl Responder, ApiError> {
    registry::rename(&mut *lock(&db)?, &upd)?;
    Ok(web::Json(Ack::ok()))
}

#[delete("/devices")]
async fn api_delete_device(
    query: web::Query<IdQuery>,
    db: web::Data<SharedDb>,
) -> Result<impl Responder, ApiError> {
    registry::remove(&mut *lock(&db)?, query.id)?;
    Ok(web::Json(Ack::ok()))
}

#[get("/rooms")]
async fn api_rooms(db: web::Data<SharedDb>) -> Result<impl Responder, ApiError> {
    let res = registry::list_rooms(&mut *lock(&db)?)?;
    Ok(web::Json(res))
}

#[post("/rooms")]
async fn api_create_room(
    Body(room): Body<NewRoom>,
    db: web::Data<SharedDb>,
) -> Result<impl Responder, ApiError> {
    let res = registry::create_room(&mut *lock(&db)?, &room)?;
    Ok(web::Json(res))
}

#[put("/rooms")]
async fn api_update_room(
    Body(room): Body<UpdateRoom>,
    db: web::Data<SharedDb>,
) -> Result<impl Responder, ApiError> {
    registry::rename_room(&mut *lock(&db)?, &room)?;
    Ok(web::Json(Ack::ok()))
}

#[delete("/rooms")]
async fn api_delete_room(
    query: web::Query<IdQuery>,
    db: web::Data<SharedDb>,
) -> Result<impl Responder, ApiError> {
    registry::remove_room(&mut *lock(&db)?, query.id)?;
    Ok(web::Json(Ack::ok()))
}

#[get("/health")]
async fn api_health(started: web::Data<Started>) -> impl Responder {
    web::Json(Health {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: (Utc::now() - started.0).num_seconds(),
    })
}

/// Routes plus extractor settings that turn malformed input into 400s.
fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::validation(err.to_string()).into()),
    )
    .app_data(
        web::FormConfig::default()
            .error_handler(|err, _req| ApiError::validation(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ApiError::validation(err.to_string()).into()),
    )
    .service(api_weather)
    .service(api_submit_weather)
    .service(api_devices)
    .service(api_register_device)
    .service(api_update_device)
    .service(api_delete_device)
    .service(api_rooms)
    .service(api_create_room)
    .service(api_update_room)
    .service(api_delete_room)
    .service(api_health);
}

fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .send_wildcard()
        .allow_any_method()
        .allow_any_header()
        .max_age(3600)
}

pub async fn new_http_server(db: SharedDb, config: &Config) -> std::io::Result<()> {
    let started = Started(Utc::now());

    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(Data::new(db.clone()))
            .app_data(Data::new(started))
            .configure(configure)
            .wrap(cors())
            .wrap(Logger::default())
    });
    if let Some(workers) = config.workers {
        server = server.workers(workers.get());
    }

    info!("listening on {}:{}", config.bind_address, config.port);
    server
        .bind((config.bind_address.as_str(), config.port))?
        .run()
        .await
}
