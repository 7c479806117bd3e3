use std::sync::{Arc, Mutex};

use anyhow::Result;
use log::info;

mod api;
mod config;
mod db;
mod error;
mod registry;
mod schema;
mod weather;

#[actix_web::main]
async fn main() -> Result<()> {
    let config = config::Config::from_env()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("opening database {}", config.database_url);
    let db = Arc::new(Mutex::new(db::Db::connect(&config.database_url)?));

    api::new_http_server(db, &config).await?;
    Ok(())
}
