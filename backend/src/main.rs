mod aggregate;
mod config;
mod error;
mod eyes;
mod model;
mod routes;
mod service;
mod storage;
mod tone;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use config::AppConfig;
use routes::configure_routes;
use service::ClassificationService;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    if let Err(e) = std::fs::create_dir_all(&config.upload_dir) {
        log::error!(
            "Failed to create upload directory {}: {}",
            config.upload_dir.display(),
            e
        );
        return Err(e);
    }
    log::info!("Storing uploads in {}", config.upload_dir.display());

    let service = ClassificationService::from_config(&config).map_err(|e| {
        log::error!("Failed to initialise eye detector client: {}", e);
        std::io::Error::other(format!("Eye detector setup failed: {}", e))
    })?;

    match &config.eyes {
        Some(eyes) => log::info!(
            "Eye attribute detection enabled (model {}, timeout {:?})",
            eyes.model_id,
            eyes.timeout
        ),
        None => log::warn!("ROBOFLOW_API_KEY is not set; eye attribute detection disabled"),
    }

    let bind_address = config.bind_address();
    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(web::Data::new(service.clone()))
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
