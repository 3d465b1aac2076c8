mod config;
mod error;
mod handlers;
mod inference;
mod models;
mod preprocess;
mod ranking;
mod upload;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::handlers::AppState;
use crate::inference::ModelProvider;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        model = %config.model_source,
        upload_dir = %config.upload_dir.display(),
        "loaded configuration"
    );

    let provider = Arc::new(ModelProvider::new(config.model_source.clone()));
    if config.preload_model {
        let provider = Arc::clone(&provider);
        actix_rt::spawn(async move {
            if provider.get().await.is_err() {
                tracing::warn!("model preload failed, the next request will retry");
            }
        });
    }

    let state = web::Data::new(AppState {
        provider,
        upload_dir: config.upload_dir.clone(),
    });
    let prefix = config.route_prefix.clone();

    tracing::info!(
        "Server running at http://{}:{}{}/",
        config.bind_addr,
        config.port,
        prefix
    );

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .service(handlers::scope(&prefix))
    })
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
