use actix_cors::Cors;
use actix_web::{middleware::Logger, App, HttpServer};
use stockbook_backend::config::AppConfig;
use stockbook_backend::store::{Store, TableKind};
use stockbook_backend::{configure_routes, AppServices};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;
    info!("Starting Stockbook on {}:{}", config.host, config.port);

    let store = Store::from_config(&config);
    info!("Using the {} store", store.backend_name());
    for kind in TableKind::ALL {
        match store.table_ref(kind) {
            Ok(Some(table_ref)) => info!("{} -> {}", kind, table_ref),
            Ok(None) => warn!("No sheet URL configured for {}; it will read as empty", kind),
            Err(e) => warn!("Sheet URL for {} is unusable: {}", kind, e),
        }
    }

    let services = AppServices::new(store);
    let cors_origin = config.cors_allowed_origin.clone();

    HttpServer::new(move || {
        let cors = match &cors_origin {
            Some(origin) => Cors::default()
                .allowed_origin(origin)
                .allowed_methods(vec!["GET", "POST"])
                .allow_any_header()
                .max_age(3600),
            None => Cors::default(),
        };

        let services = services.clone();
        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .configure(move |cfg| services.register(cfg))
            .configure(configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
