use actix_cors::Cors;
use actix_web::{
    middleware::{Logger, NormalizePath},
    web, App, HttpServer,
};
use std::sync::Arc;

use taskforge_auth::{
    auth::AuthMiddleware,
    clock::{Clock, SystemClock},
    config::Config,
    notifier::{Notifier, WebhookNotifier},
    routes::{self, health},
    state::AppState,
    store::{postgres, PgProjectStore, PgTaskStore, PgUserStore},
};

fn cors(allowed_origins: &[String]) -> Cors {
    if allowed_origins.is_empty() {
        return Cors::permissive();
    }
    allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allow_any_method()
        .allow_any_header()
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    log::debug!("{:?}", config);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let notifier: Option<Arc<dyn Notifier>> = match &config.notify_webhook_url {
        Some(url) => match WebhookNotifier::new(url.clone()) {
            Ok(notifier) => Some(Arc::new(notifier)),
            Err(e) => {
                log::error!("Failed to build webhook client: {}", e);
                std::process::exit(1);
            }
        },
        None => {
            log::warn!("NOTIFY_WEBHOOK_URL is not set; password resets run in demo mode");
            None
        }
    };

    let state = match &config.database_url {
        Some(url) => {
            let pool = match postgres::connect(url).await {
                Ok(pool) => pool,
                Err(e) => {
                    log::error!("failed to open database: {}", e);
                    std::process::exit(1);
                }
            };
            AppState::new(
                &config,
                Arc::new(PgUserStore::new(pool.clone())),
                Arc::new(PgProjectStore::new(pool.clone())),
                Arc::new(PgTaskStore::new(pool)),
                notifier,
                clock,
            )
        }
        None => {
            log::warn!("DATABASE_URL is not set; using in-memory stores");
            AppState::in_memory(&config, notifier, clock)
        }
    };
    let state = web::Data::new(state);

    log::info!("Starting TaskForge auth server at {}", config.server_url());

    let allowed_origins = config.cors_allowed_origins.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(cors(&allowed_origins))
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .service(health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
