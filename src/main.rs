use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use gift_certificates::{
    auth::TokenService,
    cache::{CacheBackend, CacheRegion, MemoryCache, RedisCache, TypedCache},
    certificates::{CertificateStore, IssuanceService, PgCertificateStore},
    config::AppConfig,
    create_router, db,
    delivery::{DeliveryService, DeliveryWorker, EmailOutbox, HttpMailRelay, LogMailer, Mailer, PgEmailOutbox},
    directory::{Directory, PgDirectory},
    documents::{DocumentService, FsAssetStore},
    inventory::{InventoryClient, SoapInventoryClient},
    registration::BatchRegistrationService,
    wizard::WizardService,
    AppState,
};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Gift Certificate API - Starting...");

    let config = Arc::new(AppConfig::from_env().expect("Invalid configuration"));

    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    let cache: Arc<dyn CacheBackend> = match &config.redis_url {
        Some(url) => Arc::new(
            RedisCache::connect(url)
                .await
                .expect("Failed to connect to Redis"),
        ),
        None => {
            tracing::warn!("REDIS_URL not set, using an in-process cache");
            Arc::new(MemoryCache::new())
        }
    };

    let directory: Arc<dyn Directory> = Arc::new(
        PgDirectory::new(db_pool.clone())
            .with_cache(TypedCache::new(cache.clone(), CacheRegion::LinkedAccount)),
    );
    let store: Arc<dyn CertificateStore> = Arc::new(PgCertificateStore::new(db_pool.clone()));

    let inventory: Arc<dyn InventoryClient> = Arc::new(
        SoapInventoryClient::new(config.inventory.clone()).expect("Failed to build inventory client"),
    );

    let mailer: Arc<dyn Mailer> = match &config.mail_relay_url {
        Some(url) => Arc::new(
            HttpMailRelay::new(url.clone(), Duration::from_secs(30)).expect("Failed to build mail relay client"),
        ),
        None => {
            tracing::warn!("MAIL_RELAY_URL not set, delivery emails are only logged");
            Arc::new(LogMailer)
        }
    };

    let registration = BatchRegistrationService::new(
        store.clone(),
        directory.clone(),
        inventory.clone(),
        config.inventory.environment,
        config.default_employee_number.clone(),
    )
    .with_tender_cache(TypedCache::new(cache.clone(), CacheRegion::TenderMethods))
    .with_debug(config.debug);

    let outbox: Arc<dyn EmailOutbox> = Arc::new(PgEmailOutbox::new(db_pool.clone()));
    let delivery_worker =
        DeliveryWorker::new(outbox.clone(), mailer.clone(), config.delivery_poll_interval).spawn();
    let delivery = DeliveryService::new(directory.clone(), outbox, mailer, config.clone());

    let issuance = IssuanceService::new(
        store.clone(),
        directory.clone(),
        inventory,
        registration,
        delivery,
        config.default_membership_number.clone(),
    );

    let documents = DocumentService::new(
        store.clone(),
        directory.clone(),
        Arc::new(FsAssetStore::new(&config.static_root, &config.media_root)),
    );

    let wizard = WizardService::new(cache, directory.clone(), store.clone(), issuance.clone(), &config);

    let state = AppState {
        config: config.clone(),
        db: Some(db_pool),
        directory,
        store,
        documents,
        issuance,
        wizard,
        tokens: Arc::new(TokenService::new(config.jwt_secret.clone())),
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Gift Certificate API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .expect("Server error");

    delivery_worker.stop().await;
}
