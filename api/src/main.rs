use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use roomly_api::{configure_app, middleware::create_cors, AppState};
use roomly_core::{
    InMemoryOtpRepository, InMemoryRateLimiter, OtpManager, OtpManagerConfig, OtpRepository,
    RateLimiter,
};
use roomly_infra::{
    create_notification_dispatcher, NotificationDispatcher, RedisClient, RedisOtpRepository,
    RedisRateLimiter,
};
use roomly_shared::{AppConfig, LimiterBackend, LoggingConfig, StoreBackend};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();
    init_tracing(&config.logging);

    info!(
        environment = ?config.environment,
        store = ?config.otp.store,
        limiter = ?config.rate_limit.backend,
        "Starting Roomly OTP service"
    );

    let notifier = Arc::new(create_notification_dispatcher(
        &config.notification,
        &config.otp,
    ));

    let redis = if config.requires_redis() {
        let client = RedisClient::new(config.cache.clone())
            .await
            .context("Failed to connect to Redis")?;
        if !client.health_check().await.unwrap_or(false) {
            warn!("Redis health check failed at start-up");
        }
        Some(Arc::new(client))
    } else {
        None
    };

    match (config.otp.store, config.rate_limit.backend) {
        (StoreBackend::Memory, LimiterBackend::Memory) => {
            let limiters = memory_limiters(&config);
            serve(config, Arc::new(InMemoryOtpRepository::new()), limiters, notifier).await
        }
        (StoreBackend::Memory, LimiterBackend::Redis) => {
            let limiters = redis_limiters(&config, required(&redis)?);
            serve(config, Arc::new(InMemoryOtpRepository::new()), limiters, notifier).await
        }
        (StoreBackend::Redis, LimiterBackend::Memory) => {
            let store = Arc::new(RedisOtpRepository::new(required(&redis)?));
            let limiters = memory_limiters(&config);
            serve(config, store, limiters, notifier).await
        }
        (StoreBackend::Redis, LimiterBackend::Redis) => {
            let client = required(&redis)?;
            let store = Arc::new(RedisOtpRepository::new(client.clone()));
            let limiters = redis_limiters(&config, client);
            serve(config, store, limiters, notifier).await
        }
    }
}

/// `RUST_LOG` wins over the configured level; `log` records (actix access logs) are bridged
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn required(redis: &Option<Arc<RedisClient>>) -> anyhow::Result<Arc<RedisClient>> {
    redis
        .clone()
        .context("Redis backend selected but no Redis client was created")
}

fn memory_limiters(config: &AppConfig) -> (Arc<InMemoryRateLimiter>, Arc<InMemoryRateLimiter>) {
    (
        Arc::new(InMemoryRateLimiter::new(config.rate_limit.issue)),
        Arc::new(InMemoryRateLimiter::new(config.rate_limit.verify)),
    )
}

fn redis_limiters(
    config: &AppConfig,
    client: Arc<RedisClient>,
) -> (Arc<RedisRateLimiter>, Arc<RedisRateLimiter>) {
    (
        Arc::new(RedisRateLimiter::new(client.clone(), config.rate_limit.issue)),
        Arc::new(RedisRateLimiter::new(client, config.rate_limit.verify)),
    )
}

async fn serve<R, L>(
    config: AppConfig,
    store: Arc<R>,
    (issue_limiter, verify_limiter): (Arc<L>, Arc<L>),
    notifier: Arc<NotificationDispatcher>,
) -> anyhow::Result<()>
where
    R: OtpRepository + 'static,
    L: RateLimiter + 'static,
{
    let manager = Arc::new(OtpManager::new(
        store,
        issue_limiter,
        verify_limiter,
        notifier,
        OtpManagerConfig::from(&config.otp),
    ));
    let app_state = web::Data::new(AppState::new(manager));

    let bind_address = config.server.bind_address();
    let max_payload_size = config.server.max_payload_size;
    let cors_config = config.cors.clone();
    info!("Server will bind to: {}", bind_address);

    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(create_cors(&cors_config))
            .wrap(Logger::default())
            .configure(|cfg| {
                configure_app::<R, L, NotificationDispatcher>(cfg, max_payload_size)
            })
    });

    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run()
        .await
        .context("HTTP server terminated with an error")
}
