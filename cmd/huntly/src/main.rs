//! # Huntly binary
//!
//! Assembles the application from the adapters selected at compile time
//! and serves the API.

use std::sync::Arc;

use anyhow::Context;
use secrecy::ExposeSecret;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use api_adapters::{metrics::ApiMetrics, router, AppState};
use auth_adapters::Argon2PasswordHasher;
use domains::{MediaStore, PostRepo, UserRepo};
use services::{AuthService, MediaService, PostService, UserService};

#[cfg(not(feature = "web-axum"))]
compile_error!("huntly requires the web-axum feature");
#[cfg(not(feature = "auth-jwt"))]
compile_error!("huntly requires the auth-jwt feature");
#[cfg(not(any(feature = "media-local", feature = "media-s3")))]
compile_error!("huntly requires a media backend: media-local or media-s3");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = configs::AppConfig::load().context("loading configuration")?;

    // ── Persistence ─────────────────────────────────────────────────────
    #[cfg(feature = "db-postgres")]
    let (post_repo, user_repo): (Arc<dyn PostRepo>, Arc<dyn UserRepo>) = {
        let pool = storage_adapters::postgres::connect(
            cfg.database.url.expose_secret(),
            cfg.database.max_connections,
        )
        .await
        .context("connecting to postgres")?;
        storage_adapters::postgres::MIGRATOR
            .run(&pool)
            .await
            .context("running migrations")?;
        (
            Arc::new(storage_adapters::postgres::PgPostRepo::new(pool.clone())),
            Arc::new(storage_adapters::postgres::PgUserRepo::new(pool)),
        )
    };
    #[cfg(not(feature = "db-postgres"))]
    let (post_repo, user_repo): (Arc<dyn PostRepo>, Arc<dyn UserRepo>) = {
        tracing::warn!("no database feature enabled, using the in-memory store");
        (
            Arc::new(storage_adapters::memory::InMemoryPostRepo::new()),
            Arc::new(storage_adapters::memory::InMemoryUserRepo::new()),
        )
    };

    // ── Media ───────────────────────────────────────────────────────────
    #[cfg(feature = "media-s3")]
    let media_store: Arc<dyn MediaStore> = Arc::new(
        storage_adapters::media_s3::S3MediaStore::from_env(
            cfg.media.s3.bucket.clone(),
            cfg.media.s3.public_base.clone(),
        )
        .await,
    );
    #[cfg(all(feature = "media-local", not(feature = "media-s3")))]
    let media_store: Arc<dyn MediaStore> = Arc::new(
        storage_adapters::media_local::LocalMediaStore::new(
            cfg.media.local.root.clone(),
            cfg.media.local.public_base.clone(),
        ),
    );

    // ── Auth ────────────────────────────────────────────────────────────
    if cfg.auth.jwt_secret.expose_secret() == configs::DEV_JWT_SECRET {
        tracing::warn!("running with the built-in dev JWT secret; set HUNTLY__AUTH__JWT_SECRET");
    }
    let hasher = Arc::new(Argon2PasswordHasher);
    let tokens = Arc::new(auth_adapters::JwtTokenIssuer::new(
        cfg.auth.jwt_secret.expose_secret().as_bytes(),
        cfg.auth.token_ttl_hours,
    ));

    // ── Assembly ────────────────────────────────────────────────────────
    let state = AppState {
        auth: Arc::new(AuthService::new(
            user_repo.clone(),
            hasher.clone(),
            tokens.clone(),
        )),
        users: Arc::new(UserService::new(user_repo, hasher)),
        posts: Arc::new(PostService::new(post_repo)),
        media: Arc::new(MediaService::new(media_store, cfg.media.max_upload_bytes)),
        tokens,
        metrics: Arc::new(ApiMetrics::new()),
        upload_limit: cfg.media.max_upload_bytes,
    };

    let app = router(state);
    #[cfg(all(feature = "media-local", not(feature = "media-s3")))]
    let app = app.nest_service(
        "/media",
        tower_http::services::ServeDir::new(&cfg.media.local.root),
    );

    let listener = tokio::net::TcpListener::bind((cfg.server.host.as_str(), cfg.server.port))
        .await
        .with_context(|| format!("binding {}:{}", cfg.server.host, cfg.server.port))?;
    tracing::info!(addr = %listener.local_addr()?, "huntly listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving")?;
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    tracing::info!("shutdown signal received");
}
