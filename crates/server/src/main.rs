//! `passvault-server` binary entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise the telemetry pipeline (tracing + optional OTLP).
//! 3. Decode key material and build the ciphers and token service.
//! 4. Connect storage (PostgreSQL or in-memory) and the blob store (S3 or in-memory).
//! 5. Build the services and the Axum router.
//! 6. Serve over TLS or plaintext until SIGINT/SIGTERM.

mod auth;
mod blob;
mod config;
mod crypto;
mod secrets;
mod server;
mod storage;
mod sync;
mod telemetry;
mod validation;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::auth::TokenService;
use crate::blob::{BlobStore, MemoryBlobStore, S3BlobStore};
use crate::config::Config;
use crate::crypto::{BlobCipher, FieldCipher};
use crate::server::state::{AppState, Backends};
use crate::storage::{memory::MemoryStorage, postgres::PgStorage};

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(cfg.otel_exporter_otlp_endpoint.as_deref(), &cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen_port = cfg.listen_port,
        "passvault-server starting"
    );

    // -----------------------------------------------------------------------
    // 3. Keys, ciphers, tokens
    // -----------------------------------------------------------------------
    let fields = FieldCipher::new(cfg.field_key()?).with_max_age(cfg.field_token_max_age());
    let contents = BlobCipher::new(cfg.blob_key()?);
    let tokens = Arc::new(
        TokenService::new(cfg.token_sign_key.as_bytes(), cfg.token_ttl())
            .context("failed to initialise token service")?,
    );

    // -----------------------------------------------------------------------
    // 4. Storage and blob store
    // -----------------------------------------------------------------------
    let backends = if cfg.database_url.is_none() && cfg.s3_bucket.is_none() {
        warn!("DATABASE_URL and S3_BUCKET not set; all data is kept in memory");
        Backends::in_memory()
    } else {
        let blobs: Arc<dyn BlobStore> = match &cfg.s3_bucket {
            Some(bucket) => {
                let s3 = S3BlobStore::connect(bucket, cfg.s3_endpoint.as_deref()).await;
                s3.ensure_bucket()
                    .await
                    .context("failed to prepare blob bucket")?;
                info!(bucket = %bucket, "using S3 blob store");
                Arc::new(s3)
            }
            None => {
                warn!("S3_BUCKET not set; file content is kept in memory");
                Arc::new(MemoryBlobStore::new())
            }
        };

        match &cfg.database_url {
            Some(url) => {
                let pg = PgStorage::connect(url, cfg.database_max_connections)
                    .await
                    .context("failed to connect to database")?;
                pg.migrate().await.context("failed to run migrations")?;
                info!(
                    max_connections = cfg.database_max_connections,
                    "using PostgreSQL storage"
                );
                Backends::from_storage(Arc::new(pg), blobs)
            }
            None => {
                warn!("DATABASE_URL not set; records are kept in memory");
                Backends::from_storage(Arc::new(MemoryStorage::new()), blobs)
            }
        }
    };

    // -----------------------------------------------------------------------
    // 5. Services and router
    // -----------------------------------------------------------------------
    let state = AppState::new(
        backends,
        fields,
        contents,
        tokens,
        server::router::access_table(),
    );
    let router = server::router::build(state, cfg.request_timeout(), cfg.max_body_bytes);

    // -----------------------------------------------------------------------
    // 6. HTTP(S) server
    // -----------------------------------------------------------------------
    let addr: std::net::SocketAddr = ([0, 0, 0, 0], cfg.listen_port).into();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    match cfg.tls_paths() {
        Some((cert_path, key_path)) => {
            let cert = tokio::fs::read(cert_path)
                .await
                .with_context(|| format!("failed to read {cert_path}"))?;
            let key = tokio::fs::read(key_path)
                .await
                .with_context(|| format!("failed to read {key_path}"))?;
            let tls = server::tls::build_server_config(&cert, &key)?;

            info!(addr = %addr, "listening (TLS)");
            server::tls::serve(listener, tls, router, shutdown_signal()).await?;
        }
        None => {
            info!(addr = %addr, "listening (plaintext)");
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
    }

    telemetry::shutdown_telemetry();
    info!("passvault-server stopped");
    Ok(())
}

/// Resolves on the first SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}
