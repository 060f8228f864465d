//! Deploy-time selfcheck for the ingestion pipeline.
//!
//! Verifies the engine loads, its scratch space is writable, and the
//! collaborator configuration is present, without touching the catalog.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rbox_ingest::IngestConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);
    let env_filter = EnvFilter::from_default_env().add_directive("rbox=info".parse()?);
    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(true))
            .with(env_filter)
            .init();
    }

    let config = IngestConfig::from_env();
    println!(
        "ingest-selfcheck: starting (debounce={}ms)",
        config.slug_debounce.as_millis()
    );

    ensure_engine().await?;
    ensure_scratch_writable().await?;
    ensure_env_present(&[
        "STORAGE_ENDPOINT_URL",
        "STORAGE_ACCESS_KEY_ID",
        "STORAGE_SECRET_ACCESS_KEY",
        "STORAGE_BUCKET_NAME",
        "STORAGE_PUBLIC_BASE_URL",
        "CATALOG_BASE_URL",
        "CATALOG_API_KEY",
    ])?;

    if config.webhook_url.is_none() {
        println!("ingest-selfcheck: warning: RBOX_WEBHOOK_URL not set, notifications disabled");
    }
    if config.revalidate_url.is_none() {
        println!("ingest-selfcheck: warning: RBOX_REVALIDATE_URL not set, invalidation disabled");
    }

    println!("ingest-selfcheck: ok");
    Ok(())
}

async fn ensure_engine() -> anyhow::Result<()> {
    rbox_engine::acquire()
        .await
        .map_err(|e| anyhow::anyhow!("engine unavailable: {}", e))?;
    Ok(())
}

async fn ensure_scratch_writable() -> anyhow::Result<()> {
    let engine = rbox_engine::acquire()
        .await
        .map_err(|e| anyhow::anyhow!("engine unavailable: {}", e))?;
    let entry = engine.scratch().claim("selfcheck");
    tokio::fs::write(entry.path(), b"selfcheck")
        .await
        .map_err(|e| anyhow::anyhow!("scratch space not writable: {}", e))?;
    entry.release().await;
    Ok(())
}

fn ensure_env_present(vars: &[&str]) -> anyhow::Result<()> {
    for var in vars {
        if std::env::var(var).is_err() {
            return Err(anyhow::anyhow!("missing required env var {}", var));
        }
    }
    Ok(())
}
