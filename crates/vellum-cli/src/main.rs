mod config;
mod server;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use vellum_core::impls::FsBlobStore;
use vellum_core::{Gallery, GalleryBuilder};

use crate::config::{Args, Settings};

fn init_logging(settings: &Settings) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.to_string()));

    if let Some(log_path) = &settings.log_file {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

async fn build_gallery(settings: &Settings) -> Result<Gallery> {
    let builder = GalleryBuilder::new(settings.gallery.clone());

    let builder = if settings.ephemeral {
        info!("ephemeral mode: images are kept in memory");
        builder
    } else {
        let store = FsBlobStore::open(&settings.data_dir)
            .await
            .with_context(|| format!("failed to open data dir {}", settings.data_dir.display()))?;
        info!(dir = %store.dir().display(), "using filesystem blob store");
        builder.store(store)
    };

    let gallery = builder.build().await.context("failed to build gallery")?;
    gallery.install();
    gallery.activate().await;
    Ok(gallery)
}

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::resolve(Args::parse())?;
    init_logging(&settings)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting vellum");

    let gallery = build_gallery(&settings).await?;
    info!(
        upload_size_hint = gallery.upload_size_hint(),
        routes = ?gallery.routes(),
        "gallery ready"
    );

    server::serve(settings.listen, Arc::new(gallery)).await
}
