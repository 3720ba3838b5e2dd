use std::sync::Arc;
use std::time::Duration;

use looper_provider::{
    Provider,
    catalog::Catalog,
    resource::{DirStore, EmbeddedStore},
};
use tokio_util::sync::CancellationToken;

mod config;
mod publisher;

use publisher::Publisher;

fn init_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .filter_module("looper_provider", log::LevelFilter::Debug)
        .filter_module("media_loadgen", log::LevelFilter::Debug)
        .init();
}

fn build_provider(config: &config::LoadConfig) -> Provider {
    match &config.resources_dir {
        Some(dir) => {
            log::info!("reading clips from {}", dir);
            Provider::new(Catalog::builtin(), Arc::new(DirStore::new(dir)))
        }
        None => {
            log::info!("using {} embedded clips", EmbeddedStore::list().len());
            Provider::embedded()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let config = config::init_config()?;
    let provider = build_provider(config);

    let cancel = CancellationToken::new();
    let mut publishers = Vec::with_capacity(config.publishers);
    for id in 0..config.publishers {
        match Publisher::start(id, &provider, config, cancel.child_token()) {
            Ok(publisher) => publishers.push(publisher),
            Err(e) => log::error!("publisher {} failed to start: {:#}", id, e),
        }
    }
    log::info!(
        "{} of {} publishers running",
        publishers.len(),
        config.publishers
    );

    let deadline = async {
        if config.duration_secs == 0 {
            std::future::pending::<()>().await
        } else {
            tokio::time::sleep(Duration::from_secs(config.duration_secs)).await
        }
    };
    tokio::select! {
        _ = deadline => {
            log::info!("test duration elapsed");
        },
        _ = tokio::signal::ctrl_c() => {
            log::info!("ctrl+c received");
        },
    }
    cancel.cancel();

    let mut total_bytes = 0;
    let mut total_samples = 0;
    for publisher in publishers.iter_mut() {
        publisher.join().await;
        publisher.report();
        for track in publisher.tracks() {
            total_bytes += track.bytes();
            total_samples += track.samples();
        }
    }
    log::info!(
        "sent {} samples, {} bytes across {} publishers",
        total_samples,
        total_bytes,
        publishers.len()
    );

    Ok(())
}
