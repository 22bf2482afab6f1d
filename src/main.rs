use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use remote_image_loader::application::{ImageLoadCoordinator, UiExecutor, ui_context};
use remote_image_loader::domain::entities::{Bitmap, IntoLocator};
use remote_image_loader::domain::LoadOutcome;
use remote_image_loader::domain::ports::SharedSurface;
use remote_image_loader::infrastructure::{
    AppConfig, CliArgs, ConfigFile, DiskResponseCache, MemoryImageCache, RasterDecoder,
    ReqwestFetcher,
};
use remote_image_loader::presentation::ImageSlot;

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = &config.log_path {
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
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .init();
    }

    Ok(())
}

fn load_placeholder(path: &Path) -> Result<Bitmap> {
    let img = image::open(path)
        .wrap_err_with(|| format!("Failed to open placeholder {}", path.display()))?;
    Ok(Arc::new(img))
}

fn report(slot: &SharedSurface<ImageSlot>, url: &str, outcome: LoadOutcome) {
    match outcome {
        Ok(_) => {
            if let Some((width, height)) = slot.lock().dimensions() {
                println!("{url}: {width}x{height}");
            }
        }
        Err(error) => {
            println!("{url}: failed (status {}): {error}", error.status_code());
            slot.lock().set_failed(error.to_string());
        }
    }
}

async fn build_coordinator(
    config: &AppConfig,
    clear_http_cache: bool,
) -> Result<(ImageLoadCoordinator, Arc<MemoryImageCache>, UiExecutor)> {
    let cache = Arc::new(MemoryImageCache::new(
        config.memory_cache.max_entries,
        config.memory_cache.max_total_cost,
    ));

    let mut fetcher = ReqwestFetcher::new()?;
    if config.http_cache.enabled {
        let directory = config.http_cache.effective_directory();
        let disk_cache = DiskResponseCache::open(directory, config.http_cache.max_bytes).await?;
        if clear_http_cache {
            disk_cache.clear().await?;
        }
        info!(
            entries = disk_cache.len(),
            bytes = disk_cache.current_size(),
            "HTTP response cache ready"
        );
        fetcher = fetcher.with_response_cache(Arc::new(disk_cache));
    }

    let (ui, executor) = ui_context();
    let coordinator = ImageLoadCoordinator::new(
        cache.clone(),
        Arc::new(fetcher),
        Arc::new(RasterDecoder::new()),
        ui,
        Handle::current(),
    )
    .with_config(config.loader.coordinator_config());

    Ok((coordinator, cache, executor))
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = CliArgs::parse();
    let config_file = ConfigFile::resolve(args.config.as_deref())?;
    let mut config = config_file.load()?;
    config.merge_with_args(&args);

    init_logging(&config)?;
    debug!(path = %config_file.path().display(), "Configuration loaded");

    info!(version = remote_image_loader::VERSION, "Starting image loader");

    let placeholder = args
        .placeholder
        .as_deref()
        .map(load_placeholder)
        .transpose()?;

    let (coordinator, cache, mut executor) =
        build_coordinator(&config, args.clear_http_cache).await?;

    for pass in 1..=args.passes.max(1) {
        let remaining = Arc::new(AtomicUsize::new(0));
        let mut slots = Vec::with_capacity(args.urls.len());

        for (index, url) in args.urls.iter().enumerate() {
            if url.into_locator().is_none() {
                warn!(url = %url, "Skipping unparsable URL");
                continue;
            }

            let slot: SharedSurface<ImageSlot> =
                Arc::new(Mutex::new(ImageSlot::new(format!("slot-{index}"))));
            remaining.fetch_add(1, Ordering::SeqCst);

            let slot_ref = slot.clone();
            let label = url.clone();
            let remaining_ref = remaining.clone();
            coordinator.load(
                &slot,
                url,
                placeholder.clone(),
                Some(Box::new(move |outcome| {
                    report(&slot_ref, &label, outcome);
                    remaining_ref.fetch_sub(1, Ordering::SeqCst);
                })),
            );
            slots.push(slot);
        }

        while remaining.load(Ordering::SeqCst) > 0 {
            if !executor.tick().await {
                break;
            }
            executor.run_pending();
        }

        let ready = slots.iter().filter(|slot| slot.lock().is_ready()).count();
        info!(pass, ready, total = slots.len(), "Pass complete");
    }

    info!("{}", cache.stats());

    Ok(())
}
